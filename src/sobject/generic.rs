//! Generic fallback object
//!
//! Used for every type name without a registered class.

use super::types::{Field, FromRecord, Record, SObject};
use crate::error::Result;
use crate::types::JsonValue;

/// Object that keeps the parsed record as-is
#[derive(Debug, Clone, Default)]
pub struct GenericObject {
    record: Record,
}

impl GenericObject {
    pub fn new(record: Record) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.record.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&JsonValue> {
        self.record.value(name)
    }
}

impl SObject for GenericObject {
    fn id(&self) -> Option<&str> {
        self.record.id()
    }

    fn type_name(&self) -> Option<&str> {
        self.record.type_name()
    }
}

impl FromRecord for GenericObject {
    fn from_record(record: Record) -> Result<Self> {
        Ok(Self { record })
    }
}
