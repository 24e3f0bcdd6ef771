//! Domain object types and traits
//!
//! Defines the capability a class needs to be materialized from a record,
//! plus the record representation handed to its factory.

use crate::error::{Error, Result};
use crate::result::QueryResult;
use crate::types::{JsonObject, JsonValue};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Field holding the record identity
pub const ID_FIELD: &str = "Id";

/// Field holding the record type marker
pub const ATTRIBUTES_FIELD: &str = "attributes";

// ============================================================================
// SObject
// ============================================================================

/// A materialized domain object
///
/// Implementors only provide the identity; cloning and downcasting come
/// from the blanket [`ObjectClone`] impl for any `Clone` type.
pub trait SObject: ObjectClone + fmt::Debug + Send + Sync + 'static {
    /// Stable identity used to key the object in a result map
    fn id(&self) -> Option<&str>;

    /// Remote type name, when the object knows it
    fn type_name(&self) -> Option<&str> {
        None
    }
}

/// Object-safe cloning and downcasting for [`SObject`]
pub trait ObjectClone {
    fn clone_object(&self) -> Box<dyn SObject>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: SObject + Clone> ObjectClone for T {
    fn clone_object(&self) -> Box<dyn SObject> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Clone for Box<dyn SObject> {
    fn clone(&self) -> Self {
        (**self).clone_object()
    }
}

impl dyn SObject {
    /// Check whether the object is of concrete type `T`
    pub fn is<T: SObject>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow the object as concrete type `T`
    pub fn downcast_ref<T: SObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow the object as concrete type `T`
    pub fn downcast_mut<T: SObject>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Construction of a domain object from a parsed record
pub trait FromRecord: SObject + Clone + Sized {
    fn from_record(record: Record) -> Result<Self>;
}

// ============================================================================
// Record
// ============================================================================

/// A single field of a parsed record
#[derive(Debug, Clone)]
pub enum Field {
    /// Plain JSON value
    Value(JsonValue),
    /// One-to-one relation, absent when the nested result was empty
    Parent(Option<Box<dyn SObject>>),
    /// One-to-many relation, iterated lazily
    Children(QueryResult),
}

impl Field {
    pub fn as_value(&self) -> Option<&JsonValue> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_parent(&self) -> Option<&(dyn SObject + 'static)> {
        match self {
            Self::Parent(Some(obj)) => Some(obj.as_ref()),
            _ => None,
        }
    }

    pub fn as_children(&self) -> Option<&QueryResult> {
        match self {
            Self::Children(result) => Some(result),
            _ => None,
        }
    }

    pub fn as_children_mut(&mut self) -> Option<&mut QueryResult> {
        match self {
            Self::Children(result) => Some(result),
            _ => None,
        }
    }

    /// True for JSON null and for an empty one-to-one relation
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(JsonValue::Null) | Self::Parent(None))
    }
}

impl From<JsonValue> for Field {
    fn from(value: JsonValue) -> Self {
        Self::Value(value)
    }
}

/// Record fields after nested relations have been resolved
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: BTreeMap<String, Field>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record of plain values, without relation resolution
    pub fn from_json(object: JsonObject) -> Self {
        Self {
            fields: object
                .into_iter()
                .map(|(k, v)| (k, Field::Value(v)))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, field: impl Into<Field>) {
        self.fields.insert(name.into(), field.into());
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Field> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Field)> {
        self.fields.iter_mut()
    }

    /// Plain JSON value of a field
    pub fn value(&self, name: &str) -> Option<&JsonValue> {
        self.get(name).and_then(Field::as_value)
    }

    /// String value of a field
    pub fn str(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(JsonValue::as_str)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(JsonValue::as_i64)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(JsonValue::as_f64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(JsonValue::as_bool)
    }

    /// String value of a field that must be present
    pub fn require_str(&self, name: &str) -> Result<&str> {
        match self.value(name) {
            None | Some(JsonValue::Null) => Err(Error::missing_field(name)),
            Some(JsonValue::String(s)) => Ok(s),
            Some(other) => Err(Error::invalid_field(
                name,
                format!("expected string, got {other}"),
            )),
        }
    }

    /// Identity of the record (`Id`)
    pub fn id(&self) -> Option<&str> {
        self.str(ID_FIELD)
    }

    /// Remote type name from `attributes.type`
    pub fn type_name(&self) -> Option<&str> {
        self.value(ATTRIBUTES_FIELD)
            .and_then(|attrs| attrs.get("type"))
            .and_then(JsonValue::as_str)
    }

    /// Take a one-to-many relation out of the record
    pub fn take_children(&mut self, name: &str) -> Option<QueryResult> {
        match self.fields.remove(name)? {
            Field::Children(result) => Some(result),
            other => {
                self.fields.insert(name.to_string(), other);
                None
            }
        }
    }

    /// Take a one-to-one relation out of the record
    pub fn take_parent(&mut self, name: &str) -> Option<Box<dyn SObject>> {
        match self.fields.remove(name)? {
            Field::Parent(parent) => parent,
            other => {
                self.fields.insert(name.to_string(), other);
                None
            }
        }
    }
}

impl FromIterator<(String, Field)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Field)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
