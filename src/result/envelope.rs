//! Normalized response envelope

use crate::error::{Error, Result};
use crate::sobject::ATTRIBUTES_FIELD;
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

/// One page of records as returned by the query API
///
/// Single-entity bodies are wrapped into a one-record envelope by
/// [`Envelope::from_value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Whether this is the last page
    #[serde(default = "default_done")]
    pub done: bool,
    /// Total number of records across all pages
    #[serde(default)]
    pub total_size: u64,
    /// Raw records of this page
    #[serde(default)]
    pub records: Vec<JsonObject>,
    /// Cursor of the next page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,
    /// Id of a created or updated entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

fn default_done() -> bool {
    true
}

impl Envelope {
    /// Envelope without records
    pub fn empty() -> Self {
        Self {
            done: true,
            total_size: 0,
            records: Vec::new(),
            next_records_url: None,
            id: None,
        }
    }

    /// Envelope around a single entity
    pub fn single(record: JsonObject) -> Self {
        Self {
            done: true,
            total_size: 1,
            records: vec![record],
            next_records_url: None,
            id: None,
        }
    }

    /// Normalize a decoded body
    pub fn from_value(body: JsonValue) -> Result<Self> {
        match body {
            JsonValue::Object(object) if is_single_entity(&object) => Ok(Self::single(object)),
            JsonValue::Object(object) => serde_json::from_value(JsonValue::Object(object))
                .map_err(|e| Error::unparsable_response("body is not a record envelope", e)),
            other => Err(Error::unparsable_response(
                "body is not a JSON object",
                Error::Other(format!("got {}", value_kind(&other))),
            )),
        }
    }

    /// Declared type of the first record
    pub fn first_type_name(&self) -> Option<&str> {
        self.records
            .first()
            .and_then(|record| record.get(ATTRIBUTES_FIELD))
            .and_then(|attrs| attrs.get("type"))
            .and_then(JsonValue::as_str)
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::empty()
    }
}

/// Top-level `attributes` marks a single entity
pub(crate) fn is_single_entity(object: &JsonObject) -> bool {
    object.contains_key(ATTRIBUTES_FIELD)
}

/// `records` marks a nested record set
pub(crate) fn is_record_set(object: &JsonObject) -> bool {
    object.contains_key("records")
}

fn value_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
