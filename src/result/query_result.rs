//! Paginated, lazily materialized query result
//!
//! A [`QueryResult`] wraps one page of records. Records are turned into
//! objects only while iterating, and the page keeps the objects only after
//! a complete pass over its records succeeded.

use super::envelope::{is_record_set, is_single_entity, Envelope};
use super::iter::Iter;
use super::response::Response;
use crate::error::{Error, Result, ResultError};
use crate::pagination::{MoreResults, NextPage};
use crate::sobject::{Field, GenericObject, ObjectMap, Record, SObject, SObjectFactory};
use crate::types::{JsonObject, JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identity and object yielded by a result
pub type ObjectEntry = (String, Box<dyn SObject>);

/// One page of a query result, chained to the pages after it
#[derive(Clone)]
pub struct QueryResult {
    /// Class the records of this page decode into
    class_name: String,
    factory: SObjectFactory,
    results: Envelope,
    object_map: Arc<ObjectMap>,
    more_results_callback: Option<Arc<dyn MoreResults>>,
    more_results: NextPage,
    /// Set only after a full successful pass over `results.records`;
    /// record order is kept and repeated identities are not merged
    pub(super) objects: Option<Vec<ObjectEntry>>,
}

impl QueryResult {
    /// Build a result from a transport response
    ///
    /// 200 and 201 decode the body, 204 yields an empty result without
    /// touching the body, any other status fails.
    pub fn from_response<R: Response>(
        response: R,
        object_map: Arc<ObjectMap>,
        more_results_callback: Option<Arc<dyn MoreResults>>,
    ) -> Result<Self> {
        let status = response.status();
        match status {
            200 | 201 => {
                let body = response
                    .into_body()
                    .map_err(|e| Error::unparsable_response("failed to read response body", e))?;
                let value: JsonValue = serde_json::from_slice(&body)
                    .map_err(|e| Error::unparsable_response("body is not valid JSON", e))?;
                Self::new(value, object_map, more_results_callback)
            }
            204 => {
                debug!("Empty response (204), no records");
                Self::from_envelope(Envelope::empty(), object_map, more_results_callback)
            }
            _ => Err(Error::unexpected_status(status)),
        }
    }

    /// Build a result from an already decoded body
    pub fn new(
        body: JsonValue,
        object_map: Arc<ObjectMap>,
        more_results_callback: Option<Arc<dyn MoreResults>>,
    ) -> Result<Self> {
        let results = Envelope::from_value(body)?;
        Self::from_envelope(results, object_map, more_results_callback)
    }

    /// Build a result from a normalized envelope
    ///
    /// The class is resolved here, so an unregistered class fails now and
    /// never during iteration.
    pub fn from_envelope(
        results: Envelope,
        object_map: Arc<ObjectMap>,
        more_results_callback: Option<Arc<dyn MoreResults>>,
    ) -> Result<Self> {
        let (class_name, factory) = object_map.resolve(results.first_type_name())?;
        debug!(
            class_name = %class_name,
            records = results.records.len(),
            total_size = results.total_size,
            has_next = results.next_records_url.is_some(),
            "Created result page"
        );
        Ok(Self {
            class_name,
            factory,
            results,
            object_map,
            more_results_callback,
            more_results: NextPage::Pending,
            objects: None,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn total_size(&self) -> u64 {
        self.results.total_size
    }

    pub fn is_done(&self) -> bool {
        self.results.done
    }

    pub fn next_records_url(&self) -> Option<&str> {
        self.results.next_records_url.as_deref()
    }

    /// Id of a created or updated entity
    pub fn last_id(&self) -> Option<&str> {
        self.results.id.as_deref()
    }

    /// Raw records of this page
    pub fn records(&self) -> &[JsonObject] {
        &self.results.records
    }

    pub fn envelope(&self) -> &Envelope {
        &self.results
    }

    pub fn object_map(&self) -> &Arc<ObjectMap> {
        &self.object_map
    }

    /// Check if this page holds materialized objects
    pub fn is_cached(&self) -> bool {
        self.objects.is_some()
    }

    /// Drop this page's objects so the next pass parses again
    ///
    /// Pages fetched after this one keep their own cache.
    pub fn clear_cache(&mut self) {
        self.objects = None;
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Lazily iterate over every object of this page and the pages after it
    pub fn iter(&mut self) -> Iter<'_> {
        Iter::new(self)
    }

    /// First object of the whole sequence
    pub fn first(&mut self) -> Result<Option<Box<dyn SObject>>> {
        let entry = self.iter().next().transpose()?;
        Ok(entry.map(|(_, object)| object))
    }

    /// Materialize every page into an identity → object map
    ///
    /// Holds all pages in memory at once.
    pub fn to_map(&mut self) -> Result<HashMap<String, Box<dyn SObject>>> {
        self.iter().collect()
    }

    /// Next page, fetched through the continuation on first call
    pub fn more(&mut self) -> Result<Option<&mut QueryResult>> {
        if self.more_results.is_pending() {
            self.more_results = match (
                &self.more_results_callback,
                &self.results.next_records_url,
            ) {
                (Some(callback), Some(cursor)) => {
                    debug!(cursor = %cursor, class_name = %self.class_name, "Fetching next page");
                    match callback.fetch(cursor, &self.class_name)? {
                        Some(page) => NextPage::Fetched(Box::new(page)),
                        None => NextPage::Done,
                    }
                }
                _ => NextPage::Done,
            };
        }
        Ok(self.more_results.page_mut())
    }

    // ========================================================================
    // Record Parsing
    // ========================================================================

    /// Turn one raw record into an object keyed by its identity
    ///
    /// Objects without identity (aggregate rows, queries not selecting `Id`)
    /// are keyed by the empty string.
    pub(super) fn parse_record(&self, raw: &JsonObject) -> Result<ObjectEntry> {
        let mut record = Record::new();
        for (name, value) in raw {
            match self.parse_field(value) {
                Ok(field) => record.insert(name.clone(), field),
                Err(e) => {
                    let partial: Box<dyn SObject> = Box::new(GenericObject::new(record));
                    return Err(self.record_error(raw, Some(partial), e));
                }
            }
        }

        let object = (self.factory)(record).map_err(|e| self.record_error(raw, None, e))?;
        let id = object.id().unwrap_or_default().to_string();
        Ok((id, object))
    }

    fn parse_field(&self, value: &JsonValue) -> Result<Field> {
        match value {
            JsonValue::Object(object) if is_record_set(object) => {
                Ok(Field::Children(self.nested(value.clone())?))
            }
            // Only the first object of a nested single relation is kept
            JsonValue::Object(object) if is_single_entity(object) => {
                Ok(Field::Parent(self.nested(value.clone())?.first()?))
            }
            _ => Ok(Field::Value(value.clone())),
        }
    }

    fn nested(&self, body: JsonValue) -> Result<QueryResult> {
        Self::new(
            body,
            Arc::clone(&self.object_map),
            self.more_results_callback.clone(),
        )
    }

    fn record_error(
        &self,
        raw: &JsonObject,
        object: Option<Box<dyn SObject>>,
        source: Error,
    ) -> Error {
        warn!(class_name = %self.class_name, error = %source, "Failed to parse record");
        Error::Result(ResultError::UnparsableRecord {
            record: raw.clone(),
            class_name: self.class_name.clone(),
            object,
            source: Box::new(source),
        })
    }
}

impl<'a> IntoIterator for &'a mut QueryResult {
    type Item = Result<ObjectEntry>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResult")
            .field("class_name", &self.class_name)
            .field("total_size", &self.results.total_size)
            .field("records", &self.results.records.len())
            .field("next_records_url", &self.results.next_records_url)
            .field("cached", &self.objects.is_some())
            .field("more_results", &self.more_results)
            .finish_non_exhaustive()
    }
}
