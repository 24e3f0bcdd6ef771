//! `nextRecordsUrl` continuation backed by the HTTP client

use super::client::HttpClient;
use crate::error::Result;
use crate::pagination::MoreResults;
use crate::result::QueryResult;
use crate::sobject::ObjectMap;
use std::sync::Arc;
use tracing::debug;

/// Fetches follow-up pages and threads itself into each of them
#[derive(Debug, Clone)]
pub struct Continuation {
    client: HttpClient,
    object_map: Arc<ObjectMap>,
}

impl Continuation {
    pub fn new(client: HttpClient, object_map: Arc<ObjectMap>) -> Self {
        Self { client, object_map }
    }
}

impl MoreResults for Continuation {
    fn fetch(&self, cursor: &str, class_name: &str) -> Result<Option<QueryResult>> {
        debug!(cursor, class_name, "Following nextRecordsUrl");
        let response = self
            .client
            .send(reqwest::Method::GET, cursor, &[], None)?;
        QueryResult::from_response(
            response,
            Arc::clone(&self.object_map),
            Some(Arc::new(self.clone())),
        )
        .map(Some)
    }
}
