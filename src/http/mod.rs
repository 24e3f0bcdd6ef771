//! HTTP client module
//!
//! Provides the blocking transport for the REST data API.
//!
//! # Features
//!
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Data API**: query, queryAll, retrieve and create endpoints
//! - **Continuation**: follows `nextRecordsUrl` cursors for [`QueryResult`]
//!
//! [`QueryResult`]: crate::result::QueryResult

mod client;
mod continuation;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use continuation::Continuation;
