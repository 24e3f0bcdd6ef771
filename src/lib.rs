// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]

//! # sfo-records
//!
//! Lazy, paginated query results for the REST data API.
//!
//! ## Features
//!
//! - **Normalization**: single entities, record sets and empty bodies share one envelope
//! - **Class Mapping**: remote types map to registered domain classes
//! - **Nested Relations**: parent and child relations parse recursively
//! - **Page Caching**: a page is cached only after it parses completely
//! - **Continuation**: follow-up pages are fetched once and memoized
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sfo_records::http::{HttpClient, HttpClientConfig};
//! use sfo_records::{ObjectMap, Result};
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let client = HttpClient::with_config(
//!         HttpClientConfig::builder()
//!             .instance_url("https://example.my.salesforce.com")
//!             .access_token("00Dxx!...")
//!             .build(),
//!     )?;
//!
//!     let mut accounts = client.query("SELECT Id, Name FROM Account", Arc::new(ObjectMap::new()))?;
//!     for entry in accounts.iter() {
//!         let (id, object) = entry?;
//!         println!("{id}: {object:?}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          QueryResult                            │
//! │  iter() → (id, object)   first()   to_map()   more() → page     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────┬────────────────┴──┬──────────────┬───────────────┐
//! │  Envelope   │     ObjectMap     │  Pagination  │     HTTP      │
//! ├─────────────┼───────────────────┼──────────────┼───────────────┤
//! │ Single      │ type → class      │ MoreResults  │ Bearer auth   │
//! │ Record set  │ class → factory   │ NextPage     │ Retry         │
//! │ Empty (204) │ GenericObject     │ memoized     │ Continuation  │
//! └─────────────┴───────────────────┴──────────────┴───────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types and codes
pub mod error;

/// Common types and type aliases
pub mod types;

/// Domain objects, records and the class registry
pub mod sobject;

/// Response normalization and lazy query results
pub mod result;

/// Continuation of paginated results
pub mod pagination;

/// HTTP client with retry
pub mod http;

/// Client configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorCode, Result, ResultError, UsageError};
pub use types::*;

// Re-export commonly used types
pub use pagination::MoreResults;
pub use result::QueryResult;
pub use sobject::{FromRecord, GenericObject, ObjectMap, Record, SObject};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
