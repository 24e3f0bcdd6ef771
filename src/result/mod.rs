//! Query result module
//!
//! # Overview
//!
//! - [`QueryResult::from_response`] classifies a transport response and
//!   decodes its body
//! - [`QueryResult::new`] normalizes single-entity and list bodies into an
//!   [`Envelope`] and resolves the page's class
//! - [`QueryResult::iter`] lazily materializes objects, expanding nested
//!   relations first, and continues into the next page when one exists
//!
//! ```rust,ignore
//! let map = Arc::new(ObjectMap::new().bind::<Account>("Account"));
//! let mut result = QueryResult::from_response(response, map, Some(continuation))?;
//! for entry in &mut result {
//!     let (id, object) = entry?;
//!     println!("{id}: {object:?}");
//! }
//! ```

mod envelope;
mod iter;
mod query_result;
mod response;

pub use envelope::Envelope;
pub use iter::Iter;
pub use query_result::{ObjectEntry, QueryResult};
pub use response::{RawResponse, Response};

#[cfg(test)]
mod tests;
