//! Pagination types and traits
//!
//! Defines the continuation used to fetch the next page and the memoized
//! state of that fetch.

use crate::error::Result;
use crate::result::QueryResult;

/// Continuation that fetches the page behind a `nextRecordsUrl` cursor
///
/// Called with the cursor and the class name resolved for the current page.
/// Closures of the same shape implement it directly.
pub trait MoreResults: Send + Sync {
    fn fetch(&self, cursor: &str, class_name: &str) -> Result<Option<QueryResult>>;
}

impl<F> MoreResults for F
where
    F: Fn(&str, &str) -> Result<Option<QueryResult>> + Send + Sync,
{
    fn fetch(&self, cursor: &str, class_name: &str) -> Result<Option<QueryResult>> {
        self(cursor, class_name)
    }
}

/// Memoized next-page link of a result
#[derive(Debug, Clone, Default)]
pub enum NextPage {
    /// Not asked for yet
    #[default]
    Pending,
    /// No next page
    Done,
    /// Next page, owned by the previous one
    Fetched(Box<QueryResult>),
}

impl NextPage {
    /// Check if the next page has not been resolved yet
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Check if this page is known to be the last one
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// The fetched page, if any
    pub fn page(&self) -> Option<&QueryResult> {
        match self {
            Self::Fetched(page) => Some(page),
            _ => None,
        }
    }

    pub fn page_mut(&mut self) -> Option<&mut QueryResult> {
        match self {
            Self::Fetched(page) => Some(page),
            _ => None,
        }
    }
}
