//! Pagination module
//!
//! # Overview
//!
//! Pages are chained through a `nextRecordsUrl` cursor. The core never
//! talks to the network: a [`MoreResults`] continuation is injected into
//! each result and asked at most once per page for the following page,
//! whose outcome is memoized as a [`NextPage`].

mod types;

pub use types::{MoreResults, NextPage};
