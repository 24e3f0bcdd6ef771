//! CLI module
//!
//! Command-line interface over the HTTP client and query results.
//!
//! # Commands
//!
//! - `query` - Run a SOQL query and stream every page as JSON lines
//! - `get` - Retrieve a single record
//! - `create` - Create a record and print the new id

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::{render_object, Runner};
