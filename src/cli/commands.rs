//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Query and fetch records from the REST data API
#[derive(Parser, Debug)]
#[command(name = "sfo-records")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Instance URL, overrides the config file
    #[arg(long, global = true)]
    pub instance_url: Option<String>,

    /// Bearer token, overrides the config file and SFO_ACCESS_TOKEN
    #[arg(long, global = true)]
    pub access_token: Option<String>,

    /// REST API version (e.g. 59.0)
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a SOQL query and print every record, following pagination
    Query {
        /// SOQL statement
        soql: String,

        /// Include deleted and archived records (queryAll)
        #[arg(long)]
        all: bool,

        /// Stop after this many records
        #[arg(long)]
        max_records: Option<usize>,
    },

    /// Retrieve a single record
    Get {
        /// Object type (e.g. Account)
        sobject: String,

        /// Record id
        id: String,
    },

    /// Create a record and print its id
    Create {
        /// Object type (e.g. Account)
        sobject: String,

        /// Field values as a JSON object
        #[arg(long)]
        json: String,
    },
}
