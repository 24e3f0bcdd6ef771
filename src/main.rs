// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]

//! sfo-records CLI
//!
//! Command-line interface for querying records

use clap::Parser;
use sfo_records::cli::{Cli, Runner};

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let runner = Runner::new(cli);

    if let Err(e) = runner.run() {
        match e.code() {
            Some(code) => eprintln!("Error [{code}]: {e}"),
            None => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
}
