//! # aodkit
//!
//! The command-line binary for aodkit.
//!
//! ## Usage
//!
//! ```bash
//! # Cluster definitions
//! aodkit definitions
//! aodkit resolve --name kV3Default
//!
//! # Tables
//! aodkit build-tables -i clusters.json -o tables.bin
//! aodkit inspect -i tables.bin
//!
//! # Workflow
//! aodkit init-config -o workflow.toml
//! aodkit --config workflow.toml run -i batch.json -o histos.json
//! ```

use aodkit::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // AODKIT_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("AODKIT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "aodkit=debug,aodkit_core=debug"
    } else if cli.quiet {
        "aodkit=warn,aodkit_core=warn"
    } else {
        "aodkit=info,aodkit_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
