//! # aodkit CLI Module
//!
//! This module implements the CLI interface for aodkit.
//!
//! ## Available Commands
//!
//! - `definitions` - List the cluster definition registry
//! - `resolve` - Look up one cluster definition by name
//! - `build-tables` - Build matched/ambiguous cluster tables from JSON
//! - `inspect` - Summarize a cluster table file
//! - `run` - Run the analysis workflow over one event batch
//! - `init-config` - Write the default workflow configuration
//! - `hash` - Compute the BLAKE3 digest of a file

mod commands;

use aodkit_core::AodError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// aodkit - EMCAL cluster tables and analysis workflows
///
/// Builds the per-pass cluster tables, resolves cluster definitions and runs
/// the histogramming analysis tasks over event batches.
#[derive(Parser, Debug)]
#[command(name = "aodkit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Workflow configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all cluster definitions
    Definitions,

    /// Show one cluster definition
    Resolve {
        /// Definition name, e.g. kV3Default
        #[arg(short, long)]
        name: String,
    },

    /// Build cluster tables from a JSON pass description
    BuildTables {
        /// Input JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output table file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Summarize a cluster table file
    Inspect {
        /// Table file written by build-tables
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Run the analysis workflow over an event batch
    Run {
        /// Event batch JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Histogram output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the default workflow configuration
    InitConfig {
        /// Output TOML file
        #[arg(short, long)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Compute BLAKE3 digest of a file
    Hash {
        /// File to hash
        #[arg(short, long)]
        input: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), AodError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Definitions) | None => cmd_definitions(json_mode),
        Some(Commands::Resolve { name }) => cmd_resolve(&name, json_mode),
        Some(Commands::BuildTables { input, output }) => {
            cmd_build_tables(&input, &output, json_mode)
        }
        Some(Commands::Inspect { input }) => cmd_inspect(&input, json_mode),
        Some(Commands::Run { input, output }) => {
            cmd_run(cli.config.as_deref(), &input, output.as_deref(), json_mode)
        }
        Some(Commands::InitConfig { output, force }) => cmd_init_config(&output, force),
        Some(Commands::Hash { input }) => cmd_hash(&input, json_mode),
    }
}
