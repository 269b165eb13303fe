//! # aodkit
//!
//! Command-line front end of aodkit-core: cluster table files, the
//! definition registry and analysis workflow runs.

pub mod cli;
pub mod config;
