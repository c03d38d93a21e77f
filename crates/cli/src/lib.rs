//! CLI tool for building and querying Chord rings.
//!
//! Provides commands for:
//! - Running the join / refresh / lookup simulation over a node file
//! - Generating random node files

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult, OutputFormat};
pub use config::CliConfig;
