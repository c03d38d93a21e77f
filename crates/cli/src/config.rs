//! Command-line configuration and logging setup.

use std::io::{self, Write};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::Command;

/// Top-level command line.
#[derive(Debug, Parser)]
#[command(
    name = "chord-ring",
    version,
    about = "Build a Chord ring from node identifiers and query it"
)]
pub struct CliConfig {
    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "CHORD_LOG", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Installs logging, executes the command and prints its result.
    pub fn run(self) -> anyhow::Result<()> {
        setup_tracing(&self.log_level);

        let result = self.command.execute()?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        result.write_to(&mut out)?;
        out.flush().context("failed to flush stdout")?;
        Ok(())
    }
}

/// Initialize the `tracing` subscriber on stderr.
///
/// Respects `RUST_LOG` if set, otherwise uses `level`.
fn setup_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
