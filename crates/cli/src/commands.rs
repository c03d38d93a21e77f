//! Subcommands.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Subcommand, ValueEnum};
use corelib::config::DEFAULT_LOOKUP_KEY;
use corelib::ring::DEFAULT_BITS;
use corelib::simulation::generate_identifiers;
use corelib::{IdSpace, RingConfig, Simulation, SimulationReport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

/// How a simulation report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Lookup line followed by one block per finger table.
    Text,
    /// Pretty-printed JSON report.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Join every node, refresh all finger tables, resolve a key and print
    /// the finger tables.
    Run {
        /// Node file with one identifier per line.
        #[arg(short, long, default_value = "nodes.txt")]
        input: PathBuf,

        /// Identifier bits; the ring has 2^bits slots.
        #[arg(short, long, env = "CHORD_BITS", default_value_t = DEFAULT_BITS)]
        bits: u32,

        /// Key to resolve once the ring is built.
        #[arg(short, long, env = "CHORD_LOOKUP_KEY", default_value_t = DEFAULT_LOOKUP_KEY)]
        key: u64,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Write random unique node identifiers, sorted, one per line.
    Generate {
        /// Destination node file.
        #[arg(short, long, default_value = "nodes.txt")]
        output: PathBuf,

        /// Number of identifiers.
        #[arg(short = 'n', long, default_value_t = 500)]
        count: usize,

        /// Identifier bits; the ring has 2^bits slots.
        #[arg(short, long, env = "CHORD_BITS", default_value_t = DEFAULT_BITS)]
        bits: u32,

        /// Seed for reproducible output.
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// What a command produced.
#[derive(Debug)]
pub enum CommandResult {
    Report {
        report: SimulationReport,
        format: OutputFormat,
    },
    Generated {
        path: PathBuf,
        count: usize,
    },
}

impl Command {
    pub fn execute(&self) -> anyhow::Result<CommandResult> {
        match self {
            Command::Run {
                input,
                bits,
                key,
                format,
            } => {
                let config = RingConfig {
                    bits: *bits,
                    lookup_key: *key,
                };
                let file = File::open(input)
                    .with_context(|| format!("failed to open {}", input.display()))?;
                let report = Simulation::new(config)
                    .run_from_reader(BufReader::new(file))
                    .with_context(|| format!("simulation over {} failed", input.display()))?;
                if !report.skipped.is_empty() {
                    warn!(skipped = report.skipped.len(), "some input lines were skipped");
                }
                Ok(CommandResult::Report {
                    report,
                    format: *format,
                })
            }
            Command::Generate {
                output,
                count,
                bits,
                seed,
            } => {
                let space = IdSpace::new(*bits)?;
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(*seed),
                    None => StdRng::from_entropy(),
                };
                let ids = generate_identifiers(*count, space, &mut rng)?;

                let file = File::create(output)
                    .with_context(|| format!("failed to create {}", output.display()))?;
                let mut writer = BufWriter::new(file);
                for id in &ids {
                    writeln!(writer, "{}", id)?;
                }
                writer.flush()?;
                info!(path = %output.display(), count = ids.len(), "node file written");

                Ok(CommandResult::Generated {
                    path: output.clone(),
                    count: ids.len(),
                })
            }
        }
    }
}

impl CommandResult {
    /// Prints the result for a human or a pipeline.
    pub fn write_to(&self, out: &mut impl Write) -> anyhow::Result<()> {
        match self {
            CommandResult::Report {
                report,
                format: OutputFormat::Text,
            } => write!(out, "{}", report)?,
            CommandResult::Report {
                report,
                format: OutputFormat::Json,
            } => {
                serde_json::to_writer_pretty(&mut *out, report)?;
                writeln!(out)?;
            }
            CommandResult::Generated { path, count } => {
                writeln!(out, "Wrote {} node identifiers to {}", count, path.display())?
            }
        }
        Ok(())
    }
}
