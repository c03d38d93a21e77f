//! Simulation harness.
//!
//! Drives the whole reference scenario: read identifiers, construct every
//! node, join them one at a time through the first node, seal the ring (one
//! global finger refresh), resolve a lookup key and capture every finger
//! table in construction order.

use std::collections::BTreeSet;
use std::fmt;
use std::io::BufRead;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::RingConfig;
use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::ring::{IdSpace, RingBuilder};
use crate::topology::FingerTableSnapshot;

/// An input line that did not yield an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub content: String,
    pub reason: String,
}

/// Identifiers read from an input source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInput {
    pub ids: Vec<u64>,
    pub skipped: Vec<SkippedLine>,
}

/// Reads one identifier per line.
///
/// Lines that are not integers, are not valid UTF-8, or fall outside `space`
/// are skipped and recorded; blank lines are ignored. Only read failures
/// abort.
pub fn parse_identifiers<R: BufRead>(reader: R, space: IdSpace) -> Result<ParsedInput> {
    let mut parsed = ParsedInput::default();

    for (index, raw) in reader.split(b'\n').enumerate() {
        let mut raw = raw?;
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        let number = index + 1;

        let line = match String::from_utf8(raw) {
            Ok(line) => line,
            Err(err) => {
                let content = String::from_utf8_lossy(err.as_bytes()).trim().to_string();
                warn!(line = number, %content, "skipping input line that is not UTF-8");
                parsed.skipped.push(SkippedLine {
                    line: number,
                    content,
                    reason: "invalid UTF-8".to_string(),
                });
                continue;
            }
        };
        let content = line.trim();
        if content.is_empty() {
            debug!(line = number, "ignoring blank line");
            continue;
        }

        let reason = match content.parse::<u64>() {
            Ok(id) if space.contains(id) => {
                parsed.ids.push(id);
                continue;
            }
            Ok(id) => format!("identifier {} outside ring of size {}", id, space.size()),
            Err(err) => format!("error converting ID: {}", err),
        };
        warn!(line = number, content, %reason, "skipping input line");
        parsed.skipped.push(SkippedLine {
            line: number,
            content: content.to_string(),
            reason,
        });
    }

    Ok(parsed)
}

/// Draws `count` unique identifiers from `space`, sorted ascending.
pub fn generate_identifiers<R: Rng>(
    count: usize,
    space: IdSpace,
    rng: &mut R,
) -> Result<Vec<u64>> {
    if count as u128 > space.size() as u128 {
        return Err(Error::TooManyNodes {
            requested: count,
            size: space.size(),
        });
    }
    let mut ids = BTreeSet::new();
    while ids.len() < count {
        ids.insert(rng.gen_range(0..space.size()));
    }
    Ok(ids.into_iter().collect())
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub bits: u32,
    pub key: u64,
    /// Node owning `key`.
    pub owner: NodeId,
    /// Finger tables in construction order.
    pub tables: Vec<FingerTableSnapshot>,
    /// Input lines that were skipped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedLine>,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Successor of key {} is node {}", self.key, self.owner)?;
        for table in &self.tables {
            writeln!(f)?;
            writeln!(f, "Node {} finger table:", table.node)?;
            for row in &table.entries {
                match row.owner {
                    Some(owner) => writeln!(f, "Start: {}, Node: {}", row.start, owner)?,
                    None => writeln!(f, "Start: {}, Node: -", row.start)?,
                }
            }
        }
        Ok(())
    }
}

/// Runs the construct, join, refresh, query sequence.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    config: RingConfig,
}

impl Simulation {
    pub fn new(config: RingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Builds a sealed ring from `ids` and reports on it.
    ///
    /// An empty or duplicated identifier set is rejected before any node is
    /// joined.
    pub fn run(&self, ids: &[u64]) -> Result<SimulationReport> {
        let space = self.config.validate()?;
        let ring = RingBuilder::new()
            .with_space(space)
            .add_nodes(ids.iter().copied())
            .build_sealed()?;

        let owner = ring.lookup(self.config.lookup_key)?;
        info!(key = self.config.lookup_key, %owner, "lookup resolved");

        Ok(SimulationReport {
            bits: space.bits(),
            key: self.config.lookup_key,
            owner,
            tables: ring.finger_tables()?,
            skipped: Vec::new(),
        })
    }

    /// Parses identifiers from `reader`, then runs.
    pub fn run_from_reader<R: BufRead>(&self, reader: R) -> Result<SimulationReport> {
        let space = self.config.validate()?;
        let input = parse_identifiers(reader, space)?;
        let mut report = self.run(&input.ids)?;
        report.skipped = input.skipped;
        Ok(report)
    }
}
