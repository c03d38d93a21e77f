//! Core library for a Chord-style distributed hash table ring.
//!
//! This crate provides the building blocks of the ring:
//! - Identifier-space arithmetic
//! - Nodes and finger tables
//! - Successor routing and the join protocol
//! - Ring building, sealing and topology snapshots
//! - A simulation harness driving the whole sequence

pub mod config;
pub mod error;
pub mod finger;
pub mod node;
pub mod ring;
pub mod simulation;
pub mod topology;

pub use config::RingConfig;
pub use error::{Error, Result};
pub use finger::{FingerEntry, FingerTable};
pub use node::{Node, NodeHandle, NodeId, NodeState};
pub use ring::{ChordRing, IdSpace, Ring, RingAction, RingBuilder, RingPhase};
pub use simulation::{Simulation, SimulationReport};
pub use topology::{FingerTableSnapshot, RingTopology};
