//! Chord ring implementation.
//!
//! The ring owns every node and provides identifier arithmetic, successor
//! routing and the join protocol that keeps finger tables usable as nodes
//! arrive.

pub mod join;
pub mod ring;
pub mod routing;
pub mod space;

pub use join::RingAction;
pub use ring::{ChordRing, RingBuilder, RingPhase};
pub use space::{between, in_half_open, IdSpace, DEFAULT_BITS, MAX_BITS};

/// Alias for the main ring type (used by lib.rs).
pub type Ring = ChordRing;
