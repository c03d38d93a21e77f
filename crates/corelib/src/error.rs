//! Error types for the core library.

use crate::node::{NodeHandle, NodeId};

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or querying a ring.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Identifier-space size outside the supported range.
    #[error("Invalid identifier space: {0} bits (expected 1..=63)")]
    InvalidBits(u32),

    /// Identifier does not fit the ring.
    #[error("Identifier {id} out of range for a ring of size {size}")]
    IdOutOfRange { id: u64, size: u64 },

    /// A node with this identifier is already part of the ring.
    #[error("Duplicate node identifier: {0}")]
    DuplicateNode(NodeId),

    /// More unique identifiers requested than the ring has slots.
    #[error("Cannot draw {requested} unique identifiers from a ring of size {size}")]
    TooManyNodes { requested: usize, size: u64 },

    /// No identifiers were supplied.
    #[error("Ring has no nodes")]
    EmptyRing,

    /// Handle does not address a node in this ring.
    #[error("Unknown node handle: {0:?}")]
    UnknownNode(NodeHandle),

    /// Successor or predecessor was never set on this node.
    #[error("Node {0} has not joined the ring")]
    NotJoined(NodeId),

    /// Join was invoked on a node that is already a member.
    #[error("Node {0} has already joined the ring")]
    AlreadyJoined(NodeId),

    /// Ring membership is frozen.
    #[error("Ring is sealed; no further joins are accepted")]
    RingSealed,

    /// Trusted queries are only answered once the ring is sealed.
    #[error("Ring is not sealed yet")]
    NotSealed,

    /// Traversal did not converge within its hop budget.
    #[error("Lookup of {target} from node {from} exceeded {limit} hops")]
    HopLimitExceeded { from: NodeId, target: u64, limit: usize },

    /// Input source failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
