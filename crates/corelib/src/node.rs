//! Ring members.
//!
//! Nodes live in an arena owned by [`ChordRing`](crate::ChordRing). Every
//! relationship between nodes (successor, predecessor, finger targets) is a
//! [`NodeHandle`] into that arena rather than a reference, so many nodes can
//! point at the same neighbor without any ownership cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::finger::FingerTable;
use crate::ring::{between, IdSpace};

/// Position of a node on the ring.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable index of a node inside its ring's arena.
///
/// Handles are assigned in construction order and never reused.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeHandle(pub usize);

/// Membership lifecycle of a node.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Constructed, no successor or predecessor yet.
    Unjoined,
    /// Spliced into the ring; fingers may be stale.
    Joined,
    /// Every finger recomputed by an explicit refresh since the last join.
    Stable,
}

/// A participant in the ring.
#[derive(Clone, Debug)]
pub struct Node {
    id: NodeId,
    fingers: FingerTable,
    predecessor: Option<NodeHandle>,
    state: NodeState,
}

impl Node {
    /// Construct an unjoined node: finger starts computed, nothing resolved.
    pub fn new(space: IdSpace, id: NodeId) -> Self {
        Self {
            id,
            fingers: FingerTable::new(space, id.0),
            predecessor: None,
            state: NodeState::Unjoined,
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> NodeState {
        self.state
    }

    #[inline]
    pub fn fingers(&self) -> &FingerTable {
        &self.fingers
    }

    /// Nearest node clockwise.
    ///
    /// This is always the first finger's target, so the two cannot drift
    /// apart.
    #[inline]
    pub fn successor(&self) -> Option<NodeHandle> {
        self.fingers.target(0)
    }

    /// Nearest node counter-clockwise.
    #[inline]
    pub fn predecessor(&self) -> Option<NodeHandle> {
        self.predecessor
    }

    pub(crate) fn fingers_mut(&mut self) -> &mut FingerTable {
        &mut self.fingers
    }

    pub(crate) fn set_predecessor(&mut self, predecessor: NodeHandle) {
        self.predecessor = Some(predecessor);
    }

    pub(crate) fn set_state(&mut self, state: NodeState) {
        self.state = state;
    }

    /// Handles an offer to make `candidate` the `index`-th finger target.
    ///
    /// The entry is replaced when `candidate` lies strictly between this node
    /// and the current target, or when the entry was never resolved. Returns
    /// whether the entry changed.
    pub(crate) fn offer_finger(
        &mut self,
        index: usize,
        candidate: NodeHandle,
        candidate_id: NodeId,
        current_target_id: Option<NodeId>,
    ) -> bool {
        let closer = match current_target_id {
            Some(current) => between(self.id.0, candidate_id.0, current.0, false),
            None => true,
        };
        if closer {
            self.fingers.set(index, candidate);
        }
        closer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let node = Node::new(IdSpace::default(), NodeId(100));
        assert_eq!(node.id(), NodeId(100));
        assert_eq!(node.state(), NodeState::Unjoined);
        assert_eq!(node.successor(), None);
        assert_eq!(node.predecessor(), None);
        assert_eq!(node.fingers().len(), 10);
        assert_eq!(node.fingers().start(0), 101);
    }

    #[test]
    fn test_successor_tracks_first_finger() {
        let mut node = Node::new(IdSpace::default(), NodeId(100));
        node.fingers_mut().set(0, NodeHandle(3));
        assert_eq!(node.successor(), Some(NodeHandle(3)));
    }

    #[test]
    fn test_offer_finger_only_accepts_closer_candidates() {
        let mut node = Node::new(IdSpace::default(), NodeId(0));
        node.fingers_mut().fill(NodeHandle(9));

        // 500 is not between 0 and 100.
        assert!(!node.offer_finger(3, NodeHandle(2), NodeId(500), Some(NodeId(100))));
        assert_eq!(node.fingers().target(3), Some(NodeHandle(9)));

        assert!(node.offer_finger(3, NodeHandle(1), NodeId(20), Some(NodeId(100))));
        assert_eq!(node.fingers().target(3), Some(NodeHandle(1)));

        // An equal target is not closer.
        assert!(!node.offer_finger(3, NodeHandle(1), NodeId(20), Some(NodeId(20))));
    }

    #[test]
    fn test_offer_finger_fills_unresolved_entry() {
        let mut node = Node::new(IdSpace::default(), NodeId(0));
        assert!(node.offer_finger(5, NodeHandle(4), NodeId(700), None));
        assert_eq!(node.fingers().target(5), Some(NodeHandle(4)));
    }

    #[test]
    fn test_display() {
        assert_eq!(NodeId(42).to_string(), "42");
    }
}
