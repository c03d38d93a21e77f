//! The ring arena and its phase state machine.
//!
//! [`ChordRing`] owns every [`Node`] and addresses them by [`NodeHandle`].
//! Its lifecycle is explicit:
//!
//! ```text
//!  Building ──seal()──▶ Sealed
//!  (insert, join,        (lookup, refresh,
//!   stale queries)        snapshots)
//! ```
//!
//! Joins are only accepted while building; trusted lookups are only answered
//! once sealed. Sealing refreshes every finger table, so a sealed ring always
//! routes correctly.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::node::{Node, NodeHandle, NodeId, NodeState};
use crate::ring::IdSpace;

/// Ring lifecycle phase.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingPhase {
    /// Nodes may be inserted and joined; queries may see stale fingers.
    Building,
    /// Membership is frozen and every finger table has been refreshed.
    Sealed,
}

/// Arena of ring members plus the phase they are in.
#[derive(Debug, Clone)]
pub struct ChordRing {
    pub(crate) space: IdSpace,
    nodes: Vec<Node>,
    by_id: HashMap<NodeId, NodeHandle>,
    phase: RingPhase,
}

impl ChordRing {
    /// Creates an empty ring over `space`.
    pub fn new(space: IdSpace) -> Self {
        Self {
            space,
            nodes: Vec::new(),
            by_id: HashMap::new(),
            phase: RingPhase::Building,
        }
    }

    #[inline]
    pub fn space(&self) -> IdSpace {
        self.space
    }

    #[inline]
    pub fn phase(&self) -> RingPhase {
        self.phase
    }

    /// Number of constructed nodes, joined or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Handles in construction order.
    pub fn handles(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        (0..self.nodes.len()).map(NodeHandle)
    }

    /// Nodes in construction order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    /// Handle of the node with identifier `id`.
    pub fn handle_of(&self, id: NodeId) -> Option<NodeHandle> {
        self.by_id.get(&id).copied()
    }

    /// Node behind `handle`.
    pub fn node(&self, handle: NodeHandle) -> Result<&Node> {
        self.nodes.get(handle.0).ok_or(Error::UnknownNode(handle))
    }

    pub(crate) fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut Node> {
        self.nodes.get_mut(handle.0).ok_or(Error::UnknownNode(handle))
    }

    /// Identifier of the node behind `handle`.
    #[inline]
    pub fn id_of(&self, handle: NodeHandle) -> Result<NodeId> {
        self.node(handle).map(Node::id)
    }

    /// Successor of `handle`, or `NotJoined` if it was never set.
    pub fn successor_of(&self, handle: NodeHandle) -> Result<NodeHandle> {
        let node = self.node(handle)?;
        node.successor().ok_or(Error::NotJoined(node.id()))
    }

    /// Predecessor of `handle`, or `NotJoined` if it was never set.
    pub fn predecessor_of(&self, handle: NodeHandle) -> Result<NodeHandle> {
        let node = self.node(handle)?;
        node.predecessor().ok_or(Error::NotJoined(node.id()))
    }

    /// The node every trusted lookup starts from: the first one constructed.
    pub fn entry(&self) -> Result<NodeHandle> {
        if self.nodes.is_empty() {
            Err(Error::EmptyRing)
        } else {
            Ok(NodeHandle(0))
        }
    }

    /// Upper bound on hops for any traversal.
    ///
    /// Fresh fingers need at most `m` hops. Stale fingers are legal between
    /// joins and still make strict progress per hop, so the ring size is
    /// added on top.
    pub fn hop_limit(&self) -> usize {
        self.space.bits() as usize + self.nodes.len()
    }

    /// Constructs an unjoined node for `id`.
    ///
    /// Rejects identifiers outside the space and duplicates of existing
    /// members.
    pub fn insert(&mut self, id: u64) -> Result<NodeHandle> {
        self.ensure_building()?;
        let id = NodeId(self.space.check(id)?);
        if self.by_id.contains_key(&id) {
            warn!(%id, "rejecting duplicate node identifier");
            return Err(Error::DuplicateNode(id));
        }
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(Node::new(self.space, id));
        self.by_id.insert(id, handle);
        debug!(%id, ?handle, "constructed node");
        Ok(handle)
    }

    /// Joins every unjoined node, in construction order.
    ///
    /// If nothing has joined yet the first node bootstraps the ring; every
    /// other node joins through the first joined node.
    pub fn join_all(&mut self) -> Result<()> {
        self.ensure_building()?;
        let mut gateway = self
            .nodes
            .iter()
            .position(|node| node.state() != NodeState::Unjoined)
            .map(NodeHandle);

        let pending: Vec<NodeHandle> = self
            .handles()
            .filter(|&h| self.nodes[h.0].state() == NodeState::Unjoined)
            .collect();

        for handle in pending {
            self.join(handle, gateway)?;
            gateway.get_or_insert(handle);
        }
        Ok(())
    }

    /// Recomputes every finger of every node from scratch.
    ///
    /// Stands in for background stabilization: call it after the last join
    /// and before trusting any lookup.
    pub fn refresh(&mut self) -> Result<()> {
        for handle in (0..self.nodes.len()).map(NodeHandle) {
            self.update_fingers(handle)?;
        }
        info!(nodes = self.nodes.len(), "finger tables refreshed");
        Ok(())
    }

    /// Freezes membership and refreshes every finger table.
    ///
    /// Fails with `EmptyRing` when there are no nodes and `NotJoined` when a
    /// constructed node was never joined.
    pub fn seal(&mut self) -> Result<()> {
        self.ensure_building()?;
        if self.nodes.is_empty() {
            return Err(Error::EmptyRing);
        }
        if let Some(node) = self
            .nodes
            .iter()
            .find(|node| node.state() == NodeState::Unjoined)
        {
            return Err(Error::NotJoined(node.id()));
        }
        self.refresh()?;
        self.phase = RingPhase::Sealed;
        info!(nodes = self.nodes.len(), bits = self.space.bits(), "ring sealed");
        Ok(())
    }

    /// Resolves the node owning `key`, starting from the entry node.
    ///
    /// Only answered on a sealed ring.
    pub fn lookup(&self, key: u64) -> Result<NodeId> {
        if self.phase != RingPhase::Sealed {
            return Err(Error::NotSealed);
        }
        let owner = self.find_successor(self.entry()?, key)?;
        self.id_of(owner)
    }

    pub(crate) fn ensure_building(&self) -> Result<()> {
        match self.phase {
            RingPhase::Building => Ok(()),
            RingPhase::Sealed => Err(Error::RingSealed),
        }
    }

    /// Marks stable nodes as possibly stale after membership changed.
    pub(crate) fn demote_stable(&mut self) {
        for node in &mut self.nodes {
            if node.state() == NodeState::Stable {
                node.set_state(NodeState::Joined);
            }
        }
    }
}

impl Default for ChordRing {
    fn default() -> Self {
        Self::new(IdSpace::default())
    }
}

/// Builder for rings (builder pattern).
///
/// Collects identifiers and validates the whole set before touching a ring,
/// so an empty set, an out-of-range identifier or a duplicate is reported
/// without any partial construction.
///
/// # Example
///
/// ```rust
/// use corelib::ring::RingBuilder;
///
/// let ring = RingBuilder::new()
///     .add_nodes([0, 20, 100, 500])
///     .build_sealed()
///     .unwrap();
/// assert_eq!(ring.lookup(50).unwrap().0, 100);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RingBuilder {
    space: IdSpace,
    ids: Vec<u64>,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom identifier space.
    pub fn with_space(mut self, space: IdSpace) -> Self {
        self.space = space;
        self
    }

    /// Add one node identifier.
    pub fn add_node(mut self, id: u64) -> Self {
        self.ids.push(id);
        self
    }

    /// Add node identifiers in order.
    pub fn add_nodes(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.ids.extend(ids);
        self
    }

    /// Validates the identifier set and constructs every node, unjoined.
    pub fn build(self) -> Result<ChordRing> {
        if self.ids.is_empty() {
            return Err(Error::EmptyRing);
        }
        let mut seen = HashSet::with_capacity(self.ids.len());
        for &id in &self.ids {
            self.space.check(id)?;
            if !seen.insert(id) {
                warn!(id, "rejecting duplicate node identifier");
                return Err(Error::DuplicateNode(NodeId(id)));
            }
        }

        let mut ring = ChordRing::new(self.space);
        for id in self.ids {
            ring.insert(id)?;
        }
        Ok(ring)
    }

    /// Builds, joins every node sequentially and seals.
    pub fn build_sealed(self) -> Result<ChordRing> {
        let mut ring = self.build()?;
        ring.join_all()?;
        ring.seal()?;
        Ok(ring)
    }
}
