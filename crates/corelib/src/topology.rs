//! Ring topology views.
//!
//! Read-only snapshots of a ring: finger tables resolved to identifiers and
//! the clockwise order obtained by walking successor links.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::node::{NodeHandle, NodeId, NodeState};
use crate::ring::ChordRing;

/// One finger table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerRow {
    pub index: usize,
    pub start: u64,
    /// Identifier of the resolved target, `None` if never resolved.
    pub owner: Option<NodeId>,
}

/// A node's finger table as identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerTableSnapshot {
    pub node: NodeId,
    pub state: NodeState,
    pub entries: Vec<FingerRow>,
}

/// Clockwise view of the ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingTopology {
    /// Identifiers visited following successor links from the smallest node.
    pub clockwise: Vec<NodeId>,
    /// True if successor links form one cycle through all `n` nodes.
    pub successor_closed: bool,
    /// True if predecessor links form one cycle through all `n` nodes.
    pub predecessor_closed: bool,
}

impl RingTopology {
    /// True if both link directions form a single cycle over all nodes.
    pub fn is_closed(&self) -> bool {
        self.successor_closed && self.predecessor_closed
    }
}

impl ChordRing {
    /// Snapshot of `handle`'s finger table.
    pub fn finger_table(&self, handle: NodeHandle) -> Result<FingerTableSnapshot> {
        let node = self.node(handle)?;
        let entries = node
            .fingers()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                Ok(FingerRow {
                    index,
                    start: entry.start,
                    owner: entry.target.map(|t| self.id_of(t)).transpose()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FingerTableSnapshot {
            node: node.id(),
            state: node.state(),
            entries,
        })
    }

    /// Snapshots of every finger table, in construction order.
    pub fn finger_tables(&self) -> Result<Vec<FingerTableSnapshot>> {
        self.handles().map(|h| self.finger_table(h)).collect()
    }

    /// Walks the ring's links.
    ///
    /// Fails with `NotJoined` if a visited node lacks a successor or predecessor.
    pub fn topology(&self) -> Result<RingTopology> {
        let n = self.len();
        let first = self
            .nodes()
            .enumerate()
            .min_by_key(|(_, node)| node.id())
            .map(|(index, _)| NodeHandle(index));
        let Some(first) = first else {
            return Ok(RingTopology {
                clockwise: Vec::new(),
                successor_closed: true,
                predecessor_closed: true,
            });
        };

        let (forward, successor_closed) = self.walk(first, n, Self::successor_of)?;
        let (_, predecessor_closed) = self.walk(first, n, Self::predecessor_of)?;
        let clockwise = forward
            .into_iter()
            .map(|h| self.id_of(h))
            .collect::<Result<Vec<_>>>()?;

        Ok(RingTopology {
            clockwise,
            successor_closed,
            predecessor_closed,
        })
    }

    /// Takes `n` steps from `first`. The walk is closed when it visits `n`
    /// distinct nodes and ends back at `first`.
    fn walk(
        &self,
        first: NodeHandle,
        n: usize,
        step: fn(&Self, NodeHandle) -> Result<NodeHandle>,
    ) -> Result<(Vec<NodeHandle>, bool)> {
        let mut visited = Vec::with_capacity(n);
        let mut seen = HashSet::with_capacity(n);
        let mut current = first;
        for _ in 0..n {
            visited.push(current);
            seen.insert(current);
            current = step(self, current)?;
        }
        let closed = current == first && seen.len() == n;
        Ok((visited, closed))
    }
}
