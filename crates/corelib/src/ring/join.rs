//! Join protocol.
//!
//! A joining node first builds its own finger table by asking an existing
//! member for successors, then offers itself to every node that may now hold
//! it as a finger. Effects on other nodes are not written directly: they are
//! queued as [`RingAction`]s and delivered one at a time to the addressed
//! node's own update routine, which may answer with a follow-up action for
//! its predecessor.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::node::{NodeHandle, NodeState};
use crate::ring::space::between;
use crate::ring::ChordRing;

/// A cross-node effect produced while a node joins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingAction {
    /// Make `predecessor` the predecessor of `node`.
    SetPredecessor {
        node: NodeHandle,
        predecessor: NodeHandle,
    },
    /// Offer `candidate` as the `index`-th finger target of `node`.
    UpdateFinger {
        node: NodeHandle,
        index: usize,
        candidate: NodeHandle,
    },
}

impl ChordRing {
    /// Joins `node` to the ring.
    ///
    /// With `via == None` the node bootstraps a singleton ring: it is its own
    /// successor and predecessor and every finger points at itself. Otherwise
    /// `via` must already be a member; the node splices in next to its
    /// successor and existing fingers are updated to include it.
    ///
    /// Fails with `RingSealed` after [`ChordRing::seal`], `AlreadyJoined` if
    /// `node` is a member and `NotJoined` if `via` is not.
    pub fn join(&mut self, node: NodeHandle, via: Option<NodeHandle>) -> Result<()> {
        self.ensure_building()?;
        let joining = self.node(node)?;
        if joining.state() != NodeState::Unjoined {
            return Err(Error::AlreadyJoined(joining.id()));
        }

        match via {
            None => self.bootstrap(node)?,
            Some(existing) => {
                let gateway = self.node(existing)?;
                if gateway.state() == NodeState::Unjoined {
                    return Err(Error::NotJoined(gateway.id()));
                }
                self.init_finger_table(node, existing)?;
                self.update_others(node)?;
            }
        }

        self.demote_stable();
        debug!(id = %self.id_of(node)?, nodes = self.len(), "node joined");
        Ok(())
    }

    fn bootstrap(&mut self, handle: NodeHandle) -> Result<()> {
        let node = self.node_mut(handle)?;
        node.fingers_mut().fill(handle);
        node.set_predecessor(handle);
        node.set_state(NodeState::Joined);
        debug!(id = %node.id(), "bootstrapped singleton ring");
        Ok(())
    }

    /// Resolves `handle`'s successor and predecessor through `existing`,
    /// splices it in, then fills the remaining fingers.
    ///
    /// A finger whose start is already covered by the previous finger's
    /// target reuses that target instead of issuing another lookup.
    fn init_finger_table(&mut self, handle: NodeHandle, existing: NodeHandle) -> Result<()> {
        let node_id = self.id_of(handle)?.value();
        let first_start = self.node(handle)?.fingers().start(0);

        let successor = self.find_successor(existing, first_start)?;
        let predecessor = self.predecessor_of(successor)?;
        {
            let node = self.node_mut(handle)?;
            node.fingers_mut().set(0, successor);
            node.set_predecessor(predecessor);
        }
        self.deliver(RingAction::SetPredecessor {
            node: successor,
            predecessor: handle,
        })?;

        let size = self.space.bits() as usize;
        for i in 0..size - 1 {
            let (next_start, previous) = {
                let fingers = self.node(handle)?.fingers();
                (fingers.start(i + 1), fingers.target(i))
            };
            let previous = previous.ok_or(Error::NotJoined(self.id_of(handle)?))?;

            let target = if between(node_id, next_start, self.id_of(previous)?.value(), true) {
                previous
            } else {
                self.find_successor(existing, next_start)?
            };
            self.node_mut(handle)?.fingers_mut().set(i + 1, target);
        }

        self.node_mut(handle)?.set_state(NodeState::Joined);
        Ok(())
    }

    /// Offers `handle` to every node whose `i`-th finger may now be it.
    ///
    /// For each index the candidate holder is the last node at or before
    /// `id - 2^i`; its update then travels backwards through predecessors.
    fn update_others(&mut self, handle: NodeHandle) -> Result<()> {
        let node_id = self.id_of(handle)?.value();

        for index in 0..self.space.bits() as usize {
            let origin = self.space.finger_origin(node_id, index);
            let mut holder = self.find_predecessor(handle, origin)?;
            // A node sitting exactly on the origin has this node as its start.
            let successor = self.successor_of(holder)?;
            if self.id_of(successor)?.value() == origin {
                holder = successor;
            }

            self.dispatch(RingAction::UpdateFinger {
                node: holder,
                index,
                candidate: handle,
            })?;
        }
        Ok(())
    }

    /// Delivers `action` and every follow-up it produces, in FIFO order.
    ///
    /// Returns the number of actions delivered. A chain never visits more
    /// nodes than the ring holds.
    pub(crate) fn dispatch(&mut self, action: RingAction) -> Result<usize> {
        let mut queue = VecDeque::from([action]);
        let mut delivered = 0;

        while let Some(action) = queue.pop_front() {
            if delivered >= self.len() {
                debug!(?action, delivered, "propagation budget exhausted");
                break;
            }
            delivered += 1;
            if let Some(next) = self.deliver(action)? {
                queue.push_back(next);
            }
        }
        Ok(delivered)
    }

    /// Applies one action on the node it addresses.
    pub(crate) fn deliver(&mut self, action: RingAction) -> Result<Option<RingAction>> {
        trace!(?action, "delivering ring action");
        match action {
            RingAction::SetPredecessor { node, predecessor } => {
                self.node_mut(node)?.set_predecessor(predecessor);
                Ok(None)
            }
            RingAction::UpdateFinger {
                node,
                index,
                candidate,
            } => {
                if node == candidate {
                    return Ok(None);
                }
                let candidate_id = self.id_of(candidate)?;
                let current = match self.node(node)?.fingers().target(index) {
                    Some(target) => Some(self.id_of(target)?),
                    None => None,
                };

                let changed = self
                    .node_mut(node)?
                    .offer_finger(index, candidate, candidate_id, current);
                if !changed {
                    return Ok(None);
                }
                debug!(node = %self.id_of(node)?, index, candidate = %candidate_id, "finger updated");

                // Propagation ends when it wraps back to the joining node.
                let predecessor = self.predecessor_of(node)?;
                if predecessor == candidate {
                    return Ok(None);
                }
                Ok(Some(RingAction::UpdateFinger {
                    node: predecessor,
                    index,
                    candidate,
                }))
            }
        }
    }

    /// Recomputes every finger of `handle` with a fresh successor lookup and
    /// marks it stable.
    pub fn update_fingers(&mut self, handle: NodeHandle) -> Result<()> {
        for index in 0..self.space.bits() as usize {
            let start = self.node(handle)?.fingers().start(index);
            let target = self.find_successor(handle, start)?;
            self.node_mut(handle)?.fingers_mut().set(index, target);
        }
        self.node_mut(handle)?.set_state(NodeState::Stable);
        Ok(())
    }
}
