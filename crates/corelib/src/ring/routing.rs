//! Successor and predecessor routing.
//!
//! Lookups are iterative: each hop moves to the closest preceding finger of
//! the target, which strictly shrinks the clockwise distance left to travel.
//! A hop counter bounded by [`ChordRing::hop_limit`] turns a corrupted ring
//! into an explicit error instead of a hang.

use tracing::trace;

use crate::error::{Error, Result};
use crate::node::NodeHandle;
use crate::ring::space::{between, in_half_open};
use crate::ring::ChordRing;

impl ChordRing {
    /// Finds the node owning `id`, starting the walk at `from`.
    ///
    /// # Algorithm
    ///
    /// 1. `id` equal to the current node resolves to the current node.
    /// 2. `id` in `(current, successor]` resolves to the successor.
    /// 3. Otherwise forward to the closest preceding finger. If no finger
    ///    precedes `id`, the successor is returned to avoid stalling.
    ///
    /// Works on stale tables: unresolved fingers are skipped. Fails with
    /// `NotJoined` if a visited node has no successor.
    ///
    /// Every forward lands strictly closer to `id`, so on a ring built
    /// through this crate the default [`ChordRing::hop_limit`] is never
    /// reached. Use [`ChordRing::find_successor_within`] for a tighter bound.
    ///
    /// # Performance
    /// - **Hops**: O(log n) with fresh fingers
    pub fn find_successor(&self, from: NodeHandle, id: u64) -> Result<NodeHandle> {
        self.find_successor_within(from, id, self.hop_limit())
    }

    /// [`ChordRing::find_successor`] allowing at most `max_hops` forwards.
    ///
    /// Passing `space().bits()` enforces the finger-table-size bound that
    /// fresh tables guarantee. Fails with `HopLimitExceeded` when the walk
    /// needs another forward after `max_hops`.
    pub fn find_successor_within(
        &self,
        from: NodeHandle,
        id: u64,
        max_hops: usize,
    ) -> Result<NodeHandle> {
        let id = self.space.check(id)?;
        let mut current = from;
        let mut hops = 0;

        loop {
            let successor = self.successor_of(current)?;
            let current_id = self.id_of(current)?.value();
            if current_id == id {
                return Ok(current);
            }
            let successor_id = self.id_of(successor)?.value();
            if in_half_open(current_id, id, successor_id) {
                return Ok(successor);
            }

            let next = self.closest_preceding_node(current, id)?;
            if next == current {
                return Ok(successor);
            }
            if hops == max_hops {
                return Err(Error::HopLimitExceeded {
                    from: self.id_of(from)?,
                    target: id,
                    limit: max_hops,
                });
            }
            hops += 1;
            trace!(hop = hops, from = current_id, to = ?next, target = id, "forwarding successor lookup");
            current = next;
        }
    }

    /// Scans `from`'s fingers from the longest reach down and returns the
    /// first target strictly between `from` and `id`, or `from` itself.
    pub fn closest_preceding_node(&self, from: NodeHandle, id: u64) -> Result<NodeHandle> {
        let node = self.node(from)?;
        let node_id = node.id().value();
        for entry in node.fingers().iter().rev() {
            let Some(target) = entry.target else {
                continue;
            };
            if between(node_id, self.id_of(target)?.value(), id, false) {
                return Ok(target);
            }
        }
        Ok(from)
    }

    /// Finds the node whose `(node, successor]` arc contains `id`, starting
    /// the walk at `from`.
    pub fn find_predecessor(&self, from: NodeHandle, id: u64) -> Result<NodeHandle> {
        self.find_predecessor_within(from, id, self.hop_limit())
    }

    /// [`ChordRing::find_predecessor`] allowing at most `max_hops` forwards.
    ///
    /// A walk that cannot move closer to `id` keeps counting hops, so it
    /// also ends in `HopLimitExceeded` rather than spinning.
    pub fn find_predecessor_within(
        &self,
        from: NodeHandle,
        id: u64,
        max_hops: usize,
    ) -> Result<NodeHandle> {
        let id = self.space.check(id)?;
        let mut current = from;
        let mut hops = 0;

        loop {
            let successor = self.successor_of(current)?;
            let current_id = self.id_of(current)?;
            if in_half_open(current_id.value(), id, self.id_of(successor)?.value()) {
                return Ok(current);
            }
            // A node's own position closes the arc that starts at its predecessor.
            if current_id.value() == id {
                return self.predecessor_of(current);
            }

            if hops == max_hops {
                return Err(Error::HopLimitExceeded {
                    from: self.id_of(from)?,
                    target: id,
                    limit: max_hops,
                });
            }
            hops += 1;
            let next = self.closest_preceding_node(current, id)?;
            trace!(hop = hops, from = %current_id, to = ?next, target = id, "forwarding predecessor lookup");
            current = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::node::{NodeHandle, NodeId};
    use crate::ring::{ChordRing, RingBuilder};

    fn sealed(ids: &[u64]) -> ChordRing {
        RingBuilder::new()
            .add_nodes(ids.iter().copied())
            .build_sealed()
            .unwrap()
    }

    fn owner(ring: &ChordRing, from: u64, id: u64) -> u64 {
        let from = ring.handle_of(NodeId(from)).unwrap();
        ring.id_of(ring.find_successor(from, id).unwrap()).unwrap().0
    }

    #[test]
    fn test_exact_match_resolves_to_itself_from_any_node() {
        let ring = sealed(&[0, 20, 100, 500]);
        for from in [0, 20, 100, 500] {
            assert_eq!(owner(&ring, from, 20), 20);
            assert_eq!(owner(&ring, from, 500), 500);
        }
    }

    #[test]
    fn test_wraparound_owner() {
        let ring = sealed(&[0, 20, 100, 500]);
        assert_eq!(owner(&ring, 100, 999), 0);
        assert_eq!(owner(&ring, 500, 501), 0);
        assert_eq!(owner(&ring, 20, 21), 100);
    }

    #[test]
    fn test_closest_preceding_node() {
        let ring = sealed(&[0, 20, 100, 500]);
        let zero = ring.handle_of(NodeId(0)).unwrap();
        let cpn = ring.closest_preceding_node(zero, 300).unwrap();
        assert_eq!(ring.id_of(cpn).unwrap(), NodeId(100));

        // Nothing lies strictly between 0 and 10.
        assert_eq!(ring.closest_preceding_node(zero, 10).unwrap(), zero);
    }

    #[test]
    fn test_find_predecessor() {
        let ring = sealed(&[0, 20, 100, 500]);
        let zero = ring.handle_of(NodeId(0)).unwrap();
        let pred = |id| ring.id_of(ring.find_predecessor(zero, id).unwrap()).unwrap().0;
        assert_eq!(pred(50), 20);
        assert_eq!(pred(100), 20);
        assert_eq!(pred(101), 100);
        assert_eq!(pred(1000), 500);
        assert_eq!(pred(0), 500);
    }

    #[test]
    fn test_hop_bound_is_enforced() {
        let ring = sealed(&[0, 20, 100, 500]);
        let zero = ring.handle_of(NodeId(0)).unwrap();

        // 0 -> 500 is one forward; 500 owns the arc up to 0.
        assert!(matches!(
            ring.find_successor_within(zero, 999, 0),
            Err(Error::HopLimitExceeded { from: NodeId(0), target: 999, limit: 0 })
        ));
        let owner = ring.find_successor_within(zero, 999, 1).unwrap();
        assert_eq!(ring.id_of(owner).unwrap(), NodeId(0));

        assert!(matches!(
            ring.find_predecessor_within(zero, 1000, 0),
            Err(Error::HopLimitExceeded { limit: 0, .. })
        ));
        let pred = ring.find_predecessor_within(zero, 1000, 1).unwrap();
        assert_eq!(ring.id_of(pred).unwrap(), NodeId(500));

        // Answered locally, so no budget is needed.
        let owner = ring.find_successor_within(zero, 20, 0).unwrap();
        assert_eq!(ring.id_of(owner).unwrap(), NodeId(20));
    }

    #[test]
    fn test_self_pointing_successor_resolves_instead_of_hanging() {
        let mut ring = sealed(&[0, 20, 100, 500]);
        let twenty = ring.handle_of(NodeId(20)).unwrap();
        ring.node_mut(twenty).unwrap().fingers_mut().fill(twenty);

        // A lone self link claims the whole ring; the walk ends there.
        let pred = ring.find_predecessor(twenty, 50).unwrap();
        assert_eq!(pred, twenty);
        let owner = ring.find_successor(twenty, 50).unwrap();
        assert_eq!(owner, twenty);
    }

    #[test]
    fn test_unjoined_node_is_a_precondition_failure() {
        let ring = RingBuilder::new().add_nodes([5, 9]).build().unwrap();
        let err = ring.find_successor(NodeHandle(0), 7).unwrap_err();
        assert!(matches!(err, Error::NotJoined(NodeId(5))));
        let err = ring.find_predecessor(NodeHandle(1), 7).unwrap_err();
        assert!(matches!(err, Error::NotJoined(NodeId(9))));
    }

    #[test]
    fn test_out_of_range_and_unknown_handles() {
        let ring = sealed(&[0, 20]);
        assert!(matches!(
            ring.find_successor(NodeHandle(0), 1024),
            Err(Error::IdOutOfRange { .. })
        ));
        assert!(matches!(
            ring.find_successor(NodeHandle(7), 3),
            Err(Error::UnknownNode(NodeHandle(7)))
        ));
    }
}
