//! Property tests over randomly generated rings.

use std::collections::BTreeSet;

use corelib::node::NodeId;
use corelib::ring::{ChordRing, IdSpace, RingBuilder};
use proptest::prelude::*;

/// Unique identifiers in a `bits`-wide space, in random join order.
fn ring_ids() -> impl Strategy<Value = (u32, Vec<u64>)> {
    (3u32..=10).prop_flat_map(|bits| {
        let size = 1u64 << bits;
        let max_nodes = (size as usize / 2).clamp(1, 48);
        (
            Just(bits),
            proptest::collection::btree_set(0..size, 1..=max_nodes)
                .prop_map(|set| set.into_iter().collect::<Vec<_>>())
                .prop_shuffle(),
        )
    })
}

fn build(bits: u32, ids: &[u64]) -> ChordRing {
    RingBuilder::new()
        .with_space(IdSpace::new(bits).unwrap())
        .add_nodes(ids.iter().copied())
        .build_sealed()
        .unwrap()
}

fn expected_owner(sorted: &BTreeSet<u64>, key: u64) -> u64 {
    sorted
        .range(key..)
        .next()
        .or_else(|| sorted.iter().next())
        .copied()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn successor_is_smallest_identifier_at_or_after_key((bits, ids) in ring_ids()) {
        let ring = build(bits, &ids);
        let sorted: BTreeSet<u64> = ids.iter().copied().collect();
        let step = ((1u64 << bits) / 128).max(1);

        for from in ring.handles() {
            for key in (0..1u64 << bits).step_by(step as usize) {
                let owner = ring.find_successor(from, key).unwrap();
                prop_assert_eq!(ring.id_of(owner).unwrap(), NodeId(expected_owner(&sorted, key)));
            }
        }
    }

    #[test]
    fn joins_keep_links_exact_before_refresh((bits, ids) in ring_ids()) {
        let mut ring = RingBuilder::new()
            .with_space(IdSpace::new(bits).unwrap())
            .add_nodes(ids.iter().copied())
            .build()
            .unwrap();
        ring.join_all().unwrap();

        let sorted: Vec<u64> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let n = sorted.len();
        for (i, id) in sorted.iter().enumerate() {
            let handle = ring.handle_of(NodeId(*id)).unwrap();
            let successor = ring.id_of(ring.successor_of(handle).unwrap()).unwrap();
            let predecessor = ring.id_of(ring.predecessor_of(handle).unwrap()).unwrap();
            prop_assert_eq!(successor, NodeId(sorted[(i + 1) % n]));
            prop_assert_eq!(predecessor, NodeId(sorted[(i + n - 1) % n]));
        }
    }

    #[test]
    fn sealed_ring_is_closed((bits, ids) in ring_ids()) {
        let ring = build(bits, &ids);
        let topology = ring.topology().unwrap();
        prop_assert!(topology.is_closed());
        prop_assert_eq!(topology.clockwise.len(), ids.len());
    }

    #[test]
    fn refresh_is_idempotent((bits, ids) in ring_ids()) {
        let mut ring = build(bits, &ids);
        ring.refresh().unwrap();
        let once = ring.finger_tables().unwrap();
        ring.refresh().unwrap();
        prop_assert_eq!(once, ring.finger_tables().unwrap());
    }
}
