//! Integration tests for the sparse-paged maps
//!
//! Tests page allocation, key recycling, and free-list round trips.

use driftwood::foundation::{FreeListSparseMap, SparseMap};

// =============================================================================
// SparseMap
// =============================================================================

#[test]
fn insert_and_get_across_pages() {
    let mut map = SparseMap::new();

    // Keys on three different pages (page size is 512).
    map.insert(3, "low");
    map.insert(700, "mid");
    map.insert(100_000, "high");

    assert_eq!(map.get(3), Some(&"low"));
    assert_eq!(map.get(700), Some(&"mid"));
    assert_eq!(map.get(100_000), Some(&"high"));
    assert_eq!(map.len(), 3);
}

#[test]
fn insert_into_occupied_slot_is_rejected() {
    let mut map = SparseMap::new();
    assert!(map.insert(5, 1).is_some());
    assert!(map.insert(5, 2).is_none());
    assert_eq!(map.get(5), Some(&1));
    assert_eq!(map.len(), 1);
}

#[test]
fn remove_returns_the_value() {
    let mut map = SparseMap::new();
    map.insert(9, 99);

    assert_eq!(map.remove(9), Some(99));
    assert_eq!(map.remove(9), None);
    assert!(!map.contains(9));
    assert!(map.is_empty());
}

#[test]
fn missing_keys_on_unallocated_pages() {
    let map: SparseMap<u32> = SparseMap::new();
    assert_eq!(map.get(0), None);
    assert_eq!(map.get(1_000_000), None);
    assert!(!map.contains(511));
}

#[test]
fn gets_do_not_allocate_pages() {
    // A fresh map probed at a distant key stays empty.
    let mut map: SparseMap<u32> = SparseMap::new();
    assert_eq!(map.get(1 << 20), None);
    map.insert(0, 1);
    assert_eq!(map.len(), 1);
}

// =============================================================================
// FreeListSparseMap
// =============================================================================

#[test]
fn keys_are_dense_from_zero() {
    let mut map = FreeListSparseMap::new();
    let keys: Vec<u32> = (0..10).map(|i| map.insert(i)).collect();
    assert_eq!(keys, (0..10).collect::<Vec<u32>>());
}

#[test]
fn freed_keys_are_recycled() {
    let mut map = FreeListSparseMap::new();
    let a = map.insert("a");
    let b = map.insert("b");
    let c = map.insert("c");

    map.remove(b);
    let d = map.insert("d");
    assert_eq!(d, b);
    assert_eq!(map.get(a), Some(&"a"));
    assert_eq!(map.get(c), Some(&"c"));
    assert_eq!(map.get(d), Some(&"d"));
}

#[test]
fn remove_all_insert_all_round_trip() {
    // Filling, draining, and refilling must reuse the same key range
    // without growing the free list.
    let mut map = FreeListSparseMap::new();
    let first: Vec<u32> = (0..300).map(|i| map.insert(i)).collect();
    for key in &first {
        assert!(map.remove(*key).is_some());
    }
    assert!(map.is_empty());

    let second: Vec<u32> = (0..300).map(|i| map.insert(i)).collect();
    let mut expected = first;
    expected.sort_unstable();
    let mut got = second;
    got.sort_unstable();
    assert_eq!(got, expected);
    assert_eq!(map.len(), 300);
}

#[test]
fn interleaved_churn_roundtrips_against_a_model() {
    let mut map = FreeListSparseMap::new();
    let mut live = std::collections::HashMap::new();

    for round in 0u32..50 {
        let key = map.insert(round);
        live.insert(key, round);
        if round % 3 == 0 {
            let victim = *live.keys().next().unwrap();
            assert_eq!(map.remove(victim), Some(live.remove(&victim).unwrap()));
        }
    }

    for (key, value) in &live {
        assert_eq!(map.get(*key), Some(value));
    }
    assert_eq!(map.len(), live.len());
}

// =============================================================================
// Property tests
// =============================================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Arbitrary insert/remove interleavings agree with a HashMap
        /// model on membership and values.
        #[test]
        fn sparse_map_matches_model(ops in proptest::collection::vec(
            (0u32..2_000, proptest::bool::ANY), 0..200,
        )) {
            let mut map = SparseMap::new();
            let mut model = std::collections::HashMap::new();

            for (key, is_insert) in ops {
                if is_insert {
                    let inserted = map.insert(key, key).is_some();
                    let vacant = !model.contains_key(&key);
                    prop_assert_eq!(inserted, vacant);
                    model.entry(key).or_insert(key);
                } else {
                    prop_assert_eq!(map.remove(key), model.remove(&key));
                }
            }

            prop_assert_eq!(map.len(), model.len());
            for (key, value) in &model {
                prop_assert_eq!(map.get(*key), Some(value));
            }
        }

        /// Every batch of frees is fully recycled before fresh keys are
        /// handed out.
        #[test]
        fn free_list_recycles_before_growing(batch in 1usize..200) {
            let mut map = FreeListSparseMap::new();
            let first: Vec<u32> = (0..batch).map(|i| map.insert(i)).collect();
            let high_water = *first.iter().max().unwrap();
            for key in &first {
                map.remove(*key);
            }

            for i in 0..batch {
                let key = map.insert(i);
                prop_assert!(key <= high_water);
            }
        }
    }
}
