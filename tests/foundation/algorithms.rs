//! Integration tests for slice algorithms
//!
//! Tests the distinct-prefix partition on sorted input.

use driftwood::foundation::distinct_prefix;

#[test]
fn empty_and_singleton_slices() {
    let mut empty: [u32; 0] = [];
    assert_eq!(distinct_prefix(&mut empty), 0);

    let mut one = [7u32];
    assert_eq!(distinct_prefix(&mut one), 1);
}

#[test]
fn already_distinct_input_is_untouched() {
    let mut values = [1, 2, 3, 4, 5];
    assert_eq!(distinct_prefix(&mut values), 5);
    assert_eq!(values, [1, 2, 3, 4, 5]);
}

#[test]
fn duplicate_runs_collapse() {
    let mut values = [1, 1, 2, 2, 2, 3, 5, 5];
    let boundary = distinct_prefix(&mut values);
    assert_eq!(boundary, 4);
    assert_eq!(&values[..boundary], [1, 2, 3, 5]);
}

#[test]
fn all_equal_keeps_one() {
    let mut values = [9u32; 16];
    assert_eq!(distinct_prefix(&mut values), 1);
    assert_eq!(values[0], 9);
}

#[test]
fn prefix_order_is_preserved() {
    // The prefix keeps the first occurrence of each value in order, the
    // way a sorted-then-truncated dedup pass relies on.
    let mut values = [0, 0, 1, 3, 3, 3, 4, 7, 7, 9];
    let boundary = distinct_prefix(&mut values);
    assert_eq!(&values[..boundary], [0, 1, 3, 4, 7, 9]);
}
