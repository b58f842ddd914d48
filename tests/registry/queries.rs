//! Integration tests for entity queries
//!
//! Tests single-type iteration, multi-type intersections, the tag
//! counting scenario, and archetype interning.

use driftwood::registry::EntityRegistry;

use crate::fixtures::{Enemy, Friendly, Health, Neutral, Transform};

// =============================================================================
// Single-type queries
// =============================================================================

#[test]
fn iterates_exactly_the_holders() {
    let mut registry = EntityRegistry::new();
    let mut holders = Vec::new();
    for i in 0..10 {
        let e = registry.create_entity();
        if i % 3 == 0 {
            registry.add_or_get_component::<Health>(e).unwrap();
            holders.push(e);
        }
    }

    let mut seen: Vec<_> = registry.entities_with::<Health>().collect();
    seen.sort_unstable();
    holders.sort_unstable();
    assert_eq!(seen, holders);
}

#[test]
fn unregistered_type_yields_nothing() {
    let mut registry = EntityRegistry::new();
    registry.create_entity();
    assert_eq!(registry.entities_with::<Health>().count(), 0);
}

// =============================================================================
// Intersections
// =============================================================================

#[test]
fn two_enemy_camps() {
    let mut registry = EntityRegistry::new();
    let enemy = registry.create_entity();
    registry.add_or_get_component::<Enemy>(enemy).unwrap();
    registry.add_or_get_component::<Transform>(enemy).unwrap();
    let friendly = registry.create_entity();
    registry.add_or_get_component::<Friendly>(friendly).unwrap();
    registry.add_or_get_component::<Transform>(friendly).unwrap();

    assert_eq!(registry.count_component::<Transform>(), 2);
    assert_eq!(registry.count_component::<Enemy>(), 1);
    assert_eq!(registry.count_component::<Friendly>(), 1);
    assert_eq!(
        registry.entities_with_2::<Transform, Friendly>().count(),
        1
    );
    assert_eq!(registry.count_component::<Neutral>(), 0);
}

#[test]
fn intersection_order_does_not_matter() {
    let mut registry = EntityRegistry::new();
    for i in 0..20 {
        let e = registry.create_entity();
        registry.add_or_get_component::<Transform>(e).unwrap();
        if i < 4 {
            registry.add_or_get_component::<Enemy>(e).unwrap();
        }
    }

    // Both orders walk the same intersection; the rare type bounds the
    // scan either way.
    assert_eq!(registry.entities_with_2::<Transform, Enemy>().count(), 4);
    assert_eq!(registry.entities_with_2::<Enemy, Transform>().count(), 4);
}

#[test]
fn wider_intersections() {
    let mut registry = EntityRegistry::new();

    let all = registry.create_entity();
    registry.add_or_get_component::<Transform>(all).unwrap();
    registry.add_or_get_component::<Health>(all).unwrap();
    registry.add_or_get_component::<Enemy>(all).unwrap();
    registry.add_or_get_component::<Friendly>(all).unwrap();
    registry.add_or_get_component::<Neutral>(all).unwrap();

    let most = registry.create_entity();
    registry.add_or_get_component::<Transform>(most).unwrap();
    registry.add_or_get_component::<Health>(most).unwrap();
    registry.add_or_get_component::<Enemy>(most).unwrap();

    assert_eq!(
        registry.entities_with_3::<Transform, Health, Enemy>().count(),
        2
    );
    assert_eq!(
        registry
            .entities_with_4::<Transform, Health, Enemy, Friendly>()
            .count(),
        1
    );
    let full: Vec<_> = registry
        .entities_with_5::<Transform, Health, Enemy, Friendly, Neutral>()
        .collect();
    assert_eq!(full, vec![all]);
}

#[test]
fn intersection_with_an_unregistered_type_is_empty() {
    let mut registry = EntityRegistry::new();
    let e = registry.create_entity();
    registry.add_or_get_component::<Transform>(e).unwrap();

    assert_eq!(registry.entities_with_2::<Transform, Health>().count(), 0);
}

#[test]
fn queries_reflect_processed_removals() {
    let mut registry = EntityRegistry::new();
    let e = registry.create_entity();
    registry.add_or_get_component::<Transform>(e).unwrap();
    registry.add_or_get_component::<Enemy>(e).unwrap();

    registry.mark_component_for_removal::<Enemy>(e).unwrap();
    registry.process_destruction();

    assert_eq!(registry.entities_with_2::<Transform, Enemy>().count(), 0);
    assert_eq!(registry.entities_with::<Transform>().count(), 1);
}
