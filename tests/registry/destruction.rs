//! Integration tests for the deferred destruction pipeline
//!
//! Tests intent deferral, mid-iteration marking, overlap between
//! component-level and entity-level marks, and the halving scenario.

use driftwood::registry::EntityRegistry;

use crate::fixtures::{Health, Neutral, Transform};

// =============================================================================
// Deferral
// =============================================================================

#[test]
fn nothing_happens_before_processing() {
    let mut registry = EntityRegistry::new();
    let e = registry.create_entity();
    registry.add_or_get_component::<Health>(e).unwrap();

    registry.mark_component_for_removal::<Health>(e).unwrap();
    registry.mark_entity_for_destruction(e);

    assert!(registry.is_live(e));
    assert!(registry.has_component::<Health>(e));
    assert_eq!(registry.count_component::<Health>(), 1);
}

#[test]
fn processing_with_nothing_marked_is_fine() {
    let mut registry = EntityRegistry::new();
    let e = registry.create_entity();
    registry.add_or_get_component::<Health>(e).unwrap();

    registry.process_destruction();
    registry.process_destruction();

    assert!(registry.is_live(e));
    assert!(registry.has_component::<Health>(e));
}

#[test]
fn component_mark_survives_only_one_pass() {
    let mut registry = EntityRegistry::new();
    let e = registry.create_entity();
    registry.add_or_get_component::<Health>(e).unwrap();

    registry.mark_component_for_removal::<Health>(e).unwrap();
    registry.process_destruction();
    assert!(!registry.has_component::<Health>(e));

    // A new component of the same type is not haunted by the old mark.
    registry.add_or_get_component::<Health>(e).unwrap().current = 1;
    registry.process_destruction();
    assert!(registry.has_component::<Health>(e));
}

// =============================================================================
// Overlapping marks
// =============================================================================

#[test]
fn component_mark_plus_entity_mark_destroys_once() {
    let mut registry = EntityRegistry::new();
    let e = registry.create_entity();
    registry.add_or_get_component::<Health>(e).unwrap();
    registry.add_or_get_component::<Transform>(e).unwrap();

    // The component is queued both individually and by the entity sweep.
    registry.mark_component_for_removal::<Health>(e).unwrap();
    registry.mark_entity_for_destruction(e);
    registry.process_destruction();

    assert!(!registry.is_live(e));
    assert_eq!(registry.count_component::<Health>(), 0);
    assert_eq!(registry.count_component::<Transform>(), 0);
    assert_eq!(registry.entity_count(), 0);
}

#[test]
fn repeated_entity_marks_collapse() {
    let mut registry = EntityRegistry::new();
    let keep = registry.create_entity();
    registry.add_or_get_component::<Health>(keep).unwrap();
    let doomed = registry.create_entity();
    registry.add_or_get_component::<Health>(doomed).unwrap();

    for _ in 0..5 {
        registry.mark_entity_for_destruction(doomed);
    }
    registry.process_destruction();

    assert!(registry.is_live(keep));
    assert!(!registry.is_live(doomed));
    assert_eq!(registry.count_component::<Health>(), 1);
}

// =============================================================================
// Mid-iteration marking (the halving scenario)
// =============================================================================

#[test]
fn halve_a_population_three_times() {
    let mut registry = EntityRegistry::new();
    for _ in 0..8 {
        let e = registry.create_entity();
        registry.add_or_get_component::<Neutral>(e).unwrap();
    }

    for expected_after in [4usize, 2, 1] {
        let before = registry.count_component::<Neutral>();
        for (index, entity) in registry.entities_with::<Neutral>().enumerate() {
            if index % 2 == 0 {
                registry.mark_entity_for_destruction(entity);
            }
        }
        // Marking mid-walk changed nothing yet.
        assert_eq!(registry.count_component::<Neutral>(), before);

        registry.process_destruction();
        assert_eq!(registry.count_component::<Neutral>(), expected_after);
        assert_eq!(registry.entity_count(), expected_after);
    }
}

#[test]
fn mark_components_of_every_visited_entity() {
    let mut registry = EntityRegistry::new();
    for i in 0..6 {
        let e = registry.create_entity();
        registry.add_or_get_component::<Neutral>(e).unwrap();
        if i % 2 == 0 {
            registry.add_or_get_component::<Health>(e).unwrap();
        }
    }

    for entity in registry.entities_with::<Neutral>() {
        // Absent components report false rather than erroring.
        let marked = registry.mark_component_for_removal::<Health>(entity).unwrap();
        assert_eq!(marked, registry.has_component::<Health>(entity));
    }
    registry.process_destruction();

    assert_eq!(registry.count_component::<Health>(), 0);
    assert_eq!(registry.count_component::<Neutral>(), 6);
    assert_eq!(registry.entity_count(), 6);
}
