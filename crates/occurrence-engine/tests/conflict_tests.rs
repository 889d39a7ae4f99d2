//! Conflict sweep: capacity breaches over expanded occurrences, the
//! equipment-capacity rule, and the evaluation window.

use chrono::{DateTime, Duration, TimeZone, Utc};
use occurrence_engine::{
    conflict_window, find_conflicts, Occurrence, Resource, AVAILABILITY_RANGE_DAYS,
    DISPLAY_TYPE_EQUIPMENT,
};

fn at(h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, h, min, 0).unwrap()
}

fn meeting(start: DateTime<Utc>, end: DateTime<Utc>) -> Occurrence {
    Occurrence::new(start, end)
}

// ─────────────────────────────────────────────────────────────
// Basic sweep behavior
// ─────────────────────────────────────────────────────────────

#[test]
fn identical_bookings_conflict_at_capacity_one() {
    let candidate = vec![meeting(at(10, 0), at(11, 0))];
    let calendar = vec![meeting(at(10, 0), at(11, 0))];
    let conflicts = find_conflicts(&candidate, &calendar, 1);
    assert_eq!(conflicts, candidate);
}

#[test]
fn identical_candidate_pair_flags_both() {
    // Two copies of the same interval, both on the candidate side: each is
    // the other's conflict.
    let candidate = vec![
        meeting(at(10, 0), at(11, 0)),
        meeting(at(10, 0), at(11, 0)),
    ];
    let conflicts = find_conflicts(&candidate, &[], 1);
    assert_eq!(conflicts, candidate);
}

#[test]
fn disjoint_bookings_do_not_conflict() {
    let candidate = vec![meeting(at(10, 0), at(11, 0))];
    let calendar = vec![meeting(at(12, 0), at(13, 0))];
    assert!(find_conflicts(&candidate, &calendar, 1).is_empty());
}

#[test]
fn partial_overlap_conflicts() {
    let candidate = vec![meeting(at(10, 0), at(11, 0))];
    let calendar = vec![meeting(at(10, 30), at(11, 30))];
    let conflicts = find_conflicts(&candidate, &calendar, 1);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].start, at(10, 0));
}

#[test]
fn back_to_back_bookings_do_not_conflict() {
    let candidate = vec![meeting(at(10, 0), at(11, 0))];
    let calendar = vec![meeting(at(11, 0), at(12, 0))];
    assert!(find_conflicts(&candidate, &calendar, 1).is_empty());
}

#[test]
fn zero_length_occurrence_never_conflicts() {
    // A zero-length marker pair cancels within its own timestamp group.
    let candidate = vec![meeting(at(10, 0), at(10, 0))];
    let calendar = vec![meeting(at(9, 0), at(11, 0))];
    assert!(find_conflicts(&candidate, &calendar, 1).is_empty());
}

#[test]
fn inverted_interval_contributes_nothing() {
    let candidate = vec![meeting(at(10, 0), at(9, 0))];
    let calendar = vec![meeting(at(8, 0), at(12, 0))];
    assert!(find_conflicts(&candidate, &calendar, 1).is_empty());
}

#[test]
fn empty_inputs_yield_no_conflicts() {
    assert!(find_conflicts(&[], &[], 1).is_empty());
    assert!(find_conflicts(&[meeting(at(10, 0), at(11, 0))], &[], 1).is_empty());
}

// ─────────────────────────────────────────────────────────────
// Capacity
// ─────────────────────────────────────────────────────────────

#[test]
fn capacity_two_absorbs_a_pair() {
    let candidate = vec![meeting(at(10, 0), at(11, 0))];
    let calendar = vec![meeting(at(10, 0), at(11, 0))];
    assert!(find_conflicts(&candidate, &calendar, 2).is_empty());
}

#[test]
fn third_concurrent_booking_breaches_capacity_two() {
    let candidate = vec![meeting(at(10, 0), at(11, 0))];
    let calendar = vec![
        meeting(at(10, 0), at(11, 0)),
        meeting(at(10, 30), at(11, 30)),
    ];
    let conflicts = find_conflicts(&candidate, &calendar, 2);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].start, at(10, 0));
}

#[test]
fn concurrent_candidates_count_against_each_other() {
    let candidate = vec![
        meeting(at(10, 0), at(11, 0)),
        meeting(at(10, 30), at(11, 30)),
    ];
    let conflicts = find_conflicts(&candidate, &[], 1);
    assert_eq!(conflicts.len(), 2);
    assert_eq!(conflicts[0].start, at(10, 0));
    assert_eq!(conflicts[1].start, at(10, 30));
}

#[test]
fn equipment_capacity_three_flags_the_fourth_booking() {
    let projector = Resource {
        display_type: Some(DISPLAY_TYPE_EQUIPMENT),
        capacity: Some(3),
    };
    let candidate = vec![meeting(at(10, 0), at(11, 0))];
    let calendar = vec![
        meeting(at(10, 0), at(11, 0)),
        meeting(at(10, 15), at(10, 45)),
    ];

    // Three simultaneous bookings fit on a triple-capacity projector.
    assert!(
        find_conflicts(&candidate, &calendar, projector.effective_capacity()).is_empty(),
        "three bookings must fit within capacity 3"
    );

    // A fourth pushes the 10:30-10:45 stretch to four holders.
    let mut busier = calendar;
    busier.push(meeting(at(10, 30), at(11, 30)));
    let conflicts = find_conflicts(&candidate, &busier, projector.effective_capacity());
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].start, at(10, 0));
}

// ─────────────────────────────────────────────────────────────
// Reporting
// ─────────────────────────────────────────────────────────────

#[test]
fn only_candidate_occurrences_are_reported() {
    let candidate = vec![meeting(at(10, 0), at(11, 0))];
    let calendar = vec![
        meeting(at(10, 0), at(11, 0)),
        meeting(at(10, 0), at(11, 0)),
    ];
    let conflicts = find_conflicts(&candidate, &calendar, 1);
    assert_eq!(conflicts, candidate);
}

#[test]
fn a_candidate_is_reported_once_despite_repeated_breaches() {
    let candidate = vec![meeting(at(10, 0), at(12, 0))];
    let calendar = vec![
        meeting(at(10, 0), at(10, 30)),
        meeting(at(11, 0), at(11, 30)),
    ];
    let conflicts = find_conflicts(&candidate, &calendar, 1);
    assert_eq!(conflicts.len(), 1);
}

#[test]
fn conflicts_come_back_in_start_order() {
    // Candidate slice deliberately out of order.
    let candidate = vec![
        meeting(at(14, 0), at(15, 0)),
        meeting(at(10, 0), at(11, 0)),
    ];
    let calendar = vec![
        meeting(at(10, 0), at(15, 0)),
    ];
    let conflicts = find_conflicts(&candidate, &calendar, 1);
    assert_eq!(conflicts.len(), 2);
    assert_eq!(conflicts[0].start, at(10, 0));
    assert_eq!(conflicts[1].start, at(14, 0));
}

// ─────────────────────────────────────────────────────────────
// Resource capacity and the evaluation window
// ─────────────────────────────────────────────────────────────

#[test]
fn only_equipment_with_positive_capacity_may_overbook() {
    let equipment = Resource {
        display_type: Some(DISPLAY_TYPE_EQUIPMENT),
        capacity: Some(3),
    };
    assert_eq!(equipment.effective_capacity(), 3);

    let room_without_capacity = Resource {
        display_type: Some(DISPLAY_TYPE_EQUIPMENT),
        capacity: Some(0),
    };
    assert_eq!(room_without_capacity.effective_capacity(), 1);

    let person = Resource {
        display_type: Some(6),
        capacity: Some(3),
    };
    assert_eq!(person.effective_capacity(), 1);

    assert_eq!(Resource::default().effective_capacity(), 1);
}

#[test]
fn conflict_window_spans_the_availability_range() {
    let start = at(9, 0);
    let (from, to) = conflict_window(start);
    assert_eq!(from, start);
    assert_eq!(to, start + Duration::days(AVAILABILITY_RANGE_DAYS));
}
