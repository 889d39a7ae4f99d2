//! Property-based tests for the conflict sweep.
//!
//! These check invariants that must hold for any mix of intervals, not just
//! the hand-picked cases in `conflict_tests.rs`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use occurrence_engine::{find_conflicts, Occurrence};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap()
}

/// Random intervals within a ten-day span, any length including zero.
fn arb_occurrences(max: usize) -> impl Strategy<Value = Vec<Occurrence>> {
    prop::collection::vec((0i64..14_400, 0i64..240), 0..max).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(offset, length)| {
                let start = base() + Duration::minutes(offset);
                Occurrence::new(start, start + Duration::minutes(length))
            })
            .collect()
    })
}

/// Like [`arb_occurrences`] but every interval has positive length.
fn arb_busy_occurrences(max: usize) -> impl Strategy<Value = Vec<Occurrence>> {
    prop::collection::vec((0i64..14_400, 1i64..240), 1..max).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(offset, length)| {
                let start = base() + Duration::minutes(offset);
                Occurrence::new(start, start + Duration::minutes(length))
            })
            .collect()
    })
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: A lone booking against an empty calendar never conflicts
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn lone_booking_never_conflicts(
        offset in 0i64..14_400,
        length in 0i64..240,
        capacity in 1usize..5,
    ) {
        let start = base() + Duration::minutes(offset);
        let candidate = vec![Occurrence::new(start, start + Duration::minutes(length))];
        prop_assert!(find_conflicts(&candidate, &[], capacity).is_empty());
    }
}

// ---------------------------------------------------------------------------
// Property 2: Raising capacity never creates new conflicts
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn raising_capacity_never_adds_conflicts(
        candidate in arb_occurrences(6),
        calendar in arb_occurrences(6),
        capacity in 1usize..4,
    ) {
        let at_capacity = find_conflicts(&candidate, &calendar, capacity);
        let relaxed = find_conflicts(&candidate, &calendar, capacity + 1);
        for occurrence in &relaxed {
            prop_assert!(
                at_capacity.contains(occurrence),
                "conflict at capacity {} absent at capacity {}: {:?}",
                capacity + 1,
                capacity,
                occurrence
            );
        }
        prop_assert!(relaxed.len() <= at_capacity.len());
    }
}

// ---------------------------------------------------------------------------
// Property 3: Results are candidate occurrences, in start order
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn conflicts_are_sorted_candidates(
        candidate in arb_occurrences(6),
        calendar in arb_occurrences(6),
        capacity in 1usize..3,
    ) {
        let conflicts = find_conflicts(&candidate, &calendar, capacity);
        for occurrence in &conflicts {
            prop_assert!(candidate.contains(occurrence));
        }
        prop_assert!(conflicts.len() <= candidate.len());
        for window in conflicts.windows(2) {
            prop_assert!(window[0].start <= window[1].start);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: Capacity covering every booking absorbs everything
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn ample_capacity_absorbs_everything(
        candidate in arb_occurrences(6),
        calendar in arb_occurrences(6),
    ) {
        let capacity = candidate.len() + calendar.len();
        prop_assert!(find_conflicts(&candidate, &calendar, capacity.max(1)).is_empty());
    }
}

// ---------------------------------------------------------------------------
// Property 5: A calendar holding the same bookings flags every candidate
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn duplicate_calendar_flags_every_booking(candidate in arb_busy_occurrences(5)) {
        let calendar = candidate.clone();
        let conflicts = find_conflicts(&candidate, &calendar, 1);
        prop_assert_eq!(
            conflicts.len(),
            candidate.len(),
            "every booking overlaps its calendar twin"
        );
    }
}
