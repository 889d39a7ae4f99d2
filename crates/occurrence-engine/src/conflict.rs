//! Booking-conflict detection.
//!
//! A sweep over interval endpoints finds the moments where more occurrences
//! run concurrently than the booked resource allows, and reports which
//! candidate occurrences take part. Identity is positional: each occurrence
//! keeps one marker pair, so two meetings with identical times still count as
//! two concurrent bookings.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::expand::Occurrence;

/// How far past the candidate start conflicts are evaluated, in days.
pub const AVAILABILITY_RANGE_DAYS: i64 = 180;

/// Address-book display type marking an equipment resource.
pub const DISPLAY_TYPE_EQUIPMENT: i64 = 8;

/// Capacity metadata for the calendar owner a booking targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resource {
    /// Address-book display type, when known.
    pub display_type: Option<i64>,
    /// Declared overbooking capacity, when known.
    pub capacity: Option<i64>,
}

impl Resource {
    /// Concurrent bookings this resource tolerates. Only equipment resources
    /// declaring a positive capacity may overbook; every other owner takes 1.
    pub fn effective_capacity(&self) -> usize {
        match (self.display_type, self.capacity) {
            (Some(DISPLAY_TYPE_EQUIPMENT), Some(capacity)) if capacity > 0 => capacity as usize,
            _ => 1,
        }
    }
}

/// Evaluation window for a candidate booking: its start plus the fixed
/// availability range.
pub fn conflict_window(candidate_start: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        candidate_start,
        candidate_start + Duration::days(AVAILABILITY_RANGE_DAYS),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    Start,
    End,
}

#[derive(Debug, Clone, Copy)]
struct Marker {
    at: DateTime<Utc>,
    kind: MarkerKind,
    id: usize,
}

/// Report which candidate occurrences would exceed `capacity` concurrent
/// bookings against the calendar's existing occurrences.
///
/// Both slices must already be expanded over the evaluation window (see
/// [`conflict_window`]). Returns the implicated candidate occurrences in
/// start order, each at most once. Empty inputs yield an empty result.
pub fn find_conflicts(
    candidate: &[Occurrence],
    calendar: &[Occurrence],
    capacity: usize,
) -> Vec<Occurrence> {
    // Candidate occurrences take ids [0, candidate.len()); calendar follows.
    let mut markers = Vec::with_capacity(2 * (candidate.len() + calendar.len()));
    for (id, occurrence) in candidate.iter().chain(calendar.iter()).enumerate() {
        // An interval whose end precedes its start contributes no markers.
        if occurrence.end < occurrence.start {
            continue;
        }
        markers.push(Marker {
            at: occurrence.start,
            kind: MarkerKind::Start,
            id,
        });
        markers.push(Marker {
            at: occurrence.end,
            kind: MarkerKind::End,
            id,
        });
    }
    // Starts sort before ends at equal timestamps, so a zero-length
    // occurrence adds and removes itself within one timestamp group and a
    // back-to-back booking never counts against the meeting it follows.
    markers.sort_by_key(|marker| (marker.at, marker.kind as u8, marker.id));

    let mut running: HashSet<usize> = HashSet::new();
    let mut flagged: HashSet<usize> = HashSet::new();
    let mut index = 0;
    while index < markers.len() {
        let group_at = markers[index].at;
        while index < markers.len() && markers[index].at == group_at {
            let marker = markers[index];
            match marker.kind {
                MarkerKind::Start => {
                    running.insert(marker.id);
                }
                MarkerKind::End => {
                    running.remove(&marker.id);
                }
            }
            index += 1;
        }
        // Capacity is checked once per timestamp group, after every marker at
        // that instant has been applied.
        if running.len() > capacity {
            flagged.extend(
                running
                    .iter()
                    .copied()
                    .filter(|id| *id < candidate.len()),
            );
        }
    }

    let mut ids: Vec<usize> = flagged.into_iter().collect();
    ids.sort_by_key(|id| (candidate[*id].start, candidate[*id].end, *id));
    ids.into_iter().map(|id| candidate[id].clone()).collect()
}
