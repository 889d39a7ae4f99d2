//! Occurrence generation: turns a decoded [`RecurrencePattern`] into the
//! concrete instances it describes, honoring deletions, overridden instances,
//! and per-instance metadata.
//!
//! ## Key design decisions
//!
//! - The base cadence is rendered as an RFC 5545 rule and expanded through the
//!   `rrule` crate. Deleted-but-not-overridden instance dates become EXDATE
//!   entries so the rule engine drops them before the merge step.
//! - All arithmetic happens in UTC. Clock times come from the pattern's
//!   start/end minute offsets; the blob's timezone descriptor is opaque here
//!   and interpreting it is the caller's concern.
//! - Expansion is always finite: the rule carries the pattern's own end bound
//!   (or the far-future sentinel) and the query is capped at
//!   [`MAX_INSTANCES`], so a hostile blob cannot run the generator unbounded.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use rrule::RRuleSet;
use serde::Serialize;

use recurstate_core::rtime;
use recurstate_core::types::{pattern_type, EndType, Frequency};
use recurstate_core::{PatternPayload, RecurrencePattern};

use crate::error::{EngineError, Result};

/// Hard cap on instances a single expansion may produce (the rule engine's
/// query limit).
pub const MAX_INSTANCES: u16 = u16::MAX;

/// BYDAY codes indexed by the wire bitmask bit (bit 0 = Sunday).
const WEEKDAY_CODES: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

/// Where an occurrence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OccurrenceSource {
    /// Generated straight from the base cadence.
    Series,
    /// Produced by the exception at this index in the pattern.
    Exception(usize),
}

/// Override metadata attached to an exception-backed occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstanceOverrides {
    pub subject: Option<String>,
    pub location: Option<String>,
    pub busy_status: Option<u32>,
    pub reminder_delta: Option<u32>,
    pub reminder_set: Option<bool>,
    pub meeting_type: Option<u32>,
    pub all_day: Option<bool>,
    pub color: Option<u32>,
    pub has_attachment: Option<bool>,
}

/// One concrete instance of a recurring (or single) appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Back-reference to the series or the exception behind this instance.
    pub source: OccurrenceSource,
    /// Field overrides carried by the exception, if any.
    pub overrides: InstanceOverrides,
}

impl Occurrence {
    /// Plain series instance.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Occurrence {
            start,
            end,
            source: OccurrenceSource::Series,
            overrides: InstanceOverrides::default(),
        }
    }

    /// True when the interval intersects the half-open window
    /// `[window_start, window_end)`. An occurrence ending exactly at
    /// `window_start` (or starting exactly at `window_end`) does not count.
    pub fn overlaps(
        &self,
        window_start: Option<DateTime<Utc>>,
        window_end: Option<DateTime<Utc>>,
    ) -> bool {
        let after_start = window_start.map_or(true, |at| self.end > at);
        let before_end = window_end.map_or(true, |at| self.start < at);
        after_start && before_end
    }
}

/// Expand `pattern` into its occurrences, optionally clipped to a window.
///
/// Deleted instances are omitted, overridden instances are replaced by their
/// exception records (including moves across the window boundary), and the
/// result is sorted by start then end.
///
/// # Errors
///
/// [`EngineError::UnsupportedPattern`] for discriminants outside the Gregorian
/// cadences, [`EngineError::Regenerating`] for completion-driven task
/// patterns, and [`EngineError::Rule`] if the rendered rule fails to build.
pub fn expand(
    pattern: &RecurrencePattern,
    window_start: Option<DateTime<Utc>>,
    window_end: Option<DateTime<Utc>>,
) -> Result<Vec<Occurrence>> {
    if pattern.regen != 0 {
        return Err(EngineError::Regenerating {
            regen: pattern.regen,
        });
    }
    let frequency = pattern
        .frequency()
        .ok_or(EngineError::UnsupportedPattern {
            pattern_type: pattern.pattern_type,
            frequency: pattern.recur_frequency,
        })?;

    let rule_text = render_rule(pattern, frequency)?;
    let rule_set: RRuleSet = rule_text
        .parse()
        .map_err(|e| EngineError::Rule(format!("{}: {}", rule_text.replace('\n', " "), e)))?;

    let starts: Vec<DateTime<Utc>> = rule_set
        .all(MAX_INSTANCES)
        .dates
        .into_iter()
        .map(|at| at.with_timezone(&Utc))
        .collect();

    let duration =
        Duration::minutes(i64::from(pattern.end_time_offset) - i64::from(pattern.start_time_offset));
    let modified_days: HashSet<u32> = pattern
        .modified_instances
        .iter()
        .map(|value| rtime::day_floor(*value))
        .collect();

    let mut occurrences: Vec<Occurrence> =
        Vec::with_capacity(starts.len() + pattern.exceptions.len());
    let mut consumed = vec![false; pattern.exceptions.len()];

    for start in starts {
        let day = rtime::day_value(start);
        if let Some(index) = find_exception(pattern, day, &consumed) {
            consumed[index] = true;
            occurrences.push(exception_occurrence(pattern, index));
        } else if modified_days.contains(&day) {
            // Marked overridden but the exception record is gone; the base
            // instance stays suppressed rather than reappearing.
            continue;
        } else {
            occurrences.push(Occurrence::new(start, start + duration));
        }
    }

    // Exceptions that did not line up with any generated instance (moved from
    // a date the rule no longer produces) still yield their occurrence.
    for (index, was_consumed) in consumed.iter().enumerate() {
        if !*was_consumed {
            occurrences.push(exception_occurrence(pattern, index));
        }
    }

    occurrences.sort_by_key(|occurrence| (occurrence.start, occurrence.end));
    occurrences.retain(|occurrence| occurrence.overlaps(window_start, window_end));
    Ok(occurrences)
}

/// Degenerate generation for non-recurring items: the item's own interval,
/// admitted under the same half-open overlap rule.
pub fn single_occurrence(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window_start: Option<DateTime<Utc>>,
    window_end: Option<DateTime<Utc>>,
) -> Option<Occurrence> {
    let occurrence = Occurrence::new(start, end);
    occurrence
        .overlaps(window_start, window_end)
        .then_some(occurrence)
}

/// Render the base cadence as an iCalendar DTSTART/RRULE text block with
/// EXDATE lines for deleted-but-not-overridden instances.
fn render_rule(pattern: &RecurrencePattern, frequency: Frequency) -> Result<String> {
    let dtstart = rtime::at_offset(rtime::day_floor(pattern.start_bound), pattern.start_time_offset);
    let until = rtime::at_offset(rtime::day_floor(pattern.end_bound), pattern.start_time_offset);

    let mut parts: Vec<String> = Vec::new();
    match frequency {
        Frequency::Daily => {
            // Daily periods are stored in minutes.
            let interval = (pattern.period / rtime::MINUTES_PER_DAY).max(1);
            parts.push("FREQ=DAILY".to_string());
            parts.push(format!("INTERVAL={}", interval));
        }
        Frequency::Weekly => {
            let PatternPayload::Weekdays { days } = pattern.pattern else {
                return Err(unsupported(pattern));
            };
            parts.push("FREQ=WEEKLY".to_string());
            parts.push(format!("INTERVAL={}", pattern.period.max(1)));
            parts.push(format!("BYDAY={}", byday_list(days)?));
            parts.push(format!(
                "WKST={}",
                WEEKDAY_CODES[(pattern.first_day_of_week % 7) as usize]
            ));
        }
        // The yearly cadences are stored as monthly with a 12-month period,
        // so one rendering covers both.
        Frequency::Monthly | Frequency::Yearly => {
            let PatternPayload::DayOfMonth { day } = pattern.pattern else {
                return Err(unsupported(pattern));
            };
            parts.push("FREQ=MONTHLY".to_string());
            parts.push(format!("INTERVAL={}", pattern.period.max(1)));
            if pattern.pattern_type == pattern_type::MONTH_END || day >= 31 {
                // Day 31 means the last day of every month, short months included.
                parts.push("BYMONTHDAY=-1".to_string());
            } else {
                parts.push(format!("BYMONTHDAY={}", day.max(1)));
            }
        }
        Frequency::MonthlyNth | Frequency::YearlyNth => {
            let PatternPayload::NthWeekday { days, week } = pattern.pattern else {
                return Err(unsupported(pattern));
            };
            parts.push("FREQ=MONTHLY".to_string());
            parts.push(format!("INTERVAL={}", pattern.period.max(1)));
            parts.push(format!("BYDAY={}", byday_list(days)?));
            // Week 5 means the last matching weekday of the month.
            let setpos: i32 = if week >= 5 { -1 } else { week.max(1) as i32 };
            parts.push(format!("BYSETPOS={}", setpos));
        }
    }

    match pattern.end() {
        EndType::AfterCount => parts.push(format!("COUNT={}", pattern.occurrence_count.max(1))),
        // End-by-date and never-ending both carry an end bound (the latter the
        // far-future sentinel); UNTIL is inclusive of the final instance start.
        EndType::AfterDate | EndType::NoEnd => {
            parts.push(format!("UNTIL={}Z", ical_stamp(until)));
        }
    }

    let mut rule_text = format!(
        "DTSTART;TZID=UTC:{}\nRRULE:{}",
        ical_stamp(dtstart),
        parts.join(";")
    );

    let exdates = exdate_stamps(pattern);
    if !exdates.is_empty() {
        rule_text.push_str(&format!("\nEXDATE;TZID=UTC:{}", exdates.join(",")));
    }

    Ok(rule_text)
}

fn unsupported(pattern: &RecurrencePattern) -> EngineError {
    EngineError::UnsupportedPattern {
        pattern_type: pattern.pattern_type,
        frequency: pattern.recur_frequency,
    }
}

/// iCalendar basic-format timestamp, no zone designator.
fn ical_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S").to_string()
}

/// BYDAY list from the wire bitmask (bit 0 = Sunday through bit 6 = Saturday).
fn byday_list(days: u32) -> Result<String> {
    let codes: Vec<&str> = WEEKDAY_CODES
        .iter()
        .enumerate()
        .filter(|(bit, _)| days & (1 << bit) != 0)
        .map(|(_, code)| *code)
        .collect();
    if codes.is_empty() {
        return Err(EngineError::Rule(format!(
            "weekday bitmask {:#x} selects no weekdays",
            days
        )));
    }
    Ok(codes.join(","))
}

/// Deleted-but-not-overridden instance starts, as iCalendar stamps.
fn exdate_stamps(pattern: &RecurrencePattern) -> Vec<String> {
    let modified: HashSet<u32> = pattern
        .modified_instances
        .iter()
        .map(|value| rtime::day_floor(*value))
        .collect();
    pattern
        .deleted_instances
        .iter()
        .map(|value| rtime::day_floor(*value))
        .filter(|day| !modified.contains(day))
        .map(|day| ical_stamp(rtime::at_offset(day, pattern.start_time_offset)))
        .collect()
}

/// First unconsumed exception whose basedate falls on `day`.
fn find_exception(pattern: &RecurrencePattern, day: u32, consumed: &[bool]) -> Option<usize> {
    pattern
        .exceptions
        .iter()
        .enumerate()
        .find_map(|(index, exception)| {
            (!consumed[index] && rtime::day_floor(exception.original_start_date) == day)
                .then_some(index)
        })
}

/// Materialize the occurrence an exception record describes. Wide strings are
/// authoritative; the narrow bytes only fill in when the extended record
/// lacks the field.
fn exception_occurrence(pattern: &RecurrencePattern, index: usize) -> Occurrence {
    let exception = &pattern.exceptions[index];
    let extended = pattern.extended_exceptions.get(index);

    let mut overrides = InstanceOverrides {
        busy_status: exception.busy_status,
        reminder_delta: exception.reminder_delta,
        reminder_set: exception.reminder_set.map(|value| value != 0),
        meeting_type: exception.meeting_type,
        all_day: exception.sub_type.map(|value| value != 0),
        color: exception.appt_color,
        has_attachment: exception.attachment.map(|value| value != 0),
        ..InstanceOverrides::default()
    };
    overrides.subject = extended
        .and_then(|ext| ext.subject.clone())
        .or_else(|| exception.subject.as_deref().map(narrow_lossy));
    overrides.location = extended
        .and_then(|ext| ext.location.clone())
        .or_else(|| exception.location.as_deref().map(narrow_lossy));

    Occurrence {
        start: rtime::to_utc(exception.start_datetime),
        end: rtime::to_utc(exception.end_datetime),
        source: OccurrenceSource::Exception(index),
        overrides,
    }
}

/// Legacy narrow bytes decoded as single-byte code points (best effort).
fn narrow_lossy(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| char::from(*byte)).collect()
}
