//! Exception management: creating and mutating per-instance overrides while
//! keeping the instance lists and record pairing consistent.
//!
//! An overridden instance is represented three ways at once: an [`Exception`]
//! record carrying the new values, an [`ExtendedException`] carrying the wide
//! strings, and the instance's day value in both `modified_instances` (it has
//! an override) and `deleted_instances` (the generated instance is
//! suppressed). The helpers here keep all three in step and hand back the
//! re-encoded blob for persisting.

use chrono::{DateTime, Duration, Utc};

use crate::encoder::encode;
use crate::error::{RecurError, Result};
use crate::rtime;
use crate::types::{
    ChangeHighlight, Exception, ExtendedException, OverrideFlags, RecurrencePattern,
    WRITER_VERSION_CHANGE_HIGHLIGHT,
};

/// Optional per-instance overrides applied by [`create_exception`] and
/// [`modify_exception`].
///
/// `start` and `end` move the instance; the remaining fields map one-to-one
/// onto the flag-gated exception fields. An absent field leaves the
/// corresponding flag unset (create) or the stored value untouched (modify).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExceptionOverrides {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub subject: Option<String>,
    pub location: Option<String>,
    pub meeting_type: Option<u32>,
    pub reminder_delta: Option<u32>,
    pub reminder_set: Option<bool>,
    pub busy_status: Option<u32>,
    pub attachment: Option<bool>,
    pub all_day: Option<bool>,
    pub color: Option<u32>,
}

/// Append a new exception overriding the instance generated at `basedate`.
///
/// The basedate's day value is inserted into both `modified_instances` and
/// `deleted_instances`, keeping each sorted ascending: the generated instance
/// is suppressed and the exception record supplies its replacement. Returns
/// the re-encoded blob for the caller to persist.
///
/// # Errors
///
/// Returns [`RecurError::DuplicateBasedate`] when an exception for that
/// instance already exists; use [`modify_exception`] instead.
pub fn create_exception(
    pattern: &mut RecurrencePattern,
    basedate: DateTime<Utc>,
    overrides: &ExceptionOverrides,
) -> Result<Vec<u8>> {
    let basedate_value = rtime::from_utc(basedate);
    if pattern
        .exceptions
        .iter()
        .any(|e| e.original_start_date == basedate_value)
    {
        return Err(RecurError::DuplicateBasedate {
            basedate: basedate_value,
        });
    }

    let duration = i64::from(pattern.end_time_offset) - i64::from(pattern.start_time_offset);
    let start = overrides.start.unwrap_or(basedate);
    let end = overrides.end.unwrap_or(start + Duration::minutes(duration));

    let mut exception = Exception {
        start_datetime: rtime::from_utc(start),
        end_datetime: rtime::from_utc(end),
        original_start_date: basedate_value,
        ..Exception::default()
    };
    let mut extended = ExtendedException::default();
    if pattern.writer_version >= WRITER_VERSION_CHANGE_HIGHLIGHT {
        extended.change_highlight = Some(ChangeHighlight::default());
    }

    apply_overrides(&mut exception, &mut extended, overrides);
    mirror_dates(&exception, &mut extended);

    pattern.exceptions.push(exception);
    pattern.extended_exceptions.push(extended);

    let day = rtime::day_floor(basedate_value);
    insert_sorted(&mut pattern.modified_instances, day);
    insert_sorted(&mut pattern.deleted_instances, day);

    encode(pattern)
}

/// Update the exception whose `original_start_date` matches `basedate`.
///
/// When the override moves the instance to a different day, the instance's
/// entry in `modified_instances` is rewritten to the new day and the list
/// re-sorted; `deleted_instances` keeps the original basedate so the
/// generated instance stays suppressed. Returns the re-encoded blob.
///
/// # Errors
///
/// Returns [`RecurError::UnknownBasedate`] when no exception matches.
pub fn modify_exception(
    pattern: &mut RecurrencePattern,
    basedate: DateTime<Utc>,
    overrides: &ExceptionOverrides,
) -> Result<Vec<u8>> {
    let basedate_value = rtime::from_utc(basedate);
    let index = pattern
        .exceptions
        .iter()
        .position(|e| e.original_start_date == basedate_value)
        .ok_or(RecurError::UnknownBasedate {
            basedate: basedate_value,
        })?;

    let previous_day = rtime::day_floor(pattern.exceptions[index].start_datetime);

    {
        let exception = &mut pattern.exceptions[index];
        let extended = &mut pattern.extended_exceptions[index];
        if let Some(start) = overrides.start {
            exception.start_datetime = rtime::from_utc(start);
        }
        if let Some(end) = overrides.end {
            exception.end_datetime = rtime::from_utc(end);
        }
        apply_overrides(exception, extended, overrides);
        mirror_dates(exception, extended);
    }

    let new_day = rtime::day_floor(pattern.exceptions[index].start_datetime);
    if new_day != previous_day {
        // A create that moved the instance recorded the basedate's day, so
        // the entry to rewrite may sit there rather than at previous_day.
        let slot = pattern
            .modified_instances
            .iter()
            .position(|entry| *entry == previous_day)
            .or_else(|| {
                let owned = rtime::day_floor(basedate_value);
                pattern
                    .modified_instances
                    .iter()
                    .position(|entry| *entry == owned)
            });
        if let Some(slot) = slot {
            pattern.modified_instances[slot] = new_day;
            pattern.modified_instances.sort_unstable();
        }
    }

    encode(pattern)
}

/// Set the flag-gated fields named by `overrides` on both records.
fn apply_overrides(
    exception: &mut Exception,
    extended: &mut ExtendedException,
    overrides: &ExceptionOverrides,
) {
    if let Some(subject) = &overrides.subject {
        exception.override_flags.set(OverrideFlags::SUBJECT);
        exception.subject = Some(narrow_bytes(subject));
        extended.subject = Some(subject.clone());
    }
    if let Some(location) = &overrides.location {
        exception.override_flags.set(OverrideFlags::LOCATION);
        exception.location = Some(narrow_bytes(location));
        extended.location = Some(location.clone());
    }
    if let Some(meeting_type) = overrides.meeting_type {
        exception.override_flags.set(OverrideFlags::MEETING_TYPE);
        exception.meeting_type = Some(meeting_type);
    }
    if let Some(reminder_delta) = overrides.reminder_delta {
        exception.override_flags.set(OverrideFlags::REMINDER_DELTA);
        exception.reminder_delta = Some(reminder_delta);
    }
    if let Some(reminder_set) = overrides.reminder_set {
        exception.override_flags.set(OverrideFlags::REMINDER_SET);
        exception.reminder_set = Some(u32::from(reminder_set));
    }
    if let Some(busy_status) = overrides.busy_status {
        exception.override_flags.set(OverrideFlags::BUSY_STATUS);
        exception.busy_status = Some(busy_status);
    }
    if let Some(attachment) = overrides.attachment {
        exception.override_flags.set(OverrideFlags::ATTACHMENT);
        exception.attachment = Some(u32::from(attachment));
    }
    if let Some(all_day) = overrides.all_day {
        exception.override_flags.set(OverrideFlags::SUB_TYPE);
        exception.sub_type = Some(u32::from(all_day));
    }
    if let Some(color) = overrides.color {
        exception.override_flags.set(OverrideFlags::APPT_COLOR);
        exception.appt_color = Some(color);
    }
}

/// Keep the extended record's repeated dates in step with the exception.
/// They exist on the wire only when a wide string is carried.
fn mirror_dates(exception: &Exception, extended: &mut ExtendedException) {
    if exception.override_flags.has_wide_payload() {
        extended.start_datetime = Some(exception.start_datetime);
        extended.end_datetime = Some(exception.end_datetime);
        extended.original_start_date = Some(exception.original_start_date);
    }
}

/// Best-effort legacy narrow encoding: code points below 0x100 pass through,
/// the rest are replaced.
fn narrow_bytes(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Insert keeping ascending order; already-present values are not duplicated.
fn insert_sorted(values: &mut Vec<u32>, value: u32) {
    if values.contains(&value) {
        return;
    }
    let at = values.partition_point(|existing| *existing <= value);
    values.insert(at, value);
}
