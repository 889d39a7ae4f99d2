//! Encoder coverage: exact wire bytes for a known pattern, and the shape
//! errors a malformed in-memory pattern must produce instead of bad bytes.

use chrono::{TimeZone, Utc};
use recurstate_core::types::{ChangeHighlight, Exception, ExtendedException, OverrideFlags};
use recurstate_core::{decode, encode, rtime, PatternPayload, RecurError, RecurrencePattern};

struct Blob(Vec<u8>);

impl Blob {
    fn new() -> Self {
        Blob(vec![0x04, 0x30, 0x04, 0x30])
    }

    fn u16(mut self, value: u16) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    fn u32(mut self, value: u32) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    fn build(self) -> Vec<u8> {
        self.0
    }
}

fn day(y: i32, m: u32, d: u32) -> u32 {
    rtime::day_value(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
}

fn weekly_pattern() -> RecurrencePattern {
    RecurrencePattern {
        recur_frequency: 0x200B,
        pattern_type: 0x1,
        first_datetime: 77,
        period: 2,
        pattern: PatternPayload::Weekdays { days: 0x3E },
        end_type: 0x2022,
        occurrence_count: 10,
        first_day_of_week: 1,
        deleted_instances: vec![day(2024, 1, 8), day(2024, 1, 10)],
        modified_instances: vec![day(2024, 1, 10)],
        start_bound: day(2024, 1, 1),
        end_bound: rtime::NO_END_DATE,
        start_time_offset: 540,
        end_time_offset: 600,
        ..RecurrencePattern::default()
    }
}

/// A subject-only exception pair in decode-normal form.
fn subject_exception(base: u32) -> (Exception, ExtendedException) {
    let exception = Exception {
        start_datetime: base + 600,
        end_datetime: base + 660,
        original_start_date: base + 540,
        override_flags: OverrideFlags(OverrideFlags::SUBJECT),
        subject: Some(b"Moved".to_vec()),
        ..Exception::default()
    };
    let extended = ExtendedException {
        start_datetime: Some(base + 600),
        end_datetime: Some(base + 660),
        original_start_date: Some(base + 540),
        subject: Some("Moved".to_string()),
        ..ExtendedException::default()
    };
    (exception, extended)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ─────────────────────────────────────────────────────────────
// Wire bytes
// ─────────────────────────────────────────────────────────────

#[test]
fn weekly_pattern_encodes_byte_exact() {
    let expected = Blob::new()
        .u16(0x200B)
        .u16(0x1)
        .u16(0)
        .u32(77)
        .u32(2)
        .u32(0)
        .u32(0x3E)
        .u32(0x2022)
        .u32(10)
        .u32(1)
        .u32(2)
        .u32(day(2024, 1, 8))
        .u32(day(2024, 1, 10))
        .u32(1)
        .u32(day(2024, 1, 10))
        .u32(day(2024, 1, 1))
        .u32(rtime::NO_END_DATE)
        .u32(0x3006)
        .u32(0x3008)
        .u32(540)
        .u32(600)
        .u16(0)
        .u32(0)
        .u32(0)
        .build();

    assert_eq!(encode(&weekly_pattern()).unwrap(), expected);
}

#[test]
fn narrow_string_carries_both_length_prefixes() {
    let base = day(2024, 1, 15);
    let mut pattern = weekly_pattern();
    let (exception, extended) = subject_exception(base);
    pattern.exceptions.push(exception);
    pattern.extended_exceptions.push(extended);

    let blob = encode(&pattern).unwrap();
    // Legacy prefix 6 (= len + 1), byte count 5, then the raw bytes.
    let mut needle = vec![0x06, 0x00, 0x05, 0x00];
    needle.extend_from_slice(b"Moved");
    assert!(
        contains(&blob, &needle),
        "narrow subject prefix bytes not found in encoded blob"
    );
}

#[test]
fn extended_dates_mirror_the_owning_exception_when_unset() {
    let base = day(2024, 1, 15);
    let mut pattern = weekly_pattern();
    let (exception, mut extended) = subject_exception(base);
    extended.start_datetime = None;
    extended.end_datetime = None;
    extended.original_start_date = None;
    pattern.exceptions.push(exception);
    pattern.extended_exceptions.push(extended);

    let decoded = decode(&encode(&pattern).unwrap()).unwrap();
    let roundtripped = &decoded.extended_exceptions[0];
    assert_eq!(roundtripped.start_datetime, Some(base + 600));
    assert_eq!(roundtripped.end_datetime, Some(base + 660));
    assert_eq!(roundtripped.original_start_date, Some(base + 540));
}

#[test]
fn stored_versions_and_counts_are_written_verbatim() {
    let mut pattern = weekly_pattern();
    pattern.reader_version = 0x3042;
    pattern.occurrence_count = 77;
    pattern.end_type = 0x2023;

    let decoded = decode(&encode(&pattern).unwrap()).unwrap();
    assert_eq!(decoded.reader_version, 0x3042);
    assert_eq!(decoded.occurrence_count, 77);
}

// ─────────────────────────────────────────────────────────────
// Shape errors
// ─────────────────────────────────────────────────────────────

#[test]
fn weekly_type_with_missing_payload_is_rejected() {
    let mut pattern = weekly_pattern();
    pattern.pattern = PatternPayload::None;
    assert_eq!(
        encode(&pattern).unwrap_err(),
        RecurError::PayloadShape {
            pattern_type: 0x1,
            payload: "none",
        }
    );
}

#[test]
fn daily_type_with_spurious_payload_is_rejected() {
    let mut pattern = weekly_pattern();
    pattern.pattern_type = 0x0;
    assert_eq!(
        encode(&pattern).unwrap_err(),
        RecurError::PayloadShape {
            pattern_type: 0x0,
            payload: "weekday bitmask",
        }
    );
}

#[test]
fn unknown_type_with_payload_is_rejected() {
    let mut pattern = weekly_pattern();
    pattern.pattern_type = 0x7;
    pattern.pattern = PatternPayload::DayOfMonth { day: 3 };
    assert_eq!(
        encode(&pattern).unwrap_err(),
        RecurError::PayloadShape {
            pattern_type: 0x7,
            payload: "day of month",
        }
    );
}

#[test]
fn mismatched_exception_lists_are_rejected() {
    let base = day(2024, 1, 15);
    let mut pattern = weekly_pattern();
    let (exception, _) = subject_exception(base);
    pattern.exceptions.push(exception);
    assert_eq!(
        encode(&pattern).unwrap_err(),
        RecurError::ExceptionMismatch {
            exceptions: 1,
            extended: 0,
        }
    );
}

#[test]
fn set_flag_without_a_value_is_rejected() {
    let base = day(2024, 1, 15);
    let mut pattern = weekly_pattern();
    pattern.exceptions.push(Exception {
        start_datetime: base + 540,
        end_datetime: base + 600,
        original_start_date: base + 540,
        override_flags: OverrideFlags(OverrideFlags::BUSY_STATUS),
        ..Exception::default()
    });
    pattern.extended_exceptions.push(ExtendedException::default());
    assert_eq!(
        encode(&pattern).unwrap_err(),
        RecurError::MissingOverrideField {
            flag: OverrideFlags::BUSY_STATUS,
            field: "exception busy status",
        }
    );
}

#[test]
fn wide_subject_must_accompany_the_subject_flag() {
    let base = day(2024, 1, 15);
    let mut pattern = weekly_pattern();
    let (exception, mut extended) = subject_exception(base);
    extended.subject = None;
    pattern.exceptions.push(exception);
    pattern.extended_exceptions.push(extended);
    assert_eq!(
        encode(&pattern).unwrap_err(),
        RecurError::MissingOverrideField {
            flag: OverrideFlags::SUBJECT,
            field: "extended exception subject",
        }
    );
}

#[test]
fn change_highlight_requires_the_gating_writer_version() {
    let base = day(2024, 1, 15);
    let mut pattern = weekly_pattern();
    let (exception, mut extended) = subject_exception(base);
    extended.change_highlight = Some(ChangeHighlight::default());
    pattern.exceptions.push(exception);
    pattern.extended_exceptions.push(extended);
    assert_eq!(
        encode(&pattern).unwrap_err(),
        RecurError::ChangeHighlightVersion {
            writer_version: 0x3008,
        }
    );
}

#[test]
fn oversized_narrow_string_is_rejected() {
    let base = day(2024, 1, 15);
    let mut pattern = weekly_pattern();
    let (mut exception, extended) = subject_exception(base);
    exception.subject = Some(vec![b'x'; 65_535]);
    pattern.exceptions.push(exception);
    pattern.extended_exceptions.push(extended);
    assert_eq!(
        encode(&pattern).unwrap_err(),
        RecurError::StringTooLong {
            field: "exception subject",
            len: 65_535,
            max: 65_534,
        }
    );
}
