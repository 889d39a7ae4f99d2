//! Decoded representation of the appointment recurrence state blob.
//!
//! ## Key design decisions
//!
//! - Raw wire discriminants (`recur_frequency`, `pattern_type`, `end_type`) are
//!   stored untouched; the typed views ([`RecurrencePattern::frequency`],
//!   [`RecurrencePattern::end`]) are derived on demand. Unknown discriminants
//!   therefore survive a decode/encode round trip byte for byte.
//! - Reserved regions are preserved verbatim with their sizes recomputed on
//!   encode, so blobs written by other producers re-encode without loss.
//! - The nine flag-gated exception fields are described once, in
//!   [`OVERRIDE_FIELDS`], and both codec directions iterate that table in wire
//!   order.

use serde::{Deserialize, Serialize};

use crate::rtime;

/// Fixed four-byte signature every blob starts with.
pub const SIGNATURE: [u8; 4] = [0x04, 0x30, 0x04, 0x30];

/// `recur_frequency` wire value for the daily cadence class.
pub const FREQ_DAILY: u16 = 0x200A;
/// Weekly cadence class.
pub const FREQ_WEEKLY: u16 = 0x200B;
/// Monthly cadence class.
pub const FREQ_MONTHLY: u16 = 0x200C;
/// Yearly cadence class.
pub const FREQ_YEARLY: u16 = 0x200D;

/// `end_type` wire value for patterns bounded by a final instance date.
pub const END_AFTER_DATE: u32 = 0x2021;
/// Bounded by a total instance count.
pub const END_AFTER_COUNT: u32 = 0x2022;
/// Unbounded (the end bound holds the far-future sentinel).
pub const END_NEVER: u32 = 0x2023;

/// Format version expected of readers.
pub const READER_VERSION: u32 = 0x3006;
/// Format version this writer produces.
pub const WRITER_VERSION: u32 = 0x3008;
/// Writer versions at or above this carry change-highlight blocks in every
/// extended exception.
pub const WRITER_VERSION_CHANGE_HIGHLIGHT: u32 = 0x3009;

/// `pattern_type` wire discriminants.
pub mod pattern_type {
    /// Daily; carries no interval payload.
    pub const DAY: u16 = 0x0;
    /// Weekly on a weekday bitmask.
    pub const WEEK: u16 = 0x1;
    /// Monthly (or yearly) on a fixed day of month.
    pub const MONTH: u16 = 0x2;
    /// Monthly (or yearly) on the Nth weekday.
    pub const MONTH_NTH: u16 = 0x3;
    /// Monthly on the last day of the month.
    pub const MONTH_END: u16 = 0x4;
    /// Hijri monthly on a fixed day.
    pub const HJ_MONTH: u16 = 0xA;
    /// Hijri monthly on the Nth weekday.
    pub const HJ_MONTH_NTH: u16 = 0xB;
    /// Hijri monthly on the last day.
    pub const HJ_MONTH_END: u16 = 0xC;
}

/// Cadence category derived from `recur_frequency` and `pattern_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    /// Fixed day of month (day 31 and the month-end types mean the last day).
    Monthly,
    /// Nth weekday of the month (week 5 means the last).
    MonthlyNth,
    /// Fixed day of a fixed month, expressed as a 12-month monthly cadence.
    Yearly,
    /// Nth weekday of a fixed month.
    YearlyNth,
}

/// How the pattern ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndType {
    /// Ends on the last instance date (`end_bound`).
    AfterDate,
    /// Ends after `occurrence_count` instances.
    AfterCount,
    /// Never ends; `end_bound` holds [`rtime::NO_END_DATE`].
    NoEnd,
}

/// Interval payload selected by `pattern_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternPayload {
    /// Daily patterns and unrecognized discriminants carry no payload.
    None,
    /// Weekly: weekday bitmask, bit 0 = Sunday through bit 6 = Saturday.
    Weekdays { days: u32 },
    /// Monthly class: fixed day of month, 1 through 31.
    DayOfMonth { day: u32 },
    /// Nth-weekday class: weekday bitmask plus week number (1 through 4, 5 = last).
    NthWeekday { days: u32, week: u32 },
}

impl PatternPayload {
    /// Short name used in payload-shape error messages.
    pub fn name(&self) -> &'static str {
        match self {
            PatternPayload::None => "none",
            PatternPayload::Weekdays { .. } => "weekday bitmask",
            PatternPayload::DayOfMonth { .. } => "day of month",
            PatternPayload::NthWeekday { .. } => "weekday bitmask + week number",
        }
    }
}

/// Bitmask of which override fields an [`Exception`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverrideFlags(pub u16);

impl OverrideFlags {
    pub const SUBJECT: u16 = 0x0001;
    pub const MEETING_TYPE: u16 = 0x0002;
    pub const REMINDER_DELTA: u16 = 0x0004;
    pub const REMINDER_SET: u16 = 0x0008;
    pub const LOCATION: u16 = 0x0010;
    pub const BUSY_STATUS: u16 = 0x0020;
    pub const ATTACHMENT: u16 = 0x0040;
    pub const SUB_TYPE: u16 = 0x0080;
    pub const APPT_COLOR: u16 = 0x0100;

    pub fn contains(self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    pub fn set(&mut self, bit: u16) {
        self.0 |= bit;
    }

    /// True when the paired extended exception carries the repeated dates,
    /// wide strings, and trailing reserved block.
    pub fn has_wide_payload(self) -> bool {
        self.contains(Self::SUBJECT) || self.contains(Self::LOCATION)
    }
}

/// Wire shape of one flag-gated exception field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// Single 4-byte value.
    Long,
    /// Narrow string with two length prefixes (legacy count, byte count) and
    /// raw legacy-codepage bytes.
    NarrowString,
}

/// One row of the flag-gated exception field table.
#[derive(Debug, Clone, Copy)]
pub struct OverrideField {
    pub flag: u16,
    pub shape: FieldShape,
    pub name: &'static str,
}

/// The nine flag-gated exception fields, in wire order. Decoder and encoder
/// both iterate this table so the two directions cannot drift apart.
pub const OVERRIDE_FIELDS: [OverrideField; 9] = [
    OverrideField {
        flag: OverrideFlags::SUBJECT,
        shape: FieldShape::NarrowString,
        name: "exception subject",
    },
    OverrideField {
        flag: OverrideFlags::MEETING_TYPE,
        shape: FieldShape::Long,
        name: "exception meeting type",
    },
    OverrideField {
        flag: OverrideFlags::REMINDER_DELTA,
        shape: FieldShape::Long,
        name: "exception reminder delta",
    },
    OverrideField {
        flag: OverrideFlags::REMINDER_SET,
        shape: FieldShape::Long,
        name: "exception reminder set",
    },
    OverrideField {
        flag: OverrideFlags::LOCATION,
        shape: FieldShape::NarrowString,
        name: "exception location",
    },
    OverrideField {
        flag: OverrideFlags::BUSY_STATUS,
        shape: FieldShape::Long,
        name: "exception busy status",
    },
    OverrideField {
        flag: OverrideFlags::ATTACHMENT,
        shape: FieldShape::Long,
        name: "exception attachment",
    },
    OverrideField {
        flag: OverrideFlags::SUB_TYPE,
        shape: FieldShape::Long,
        name: "exception subtype",
    },
    OverrideField {
        flag: OverrideFlags::APPT_COLOR,
        shape: FieldShape::Long,
        name: "exception color",
    },
];

/// Per-instance override record.
///
/// Only fields whose flag bit is set are present on the wire; the flags are
/// authoritative when encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Exception {
    /// Replacement instance start (instance-date minutes, time included).
    pub start_datetime: u32,
    /// Replacement instance end.
    pub end_datetime: u32,
    /// Basedate: the generated instance this record overrides.
    pub original_start_date: u32,
    pub override_flags: OverrideFlags,
    /// Legacy narrow-codepage subject bytes.
    pub subject: Option<Vec<u8>>,
    pub meeting_type: Option<u32>,
    pub reminder_delta: Option<u32>,
    pub reminder_set: Option<u32>,
    /// Legacy narrow-codepage location bytes.
    pub location: Option<Vec<u8>>,
    pub busy_status: Option<u32>,
    pub attachment: Option<u32>,
    pub sub_type: Option<u32>,
    pub appt_color: Option<u32>,
}

impl Exception {
    /// Value of a `Long`-shaped field, keyed by its flag bit.
    pub fn long_field(&self, flag: u16) -> Option<u32> {
        match flag {
            OverrideFlags::MEETING_TYPE => self.meeting_type,
            OverrideFlags::REMINDER_DELTA => self.reminder_delta,
            OverrideFlags::REMINDER_SET => self.reminder_set,
            OverrideFlags::BUSY_STATUS => self.busy_status,
            OverrideFlags::ATTACHMENT => self.attachment,
            OverrideFlags::SUB_TYPE => self.sub_type,
            OverrideFlags::APPT_COLOR => self.appt_color,
            _ => None,
        }
    }

    pub(crate) fn set_long_field(&mut self, flag: u16, value: u32) {
        match flag {
            OverrideFlags::MEETING_TYPE => self.meeting_type = Some(value),
            OverrideFlags::REMINDER_DELTA => self.reminder_delta = Some(value),
            OverrideFlags::REMINDER_SET => self.reminder_set = Some(value),
            OverrideFlags::BUSY_STATUS => self.busy_status = Some(value),
            OverrideFlags::ATTACHMENT => self.attachment = Some(value),
            OverrideFlags::SUB_TYPE => self.sub_type = Some(value),
            OverrideFlags::APPT_COLOR => self.appt_color = Some(value),
            _ => {}
        }
    }

    /// Bytes of a narrow-string field, keyed by its flag bit.
    pub fn narrow_field(&self, flag: u16) -> Option<&[u8]> {
        match flag {
            OverrideFlags::SUBJECT => self.subject.as_deref(),
            OverrideFlags::LOCATION => self.location.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn set_narrow_field(&mut self, flag: u16, value: Vec<u8>) {
        match flag {
            OverrideFlags::SUBJECT => self.subject = Some(value),
            OverrideFlags::LOCATION => self.location = Some(value),
            _ => {}
        }
    }
}

/// Change-highlight block carried when the writer version is
/// [`WRITER_VERSION_CHANGE_HIGHLIGHT`] or newer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeHighlight {
    /// Highlight bit field (the first four bytes of the block).
    pub value: u32,
    /// Bytes past the value, preserved verbatim.
    pub reserved: Vec<u8>,
}

/// Wide-string companion to an [`Exception`], index-aligned with it.
///
/// The repeated dates, wide strings, and trailing reserved block exist on the
/// wire only when the owning exception overrides subject or location.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtendedException {
    /// Present exactly when the owning pattern's writer version gates it in.
    pub change_highlight: Option<ChangeHighlight>,
    /// Reserved block between the header and the date fields, preserved verbatim.
    pub reserved_block1: Vec<u8>,
    /// Replacement start, repeated from the owning exception.
    pub start_datetime: Option<u32>,
    pub end_datetime: Option<u32>,
    pub original_start_date: Option<u32>,
    /// Wide subject override.
    pub subject: Option<String>,
    /// Wide location override.
    pub location: Option<String>,
    /// Trailing reserved block, preserved verbatim.
    pub reserved_block2: Vec<u8>,
}

/// Decoded appointment recurrence state.
///
/// Field order mirrors the wire layout; see [`crate::decoder::decode`] for the
/// exact byte structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    /// Raw cadence class (`FREQ_*`).
    pub recur_frequency: u16,
    /// Raw pattern type discriminant ([`pattern_type`]).
    pub pattern_type: u16,
    /// Calendar system identifier, passed through unmodified.
    pub calendar_type: u16,
    /// First-instance phase anchor, carried but not consulted for expansion.
    pub first_datetime: u32,
    /// Interval count: minutes for daily, weeks for weekly, months otherwise
    /// (12 for the yearly cadences).
    pub period: u32,
    /// Non-zero marks a regenerating task pattern whose next instance is
    /// scheduled relative to completion rather than a fixed cadence.
    pub regen: u32,
    /// Interval payload matching `pattern_type`.
    pub pattern: PatternPayload,
    /// Raw end discriminant (`END_*`).
    pub end_type: u32,
    /// Total instances, meaningful when `end_type` is end-after-count.
    pub occurrence_count: u32,
    /// Weekday the week starts on, 0 = Sunday.
    pub first_day_of_week: u32,
    /// Day values of removed instances, ascending.
    pub deleted_instances: Vec<u32>,
    /// Day values of overridden instances, ascending.
    pub modified_instances: Vec<u32>,
    /// First instance day value.
    pub start_bound: u32,
    /// Last instance day value ([`rtime::NO_END_DATE`] when unbounded).
    pub end_bound: u32,
    pub reader_version: u32,
    /// Format version; [`WRITER_VERSION_CHANGE_HIGHLIGHT`] and above add
    /// change-highlight blocks to every extended exception.
    pub writer_version: u32,
    /// Minutes past midnight at which every instance starts.
    pub start_time_offset: u32,
    /// Minutes past midnight at which every instance ends.
    pub end_time_offset: u32,
    /// Per-instance overrides, index-aligned with `extended_exceptions`.
    pub exceptions: Vec<Exception>,
    /// Wide-string companions, one per exception.
    pub extended_exceptions: Vec<ExtendedException>,
    /// Reserved bytes between the exception and extended-exception sections.
    pub reserved_block1: Vec<u8>,
    /// Reserved bytes after the extended-exception section.
    pub reserved_block2: Vec<u8>,
}

impl Default for RecurrencePattern {
    /// A daily, never-ending pattern with no exceptions, starting at the epoch.
    fn default() -> Self {
        RecurrencePattern {
            recur_frequency: FREQ_DAILY,
            pattern_type: pattern_type::DAY,
            calendar_type: 0,
            first_datetime: 0,
            period: rtime::MINUTES_PER_DAY,
            regen: 0,
            pattern: PatternPayload::None,
            end_type: END_NEVER,
            occurrence_count: 0,
            first_day_of_week: 0,
            deleted_instances: Vec::new(),
            modified_instances: Vec::new(),
            start_bound: 0,
            end_bound: rtime::NO_END_DATE,
            reader_version: READER_VERSION,
            writer_version: WRITER_VERSION,
            start_time_offset: 0,
            end_time_offset: 0,
            exceptions: Vec::new(),
            extended_exceptions: Vec::new(),
            reserved_block1: Vec::new(),
            reserved_block2: Vec::new(),
        }
    }
}

impl RecurrencePattern {
    /// Cadence category, or `None` when the discriminant pair names a pattern
    /// outside the Gregorian cadences (Hijri types, unknown values).
    pub fn frequency(&self) -> Option<Frequency> {
        let yearly = self.recur_frequency == FREQ_YEARLY;
        match self.pattern_type {
            pattern_type::DAY => Some(Frequency::Daily),
            pattern_type::WEEK => Some(Frequency::Weekly),
            pattern_type::MONTH | pattern_type::MONTH_END => Some(if yearly {
                Frequency::Yearly
            } else {
                Frequency::Monthly
            }),
            pattern_type::MONTH_NTH => Some(if yearly {
                Frequency::YearlyNth
            } else {
                Frequency::MonthlyNth
            }),
            _ => None,
        }
    }

    /// End discipline; unknown discriminants read as never-ending, matching
    /// how consumers of the format treat them.
    pub fn end(&self) -> EndType {
        match self.end_type {
            END_AFTER_DATE => EndType::AfterDate,
            END_AFTER_COUNT => EndType::AfterCount,
            _ => EndType::NoEnd,
        }
    }
}
