//! Blob encoding: [`RecurrencePattern`] back to bytes.
//!
//! ## Key design decisions
//!
//! - The encoder writes the values the pattern holds, never defaults derived
//!   from other fields. A decoded blob's versions, counts, bounds, and
//!   reserved regions therefore come back out exactly as they went in.
//! - Override flags are authoritative: a set flag whose field holds no value
//!   is an error rather than a silently skipped field, and the payload variant
//!   must match what the pattern type requires on the wire.
//! - Reserved blocks are re-emitted with their sizes recomputed from the
//!   preserved content, so editing a pattern cannot leave a stale size prefix.

use crate::cursor::Writer;
use crate::error::{RecurError, Result};
use crate::types::{
    pattern_type, Exception, ExtendedException, FieldShape, OverrideFlags, PatternPayload,
    RecurrencePattern, OVERRIDE_FIELDS, SIGNATURE, WRITER_VERSION_CHANGE_HIGHLIGHT,
};

/// Encode a pattern into appointment recurrence state blob form.
///
/// # Errors
///
/// Returns [`RecurError::ExceptionMismatch`] when the exception and
/// extended-exception lists disagree in length, [`RecurError::PayloadShape`]
/// when the payload variant does not fit the pattern type, and
/// [`RecurError::MissingOverrideField`] when a set override flag has no value
/// to write.
pub fn encode(pattern: &RecurrencePattern) -> Result<Vec<u8>> {
    if pattern.exceptions.len() != pattern.extended_exceptions.len() {
        return Err(RecurError::ExceptionMismatch {
            exceptions: pattern.exceptions.len(),
            extended: pattern.extended_exceptions.len(),
        });
    }

    let mut w = Writer::with_capacity(
        96 + 4 * (pattern.deleted_instances.len() + pattern.modified_instances.len())
            + 64 * pattern.exceptions.len(),
    );

    w.bytes(&SIGNATURE);
    w.u16(pattern.recur_frequency);
    w.u16(pattern.pattern_type);
    w.u16(pattern.calendar_type);
    w.u32(pattern.first_datetime);
    w.u32(pattern.period);
    w.u32(pattern.regen);
    write_payload(&mut w, pattern)?;
    w.u32(pattern.end_type);
    w.u32(pattern.occurrence_count);
    w.u32(pattern.first_day_of_week);

    write_instance_dates(&mut w, "deleted instances", &pattern.deleted_instances)?;
    write_instance_dates(&mut w, "modified instances", &pattern.modified_instances)?;

    w.u32(pattern.start_bound);
    w.u32(pattern.end_bound);
    w.u32(pattern.reader_version);
    w.u32(pattern.writer_version);
    w.u32(pattern.start_time_offset);
    w.u32(pattern.end_time_offset);

    let count = u16::try_from(pattern.exceptions.len()).map_err(|_| RecurError::CountOverflow {
        field: "exception count",
        count: pattern.exceptions.len(),
        max: u16::MAX as usize,
    })?;
    w.u16(count);
    for exception in &pattern.exceptions {
        write_exception(&mut w, exception)?;
    }

    write_reserved_block(&mut w, "reserved block 1", &pattern.reserved_block1)?;

    for (exception, extended) in pattern.exceptions.iter().zip(&pattern.extended_exceptions) {
        write_extended_exception(&mut w, pattern.writer_version, exception, extended)?;
    }

    write_reserved_block(&mut w, "reserved block 2", &pattern.reserved_block2)?;

    Ok(w.into_bytes())
}

/// Payload bytes for the pattern type; daily and unrecognized discriminants
/// legitimately carry none.
fn write_payload(w: &mut Writer, pattern: &RecurrencePattern) -> Result<()> {
    match (pattern.pattern_type, pattern.pattern) {
        (pattern_type::WEEK, PatternPayload::Weekdays { days }) => w.u32(days),
        (
            pattern_type::MONTH
            | pattern_type::MONTH_END
            | pattern_type::HJ_MONTH
            | pattern_type::HJ_MONTH_END,
            PatternPayload::DayOfMonth { day },
        ) => w.u32(day),
        (
            pattern_type::MONTH_NTH | pattern_type::HJ_MONTH_NTH,
            PatternPayload::NthWeekday { days, week },
        ) => {
            w.u32(days);
            w.u32(week);
        }
        (
            pattern_type::WEEK
            | pattern_type::MONTH
            | pattern_type::MONTH_END
            | pattern_type::HJ_MONTH
            | pattern_type::HJ_MONTH_END
            | pattern_type::MONTH_NTH
            | pattern_type::HJ_MONTH_NTH,
            payload,
        ) => {
            return Err(RecurError::PayloadShape {
                pattern_type: pattern.pattern_type,
                payload: payload.name(),
            });
        }
        (_, PatternPayload::None) => {}
        (_, payload) => {
            return Err(RecurError::PayloadShape {
                pattern_type: pattern.pattern_type,
                payload: payload.name(),
            });
        }
    }
    Ok(())
}

fn write_instance_dates(w: &mut Writer, field: &'static str, values: &[u32]) -> Result<()> {
    let count = u32::try_from(values.len()).map_err(|_| RecurError::CountOverflow {
        field,
        count: values.len(),
        max: u32::MAX as usize,
    })?;
    w.u32(count);
    for value in values {
        w.u32(*value);
    }
    Ok(())
}

fn write_reserved_block(w: &mut Writer, field: &'static str, content: &[u8]) -> Result<()> {
    let size = u32::try_from(content.len()).map_err(|_| RecurError::CountOverflow {
        field,
        count: content.len(),
        max: u32::MAX as usize,
    })?;
    w.u32(size);
    w.bytes(content);
    Ok(())
}

/// Fixed header followed by the flag-gated fields in [`OVERRIDE_FIELDS`] order.
fn write_exception(w: &mut Writer, exception: &Exception) -> Result<()> {
    w.u32(exception.start_datetime);
    w.u32(exception.end_datetime);
    w.u32(exception.original_start_date);
    w.u16(exception.override_flags.0);

    for field in OVERRIDE_FIELDS {
        if !exception.override_flags.contains(field.flag) {
            continue;
        }
        match field.shape {
            FieldShape::Long => {
                let value =
                    exception
                        .long_field(field.flag)
                        .ok_or(RecurError::MissingOverrideField {
                            flag: field.flag,
                            field: field.name,
                        })?;
                w.u32(value);
            }
            FieldShape::NarrowString => {
                let bytes =
                    exception
                        .narrow_field(field.flag)
                        .ok_or(RecurError::MissingOverrideField {
                            flag: field.flag,
                            field: field.name,
                        })?;
                write_narrow_string(w, field.name, bytes)?;
            }
        }
    }

    Ok(())
}

/// Legacy prefix (byte count plus one) then the byte count, then raw bytes.
fn write_narrow_string(w: &mut Writer, field: &'static str, bytes: &[u8]) -> Result<()> {
    let len = u16::try_from(bytes.len())
        .ok()
        .filter(|len| *len < u16::MAX)
        .ok_or(RecurError::StringTooLong {
            field,
            len: bytes.len(),
            max: (u16::MAX - 1) as usize,
        })?;
    w.u16(len + 1);
    w.u16(len);
    w.bytes(bytes);
    Ok(())
}

/// UTF-16LE with a leading 16-bit code-unit count.
fn write_wide_string(w: &mut Writer, field: &'static str, value: &str) -> Result<()> {
    let units: Vec<u16> = value.encode_utf16().collect();
    let len = u16::try_from(units.len()).map_err(|_| RecurError::StringTooLong {
        field,
        len: units.len(),
        max: u16::MAX as usize,
    })?;
    w.u16(len);
    for unit in units {
        w.u16(unit);
    }
    Ok(())
}

/// The extended record mirrors the shape rules of
/// [`crate::decoder`]: the change highlight is gated by the writer version,
/// the dates and trailing block by the owning exception's flags.
fn write_extended_exception(
    w: &mut Writer,
    writer_version: u32,
    exception: &Exception,
    extended: &ExtendedException,
) -> Result<()> {
    if writer_version >= WRITER_VERSION_CHANGE_HIGHLIGHT {
        let highlight = extended.change_highlight.clone().unwrap_or_default();
        let size = u32::try_from(4 + highlight.reserved.len()).map_err(|_| {
            RecurError::CountOverflow {
                field: "change highlight",
                count: highlight.reserved.len(),
                max: u32::MAX as usize,
            }
        })?;
        w.u32(size);
        w.u32(highlight.value);
        w.bytes(&highlight.reserved);
    } else if extended.change_highlight.is_some() {
        return Err(RecurError::ChangeHighlightVersion { writer_version });
    }

    write_reserved_block(w, "extended exception reserved block", &extended.reserved_block1)?;

    let flags = exception.override_flags;
    if flags.has_wide_payload() {
        // The repeated dates mirror the owning exception when not set explicitly.
        w.u32(extended.start_datetime.unwrap_or(exception.start_datetime));
        w.u32(extended.end_datetime.unwrap_or(exception.end_datetime));
        w.u32(
            extended
                .original_start_date
                .unwrap_or(exception.original_start_date),
        );
        if flags.contains(OverrideFlags::SUBJECT) {
            let subject =
                extended
                    .subject
                    .as_deref()
                    .ok_or(RecurError::MissingOverrideField {
                        flag: OverrideFlags::SUBJECT,
                        field: "extended exception subject",
                    })?;
            write_wide_string(w, "extended exception subject", subject)?;
        }
        if flags.contains(OverrideFlags::LOCATION) {
            let location =
                extended
                    .location
                    .as_deref()
                    .ok_or(RecurError::MissingOverrideField {
                        flag: OverrideFlags::LOCATION,
                        field: "extended exception location",
                    })?;
            write_wide_string(w, "extended exception location", location)?;
        }
        write_reserved_block(
            w,
            "extended exception trailing block",
            &extended.reserved_block2,
        )?;
    }

    Ok(())
}
