//! Blob decoding: bytes to [`RecurrencePattern`].
//!
//! ## Key design decisions
//!
//! - Every multi-byte field is read through [`crate::cursor::Reader`], which
//!   attributes truncation to a named field and offset instead of panicking or
//!   silently misreading.
//! - Declared counts and block sizes are validated against the remaining
//!   buffer before anything is allocated, so a hostile length field cannot
//!   request an absurd allocation.
//! - Nothing is normalized away: raw discriminants, reserved regions, and
//!   unknown calendar types all land in the pattern untouched, and decoding
//!   fails if bytes remain after the terminating block. Together these make
//!   `encode(&decode(blob)?)` reproduce `blob` exactly.
//!
//! ## Wire layout
//!
//! All integers are little-endian.
//!
//! ```text
//! signature           4 bytes   04 30 04 30
//! recur_frequency     u16       0x200A..=0x200D
//! pattern_type        u16
//! calendar_type       u16
//! first_datetime      u32
//! period              u32
//! regen               u32
//! payload             0, 4, or 8 bytes, selected by pattern_type
//! end_type            u32
//! occurrence_count    u32
//! first_day_of_week   u32
//! deleted_instances   u32 count + count * u32
//! modified_instances  u32 count + count * u32
//! start_bound         u32
//! end_bound           u32
//! reader_version      u32
//! writer_version      u32
//! start_time_offset   u32       minutes past midnight
//! end_time_offset     u32
//! exception_count     u16
//! exceptions          variable, see read_exception
//! reserved_block1     u32 size + size bytes
//! extended_exceptions one per exception, see read_extended_exception
//! reserved_block2     u32 size + size bytes
//! ```

use crate::cursor::Reader;
use crate::error::{RecurError, Result};
use crate::types::{
    pattern_type, ChangeHighlight, Exception, ExtendedException, FieldShape, OverrideFlags,
    PatternPayload, RecurrencePattern, OVERRIDE_FIELDS, SIGNATURE,
    WRITER_VERSION_CHANGE_HIGHLIGHT,
};

/// Decode an appointment recurrence state blob.
///
/// # Errors
///
/// Returns [`RecurError::Signature`] when the leading magic is wrong, and
/// [`RecurError::Truncated`] / [`RecurError::Overrun`] naming the offending
/// field when the buffer is shorter than its declared structure.
pub fn decode(buf: &[u8]) -> Result<RecurrencePattern> {
    let mut r = Reader::new(buf);

    let signature = r.bytes("signature", 4)?;
    if signature != SIGNATURE {
        let found = u32::from_le_bytes([signature[0], signature[1], signature[2], signature[3]]);
        return Err(RecurError::Signature { found });
    }

    let recur_frequency = r.u16("recurrence frequency")?;
    let pattern_type = r.u16("pattern type")?;
    let calendar_type = r.u16("calendar type")?;
    let first_datetime = r.u32("first datetime")?;
    let period = r.u32("period")?;
    let regen = r.u32("regen")?;
    let pattern = read_payload(&mut r, pattern_type)?;
    let end_type = r.u32("end type")?;
    let occurrence_count = r.u32("occurrence count")?;
    let first_day_of_week = r.u32("first day of week")?;

    let deleted_instances = read_instance_dates(&mut r, "deleted instances")?;
    let modified_instances = read_instance_dates(&mut r, "modified instances")?;

    let start_bound = r.u32("start bound")?;
    let end_bound = r.u32("end bound")?;
    let reader_version = r.u32("reader version")?;
    let writer_version = r.u32("writer version")?;
    let start_time_offset = r.u32("start time offset")?;
    let end_time_offset = r.u32("end time offset")?;

    let exception_count = r.u16("exception count")?;
    let mut exceptions = Vec::with_capacity(exception_count as usize);
    for _ in 0..exception_count {
        exceptions.push(read_exception(&mut r)?);
    }

    let reserved_block1 = read_reserved_block(&mut r, "reserved block 1")?;

    let mut extended_exceptions = Vec::with_capacity(exceptions.len());
    for exception in &exceptions {
        extended_exceptions.push(read_extended_exception(
            &mut r,
            writer_version,
            exception.override_flags,
        )?);
    }

    let reserved_block2 = read_reserved_block(&mut r, "reserved block 2")?;

    if r.remaining() > 0 {
        return Err(RecurError::TrailingBytes {
            offset: r.position(),
            remaining: r.remaining(),
        });
    }

    Ok(RecurrencePattern {
        recur_frequency,
        pattern_type,
        calendar_type,
        first_datetime,
        period,
        regen,
        pattern,
        end_type,
        occurrence_count,
        first_day_of_week,
        deleted_instances,
        modified_instances,
        start_bound,
        end_bound,
        reader_version,
        writer_version,
        start_time_offset,
        end_time_offset,
        exceptions,
        extended_exceptions,
        reserved_block1,
        reserved_block2,
    })
}

/// Interval payload; which fields exist is fixed by the pattern type.
/// Unrecognized discriminants carry no payload but still round-trip.
fn read_payload(r: &mut Reader<'_>, ptype: u16) -> Result<PatternPayload> {
    Ok(match ptype {
        pattern_type::WEEK => PatternPayload::Weekdays {
            days: r.u32("weekday bitmask")?,
        },
        pattern_type::MONTH
        | pattern_type::MONTH_END
        | pattern_type::HJ_MONTH
        | pattern_type::HJ_MONTH_END => PatternPayload::DayOfMonth {
            day: r.u32("day of month")?,
        },
        pattern_type::MONTH_NTH | pattern_type::HJ_MONTH_NTH => PatternPayload::NthWeekday {
            days: r.u32("weekday bitmask")?,
            week: r.u32("week number")?,
        },
        _ => PatternPayload::None,
    })
}

/// Count-prefixed list of instance-date day values.
fn read_instance_dates(r: &mut Reader<'_>, field: &'static str) -> Result<Vec<u32>> {
    let count = r.u32(field)? as usize;
    if count.saturating_mul(4) > r.remaining() {
        return Err(RecurError::Overrun {
            field,
            declared: count.saturating_mul(4),
            offset: r.position(),
            remaining: r.remaining(),
        });
    }
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(r.u32(field)?);
    }
    Ok(values)
}

/// Size-prefixed region the format reserves without defining. The content is
/// preserved for re-encoding.
fn read_reserved_block(r: &mut Reader<'_>, field: &'static str) -> Result<Vec<u8>> {
    let size = r.u32(field)? as usize;
    Ok(r.block(field, size)?.to_vec())
}

/// Fixed header followed by the flag-gated fields in [`OVERRIDE_FIELDS`] order.
fn read_exception(r: &mut Reader<'_>) -> Result<Exception> {
    let mut exception = Exception {
        start_datetime: r.u32("exception start")?,
        end_datetime: r.u32("exception end")?,
        original_start_date: r.u32("exception original start")?,
        override_flags: OverrideFlags(r.u16("override flags")?),
        ..Exception::default()
    };

    for field in OVERRIDE_FIELDS {
        if !exception.override_flags.contains(field.flag) {
            continue;
        }
        match field.shape {
            FieldShape::Long => {
                let value = r.u32(field.name)?;
                exception.set_long_field(field.flag, value);
            }
            FieldShape::NarrowString => {
                let bytes = read_narrow_string(r, field.name)?;
                exception.set_narrow_field(field.flag, bytes);
            }
        }
    }

    Ok(exception)
}

/// Narrow strings carry two length prefixes: a legacy count that must equal
/// the byte count plus one (a terminator that is never actually written), then
/// the byte count itself.
fn read_narrow_string(r: &mut Reader<'_>, field: &'static str) -> Result<Vec<u8>> {
    let legacy = r.u16(field)?;
    let len = r.u16(field)?;
    if u32::from(legacy) != u32::from(len) + 1 {
        return Err(RecurError::NarrowLength { field, legacy, len });
    }
    Ok(r.block(field, len as usize)?.to_vec())
}

/// Wide strings are UTF-16LE with a leading 16-bit code-unit count.
fn read_wide_string(r: &mut Reader<'_>, field: &'static str) -> Result<String> {
    let units = r.u16(field)? as usize;
    let bytes = r.block(field, units * 2)?;
    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&code_units).map_err(|_| RecurError::WideString { field })
}

/// Change-highlight blocks hold a 4-byte value plus reserved padding; the
/// declared size covers both.
fn read_change_highlight(r: &mut Reader<'_>) -> Result<ChangeHighlight> {
    let size = r.u32("change highlight")? as usize;
    if size < 4 {
        return Err(RecurError::BlockSize {
            field: "change highlight",
            size,
            min: 4,
        });
    }
    let value = r.u32("change highlight value")?;
    let reserved = r.block("change highlight reserved", size - 4)?.to_vec();
    Ok(ChangeHighlight { value, reserved })
}

/// The extended record's own shape depends on the pattern's writer version and
/// the owning exception's override flags.
fn read_extended_exception(
    r: &mut Reader<'_>,
    writer_version: u32,
    flags: OverrideFlags,
) -> Result<ExtendedException> {
    let mut extended = ExtendedException::default();

    if writer_version >= WRITER_VERSION_CHANGE_HIGHLIGHT {
        extended.change_highlight = Some(read_change_highlight(r)?);
    }

    extended.reserved_block1 = read_reserved_block(r, "extended exception reserved block")?;

    if flags.has_wide_payload() {
        extended.start_datetime = Some(r.u32("extended exception start")?);
        extended.end_datetime = Some(r.u32("extended exception end")?);
        extended.original_start_date = Some(r.u32("extended exception original start")?);
        if flags.contains(OverrideFlags::SUBJECT) {
            extended.subject = Some(read_wide_string(r, "extended exception subject")?);
        }
        if flags.contains(OverrideFlags::LOCATION) {
            extended.location = Some(read_wide_string(r, "extended exception location")?);
        }
        extended.reserved_block2 =
            read_reserved_block(r, "extended exception trailing block")?;
    }

    Ok(extended)
}
