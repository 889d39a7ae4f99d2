//! Error types for recurrence blob decoding, encoding, and exception edits.

use thiserror::Error;

/// Errors that can occur while working with a recurrence state blob.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurError {
    /// The buffer ended before `field` could be read in full (decoding path).
    #[error("Truncated blob: {field} needs {needed} byte(s) at offset {offset}, only {available} left")]
    Truncated {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A declared count or block size would read past the end of the buffer.
    #[error("{field} declares {declared} byte(s) at offset {offset}, past the {remaining}-byte remainder")]
    Overrun {
        field: &'static str,
        declared: usize,
        offset: usize,
        remaining: usize,
    },

    /// The blob does not start with the fixed 0x04 0x30 0x04 0x30 signature.
    #[error("Unrecognized blob signature {found:#010x}")]
    Signature { found: u32 },

    /// The two length prefixes of a narrow string disagree.
    /// The legacy prefix must be the byte count plus one.
    #[error("{field} length prefixes disagree: legacy {legacy}, byte count {len}")]
    NarrowLength {
        field: &'static str,
        legacy: u16,
        len: u16,
    },

    /// A wide string field held an invalid UTF-16 sequence.
    #[error("{field} is not valid UTF-16")]
    WideString { field: &'static str },

    /// A size-prefixed block declared fewer bytes than its fixed leading fields occupy.
    #[error("{field} block size {size} cannot hold its {min}-byte fixed part")]
    BlockSize {
        field: &'static str,
        size: usize,
        min: usize,
    },

    /// Bytes remained after the terminating block.
    #[error("{remaining} trailing byte(s) after the terminating block at offset {offset}")]
    TrailingBytes { offset: usize, remaining: usize },

    /// The pattern payload variant does not match what the pattern type
    /// discriminant requires on the wire (encoding path).
    #[error("Pattern payload '{payload}' does not fit pattern type {pattern_type:#x}")]
    PayloadShape {
        pattern_type: u16,
        payload: &'static str,
    },

    /// A string field exceeds what its 16-bit length prefix can express.
    #[error("{field} is {len} unit(s) long, the wire limit is {max}")]
    StringTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// `exceptions` and `extended_exceptions` must stay index-aligned.
    #[error("{exceptions} exception record(s) but {extended} extended record(s)")]
    ExceptionMismatch { exceptions: usize, extended: usize },

    /// An override flag is set but the field it gates holds no value.
    #[error("Override flag {flag:#06x} is set but {field} is absent")]
    MissingOverrideField { flag: u16, field: &'static str },

    /// Change-highlight blocks require writer version 0x3009 or newer.
    #[error("Change highlight present but writer version is {writer_version:#x}")]
    ChangeHighlightVersion { writer_version: u32 },

    /// An element count or block length exceeds its wire counter.
    #[error("{field} count {count} exceeds the wire maximum {max}")]
    CountOverflow {
        field: &'static str,
        count: usize,
        max: usize,
    },

    /// No exception record matches the requested basedate (exception edits).
    #[error("No exception with original start date {basedate} (instance-date minutes)")]
    UnknownBasedate { basedate: u32 },

    /// An exception for the basedate already exists; modify it instead.
    #[error("An exception for instance date {basedate} already exists")]
    DuplicateBasedate { basedate: u32 },
}

/// Convenience alias used throughout recurstate-core.
pub type Result<T> = std::result::Result<T, RecurError>;
