//! # recurstate-core
//!
//! Pure-Rust encoder and decoder for the **MAPI appointment recurrence state
//! blob** (the little-endian structure behind `PidLidAppointmentRecur`,
//! MS-OXOCAL section 2.2.1.44), plus the exception bookkeeping that keeps a
//! decoded pattern consistent while individual instances are overridden.
//!
//! Decoding preserves raw discriminants and reserved regions, so
//! `encode(&decode(blob)?)` reproduces the original bytes exactly, including
//! blobs using calendar systems or pattern types this crate cannot expand.
//!
//! ## Quick start
//!
//! ```rust
//! use recurstate_core::types::{pattern_type, FREQ_WEEKLY};
//! use recurstate_core::{decode, encode, PatternPayload, RecurrencePattern};
//!
//! // Weekly on Monday, Wednesday, and Friday.
//! let pattern = RecurrencePattern {
//!     recur_frequency: FREQ_WEEKLY,
//!     pattern_type: pattern_type::WEEK,
//!     period: 1,
//!     pattern: PatternPayload::Weekdays { days: 0b0010_1010 },
//!     ..RecurrencePattern::default()
//! };
//!
//! let blob = encode(&pattern).unwrap();
//! let decoded = decode(&blob).unwrap();
//! assert_eq!(decoded, pattern);
//! ```
//!
//! ## Modules
//!
//! - [`decoder`] -- blob bytes to [`RecurrencePattern`]
//! - [`encoder`] -- [`RecurrencePattern`] back to blob bytes
//! - [`exceptions`] -- create/modify per-instance overrides
//! - [`types`] -- the pattern, exception, and discriminant types
//! - [`rtime`] -- instance-date (minutes since 1601) conversions
//! - [`cursor`] -- bounds-checked little-endian reader/writer
//! - [`error`] -- error types for decode/encode/edit failures

pub mod cursor;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod exceptions;
pub mod rtime;
pub mod types;

pub use decoder::decode;
pub use encoder::encode;
pub use error::{RecurError, Result};
pub use exceptions::{create_exception, modify_exception, ExceptionOverrides};
pub use types::{
    ChangeHighlight, EndType, Exception, ExtendedException, Frequency, OverrideFlags,
    PatternPayload, RecurrencePattern,
};
