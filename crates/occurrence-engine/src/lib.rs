//! # occurrence-engine
//!
//! Occurrence expansion and booking-conflict detection for MAPI recurrence
//! patterns decoded by `recurstate-core`.
//!
//! The engine turns a decoded pattern into concrete instances (deletions
//! omitted, overridden instances replaced by their exception records) and
//! sweeps expanded calendars for capacity breaches. Items are reached through
//! the [`store::ItemStore`] seam, so nothing here depends on a particular
//! message store.
//!
//! ## Quick start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use occurrence_engine::expand;
//! use recurstate_core::types::{pattern_type, END_AFTER_DATE, FREQ_WEEKLY};
//! use recurstate_core::{PatternPayload, RecurrencePattern};
//!
//! // Weekly on Monday and Wednesday, 10:00-10:30, for four weeks.
//! let pattern = RecurrencePattern {
//!     recur_frequency: FREQ_WEEKLY,
//!     pattern_type: pattern_type::WEEK,
//!     period: 1,
//!     pattern: PatternPayload::Weekdays { days: 0b0000_1010 },
//!     end_type: END_AFTER_DATE,
//!     start_bound: 222_475_680, // 2024-01-01, a Monday
//!     end_bound: 222_508_800,   // 2024-01-24
//!     start_time_offset: 600,   // 10:00
//!     end_time_offset: 630,
//!     ..RecurrencePattern::default()
//! };
//!
//! let occurrences = expand(&pattern, None, None).unwrap();
//! assert_eq!(occurrences.len(), 8);
//! assert_eq!(
//!     occurrences[0].start,
//!     Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
//! );
//! ```
//!
//! ## Modules
//!
//! - [`expand`] -- pattern to concrete [`Occurrence`]s
//! - [`conflict`] -- capacity sweep over expanded occurrences
//! - [`appointment`] -- typed appointment view over an item
//! - [`store`] -- the [`ItemStore`] property seam and property catalog
//! - [`error`] -- error types

pub mod appointment;
pub mod conflict;
pub mod error;
pub mod expand;
pub mod store;

pub use appointment::Appointment;
pub use conflict::{
    conflict_window, find_conflicts, Resource, AVAILABILITY_RANGE_DAYS, DISPLAY_TYPE_EQUIPMENT,
};
pub use error::{EngineError, Result};
pub use expand::{
    expand, single_occurrence, InstanceOverrides, Occurrence, OccurrenceSource, MAX_INSTANCES,
};
pub use store::{
    property_def, ItemStore, MemoryItem, PropertyDef, PropertyId, PropertySet, PropertyValue,
    ValueKind, PROPERTY_TABLE,
};
