//! Error types for occurrence expansion and item access.

use thiserror::Error;

use crate::store::PropertyId;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The discriminant pair names a cadence this engine cannot expand
    /// (Hijri calendar types, unknown values). The blob itself still decodes
    /// and round-trips.
    #[error("Unsupported pattern: type {pattern_type:#x}, frequency {frequency:#x}")]
    UnsupportedPattern { pattern_type: u16, frequency: u16 },

    /// Regenerating task patterns schedule relative to completion and have no
    /// fixed occurrence schedule to expand.
    #[error("Regenerating pattern (regen = {regen}) has no fixed schedule")]
    Regenerating { regen: u32 },

    /// The rendered recurrence rule was rejected by the rule engine.
    #[error("Invalid recurrence rule: {0}")]
    Rule(String),

    /// The item's recurrence blob failed to decode.
    #[error(transparent)]
    Blob(#[from] recurstate_core::RecurError),

    /// The item lacks a property the operation requires.
    #[error("Item is missing the {0:?} property")]
    MissingProperty(PropertyId),
}

pub type Result<T> = std::result::Result<T, EngineError>;
