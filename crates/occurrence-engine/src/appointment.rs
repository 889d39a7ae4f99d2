//! Appointment facade: a typed view over an [`ItemStore`] item with
//! occurrence generation for both recurring and single appointments.

use chrono::{DateTime, Utc};

use recurstate_core::{decode, RecurrencePattern};

use crate::error::{EngineError, Result};
use crate::expand::{self, Occurrence};
use crate::store::{ItemStore, PropertyId, PropertyValue};

/// Read-only appointment view over a property store.
#[derive(Debug)]
pub struct Appointment<'a, S: ItemStore> {
    item: &'a S,
}

impl<'a, S: ItemStore> Appointment<'a, S> {
    pub fn new(item: &'a S) -> Self {
        Appointment { item }
    }

    /// Whether the item carries a recurrence.
    pub fn is_recurring(&self) -> bool {
        self.item
            .get(PropertyId::Recurring)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    /// Item start (the first instance, for a series), when set.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.item
            .get(PropertyId::CommonStart)
            .and_then(|value| value.as_time())
    }

    /// Item end, when set.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.item
            .get(PropertyId::CommonEnd)
            .and_then(|value| value.as_time())
    }

    pub fn subject(&self) -> Option<String> {
        self.item
            .get(PropertyId::Subject)
            .and_then(PropertyValue::into_text)
    }

    pub fn location(&self) -> Option<String> {
        self.item
            .get(PropertyId::Location)
            .and_then(PropertyValue::into_text)
    }

    /// Decoded recurrence pattern from the recurrence-state property.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingProperty`] when the item holds no blob,
    /// [`EngineError::Blob`] when the blob fails to decode.
    pub fn recurrence(&self) -> Result<RecurrencePattern> {
        let blob = self
            .item
            .get(PropertyId::RecurrenceState)
            .and_then(PropertyValue::into_bytes)
            .ok_or(EngineError::MissingProperty(PropertyId::RecurrenceState))?;
        Ok(decode(&blob)?)
    }

    /// Occurrences of this appointment intersecting the window.
    ///
    /// Recurring items expand their pattern; single items degenerate to their
    /// own interval under the same half-open overlap rule. A single item
    /// without both start and end yields nothing.
    pub fn occurrences(
        &self,
        window_start: Option<DateTime<Utc>>,
        window_end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Occurrence>> {
        if self.is_recurring() {
            return expand::expand(&self.recurrence()?, window_start, window_end);
        }
        let (Some(start), Some(end)) = (self.start(), self.end()) else {
            return Ok(Vec::new());
        };
        Ok(expand::single_occurrence(start, end, window_start, window_end)
            .into_iter()
            .collect())
    }
}
