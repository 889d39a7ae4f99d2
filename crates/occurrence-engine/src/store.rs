//! Typed-property seam between the engine and whatever holds the item.
//!
//! The engine never talks to a message store directly: it reads and writes
//! item properties through [`ItemStore`] using the symbolic [`PropertyId`]s
//! below. An absent property is `None`, never an error, so callers branch on
//! presence instead of catching lookup failures. [`PROPERTY_TABLE`] carries
//! the wire identity of each property for embedders that map the seam onto a
//! real store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Symbolic identifiers for every property the engine touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
    /// The recurrence state blob itself.
    RecurrenceState,
    /// Whether the item recurs at all.
    Recurring,
    /// Item start (the first instance, for a series).
    CommonStart,
    /// Item end.
    CommonEnd,
    /// Subject line.
    Subject,
    /// Free-text location.
    Location,
    /// Busy status (0 free through 3 out of office).
    BusyStatus,
    /// Minutes before start at which the reminder fires.
    ReminderDelta,
    /// Whether a reminder is armed.
    ReminderSet,
    /// All-day flag.
    SubType,
    /// Label color.
    Color,
    /// Basedate of the instance an embedded exception message replaces.
    ExceptionReplaceTime,
    /// Opaque timezone descriptor, passed through untouched.
    TimezoneStruct,
    /// Address-book display type of the calendar owner.
    DisplayTypeEx,
    /// Declared overbooking capacity of an equipment resource.
    RoomCapacity,
}

/// Namespace a property's dispatch id lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertySet {
    /// Named property in the appointment set (PSETID_Appointment).
    Appointment,
    /// Named property in the common set (PSETID_Common).
    Common,
    /// Plain tagged property; the dispatch id is the proptag id.
    Tagged,
}

/// Value kind a store is expected to hold for a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Long,
    Time,
    Text,
    Bytes,
}

/// One property-table row: symbolic id to wire identity.
#[derive(Debug, Clone, Copy)]
pub struct PropertyDef {
    pub id: PropertyId,
    pub set: PropertySet,
    /// Dispatch id within the set: the named-property LID, or the proptag id
    /// for tagged properties.
    pub dispatch: u32,
    pub kind: ValueKind,
}

/// Static catalog of every property the engine touches. Embedders translate
/// rows into whatever their store dialect needs; the engine itself only ever
/// passes [`PropertyId`]s around.
pub const PROPERTY_TABLE: &[PropertyDef] = &[
    PropertyDef {
        id: PropertyId::RecurrenceState,
        set: PropertySet::Appointment,
        dispatch: 0x8216,
        kind: ValueKind::Bytes,
    },
    PropertyDef {
        id: PropertyId::Recurring,
        set: PropertySet::Appointment,
        dispatch: 0x8223,
        kind: ValueKind::Bool,
    },
    PropertyDef {
        id: PropertyId::CommonStart,
        set: PropertySet::Common,
        dispatch: 0x8516,
        kind: ValueKind::Time,
    },
    PropertyDef {
        id: PropertyId::CommonEnd,
        set: PropertySet::Common,
        dispatch: 0x8517,
        kind: ValueKind::Time,
    },
    PropertyDef {
        id: PropertyId::Subject,
        set: PropertySet::Tagged,
        dispatch: 0x0037,
        kind: ValueKind::Text,
    },
    PropertyDef {
        id: PropertyId::Location,
        set: PropertySet::Appointment,
        dispatch: 0x8208,
        kind: ValueKind::Text,
    },
    PropertyDef {
        id: PropertyId::BusyStatus,
        set: PropertySet::Appointment,
        dispatch: 0x8205,
        kind: ValueKind::Long,
    },
    PropertyDef {
        id: PropertyId::ReminderDelta,
        set: PropertySet::Common,
        dispatch: 0x8501,
        kind: ValueKind::Long,
    },
    PropertyDef {
        id: PropertyId::ReminderSet,
        set: PropertySet::Common,
        dispatch: 0x8503,
        kind: ValueKind::Bool,
    },
    PropertyDef {
        id: PropertyId::SubType,
        set: PropertySet::Appointment,
        dispatch: 0x8215,
        kind: ValueKind::Bool,
    },
    PropertyDef {
        id: PropertyId::Color,
        set: PropertySet::Appointment,
        dispatch: 0x8214,
        kind: ValueKind::Long,
    },
    PropertyDef {
        id: PropertyId::ExceptionReplaceTime,
        set: PropertySet::Appointment,
        dispatch: 0x8228,
        kind: ValueKind::Time,
    },
    PropertyDef {
        id: PropertyId::TimezoneStruct,
        set: PropertySet::Appointment,
        dispatch: 0x8233,
        kind: ValueKind::Bytes,
    },
    PropertyDef {
        id: PropertyId::DisplayTypeEx,
        set: PropertySet::Tagged,
        dispatch: 0x3905,
        kind: ValueKind::Long,
    },
    PropertyDef {
        id: PropertyId::RoomCapacity,
        set: PropertySet::Tagged,
        dispatch: 0x0807,
        kind: ValueKind::Long,
    },
];

/// Wire identity for a symbolic id, when the table carries one.
pub fn property_def(id: PropertyId) -> Option<&'static PropertyDef> {
    PROPERTY_TABLE.iter().find(|def| def.id == id)
}

/// Typed scalar stored for a property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Long(i64),
    Time(DateTime<Utc>),
    Text(String),
    Bytes(Vec<u8>),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            PropertyValue::Long(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            PropertyValue::Time(value) => Some(*value),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            PropertyValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            PropertyValue::Bytes(value) => Some(value),
            _ => None,
        }
    }
}

/// Typed property access on a calendar item. Absence is `None`, never an error.
pub trait ItemStore {
    fn get(&self, id: PropertyId) -> Option<PropertyValue>;
    fn set(&mut self, id: PropertyId, value: PropertyValue);
}

/// In-memory [`ItemStore`], used by tests and lightweight embedders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryItem {
    properties: HashMap<PropertyId, PropertyValue>,
}

impl MemoryItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style set, convenient for fixtures.
    pub fn with(mut self, id: PropertyId, value: PropertyValue) -> Self {
        self.set(id, value);
        self
    }
}

impl ItemStore for MemoryItem {
    fn get(&self, id: PropertyId) -> Option<PropertyValue> {
        self.properties.get(&id).cloned()
    }

    fn set(&mut self, id: PropertyId, value: PropertyValue) {
        self.properties.insert(id, value);
    }
}
