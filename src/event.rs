use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Epoch-millisecond value that an unset timestamp encodes as.
///
/// The ingest wire format predates this implementation: producers that never
/// set a timestamp have always serialized the zero value of their runtime's
/// instant type, which lands on this constant. Kept for wire compatibility.
pub const ZERO_TIMESTAMP_MS: i64 = -6_795_364_578_871;

/// Converts an optional instant to the epoch-millisecond wire encoding,
/// falling back to [`ZERO_TIMESTAMP_MS`] when unset.
pub(crate) fn epoch_millis(timestamp: Option<DateTime<Utc>>) -> i64 {
    timestamp.map_or(ZERO_TIMESTAMP_MS, |ts| ts.timestamp_millis())
}

/// A scalar attribute value attached to a telemetry record.
///
/// The closed set of variants keeps serialization type-safe without any
/// reflection over arbitrary user types.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A UTF-8 string value.
    String(String),
    /// A signed integer value.
    Int(i64),
    /// A floating point value. Non-finite values serialize as `null`.
    Float(f64),
    /// A boolean value.
    Bool(bool),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A single timestamped, typed occurrence with optional key/value attributes.
///
/// Events serialize as one flat JSON object: `eventType` is always present
/// (the empty string is legal), `timestamp` is epoch milliseconds, and every
/// attribute is flattened to a top-level key rather than nested under an
/// `attributes` object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Event {
    /// The event's type name. May be empty.
    pub event_type: String,
    /// When the event occurred. `None` encodes as [`ZERO_TIMESTAMP_MS`].
    pub timestamp: Option<DateTime<Utc>>,
    /// Arbitrary key/value attributes, flattened into the event object.
    pub attributes: IndexMap<String, AttributeValue>,
}

impl Event {
    /// Creates an event of the given type with no timestamp or attributes.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Default::default()
        }
    }

    /// Sets the event timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Adds a single attribute.
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl Serialize for Event {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Attribute keys colliding with the fixed keys are written after them
        // and the duplicate-key object is sent as-is; resolution is left to
        // the server.
        let mut map = serializer.serialize_map(Some(2 + self.attributes.len()))?;
        map.serialize_entry("eventType", &self.event_type)?;
        map.serialize_entry("timestamp", &epoch_millis(self.timestamp))?;
        for (key, value) in &self.attributes {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
