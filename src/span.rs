use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::event::{epoch_millis, AttributeValue};

/// A single span in a distributed trace.
///
/// Unlike events, the span wire format nests everything except `id`,
/// `trace.id`, and `timestamp` under an `attributes` object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Span {
    /// Unique identifier for this span.
    pub id: String,
    /// Identifier shared by all spans within the same trace.
    pub trace_id: String,
    /// Operation name.
    pub name: String,
    /// Identifier of the parent span, if this is not a root span.
    pub parent_id: Option<String>,
    /// When the span started. `None` encodes as the zero-timestamp sentinel.
    pub timestamp: Option<DateTime<Utc>>,
    /// How long the span took.
    pub duration: Option<Duration>,
    /// Name of the service that produced the span.
    pub service_name: Option<String>,
    /// Arbitrary key/value attributes.
    pub attributes: IndexMap<String, AttributeValue>,
}

impl Span {
    /// Creates a span with the given identifiers.
    pub fn new(id: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            trace_id: trace_id.into(),
            ..Default::default()
        }
    }
}

struct SpanAttributes<'a>(&'a Span);

impl Serialize for SpanAttributes<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let span = self.0;
        let mut map = serializer.serialize_map(None)?;
        if !span.name.is_empty() {
            map.serialize_entry("name", &span.name)?;
        }
        if let Some(parent_id) = &span.parent_id {
            map.serialize_entry("parent.id", parent_id)?;
        }
        if let Some(duration) = span.duration {
            map.serialize_entry("duration.ms", &(duration.as_secs_f64() * 1000.0))?;
        }
        if let Some(service_name) = &span.service_name {
            map.serialize_entry("service.name", service_name)?;
        }
        for (key, value) in &span.attributes {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for Span {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("trace.id", &self.trace_id)?;
        map.serialize_entry("timestamp", &epoch_millis(self.timestamp))?;
        map.serialize_entry("attributes", &SpanAttributes(self))?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn minimal_span_has_empty_attributes_object() {
        let span = Span::new("span-1", "trace-1");
        assert_eq!(
            serde_json::to_string(&span).unwrap(),
            r#"{"id":"span-1","trace.id":"trace-1","timestamp":-6795364578871,"attributes":{}}"#
        );
    }

    #[test]
    fn populated_span_nests_well_known_attributes() {
        let mut span = Span::new("span-2", "trace-1");
        span.name = "GET /widgets".to_owned();
        span.parent_id = Some("span-1".to_owned());
        span.timestamp = Some(Utc.with_ymd_and_hms(2014, 11, 28, 1, 1, 0).unwrap());
        span.duration = Some(Duration::from_millis(250));
        span.service_name = Some("widget-service".to_owned());
        span.attributes.insert("zip".to_owned(), "zap".into());
        assert_eq!(
            serde_json::to_string(&span).unwrap(),
            concat!(
                r#"{"id":"span-2","trace.id":"trace-1","timestamp":1417136460000,"#,
                r#""attributes":{"name":"GET /widgets","parent.id":"span-1","#,
                r#""duration.ms":250.0,"service.name":"widget-service","zip":"zap"}}"#
            )
        );
    }
}
