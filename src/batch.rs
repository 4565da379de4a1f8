use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use snafu::{ResultExt, Snafu};

use crate::event::{AttributeValue, Event};
use crate::metric::Metric;
use crate::span::Span;

/// Error returned when a batch cannot be encoded as JSON.
#[derive(Debug, Snafu)]
#[snafu(display("failed to encode batch as JSON: {}", source))]
pub struct EncodingError {
    source: serde_json::Error,
}

/// A payload that can be serialized for transport and split in two when it is
/// too large to send whole.
pub trait Batch {
    /// The number of records in the batch.
    fn len(&self) -> usize;

    /// Returns `true` if the batch holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encodes the batch into its canonical JSON wire form, with no
    /// superfluous whitespace.
    fn serialize(&self) -> Result<Vec<u8>, EncodingError>;

    /// Splits the batch into two order-preserving halves.
    ///
    /// Returns `None` when the batch holds fewer than two records and cannot
    /// be split further; callers must treat that as terminal. Otherwise the
    /// first half holds `floor(len / 2)` records and the second the
    /// remainder, and concatenating the halves reproduces the original
    /// sequence exactly. The original batch is left unchanged.
    fn split(&self) -> Option<(Self, Self)>
    where
        Self: Sized;
}

// Splitting is identical for every record kind: divide the sequence at the
// midpoint into two freshly allocated halves.
fn split_records<T: Clone>(records: &[T]) -> Option<(Vec<T>, Vec<T>)> {
    if records.len() < 2 {
        return None;
    }
    let (first, second) = records.split_at(records.len() / 2);
    Some((first.to_vec(), second.to_vec()))
}

/// An ordered collection of [`Event`]s awaiting transport.
///
/// Serializes as a bare JSON array of flat event objects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventBatch {
    events: Vec<Event>,
}

impl EventBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event, preserving insertion order.
    pub fn record(&mut self, event: Event) {
        self.events.push(event);
    }

    /// The recorded events, in insertion order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

impl From<Vec<Event>> for EventBatch {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl Batch for EventBatch {
    fn len(&self) -> usize {
        self.events.len()
    }

    fn serialize(&self) -> Result<Vec<u8>, EncodingError> {
        serde_json::to_vec(&self.events).context(EncodingSnafu)
    }

    fn split(&self) -> Option<(Self, Self)> {
        split_records(&self.events)
            .map(|(first, second)| (Self { events: first }, Self { events: second }))
    }
}

// Span and metric batches share a wire shape: a single-element JSON array
// wrapping the records alongside an optional `common` attribute block that
// the server applies to every record in the batch.
struct BatchBody<'a, T> {
    key: &'static str,
    common: &'a IndexMap<String, AttributeValue>,
    records: &'a [T],
}

impl<T: Serialize> Serialize for BatchBody<'_, T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct Common<'a>(&'a IndexMap<String, AttributeValue>);

        impl Serialize for Common<'_> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("attributes", self.0)?;
                map.end()
            }
        }

        struct Body<'a, T>(&'a BatchBody<'a, T>);

        impl<T: Serialize> Serialize for Body<'_, T> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut map = serializer.serialize_map(None)?;
                if !self.0.common.is_empty() {
                    map.serialize_entry("common", &Common(self.0.common))?;
                }
                map.serialize_entry(self.0.key, self.0.records)?;
                map.end()
            }
        }

        let mut seq = serializer.serialize_seq(Some(1))?;
        seq.serialize_element(&Body(self))?;
        seq.end()
    }
}

/// An ordered collection of [`Span`]s awaiting transport.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpanBatch {
    /// Attributes applied to every span in the batch by the server.
    pub common: IndexMap<String, AttributeValue>,
    spans: Vec<Span>,
}

impl SpanBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a span, preserving insertion order.
    pub fn record(&mut self, span: Span) {
        self.spans.push(span);
    }

    /// The recorded spans, in insertion order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }
}

impl Batch for SpanBatch {
    fn len(&self) -> usize {
        self.spans.len()
    }

    fn serialize(&self) -> Result<Vec<u8>, EncodingError> {
        let body = BatchBody {
            key: "spans",
            common: &self.common,
            records: &self.spans,
        };
        serde_json::to_vec(&body).context(EncodingSnafu)
    }

    fn split(&self) -> Option<(Self, Self)> {
        split_records(&self.spans).map(|(first, second)| {
            (
                Self {
                    common: self.common.clone(),
                    spans: first,
                },
                Self {
                    common: self.common.clone(),
                    spans: second,
                },
            )
        })
    }
}

/// An ordered collection of [`Metric`]s awaiting transport.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricBatch {
    /// Attributes applied to every metric in the batch by the server.
    pub common: IndexMap<String, AttributeValue>,
    metrics: Vec<Metric>,
}

impl MetricBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a metric, preserving insertion order.
    pub fn record(&mut self, metric: Metric) {
        self.metrics.push(metric);
    }

    /// The recorded metrics, in insertion order.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }
}

impl Batch for MetricBatch {
    fn len(&self) -> usize {
        self.metrics.len()
    }

    fn serialize(&self) -> Result<Vec<u8>, EncodingError> {
        let body = BatchBody {
            key: "metrics",
            common: &self.common,
            records: &self.metrics,
        };
        serde_json::to_vec(&body).context(EncodingSnafu)
    }

    fn split(&self) -> Option<(Self, Self)> {
        split_records(&self.metrics).map(|(first, second)| {
            (
                Self {
                    common: self.common.clone(),
                    metrics: first,
                },
                Self {
                    common: self.common.clone(),
                    metrics: second,
                },
            )
        })
    }
}
