use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::event::{epoch_millis, AttributeValue};

/// Attributes shared by every metric kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricCommon {
    /// Metric name.
    pub name: String,
    /// When the measurement was taken. `None` encodes as the zero-timestamp
    /// sentinel.
    pub timestamp: Option<DateTime<Utc>>,
    /// Arbitrary key/value attributes, nested under an `attributes` object.
    pub attributes: IndexMap<String, AttributeValue>,
}

impl MetricCommon {
    /// Creates the common portion of a metric with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Aggregated value of a [`Metric::Summary`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SummaryValue {
    /// Number of observations aggregated.
    pub count: u64,
    /// Sum of all observations.
    pub sum: f64,
    /// Smallest observation. `NaN` encodes as `null`.
    pub min: f64,
    /// Largest observation. `NaN` encodes as `null`.
    pub max: f64,
}

impl Serialize for SummaryValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("count", &self.count)?;
        map.serialize_entry("sum", &self.sum)?;
        // serde_json writes non-finite floats as null, which is exactly the
        // wire encoding for an absent min/max.
        map.serialize_entry("min", &self.min)?;
        map.serialize_entry("max", &self.max)?;
        map.end()
    }
}

/// A single metric measurement.
///
/// The closed set of kinds is tagged on the wire by a `type` field.
#[derive(Clone, Debug, PartialEq)]
pub enum Metric {
    /// A point-in-time value.
    Gauge {
        /// Name, timestamp, and attributes.
        common: MetricCommon,
        /// The observed value.
        value: f64,
    },
    /// A count of occurrences over an interval. Resets each interval.
    Count {
        /// Name, timestamp, and attributes.
        common: MetricCommon,
        /// The number of occurrences.
        value: f64,
        /// Length of the aggregation window.
        interval: Option<Duration>,
    },
    /// An aggregated distribution over an interval.
    Summary {
        /// Name, timestamp, and attributes.
        common: MetricCommon,
        /// The aggregated observations.
        value: SummaryValue,
        /// Length of the aggregation window.
        interval: Option<Duration>,
    },
}

impl Metric {
    const fn kind(&self) -> &'static str {
        match self {
            Metric::Gauge { .. } => "gauge",
            Metric::Count { .. } => "count",
            Metric::Summary { .. } => "summary",
        }
    }

    const fn common(&self) -> &MetricCommon {
        match self {
            Metric::Gauge { common, .. }
            | Metric::Count { common, .. }
            | Metric::Summary { common, .. } => common,
        }
    }

    const fn interval(&self) -> Option<Duration> {
        match self {
            Metric::Gauge { .. } => None,
            Metric::Count { interval, .. } | Metric::Summary { interval, .. } => *interval,
        }
    }
}

impl Serialize for Metric {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let common = self.common();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &common.name)?;
        map.serialize_entry("type", self.kind())?;
        match self {
            Metric::Gauge { value, .. } | Metric::Count { value, .. } => {
                map.serialize_entry("value", value)?;
            }
            Metric::Summary { value, .. } => {
                map.serialize_entry("value", value)?;
            }
        }
        map.serialize_entry("timestamp", &epoch_millis(common.timestamp))?;
        if let Some(interval) = self.interval() {
            map.serialize_entry("interval.ms", &(interval.as_secs_f64() * 1000.0))?;
        }
        if !common.attributes.is_empty() {
            map.serialize_entry("attributes", &common.attributes)?;
        }
        map.end()
    }
}
