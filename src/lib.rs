#![deny(unreachable_pub)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(clippy::trivially_copy_pass_by_ref)]

//! In-memory batching and transport-payload construction for telemetry data.
//!
//! Callers accumulate [`Event`]s (or [`Span`]s, or [`Metric`]s) into a batch,
//! then hand the batch to [`build_requests`], which serializes it to the
//! canonical JSON wire form, splits it recursively while it exceeds the
//! configured payload limit, gzip-compresses each final piece, and returns
//! immutable [`RequestDescriptor`]s for an external HTTP transport to send.
//! Nothing in this crate performs network I/O.

#[macro_use]
extern crate tracing;

pub mod batch;
pub mod compression;
pub mod event;
pub mod metric;
pub mod request;
pub mod span;

pub use batch::{Batch, EncodingError, EventBatch, MetricBatch, SpanBatch};
pub use event::{AttributeValue, Event, ZERO_TIMESTAMP_MS};
pub use metric::{Metric, MetricCommon, SummaryValue};
pub use request::{
    build_requests, BuildError, RequestConfig, RequestDescriptor, DEFAULT_MAX_PAYLOAD_BYTES,
};
pub use span::Span;
