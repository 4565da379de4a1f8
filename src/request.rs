//! Construction of ready-to-send transport units.
//!
//! The builder turns a [`Batch`] into one or more immutable
//! [`RequestDescriptor`]s, recursively splitting the batch whenever its
//! serialized form exceeds the configured payload limit. Actual network I/O,
//! retries, and backoff belong to the external HTTP transport that consumes
//! the descriptors.

use bytes::Bytes;
use http::{header, Request, Uri};
use snafu::{ResultExt, Snafu};

use crate::batch::{Batch, EncodingError};
use crate::compression;

/// Default serialized-payload size limit, in bytes, above which a batch is
/// split before being compressed.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1 << 20;

/// Header carrying the ingest license key.
pub const API_KEY_HEADER: &str = "Api-Key";

/// Destination and sizing settings for request construction, supplied by the
/// SDK layer that owns endpoint configuration.
#[derive(Clone, Debug)]
pub struct RequestConfig {
    /// Full URL of the ingest endpoint.
    pub url: String,
    /// License key sent in the [`API_KEY_HEADER`] header.
    pub api_key: String,
    /// Value for the `User-Agent` header.
    pub user_agent: String,
    /// Serialized payload size above which batches are split.
    pub max_payload_bytes: usize,
}

impl RequestConfig {
    /// Creates a config with the default payload size limit.
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            user_agent: user_agent.into(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

/// Error building requests from a batch.
#[derive(Debug, Snafu)]
pub enum BuildError {
    /// The batch could not be serialized to JSON.
    #[snafu(display("failed to encode payload: {}", source))]
    Encoding {
        /// Underlying encoding failure.
        source: EncodingError,
    },
    /// The serialized body could not be compressed.
    #[snafu(display("failed to compress payload: {}", source))]
    Compression {
        /// Underlying I/O failure from the gzip encoder.
        source: std::io::Error,
    },
    /// The configured ingest URL is not a valid URI.
    #[snafu(display("invalid ingest URL: {}", source))]
    InvalidUrl {
        /// Underlying URI parse failure.
        source: http::uri::InvalidUri,
    },
    /// The HTTP request could not be assembled.
    #[snafu(display("failed to build HTTP request: {}", source))]
    BuildRequest {
        /// Underlying `http` builder failure.
        source: http::Error,
    },
}

/// A fully prepared, ready-to-send transport unit.
///
/// Descriptors are immutable once built and are consumed exactly once by the
/// transport. Both body forms are retained: the compressed body is what goes
/// on the wire, the uncompressed body supports diagnostics and integrity
/// checks.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    uncompressed_body: Bytes,
    compressed_body: Bytes,
    url: String,
    api_key: String,
    user_agent: String,
}

impl RequestDescriptor {
    fn new(body: Vec<u8>, config: &RequestConfig) -> Result<Self, BuildError> {
        let compressed = compression::compress(&body).context(CompressionSnafu)?;
        Ok(Self {
            uncompressed_body: body.into(),
            compressed_body: compressed.into(),
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    /// The serialized JSON body before compression.
    pub fn uncompressed_body(&self) -> &[u8] {
        &self.uncompressed_body
    }

    /// The gzip-compressed body that goes on the wire.
    pub fn compressed_body(&self) -> &[u8] {
        &self.compressed_body
    }

    /// Length of the compressed body, in bytes.
    pub fn compressed_len(&self) -> usize {
        self.compressed_body.len()
    }

    /// The ingest endpoint this descriptor targets.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Materializes the HTTP request for the transport collaborator.
    pub fn to_http_request(&self) -> Result<Request<Bytes>, BuildError> {
        let uri: Uri = self.url.parse().context(InvalidUrlSnafu)?;
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_ENCODING, "gzip")
            .header(header::USER_AGENT, self.user_agent.as_str())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .body(self.compressed_body.clone())
            .context(BuildRequestSnafu)
    }
}

/// Converts a batch into one or more request descriptors.
///
/// The batch is serialized once; if the serialized size is within the
/// configured limit it becomes a single descriptor. Otherwise the batch is
/// split at its midpoint and each half is built recursively, with descriptor
/// order following record order. A batch that exceeds the limit but cannot be
/// split further is sent as one oversized descriptor rather than dropped;
/// whether to accept it is the server's call.
pub fn build_requests<B: Batch>(
    batch: &B,
    config: &RequestConfig,
) -> Result<Vec<RequestDescriptor>, BuildError> {
    let body = batch.serialize().context(EncodingSnafu)?;
    if body.len() <= config.max_payload_bytes {
        return Ok(vec![RequestDescriptor::new(body, config)?]);
    }

    match batch.split() {
        Some((first, second)) => {
            trace!(
                message = "Payload over size limit, splitting batch.",
                uncompressed_bytes = body.len(),
                limit = config.max_payload_bytes,
                records = batch.len(),
            );
            let mut requests = build_requests(&first, config)?;
            requests.extend(build_requests(&second, config)?);
            Ok(requests)
        }
        None => {
            warn!(
                message = "Payload over size limit but not splittable, sending as-is.",
                uncompressed_bytes = body.len(),
                limit = config.max_payload_bytes,
            );
            Ok(vec![RequestDescriptor::new(body, config)?])
        }
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::batch::EventBatch;
    use crate::event::Event;

    fn config_with_limit(max_payload_bytes: usize) -> RequestConfig {
        RequestConfig {
            max_payload_bytes,
            ..RequestConfig::new(
                "https://ingest.example.com/v1/events",
                "apiKey",
                "userAgent",
            )
        }
    }

    fn batch_of(types: &[&str]) -> EventBatch {
        types.iter().map(|t| Event::new(*t)).collect::<Vec<_>>().into()
    }

    #[test]
    fn small_batch_builds_one_request() {
        let batch = batch_of(&["a", "b"]);
        let requests = build_requests(&batch, &config_with_limit(DEFAULT_MAX_PAYLOAD_BYTES))
            .unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            std::str::from_utf8(requests[0].uncompressed_body()).unwrap(),
            concat!(
                r#"[{"eventType":"a","timestamp":-6795364578871},"#,
                r#"{"eventType":"b","timestamp":-6795364578871}]"#
            )
        );
    }

    #[test]
    fn compressed_body_round_trips_to_uncompressed() {
        let batch = batch_of(&["a", "b", "c"]);
        let requests =
            build_requests(&batch, &config_with_limit(DEFAULT_MAX_PAYLOAD_BYTES)).unwrap();
        let request = &requests[0];
        assert_eq!(request.compressed_len(), request.compressed_body().len());
        assert_eq!(
            crate::compression::decompress(request.compressed_body()).unwrap(),
            request.uncompressed_body().to_vec()
        );
    }

    #[test]
    fn oversized_batch_splits_until_within_limit() {
        let batch = batch_of(&["a", "b", "c", "d"]);
        // One serialized event is ~45 bytes, so this forces one request per
        // event.
        let requests = build_requests(&batch, &config_with_limit(50)).unwrap();
        assert_eq!(requests.len(), 4);

        // Parsing each body back and concatenating reproduces record order.
        let types: Vec<String> = requests
            .iter()
            .flat_map(|request| {
                let values: Vec<serde_json::Value> =
                    serde_json::from_slice(request.uncompressed_body()).unwrap();
                values
                    .into_iter()
                    .map(|v| v["eventType"].as_str().unwrap().to_owned())
                    .collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(types, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn unsplittable_oversized_batch_is_sent_as_is() {
        let batch = batch_of(&["oneVeryLargeEventTypeThatExceedsTheLimit"]);
        let requests = build_requests(&batch, &config_with_limit(10)).unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].uncompressed_body().len() > 10);
    }

    #[test]
    fn http_request_carries_transport_headers() {
        let batch = batch_of(&["a"]);
        let requests =
            build_requests(&batch, &config_with_limit(DEFAULT_MAX_PAYLOAD_BYTES)).unwrap();
        let http_request = requests[0].to_http_request().unwrap();

        assert_eq!(http_request.method(), http::Method::POST);
        assert_eq!(
            http_request.uri().to_string(),
            "https://ingest.example.com/v1/events"
        );
        let headers = http_request.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(headers[header::CONTENT_ENCODING], "gzip");
        assert_eq!(headers[header::USER_AGENT], "userAgent");
        assert_eq!(headers[API_KEY_HEADER], "apiKey");
        assert_eq!(http_request.body(), requests[0].compressed_body());
    }

    #[test]
    fn invalid_url_surfaces_as_build_error() {
        let batch = batch_of(&["a"]);
        let mut config = config_with_limit(DEFAULT_MAX_PAYLOAD_BYTES);
        config.url = "not a url".to_owned();
        let requests = build_requests(&batch, &config).unwrap();
        assert!(matches!(
            requests[0].to_http_request(),
            Err(BuildError::InvalidUrl { .. })
        ));
    }
}
