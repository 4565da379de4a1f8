use chrono::{TimeZone, Utc};
use similar_asserts::assert_eq;
use telemetry_batch::{
    build_requests, compression, Batch, Event, EventBatch, RequestConfig,
};

fn config() -> RequestConfig {
    RequestConfig::new("https://ingest.example.com/v1/events", "apiKey", "userAgent")
}

#[test]
fn batch_to_request_pipeline() {
    let mut batch = EventBatch::new();
    batch.record(Event::default());
    batch.record(
        Event::new("testEvent")
            .with_timestamp(Utc.with_ymd_and_hms(2014, 11, 28, 1, 1, 0).unwrap())
            .with_attribute("zip", "zap"),
    );

    let requests = build_requests(&batch, &config()).unwrap();
    assert_eq!(requests.len(), 1);

    let request = &requests[0];
    assert_eq!(
        std::str::from_utf8(request.uncompressed_body()).unwrap(),
        concat!(
            r#"[{"eventType":"","timestamp":-6795364578871},"#,
            r#"{"eventType":"testEvent","timestamp":1417136460000,"zip":"zap"}]"#
        )
    );

    // The wire body decompresses back to exactly the serialized batch.
    assert_eq!(
        compression::decompress(request.compressed_body()).unwrap(),
        request.uncompressed_body().to_vec()
    );
    assert_eq!(request.compressed_len(), request.compressed_body().len());
}

#[test]
fn split_pipeline_preserves_record_order() {
    let mut batch = EventBatch::new();
    for event_type in ["a", "b", "c"] {
        batch.record(Event::new(event_type));
    }

    let (first, second) = batch.split().unwrap();
    let first_requests = build_requests(&first, &config()).unwrap();
    let second_requests = build_requests(&second, &config()).unwrap();

    assert_eq!(
        std::str::from_utf8(first_requests[0].uncompressed_body()).unwrap(),
        r#"[{"eventType":"a","timestamp":-6795364578871}]"#
    );
    assert_eq!(
        std::str::from_utf8(second_requests[0].uncompressed_body()).unwrap(),
        concat!(
            r#"[{"eventType":"b","timestamp":-6795364578871},"#,
            r#"{"eventType":"c","timestamp":-6795364578871}]"#
        )
    );
}
