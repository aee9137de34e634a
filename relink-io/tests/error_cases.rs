//! Failure behaviour of the transformer

use relink_format::{DecodeError, LinkedField, RelinkError};
use relink_io::{MemoryObjectStore, TransformOptions, Transformer};
use relink_test_utils::{EnvelopeBuilder, FailingStore, LogEntryBuilder};
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

fn transformer(store: Arc<dyn relink_io::ObjectStore>) -> Transformer {
    Transformer::new(store, TransformOptions::default()).expect("transformer")
}

#[tokio::test]
async fn malformed_envelope_json() {
    let store = Arc::new(MemoryObjectStore::new());
    let err = transformer(store.clone())
        .transform(b"{\"records\": [")
        .await
        .unwrap_err();

    assert!(matches!(err, RelinkError::Decode(DecodeError::Envelope(_))));
    assert!(store.is_empty());
}

#[tokio::test]
async fn missing_records_member() {
    let err = transformer(Arc::new(MemoryObjectStore::new()))
        .transform(br#"{"invocationId":"i","deliveryStreamArn":"a","region":"r"}"#)
        .await
        .unwrap_err();

    match err {
        RelinkError::Decode(DecodeError::Envelope(source)) => {
            assert!(source.to_string().contains("records"))
        }
        other => panic!("expected envelope decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn invalid_base64_fails_without_output() {
    let store = Arc::new(MemoryObjectStore::new());
    let input = EnvelopeBuilder::new().raw("r-0", "@@not base64@@").to_bytes();

    let err = transformer(store.clone()).transform(&input).await.unwrap_err();

    match err {
        RelinkError::Decode(DecodeError::Base64 {
            index, record_id, ..
        }) => {
            assert_eq!(index, 0);
            assert_eq!(record_id, "r-0");
        }
        other => panic!("expected base64 decode error, got {:?}", other),
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn payload_that_is_not_a_log_entry() {
    use base64::Engine as _;
    let data = base64::engine::general_purpose::STANDARD.encode(r#"{"Request": 42}"#);
    let input = EnvelopeBuilder::new().raw("r-0", &data).to_bytes();

    let err = transformer(Arc::new(MemoryObjectStore::new()))
        .transform(&input)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RelinkError::Decode(DecodeError::LogEntry { .. })
    ));
}

#[tokio::test]
async fn decode_failure_mid_batch_keeps_earlier_objects() {
    let store = Arc::new(MemoryObjectStore::new());
    let input = EnvelopeBuilder::new()
        .samples(2)
        .raw("broken", "%%%")
        .samples(1)
        .to_bytes();

    let err = transformer(store.clone()).transform(&input).await.unwrap_err();

    match err {
        RelinkError::Decode(DecodeError::Base64 { index, .. }) => assert_eq!(index, 2),
        other => panic!("expected base64 decode error, got {:?}", other),
    }
    // No rollback: the two records before the broken one were published.
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn store_write_failure_aborts_remaining_records() {
    // Writes 0..=3 cover records 0 and 1; write 4 belongs to record 2.
    let store = Arc::new(FailingStore::on_put(4));
    let input = EnvelopeBuilder::new().samples(5).to_bytes();

    let err = transformer(store.clone()).transform(&input).await.unwrap_err();

    match &err {
        RelinkError::Publish {
            index, record_id, ..
        } => {
            assert_eq!(*index, 2);
            assert_eq!(record_id, "rec-0002");
        }
        other => panic!("expected publish error, got {:?}", other),
    }
    assert!(err.is_publish());
    assert!(err.source().is_some());
    // Records 3 and 4 were never attempted.
    assert!(store.put_attempts() <= 6);
}

#[tokio::test]
async fn failed_field_waits_for_sibling_publish() {
    let store = Arc::new(FailingStore::on_body("FAIL").with_put_delay(Duration::from_millis(30)));
    let entry = LogEntryBuilder::sample(0)
        .request("FAIL")
        .response("200 OK")
        .build();
    let input = EnvelopeBuilder::new().entry("r", &entry).to_bytes();

    let err = transformer(store.clone()).transform(&input).await.unwrap_err();

    match err {
        RelinkError::Publish { field, .. } => assert_eq!(field, LinkedField::Request),
        other => panic!("expected publish error, got {:?}", other),
    }
    // The Response write was already running and is not cut short.
    assert_eq!(store.put_attempts(), 2);
    assert_eq!(store.completed_puts(), 1);
    let stored: Vec<_> = store
        .inner()
        .keys("relink-logs")
        .into_iter()
        .filter_map(|key| store.inner().get("relink-logs", &key))
        .collect();
    assert_eq!(stored.len(), 1);
    assert_eq!(&stored[0].body[..], b"200 OK");
}

#[tokio::test]
async fn request_error_is_reported_when_both_fields_fail() {
    let store = Arc::new(FailingStore::on_body("FAIL"));
    let entry = LogEntryBuilder::sample(0)
        .request("FAIL")
        .response("FAIL")
        .build();
    let input = EnvelopeBuilder::new().entry("r", &entry).to_bytes();

    let err = transformer(store.clone()).transform(&input).await.unwrap_err();

    assert!(matches!(
        err,
        RelinkError::Publish {
            field: LinkedField::Request,
            ..
        }
    ));
    assert_eq!(store.put_attempts(), 2);
}

#[tokio::test]
async fn link_failure_is_a_publish_error() {
    let store = Arc::new(FailingStore::on_link());
    let entry = LogEntryBuilder::sample(0).build();
    let input = EnvelopeBuilder::new().entry("only", &entry).to_bytes();

    let err = transformer(store.clone()).transform(&input).await.unwrap_err();

    match err {
        RelinkError::Publish { field, source, .. } => {
            assert!(LinkedField::ALL.contains(&field));
            assert!(source.to_string().contains("injected failure linking"));
        }
        other => panic!("expected publish error, got {:?}", other),
    }
}

#[tokio::test]
async fn payload_limit_is_enforced_per_record() {
    let mut options = TransformOptions::default();
    options.limits.max_payload_bytes = 16;
    let store = Arc::new(MemoryObjectStore::new());
    let transformer = Transformer::new(store.clone(), options).unwrap();
    let input = EnvelopeBuilder::new().samples(1).to_bytes();

    let err = transformer.transform(&input).await.unwrap_err();

    assert!(matches!(err, RelinkError::LimitExceeded(msg) if msg.contains("rec-0000")));
    assert!(store.is_empty());
}

#[tokio::test]
async fn envelope_limit_is_checked_before_decoding() {
    let mut options = TransformOptions::default();
    options.limits.max_envelope_bytes = 8;
    let transformer = Transformer::new(Arc::new(MemoryObjectStore::new()), options).unwrap();

    let err = transformer.transform(b"not even json").await.unwrap_err();

    assert!(matches!(err, RelinkError::LimitExceeded(_)));
}
