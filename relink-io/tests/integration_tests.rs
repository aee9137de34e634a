//! End-to-end transformation tests

use relink_format::{decode_envelope, LinkedField, LogEntry};
use relink_io::{
    execute_transform, FsObjectStore, InputSource, LinkExpiry, MemoryObjectStore, OutputSink,
    TransformOptions, TransformRequest, Transformer,
};
use relink_test_utils::{EnvelopeBuilder, LogEntryBuilder, RecordingStore, StoreCall};
use serde_json::{json, Value};
use std::sync::Arc;

fn transformer_with(store: Arc<dyn relink_io::ObjectStore>) -> Transformer {
    Transformer::new(store, TransformOptions::default()).expect("transformer")
}

fn strip_linked(mut entry: LogEntry) -> LogEntry {
    entry.request = None;
    entry.response = None;
    entry
}

#[tokio::test]
async fn single_record_scenario() {
    let store = Arc::new(MemoryObjectStore::new());
    let transformer = transformer_with(store.clone());

    let original = LogEntryBuilder::new()
        .request_id("7f3c")
        .session_id("s-1")
        .timestamp("2024-05-01T12:00:00Z")
        .user_id("u-42")
        .server_ip("10.1.2.3")
        .message("served")
        .level("Info")
        .category("http")
        .request("GET /foo")
        .response("200 OK")
        .build();
    let input = EnvelopeBuilder::new()
        .entry(
            "49546986683135544286507457936321625675700192471156785154",
            &original,
        )
        .to_bytes();

    let output = transformer.transform(&input).await.expect("transform");
    let envelope = decode_envelope(&output).expect("output decodes");

    assert_eq!(envelope.records.len(), 1);
    let record = &envelope.records[0];
    assert_eq!(record.result, "Ok");
    assert_eq!(
        record.record_id,
        "49546986683135544286507457936321625675700192471156785154"
    );

    let entry = record.decode_payload(0).expect("payload decodes");
    let request = entry.request.clone().expect("request link");
    let response = entry.response.clone().expect("response link");
    assert!(request.starts_with("memory://relink-logs/"));
    assert!(response.starts_with("memory://relink-logs/"));
    assert_ne!(request, "GET /foo");
    assert_ne!(response, "200 OK");
    assert_ne!(request, response);
    assert_eq!(strip_linked(entry), strip_linked(original));

    let bodies: Vec<_> = store
        .keys("relink-logs")
        .iter()
        .map(|key| store.get("relink-logs", key).unwrap().body)
        .collect();
    assert!(bodies.iter().any(|b| &b[..] == b"GET /foo"));
    assert!(bodies.iter().any(|b| &b[..] == b"200 OK"));
}

#[tokio::test]
async fn preserves_envelope_metadata_and_unknown_members() {
    let transformer = transformer_with(Arc::new(MemoryObjectStore::new()));
    let data = relink_format::encode_log_entry(&LogEntryBuilder::sample(1).build()).unwrap();
    let input = json!({
        "invocationId": "inv-77",
        "deliveryStreamArn": "arn:aws:firehose:eu-west-1:1:deliverystream/x",
        "region": "eu-west-1",
        "sourceKinesisStreamArn": "arn:aws:kinesis:eu-west-1:1:stream/y",
        "records": [{
            "recordId": "r-1",
            "approximateArrivalTimestamp": 1495072949453u64,
            "data": data
        }]
    });

    let output = transformer
        .transform(input.to_string().as_bytes())
        .await
        .unwrap();
    let value: Value = serde_json::from_slice(&output).unwrap();

    assert_eq!(value["invocationId"], "inv-77");
    assert_eq!(value["deliveryStreamArn"], input["deliveryStreamArn"]);
    assert_eq!(value["region"], "eu-west-1");
    assert_eq!(value["sourceKinesisStreamArn"], input["sourceKinesisStreamArn"]);
    assert_eq!(value["records"][0]["approximateArrivalTimestamp"], 1495072949453u64);
    assert_eq!(value["records"][0]["result"], "Ok");
}

#[tokio::test]
async fn null_fields_are_published_as_empty_objects() {
    let store = Arc::new(MemoryObjectStore::new());
    let transformer = transformer_with(store.clone());
    let entry = LogEntryBuilder::new().message("no bodies").build();
    let input = EnvelopeBuilder::new().entry("r", &entry).to_bytes();

    let output = transformer.transform(&input).await.unwrap();
    let entry = decode_envelope(&output).unwrap().records[0]
        .decode_payload(0)
        .unwrap();

    assert!(entry.linked(LinkedField::Request).is_some());
    assert!(entry.linked(LinkedField::Response).is_some());
    assert_eq!(entry.request_id, None);
    assert_eq!(store.len(), 2);
    assert_eq!(store.total_bytes(), 0);
}

#[tokio::test]
async fn link_requested_only_after_store() {
    let store = Arc::new(RecordingStore::new());
    let transformer = transformer_with(store.clone());
    let input = EnvelopeBuilder::new().samples(5).to_bytes();

    transformer.transform(&input).await.unwrap();

    let calls = store.calls();
    assert_eq!(calls.len(), 20);
    for (pos, call) in calls.iter().enumerate() {
        if let StoreCall::Link { key, .. } = call {
            let stored_before = calls[..pos]
                .iter()
                .any(|c| matches!(c, StoreCall::Put { key: k, .. } if k == key));
            assert!(stored_before, "link for {key} requested before its write");
        }
    }
    for call in &calls {
        if let StoreCall::Put { content_type, bucket, .. } = call {
            assert_eq!(content_type, "application/json");
            assert_eq!(bucket, "relink-logs");
        }
    }
}

#[tokio::test]
async fn configured_bucket_and_expiry_are_used() {
    let store = Arc::new(RecordingStore::new());
    let options = TransformOptions {
        bucket: "cloud-logs".to_string(),
        link_expiry: LinkExpiry::Days(10),
        ..Default::default()
    };
    let transformer = Transformer::new(store.clone(), options).unwrap();
    let input = EnvelopeBuilder::new().samples(1).to_bytes();

    let before = chrono::Utc::now();
    transformer.transform(&input).await.unwrap();

    for call in store.calls() {
        match call {
            StoreCall::Put { bucket, .. } => assert_eq!(bucket, "cloud-logs"),
            StoreCall::Link {
                bucket, expires_at, ..
            } => {
                assert_eq!(bucket, "cloud-logs");
                let lifetime = expires_at - before;
                assert!(lifetime >= chrono::Duration::days(10) - chrono::Duration::seconds(1));
                assert!(lifetime <= chrono::Duration::days(10) + chrono::Duration::minutes(1));
            }
        }
    }
}

#[tokio::test]
async fn default_expiry_is_about_two_years() {
    let store = Arc::new(RecordingStore::new());
    let transformer = transformer_with(store.clone());
    let input = EnvelopeBuilder::new().samples(1).to_bytes();

    let before = chrono::Utc::now();
    transformer.transform(&input).await.unwrap();

    let expiry = store
        .calls()
        .into_iter()
        .find_map(|call| match call {
            StoreCall::Link { expires_at, .. } => Some(expires_at),
            StoreCall::Put { .. } => None,
        })
        .expect("link requested");
    let days = (expiry - before).num_days();
    assert!((729..=731).contains(&days), "expiry was {days} days out");
}

#[tokio::test]
async fn large_record_within_delivery_stream_limit() {
    let store = Arc::new(MemoryObjectStore::new());
    let request = "r".repeat(800 * 1024);
    let entry = LogEntryBuilder::sample(0).request(&request).build();
    let input = EnvelopeBuilder::new().entry("big", &entry).to_bytes();

    let output = transformer_with(store.clone())
        .transform(&input)
        .await
        .expect("800 KiB field transforms");

    let envelope = decode_envelope(&output).unwrap();
    let link = envelope.records[0].decode_payload(0).unwrap().request.unwrap();
    let key = link
        .trim_start_matches("memory://relink-logs/")
        .split('?')
        .next()
        .unwrap()
        .to_string();
    assert_eq!(store.get("relink-logs", &key).unwrap().body.len(), request.len());
}

#[tokio::test]
async fn execute_transform_with_fs_store() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("testData.json");
    let output_path = dir.path().join("out.json");
    std::fs::write(&input_path, EnvelopeBuilder::new().samples(3).to_bytes()).unwrap();

    let store = Arc::new(FsObjectStore::open(dir.path().join("objects")).unwrap());
    let summary = execute_transform(TransformRequest {
        input: InputSource::Path(input_path.clone()),
        output: OutputSink::Path(output_path.clone()),
        options: TransformOptions::default(),
        store: store.clone(),
        pretty: true,
    })
    .await
    .unwrap();

    assert_eq!(summary.metrics.records_transformed, 3);
    assert_eq!(summary.metrics.objects_published, 6);
    assert_eq!(
        summary.metrics.input_bytes,
        std::fs::metadata(&input_path).unwrap().len()
    );

    let output = std::fs::read(&output_path).unwrap();
    assert_eq!(summary.metrics.output_bytes, output.len() as u64);
    assert!(output.starts_with(b"{\n"));

    let envelope = decode_envelope(&output).unwrap();
    for (index, record) in envelope.records.iter().enumerate() {
        let entry = record.decode_payload(index).unwrap();
        let link = entry.request.unwrap();
        assert!(link.starts_with("file://"));
        let path = url::Url::parse(&link).unwrap().to_file_path().unwrap();
        let body = std::fs::read_to_string(path).unwrap();
        assert_eq!(body, LogEntryBuilder::sample(index).build().request.unwrap());
    }
}

#[tokio::test]
async fn failed_execute_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("out.json");
    let input = EnvelopeBuilder::new()
        .samples(1)
        .raw("bad", "not base64!")
        .to_bytes();

    let err = execute_transform(TransformRequest {
        input: InputSource::Bytes(input),
        output: OutputSink::Path(output_path.clone()),
        options: TransformOptions::default(),
        store: Arc::new(MemoryObjectStore::new()),
        pretty: false,
    })
    .await
    .unwrap_err();

    assert!(err.is_decode());
    assert!(!output_path.exists());
}
