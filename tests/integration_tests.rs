//! Integration tests for recordwire

use proptest::prelude::*;
use recordwire::{
    frames_to_jsonl, jsonl_to_frames, Buffer, Error, JsonCodec, RecordBuilder, RecordCodec, Root,
    Schema,
};
use serde_json::json;
use std::sync::Arc;

fn string_codec() -> JsonCodec {
    JsonCodec::new(Arc::new(Schema::string()))
}

fn event_schema() -> Arc<Schema> {
    Arc::new(
        Schema::parse(
            r#"{"object": {"id": "uint", "kind": "string", "payload": {"optional": "bytes"}}}"#,
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn test_three_records_there_and_back() {
    let codec = string_codec();
    let jsonl = "\"A\"\n\"B\"\n\"C\"\n";

    let mut framed = Vec::new();
    let count = jsonl_to_frames(&codec, jsonl.as_bytes(), &mut framed)
        .await
        .unwrap();
    assert_eq!(count, 3);

    // Three frames: each a 4-byte prefix plus a 2-byte payload
    assert_eq!(framed.len(), 3 * (4 + 2));

    let mut back = Vec::new();
    let count = frames_to_jsonl(&codec, &framed[..], &mut back).await.unwrap();
    assert_eq!(count, 3);
    assert_eq!(back, jsonl.as_bytes());
}

#[tokio::test]
async fn test_structured_records_roundtrip() {
    let codec = JsonCodec::new(event_schema());
    let jsonl = concat!(
        "{\"id\":1,\"kind\":\"open\",\"payload\":\"00ff\"}\n",
        "{\"id\":2,\"kind\":\"close\",\"payload\":null}\n",
    );

    let mut framed = Vec::new();
    jsonl_to_frames(&codec, jsonl.as_bytes(), &mut framed)
        .await
        .unwrap();

    let mut back = Vec::new();
    frames_to_jsonl(&codec, &framed[..], &mut back).await.unwrap();
    assert_eq!(back, jsonl.as_bytes());
}

#[tokio::test]
async fn test_corrupted_last_record_emits_the_rest_then_fails() {
    let codec = string_codec();
    let jsonl = "\"A\"\n\"B\"\n\"C\"\n";

    let mut framed = Vec::new();
    jsonl_to_frames(&codec, jsonl.as_bytes(), &mut framed)
        .await
        .unwrap();

    // Truncate the last frame's payload by one byte
    framed.pop();

    let mut back = Vec::new();
    let err = frames_to_jsonl(&codec, &framed[..], &mut back)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Truncated { expected: 2, got: 1 }));
    assert_eq!(back, b"\"A\"\n\"B\"\n");
}

#[tokio::test]
async fn test_undecodable_record_aborts_the_run() {
    let codec = JsonCodec::new(event_schema());

    let mut framed = Vec::new();
    let good = codec
        .encode("{\"id\":1,\"kind\":\"open\",\"payload\":null}")
        .unwrap();
    good.write_frame(&mut framed).await.unwrap();
    Buffer::from_slice(&[0xff, 0xff, 0xff])
        .write_frame(&mut framed)
        .await
        .unwrap();

    let mut back = Vec::new();
    let err = frames_to_jsonl(&codec, &framed[..], &mut back)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidData(_) | Error::OutOfData));
    // The good record was already emitted
    assert_eq!(back, b"{\"id\":1,\"kind\":\"open\",\"payload\":null}\n");
}

#[tokio::test]
async fn test_truncated_prefix_yields_no_record() {
    let codec = string_codec();
    let stream: &[u8] = &[2, 0]; // half a length prefix

    let mut back = Vec::new();
    let err = frames_to_jsonl(&codec, stream, &mut back).await.unwrap_err();
    assert!(matches!(err, Error::Truncated { expected: 4, got: 2 }));
    assert!(back.is_empty());
}

#[tokio::test]
async fn test_memory_stays_bounded_by_one_record() {
    // Same conversion at two stream lengths; only the one-record buffers are
    // ever resident, so both run identically apart from output size.
    let codec = JsonCodec::new(event_schema());
    for records in [10u64, 10_000] {
        let mut jsonl = String::new();
        for id in 0..records {
            jsonl.push_str(&format!(
                "{{\"id\":{id},\"kind\":\"tick\",\"payload\":\"abcd\"}}\n"
            ));
        }

        let mut framed = Vec::new();
        let count = jsonl_to_frames(&codec, jsonl.as_bytes(), &mut framed)
            .await
            .unwrap();
        assert_eq!(count, records);

        let mut back = Vec::new();
        let count = frames_to_jsonl(&codec, &framed[..], &mut back).await.unwrap();
        assert_eq!(count, records);
        assert_eq!(back, jsonl.as_bytes());
    }
}

#[tokio::test]
async fn test_root_framed_pipeline() {
    let schema = event_schema();
    let builder = RecordBuilder::new(schema.clone());

    let mut stream = Vec::new();
    for id in 0..3u64 {
        let root = builder
            .finish_root(&json!({"id": id, "kind": "tick", "payload": null}))
            .unwrap();
        root.write_framed(&mut stream).await.unwrap();
    }

    let mut reader = &stream[..];
    let mut root = Root::unbound(schema);
    let mut ids = Vec::new();
    while root.read_framed(&mut reader).await.unwrap() {
        ids.push(root.value().unwrap()["id"].as_u64().unwrap());
    }
    assert_eq!(ids, [0, 1, 2]);
}

#[tokio::test]
async fn test_verification_failure_is_a_stream_failure() {
    let schema = event_schema();

    // A frame whose payload is not a well-formed record for the schema
    let mut stream = Vec::new();
    Buffer::from_slice(b"zz")
        .write_frame(&mut stream)
        .await
        .unwrap();

    let mut reader = &stream[..];
    let mut root = Root::unbound(schema.clone());
    assert!(matches!(
        root.read_framed(&mut reader).await,
        Err(Error::Verification)
    ));
    assert!(!root.valid());

    // Direct binding of the same bytes: invalid view, not an error
    let bound = Root::bind(schema, Buffer::from_slice(b"zz"));
    assert!(!bound.valid());
    assert!(matches!(bound.value(), Err(Error::InvalidRoot)));
}

proptest! {
    #[test]
    fn prop_frame_roundtrip_is_exact(payload in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let read = futures::executor::block_on(async {
            let buffer = Buffer::from(payload.clone());
            let mut stream = Vec::new();
            buffer.write_frame(&mut stream).await.unwrap();

            let mut reader = &stream[..];
            let read = Buffer::read_frame(&mut reader).await.unwrap().unwrap();
            assert!(Buffer::read_frame(&mut reader).await.unwrap().is_none());
            read
        });
        prop_assert_eq!(read.as_slice(), &payload[..]);
    }
}
