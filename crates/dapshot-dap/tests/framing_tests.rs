//! Wire framing tests
//!
//! Exercises `Content-Length` framing against streams that deliver bytes in
//! arbitrary chunks, and checks that malformed frames are rejected.
//!
//! Run with: cargo test --package dapshot-dap --test framing_tests

use dapshot_dap::codec::{encode_message, read_message};
use dapshot_dap::constants::framing::MAX_CONTENT_LENGTH;
use dapshot_dap::{DapBroker, Error, Event, ProtocolMessage};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, BufReader, ReadBuf};

/// Delivers a byte buffer in reads no larger than the next chunk size
struct ChunkedReader {
    data: Vec<u8>,
    pos: usize,
    chunks: Vec<usize>,
    next: usize,
}

impl ChunkedReader {
    fn new(data: Vec<u8>, chunks: Vec<usize>) -> Self {
        Self {
            data,
            pos: 0,
            chunks,
            next: 0,
        }
    }
}

impl AsyncRead for ChunkedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        if this.pos >= this.data.len() {
            return Poll::Ready(Ok(()));
        }
        let chunk = this.chunks[this.next % this.chunks.len()].max(1);
        this.next += 1;

        let n = chunk
            .min(buf.remaining())
            .min(this.data.len() - this.pos);
        buf.put_slice(&this.data[this.pos..this.pos + n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

/// JSON without floats, so values compare exactly after a round trip
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        ".{0,24}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn event_with_payload(seq: i64, payload: Value) -> ProtocolMessage {
    ProtocolMessage::Event(Event::new(seq, "x").with_body(json!({ "payload": payload })))
}

fn encode_all(messages: &[ProtocolMessage]) -> Vec<u8> {
    messages
        .iter()
        .flat_map(|m| encode_message(m).unwrap())
        .collect()
}

fn current_thread_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

async fn decode_all(bytes: &[u8]) -> Result<Vec<ProtocolMessage>, Error> {
    let mut reader = BufReader::new(bytes);
    let mut messages = Vec::new();
    while let Some(message) = read_message(&mut reader).await? {
        messages.push(message);
    }
    Ok(messages)
}

// ============================================================
// Chunked delivery
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn framed_messages_survive_arbitrary_chunking(
        payloads in prop::collection::vec(arb_json(), 1..5),
        chunks in prop::collection::vec(1usize..64, 1..16),
    ) {
        let messages: Vec<ProtocolMessage> = payloads
            .into_iter()
            .enumerate()
            .map(|(i, p)| event_with_payload(i as i64 + 1, p))
            .collect();
        let bytes = encode_all(&messages);

        let decoded = current_thread_runtime().block_on(async {
            let mut reader = BufReader::new(ChunkedReader::new(bytes, chunks));
            let mut decoded = Vec::new();
            while let Some(message) = read_message(&mut reader).await.unwrap() {
                decoded.push(message);
            }
            decoded
        });

        prop_assert_eq!(decoded, messages);
    }

    #[test]
    fn content_length_counts_bytes_not_chars(text in "\\PC{1,32}") {
        let message = event_with_payload(1, Value::String(text));
        let framed = encode_message(&message).unwrap();

        let header_end = framed.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
        let header = std::str::from_utf8(&framed[..header_end]).unwrap();
        let declared: usize = header.trim_start_matches("Content-Length: ").parse().unwrap();

        prop_assert_eq!(declared, framed.len() - header_end - 4);
    }
}

#[tokio::test]
async fn test_broker_forwards_events_split_across_reads() {
    let messages: Vec<ProtocolMessage> = (1..=20)
        .map(|seq| event_with_payload(seq, json!({ "n": seq, "text": "héllo wörld" })))
        .collect();
    let reader = ChunkedReader::new(encode_all(&messages), vec![1, 7, 3, 64, 2]);

    let (broker, mut events) = DapBroker::new(reader, tokio::io::sink());

    let mut seqs = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_secs(2), events.recv()).await {
        seqs.push(event.seq);
    }
    assert_eq!(seqs, (1..=20).collect::<Vec<i64>>());

    // Clean end of stream closes the broker
    assert!(broker.is_closed());
}

// ============================================================
// Malformed frames
// ============================================================

#[tokio::test]
async fn test_extra_headers_and_header_case_are_tolerated() {
    let body = r#"{"seq":4,"type":"event","event":"initialized"}"#;
    let frame = format!(
        "content-length: {}\r\nContent-Type: application/vscode-jsonrpc; charset=utf-8\r\n\r\n{}",
        body.len(),
        body
    );

    let messages = decode_all(frame.as_bytes()).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].seq(), 4);
}

#[tokio::test]
async fn test_missing_content_length_is_protocol_error() {
    let err = decode_all(b"Content-Type: text/plain\r\n\r\n{}")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_non_numeric_content_length_is_protocol_error() {
    let err = decode_all(b"Content-Length: twelve\r\n\r\n{}")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_oversized_content_length_is_rejected_before_reading() {
    let frame = format!("Content-Length: {}\r\n\r\n", MAX_CONTENT_LENGTH + 1);
    let err = decode_all(frame.as_bytes()).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_truncated_body_is_protocol_error() {
    let err = decode_all(b"Content-Length: 50\r\n\r\n{\"seq\":1}")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_stream_ending_inside_header_is_protocol_error() {
    let err = decode_all(b"Content-Length: 10\r\n").await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_invalid_json_body_is_invalid_message() {
    let body = "{not json}";
    let frame = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);
    let err = decode_all(frame.as_bytes()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidMessage(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_empty_stream_is_clean_eof() {
    assert!(decode_all(b"").await.unwrap().is_empty());
}
