//! Integration tests for streamed summary assembly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use student_summary::error::ServiceError;
use student_summary::summary::stream::{assemble, decode_chunks};

fn lines(lines: &[&str]) -> Vec<Result<Bytes, String>> {
    lines
        .iter()
        .map(|l| Ok(Bytes::from(format!("{l}\n"))))
        .collect()
}

#[tokio::test]
async fn test_assembles_fragments_in_order() {
    let body = lines(&[
        r#"{"message":{"content":"Hi "},"done":false}"#,
        r#"{"message":{"content":"there."},"done":true}"#,
    ]);

    let summary = assemble(decode_chunks(stream::iter(body))).await.unwrap();
    assert_eq!(summary, "Hi there.");
}

#[tokio::test]
async fn test_invalid_json_line_is_skipped() {
    let body = lines(&[
        r#"{"message":{"content":"Hi "},"done":false}"#,
        r#"{"message":{"content": oops"#,
        r#"{"message":{"content":"there."},"done":true}"#,
    ]);

    let summary = assemble(decode_chunks(stream::iter(body))).await.unwrap();
    assert_eq!(summary, "Hi there.");
}

#[tokio::test]
async fn test_body_after_done_is_never_polled() {
    let polled = Arc::new(AtomicUsize::new(0));
    let counter = polled.clone();

    let body = stream::iter(lines(&[
        r#"{"message":{"content":"one"},"done":false}"#,
        r#"{"message":{"content":" two"},"done":true}"#,
        r#"{"message":{"content":" three"},"done":false}"#,
        r#"{"message":{"content":" four"},"done":true}"#,
    ]))
    .inspect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let summary = assemble(decode_chunks(body)).await.unwrap();
    assert_eq!(summary, "one two");
    assert_eq!(polled.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_whitespace_is_trimmed() {
    let body = lines(&[
        r#"{"message":{"content":"\n\n  Ada is a student."},"done":false}"#,
        r#"{"message":{"content":"  \n"},"done":true}"#,
    ]);

    let summary = assemble(decode_chunks(stream::iter(body))).await.unwrap();
    assert_eq!(summary, "Ada is a student.");
}

#[tokio::test]
async fn test_empty_body_gives_empty_summary() {
    let body: Vec<Result<Bytes, String>> = vec![];
    let summary = assemble(decode_chunks(stream::iter(body))).await.unwrap();
    assert!(summary.is_empty());
}

#[tokio::test]
async fn test_invalid_utf8_is_replaced_not_fatal() {
    let body: Vec<Result<Bytes, String>> = vec![
        Ok(Bytes::from_static(b"{\"message\":{\"content\":\"Hi \"},\"done\":false}\n")),
        Ok(Bytes::from_static(b"{\"message\":{\"content\":\"caf\xe9 \"},\"done\":false}\n")),
        Ok(Bytes::from_static(b"\xc3\x28\n")),
        Ok(Bytes::from_static(b"{\"message\":{\"content\":\"there.\"},\"done\":true}\n")),
    ];

    let summary = assemble(decode_chunks(stream::iter(body))).await.unwrap();
    assert_eq!(summary, "Hi caf\u{FFFD} there.");
}

#[tokio::test]
async fn test_null_done_keeps_fragment() {
    let body = lines(&[
        r#"{"message":{"content":"Hi "},"done":null}"#,
        r#"{"message":{"content":"there."},"done":true}"#,
    ]);

    let summary = assemble(decode_chunks(stream::iter(body))).await.unwrap();
    assert_eq!(summary, "Hi there.");
}

#[tokio::test]
async fn test_inband_error_is_protocol_error() {
    let body = lines(&[
        r#"{"message":{"content":"Hi "},"done":false}"#,
        r#"{"error":"model runner has unexpectedly stopped"}"#,
    ]);

    let err = assemble(decode_chunks(stream::iter(body))).await.unwrap_err();
    assert!(matches!(err, ServiceError::UpstreamProtocol(_)));
}

#[tokio::test]
async fn test_decoder_ends_after_error() {
    let body: Vec<Result<Bytes, String>> = vec![
        Err("reset".to_string()),
        Ok(Bytes::from_static(b"{\"message\":{\"content\":\"late\"}}\n")),
    ];

    let items: Vec<_> = decode_chunks(stream::iter(body)).collect().await;
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(ServiceError::UpstreamUnavailable(_))));
}
