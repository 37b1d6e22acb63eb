// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::TimeZone;
use serde_json::json;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

#[test]
fn new_operation_defaults_to_chat_message() {
    let op = NewOperation::chat_message("s-1", "hello");
    assert_eq!(op.kind, DEFAULT_KIND);
    assert_eq!(op.context, json!({}));
}

#[test]
fn queued_operation_starts_with_zero_retries() {
    let op = QueuedOperation::new(NewOperation::chat_message("s-1", "hi"), at(1_700_000_000));
    assert_eq!(op.retry_count, 0);
    assert!(op.id.starts_with("op-"));
    assert_eq!(op.id.len(), "op-".len() + 12);
}

#[test]
fn identical_payloads_get_distinct_ids() {
    let a = QueuedOperation::new(NewOperation::chat_message("s-1", "same"), at(5));
    let b = QueuedOperation::new(NewOperation::chat_message("s-1", "same"), at(5));
    assert_ne!(a.id, b.id);
}

#[test]
fn envelope_uses_camel_case_fields() {
    let op = QueuedOperation::new(
        NewOperation::chat_message("s-9", "what is 2+2?").with_context(json!({"subject": "math"})),
        at(1_700_000_000),
    );
    let value: serde_json::Value = serde_json::from_str(&op.to_json().unwrap()).unwrap();

    assert_eq!(value["sessionId"], "s-9");
    assert_eq!(value["retryCount"], 0);
    assert_eq!(value["context"]["subject"], "math");
    assert_eq!(value["createdAt"], "2023-11-14T22:13:20Z");
}

#[test]
fn envelope_without_kind_or_retry_count_decodes_with_defaults() {
    let json = r#"{"id":"op-abc","sessionId":"s","content":"c","context":{},"createdAt":"2026-01-01T00:00:00Z"}"#;
    let op = QueuedOperation::from_json(json).unwrap();
    assert_eq!(op.kind, DEFAULT_KIND);
    assert_eq!(op.retry_count, 0);
}

#[test]
fn malformed_envelope_is_a_json_error() {
    let err = QueuedOperation::from_json("{\"id\": 3}").unwrap_err();
    assert!(matches!(err, crate::Error::Json(_)));
}
