// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::cache::{Namespace, SetOptions};
use crate::cli::{LimitCommand, QueueCommand};
use tempfile::TempDir;

#[test]
fn test_context_open_creates_store_dir_and_uses_defaults() {
    let temp = TempDir::new().unwrap();
    let ctx = Context::open(temp.path(), OutputFormat::Text).unwrap();

    assert!(temp.path().join("store").is_dir());
    assert_eq!(ctx.config, Config::default());
    assert!(!ctx.is_json());
}

#[test]
fn test_context_open_rejects_bad_config() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.toml"), "[cache]\ncapacity = 0\n").unwrap();

    assert!(Context::open(temp.path(), OutputFormat::Text).is_err());
}

#[tokio::test]
async fn test_dispatch_queue_add_persists_to_file_store() {
    let temp = TempDir::new().unwrap();
    let add = QueueCommand::Add {
        content: "hello".into(),
        session: "s-1".into(),
        kind: "chat_message".into(),
        context: Some(r#"{"lang":"en"}"#.into()),
    };

    dispatch(Command::Queue { command: add }, temp.path(), OutputFormat::Json).await.unwrap();

    let ctx = Context::open(temp.path(), OutputFormat::Text).unwrap();
    let ops = ctx.queue().await.snapshot().await;
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].session_id, "s-1");
    assert_eq!(ops[0].context["lang"], "en");
}

#[tokio::test]
async fn test_dispatch_queue_remove_unknown_id_fails() {
    let temp = TempDir::new().unwrap();
    let remove = QueueCommand::Remove { id: "op-missing".into() };

    let err = dispatch(Command::Queue { command: remove }, temp.path(), OutputFormat::Text).await.unwrap_err();

    assert!(matches!(err, crate::error::Error::OperationNotFound(ref id) if id == "op-missing"));
}

#[tokio::test]
async fn test_components_share_one_store() {
    let temp = TempDir::new().unwrap();
    let ctx = Context::open(temp.path(), OutputFormat::Text).unwrap();

    ctx.cache().set(Namespace::User, "name", &"ada", SetOptions::default()).await.unwrap();
    dispatch(Command::Limit { command: LimitCommand::Record { action: "chat".into() } }, temp.path(), OutputFormat::Text)
        .await
        .unwrap();

    let keys = ctx.store.keys_with_prefix("").await.unwrap();
    assert_eq!(keys, vec!["cache:user:name".to_string(), "ratelimit:chat".to_string()]);
}
