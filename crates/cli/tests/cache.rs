// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;

#[test]
fn cache_set_then_get_string() {
    let temp = TempDir::new().unwrap();
    tether(temp.path())
        .args(["cache", "set", "user", "name", "ada"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set cache:user:name"));

    tether(temp.path()).args(["cache", "get", "user", "name"]).assert().success().stdout("ada\n");
}

#[test]
fn cache_set_json_value() {
    let temp = TempDir::new().unwrap();
    tether(temp.path()).args(["cache", "set", "api", "stats", r#"{"xp":10}"#]).assert().success();

    let entry = json_output(temp.path(), &["cache", "get", "api", "stats"]);
    assert_eq!(entry["key"], "cache:api:stats");
    assert_eq!(entry["value"]["xp"], 10);
    assert_eq!(entry["ttlMs"], 300_000);
    assert!(entry["writtenAt"].is_u64());
}

#[test]
fn cache_set_with_ttl_override() {
    let temp = TempDir::new().unwrap();
    tether(temp.path()).args(["cache", "set", "temp", "token", "abc", "--ttl", "3600"]).assert().success();

    let entry = json_output(temp.path(), &["cache", "get", "temp", "token"]);
    assert_eq!(entry["ttlMs"], 3_600_000);
}

#[test]
fn cache_zero_ttl_is_rejected() {
    let temp = TempDir::new().unwrap();
    tether(temp.path())
        .args(["cache", "set", "temp", "token", "abc", "--ttl", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid ttl"));
}

#[test]
fn cache_get_missing_fails() {
    let temp = TempDir::new().unwrap();
    tether(temp.path())
        .args(["cache", "get", "user", "nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not cached: cache:user:nobody"));
}

#[test]
fn cache_unknown_namespace_fails() {
    let temp = TempDir::new().unwrap();
    tether(temp.path())
        .args(["cache", "get", "misc", "k"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid namespace"));
}

#[test]
fn cache_remove_key() {
    let temp = TempDir::new().unwrap();
    tether(temp.path()).args(["cache", "set", "user", "name", "ada"]).assert().success();
    tether(temp.path()).args(["cache", "remove", "user", "name"]).assert().success();
    tether(temp.path()).args(["cache", "get", "user", "name"]).assert().failure();
}

#[test]
fn cache_clear_one_namespace_keeps_others() {
    let temp = TempDir::new().unwrap();
    tether(temp.path()).args(["cache", "set", "user", "name", "ada"]).assert().success();
    tether(temp.path()).args(["cache", "set", "api", "feed", "[1,2]"]).assert().success();

    tether(temp.path())
        .args(["cache", "clear", "api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared api"));

    tether(temp.path()).args(["cache", "get", "api", "feed"]).assert().failure();
    tether(temp.path()).args(["cache", "get", "user", "name"]).assert().success();
}

#[test]
fn cache_clear_all_keeps_queue() {
    let temp = TempDir::new().unwrap();
    queue_add(temp.path(), "pending");
    tether(temp.path()).args(["cache", "set", "user", "name", "ada"]).assert().success();

    tether(temp.path()).args(["cache", "clear"]).assert().success();

    tether(temp.path()).args(["cache", "get", "user", "name"]).assert().failure();
    let ops = json_output(temp.path(), &["queue", "list"]);
    assert_eq!(ops.as_array().unwrap().len(), 1);
}

#[test]
fn cache_prune_reports_count() {
    let temp = TempDir::new().unwrap();
    tether(temp.path()).args(["cache", "set", "user", "name", "ada"]).assert().success();

    let pruned = json_output(temp.path(), &["cache", "prune"]);
    assert_eq!(pruned["pruned"], 0);
}
