// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::limiter::RateLimitPolicy;
use tempfile::TempDir;

#[test]
fn test_effective_config_includes_builtin_limits() {
    let config = effective(Config::default());
    let actions: Vec<&str> = config.rate_limits.keys().map(String::as_str).collect();
    assert_eq!(actions, vec!["api", "auth", "chat", "ocr"]);
}

#[test]
fn test_effective_config_keeps_overrides() {
    let mut config = Config::default();
    config.rate_limits.insert("chat".into(), RateLimitPolicy::new(1, 5, None));

    let config = effective(config);

    assert_eq!(config.rate_limits["chat"], RateLimitPolicy::new(1, 5, None));
    assert_eq!(config.rate_limits.len(), 4);
}

#[test]
fn test_show_and_path_succeed_without_config_file() {
    let temp = TempDir::new().unwrap();
    run(ConfigCommand::Show, temp.path(), OutputFormat::Text).unwrap();
    run(ConfigCommand::Show, temp.path(), OutputFormat::Json).unwrap();
    run(ConfigCommand::Path, temp.path(), OutputFormat::Text).unwrap();
    // Showing config never creates the store
    assert!(!temp.path().join("store").exists());
}
