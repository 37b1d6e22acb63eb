// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::{print_json, Context};
use crate::cache::{Namespace, SetOptions};
use crate::cli::CacheCommand;
use crate::error::{Error, Result};

pub async fn run(ctx: &Context, command: CacheCommand) -> Result<()> {
    let cache = ctx.cache();
    match command {
        CacheCommand::Get { namespace, key } => {
            let entry = cache.get_entry(namespace, &key).await.ok_or_else(|| Error::NotCached(namespace.key(&key)))?;
            if ctx.is_json() {
                return print_json(&entry);
            }
            println!("{}", render_value(&entry.value));
        }
        CacheCommand::Set { namespace, key, value, ttl } => {
            let ttl = parse_ttl(ttl)?;
            let value = parse_value(&value);
            cache.set(namespace, &key, &value, SetOptions { ttl }).await?;
            report(ctx, "set", &namespace.key(&key))?;
        }
        CacheCommand::Remove { namespace, key } => {
            cache.remove(namespace, &key).await;
            report(ctx, "removed", &namespace.key(&key))?;
        }
        CacheCommand::Clear { namespace: Some(namespace) } => {
            cache.clear(namespace).await;
            report(ctx, "cleared", namespace.as_str())?;
        }
        CacheCommand::Clear { namespace: None } => {
            cache.clear_all().await;
            let all: Vec<&str> = Namespace::ALL.iter().map(|ns| ns.as_str()).collect();
            report(ctx, "cleared", &all.join(", "))?;
        }
        CacheCommand::Prune => {
            let removed = cache.prune_expired().await;
            if ctx.is_json() {
                return print_json(&serde_json::json!({ "pruned": removed }));
            }
            println!("Pruned {} expired entries", removed);
        }
    }
    Ok(())
}

fn report(ctx: &Context, action: &str, target: &str) -> Result<()> {
    if ctx.is_json() {
        let mut body = serde_json::Map::new();
        body.insert(action.to_string(), target.into());
        return print_json(&body);
    }
    let mut verb = action.to_string();
    if let Some(first) = verb.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    println!("{} {}", verb, target);
    Ok(())
}

/// Values that parse as JSON are stored as JSON; anything else as a string.
pub(crate) fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

pub(crate) fn parse_ttl(secs: Option<u64>) -> Result<Option<Duration>> {
    match secs {
        Some(0) => Err(Error::InvalidValue { field: "ttl", reason: "must be at least 1 second".to_string() }),
        secs => Ok(secs.map(Duration::from_secs)),
    }
}

/// Strings print bare; everything else as compact JSON.
pub(crate) fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
