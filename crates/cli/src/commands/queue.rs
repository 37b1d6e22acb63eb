// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tether_core::{NewOperation, QueuedOperation};

use super::{print_json, Context};
use crate::cli::QueueCommand;
use crate::error::{Error, Result};

pub async fn run(ctx: &Context, command: QueueCommand) -> Result<()> {
    match command {
        QueueCommand::List => list(ctx).await,
        QueueCommand::Add { content, session, kind, context } => add(ctx, content, session, kind, context).await,
        QueueCommand::Remove { id } => remove(ctx, &id).await,
        QueueCommand::Clear => clear(ctx).await,
    }
}

async fn list(ctx: &Context) -> Result<()> {
    let ops = ctx.queue().await.snapshot().await;
    if ctx.is_json() {
        return print_json(&ops);
    }
    print!("{}", render_list(&ops));
    Ok(())
}

async fn add(ctx: &Context, content: String, session: String, kind: String, context: Option<String>) -> Result<()> {
    let mut op = NewOperation::chat_message(session, content).with_kind(kind);
    if let Some(context) = context {
        op = op.with_context(parse_context(&context)?);
    }

    let id = ctx.queue().await.enqueue(op).await;
    if ctx.is_json() {
        return print_json(&serde_json::json!({ "id": id }));
    }
    println!("{}", id);
    Ok(())
}

async fn remove(ctx: &Context, id: &str) -> Result<()> {
    if !ctx.queue().await.remove(id).await {
        return Err(Error::OperationNotFound(id.to_string()));
    }
    if ctx.is_json() {
        return print_json(&serde_json::json!({ "removed": id }));
    }
    println!("Removed {}", id);
    Ok(())
}

async fn clear(ctx: &Context) -> Result<()> {
    let discarded = ctx.queue().await.clear().await;
    if ctx.is_json() {
        return print_json(&discarded);
    }
    println!("Discarded {} pending {}", discarded.len(), plural(discarded.len(), "operation"));
    Ok(())
}

/// Parse `--context`, which must be a JSON object.
pub(crate) fn parse_context(raw: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| Error::InvalidValue { field: "context", reason: e.to_string() })?;
    if !value.is_object() {
        return Err(Error::InvalidValue { field: "context", reason: "must be a JSON object".to_string() });
    }
    Ok(value)
}

pub(crate) fn render_list(ops: &[QueuedOperation]) -> String {
    if ops.is_empty() {
        return "No pending operations\n".to_string();
    }

    let mut out = String::new();
    for op in ops {
        out.push_str(&format!(
            "{}  {}  {}  retries={}  {}\n",
            op.id,
            op.created_at.format("%Y-%m-%d %H:%M:%S"),
            op.kind,
            op.retry_count,
            op.content
        ));
    }
    out.push_str(&format!("{} pending {}\n", ops.len(), plural(ops.len(), "operation")));
    out
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
