// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::{print_json, Context};
use crate::cli::LimitCommand;
use crate::error::Result;
use crate::limiter::{RateDecision, RateLimitStatus};

pub async fn run(ctx: &Context, command: LimitCommand) -> Result<()> {
    let limiter = ctx.limiter();
    match command {
        LimitCommand::Check { action } => {
            let decision = limiter.can_make_request(&action).await;
            if ctx.is_json() {
                return print_json(&decision);
            }
            println!("{}", render_decision(&action, &decision));
        }
        LimitCommand::Record { action } => {
            limiter.record_request(&action).await;
            let status = limiter.get_status(&action).await;
            if ctx.is_json() {
                return print_json(&status);
            }
            println!("{}", render_status(&status));
        }
        LimitCommand::Status { action } => {
            let actions = match action {
                Some(action) => vec![action],
                None => limiter.policies().keys().cloned().collect(),
            };
            let mut statuses = Vec::with_capacity(actions.len());
            for action in &actions {
                statuses.push(limiter.get_status(action).await);
            }
            if ctx.is_json() {
                return print_json(&statuses);
            }
            for status in &statuses {
                println!("{}", render_status(status));
            }
        }
        LimitCommand::Reset { action: Some(action) } => {
            limiter.reset(&action).await;
            if ctx.is_json() {
                return print_json(&serde_json::json!({ "reset": action }));
            }
            println!("Reset {}", action);
        }
        LimitCommand::Reset { action: None } => {
            limiter.reset_all().await;
            if ctx.is_json() {
                return print_json(&serde_json::json!({ "reset_all": true }));
            }
            println!("Reset all actions");
        }
    }
    Ok(())
}

pub(crate) fn render_decision(action: &str, decision: &RateDecision) -> String {
    if decision.allowed {
        return format!("{}: allowed ({} remaining)", action, decision.remaining_requests);
    }
    match &decision.message {
        Some(message) => format!("{}: denied. {}", action, message),
        None => format!("{}: denied", action),
    }
}

pub(crate) fn render_status(status: &RateLimitStatus) -> String {
    let mut line = format!(
        "{}: {}/{} used in {}s window",
        status.action, status.used, status.max_requests, status.window_secs
    );
    if let Some(ms) = status.cooldown_remaining_ms {
        line.push_str(&format!(", cooling down for {}s", ms.div_ceil(1000)));
    }
    line
}

#[cfg(test)]
#[path = "limit_tests.rs"]
mod tests;
