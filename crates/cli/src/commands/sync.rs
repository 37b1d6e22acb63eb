// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::{print_json, Context};
use crate::error::{Error, Result};
use crate::session::{Session, SessionDeps};
use crate::sync::{ConnectivityHandle, DropReason, HttpProbe, HttpTransport, SkipReason, SyncReport};

pub async fn run(ctx: &Context) -> Result<()> {
    let base_url = ctx.config.transport.base_url.as_deref().ok_or(Error::NotConfigured("transport.base_url"))?;
    let transport = HttpTransport::new(base_url, ctx.config.transport.timeout())?;

    let online = match ctx.config.probe_url() {
        Some(url) => {
            let probe = HttpProbe::new(url, ctx.config.connectivity.interval(), ctx.config.connectivity.timeout())?;
            probe.probe().await
        }
        None => true,
    };

    let deps = SessionDeps {
        store: Arc::clone(&ctx.store),
        transport: Arc::new(transport),
        connectivity: Arc::new(ConnectivityHandle::new(online)),
        clock: Arc::clone(&ctx.clock),
    };
    let session = Session::open(deps, &ctx.config).await;
    let report = session.trigger_sync().await;

    if ctx.is_json() {
        return print_json(&report);
    }
    print!("{}", render_report(&report));
    Ok(())
}

pub(crate) fn render_report(report: &SyncReport) -> String {
    match report.skipped {
        Some(SkipReason::Offline) => {
            return format!("Backend unreachable; {} operations remain queued\n", report.remaining);
        }
        Some(SkipReason::InFlight) => return "A sync is already running\n".to_string(),
        None => {}
    }

    let mut out = format!(
        "Synced {}, failed {}, dropped {}, remaining {}\n",
        report.synced,
        report.failed,
        report.dropped.len(),
        report.remaining
    );
    if report.interrupted {
        out.push_str("Stopped early: connectivity lost\n");
    }
    for failure in report.errors.iter().filter(|f| !f.permanent) {
        out.push_str(&format!("  retry  {}  (attempt {}): {}\n", failure.id, failure.retry_count, failure.error));
    }
    for dropped in &report.dropped {
        let why = match &dropped.reason {
            DropReason::MaxRetries { attempts } => format!("gave up after {} attempts", attempts),
            DropReason::Rejected { message } => format!("rejected: {}", message),
        };
        out.push_str(&format!("  dropped  {}  {}: {}\n", dropped.operation.id, why, dropped.operation.content));
    }
    out
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
