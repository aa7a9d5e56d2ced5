//! Background refresh scheduler.
//!
//! One cancellable task owns the periodic refresh cadence; the cache keeps
//! its own on-demand path for user-triggered reloads. Scheduled refreshes
//! are fire-and-forget: outcomes are logged, never surfaced to chats.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::cache::{RefreshCache, RefreshOutcome};
use crate::metrics;
use crate::persist;

/// Starts the periodic refresh task.
///
/// Each tick runs one non-forced refresh (the version probe makes idle
/// ticks cheap), persists the snapshot after an update, and reports
/// staleness when the provider has been failing for longer than the
/// cache's threshold. Cancel the token to stop; an in-flight provider call
/// finishes under its own timeouts rather than being aborted mid-parse.
pub fn start_refresh_scheduler(
    cache: Arc<RefreshCache>,
    every: Duration,
    snapshot_path: Option<PathBuf>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        log::info!("Refresh scheduler started (interval: {:?})", every);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    log::info!("Refresh scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let outcome = cache.refresh(false).await;
            match &outcome {
                RefreshOutcome::Updated { main_buttons, guides } => {
                    log::info!("Scheduled refresh: updated ({} main, {} guides)", main_buttons, guides);
                    if let Some(path) = &snapshot_path {
                        if let Some(snapshot) = cache.snapshot().await {
                            if let Err(e) = persist::save(path, &snapshot).await {
                                log::warn!("Failed to persist snapshot: {:#}", e);
                            }
                        }
                    }
                }
                RefreshOutcome::Unchanged => log::debug!("Scheduled refresh: unchanged"),
                RefreshOutcome::Failed(reason) => log::warn!("Scheduled refresh failed: {}", reason),
            }

            if let Some(age) = cache.staleness().await {
                metrics::TREE_AGE_SECONDS.set(age.as_secs() as i64);
                if cache.is_stale().await {
                    log::warn!("Serving stale guide tree, age {:?}", age);
                }
            }
        }
    })
}
