//! Refresh cache: serves the current guide tree while coordinating
//! at-most-one-in-flight refresh against the spreadsheet provider.
//!
//! Readers never touch the network: [`RefreshCache::current`] hands out the
//! last successfully parsed tree behind an `Arc`, and a refresh replaces
//! that pointer in one motion under a write lock held only for the swap.
//! A failed refresh leaves the previous tree serving, so the bot degrades
//! to stale content instead of an empty menu.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::config;
use crate::error::ProviderError;
use crate::metrics;
use crate::persist::TreeSnapshot;
use crate::retry::{retry, RetryConfig, RetryError};
use crate::sheets::SheetProvider;
use crate::tree::{parse_rows, GuideTree};

/// What a single refresh attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Rows were fetched, parsed and swapped in.
    Updated { main_buttons: usize, guides: usize },
    /// The provider's version token matched the cached one; no row fetch.
    Unchanged,
    /// The provider failed after retries; the previous tree is untouched.
    Failed(String),
}

struct CacheState {
    tree: Arc<GuideTree>,
    version: Option<String>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// The only shared mutable resource of the pipeline.
///
/// Built once at startup with an injected provider and passed by `Arc` to
/// the handlers and the scheduler.
pub struct RefreshCache {
    provider: Arc<dyn SheetProvider>,
    version_retry: RetryConfig,
    fetch_retry: RetryConfig,
    stale_after: Duration,
    state: RwLock<CacheState>,
    // Serializes whole refresh attempts; never guards reads.
    refresh_gate: Mutex<()>,
}

impl RefreshCache {
    /// Creates an empty cache around a provider, with the workspace
    /// default retry configs and staleness threshold.
    pub fn new(provider: Arc<dyn SheetProvider>) -> Self {
        Self {
            provider,
            version_retry: RetryConfig::version_probe(),
            fetch_retry: RetryConfig::sheet_fetch(),
            stale_after: config::refresh::stale_after(),
            state: RwLock::new(CacheState {
                tree: Arc::new(GuideTree::default()),
                version: None,
                refreshed_at: None,
            }),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Overrides both retry configs.
    #[must_use]
    pub fn with_retry_configs(mut self, version: RetryConfig, fetch: RetryConfig) -> Self {
        self.version_retry = version;
        self.fetch_retry = fetch;
        self
    }

    /// Overrides the staleness threshold.
    #[must_use]
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// The currently served tree. Never blocks on the network; possibly
    /// stale, possibly empty if nothing was ever loaded.
    pub async fn current(&self) -> Arc<GuideTree> {
        self.state.read().await.tree.clone()
    }

    /// The cached provider version token.
    pub async fn version(&self) -> Option<String> {
        self.state.read().await.version.clone()
    }

    /// When the served tree was last replaced (or seeded).
    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.refreshed_at
    }

    /// Age of the served tree, if one was ever loaded.
    pub async fn staleness(&self) -> Option<Duration> {
        let refreshed_at = self.state.read().await.refreshed_at?;
        Some((Utc::now() - refreshed_at).to_std().unwrap_or_default())
    }

    /// True when the served tree is older than the configured threshold.
    /// Serving continues regardless; this is an observability signal.
    pub async fn is_stale(&self) -> bool {
        match self.staleness().await {
            Some(age) => age > self.stale_after,
            None => false,
        }
    }

    /// Refreshes the tree from the provider.
    ///
    /// With `force = false` and a known version token, a cheap metadata
    /// probe short-circuits to [`RefreshOutcome::Unchanged`] when nothing
    /// changed upstream, skipping the row fetch and re-parse entirely.
    /// Errors never propagate: every provider failure becomes
    /// [`RefreshOutcome::Failed`] and the previous tree stays in place.
    ///
    /// Concurrent callers are serialized; a caller that waited out another
    /// refresh typically lands on the unchanged path right after it.
    pub async fn refresh(&self, force: bool) -> RefreshOutcome {
        let _gate = self.refresh_gate.lock().await;

        let cached_version = self.state.read().await.version.clone();

        let mut remote_version: Option<String> = None;
        if !force {
            if let Some(cached) = cached_version.as_deref() {
                match retry(&self.version_retry, || self.provider.version_token()).await.result {
                    Ok(remote) => {
                        if remote == cached {
                            metrics::REFRESH_TOTAL.with_label_values(&["unchanged"]).inc();
                            return RefreshOutcome::Unchanged;
                        }
                        remote_version = Some(remote);
                    }
                    Err(err) => return self.record_failure(err),
                }
            }
        }

        // The probe already told us the remote version on the changed path;
        // only the cold start and forced reloads need to ask again.
        let version = match remote_version {
            Some(v) => v,
            None => match retry(&self.version_retry, || self.provider.version_token()).await.result {
                Ok(v) => v,
                Err(err) => return self.record_failure(err),
            },
        };

        let rows = match retry(&self.fetch_retry, || self.provider.fetch_rows()).await.result {
            Ok(rows) => rows,
            Err(err) => return self.record_failure(err),
        };

        if rows.is_empty() {
            // An empty range is more likely a half-edited sheet than an
            // intentional wipe; keep serving the previous tree.
            log::warn!("Provider returned no rows for the guides range, keeping previous tree");
            metrics::REFRESH_TOTAL.with_label_values(&["failed"]).inc();
            return RefreshOutcome::Failed("provider returned no rows".to_string());
        }

        let (tree, stats) = parse_rows(&rows);
        if stats.rows_skipped > 0 {
            log::warn!(
                "Skipped {} malformed row(s) of {}",
                stats.rows_skipped,
                stats.rows_total
            );
        }

        let tree = Arc::new(tree);
        {
            // Held only for the pointer swap, never across provider I/O.
            let mut state = self.state.write().await;
            state.tree = Arc::clone(&tree);
            state.version = Some(version);
            state.refreshed_at = Some(Utc::now());
        }

        metrics::REFRESH_TOTAL.with_label_values(&["updated"]).inc();
        metrics::TREE_MAIN_BUTTONS.set(tree.main_buttons().len() as i64);
        metrics::TREE_GUIDES.set(tree.guide_count() as i64);
        log::info!(
            "Guides loaded: {} main, {} sub",
            tree.main_buttons().len(),
            tree.submenu_entry_count()
        );

        RefreshOutcome::Updated {
            main_buttons: tree.main_buttons().len(),
            guides: tree.guide_count(),
        }
    }

    /// Exports the served tree for snapshot persistence. `None` while the
    /// cache has never been filled.
    pub async fn snapshot(&self) -> Option<TreeSnapshot> {
        let state = self.state.read().await;
        if state.tree.is_empty() {
            return None;
        }
        Some(TreeSnapshot {
            tree: (*state.tree).clone(),
            version: state.version.clone(),
            captured_at: state.refreshed_at.unwrap_or_else(Utc::now),
        })
    }

    /// Seeds an empty cache from a persisted snapshot. Returns false when
    /// the cache already holds a live tree (the snapshot is then ignored,
    /// live data always wins).
    pub async fn seed_from_snapshot(&self, snapshot: TreeSnapshot) -> bool {
        let mut state = self.state.write().await;
        if !state.tree.is_empty() {
            return false;
        }

        log::info!(
            "Seeding cache from snapshot captured at {} ({} main buttons)",
            snapshot.captured_at,
            snapshot.tree.main_buttons().len()
        );
        metrics::TREE_MAIN_BUTTONS.set(snapshot.tree.main_buttons().len() as i64);
        metrics::TREE_GUIDES.set(snapshot.tree.guide_count() as i64);

        state.tree = Arc::new(snapshot.tree);
        state.version = snapshot.version;
        state.refreshed_at = Some(snapshot.captured_at);
        true
    }

    fn record_failure(&self, err: RetryError<ProviderError>) -> RefreshOutcome {
        let RetryError::MaxRetriesExhausted { last_error, .. } = err;

        if last_error.is_fatal() {
            log::error!("Guide refresh failed: {}", last_error);
        } else {
            log::warn!("Guide refresh failed after retries: {}", last_error);
        }
        metrics::REFRESH_TOTAL.with_label_values(&["failed"]).inc();
        RefreshOutcome::Failed(last_error.to_string())
    }
}
