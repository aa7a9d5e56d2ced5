use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration for the guide pipeline

/// Spreadsheet id holding the guide content
/// Read from GOOGLE_SHEET_ID (SHEET_ID also accepted)
pub static SHEET_ID: Lazy<String> = Lazy::new(|| {
    env::var("GOOGLE_SHEET_ID")
        .or_else(|_| env::var("SHEET_ID"))
        .unwrap_or_else(|_| String::new())
});

/// Google API key with read access to the sheet and its Drive metadata
/// Read from GOOGLE_API_KEY
pub static API_KEY: Lazy<String> = Lazy::new(|| env::var("GOOGLE_API_KEY").unwrap_or_else(|_| String::new()));

/// Range of the sheet that holds (parent, button, text) rows
/// Read from GUIDES_RANGE, defaults to the Guides tab
pub static GUIDES_RANGE: Lazy<String> =
    Lazy::new(|| env::var("GUIDES_RANGE").unwrap_or_else(|_| "Guides!A:C".to_string()));

/// Path of the last-known-good tree snapshot
/// Read from SNAPSHOT_PATH; empty string disables snapshotting
pub static SNAPSHOT_PATH: Lazy<String> =
    Lazy::new(|| env::var("SNAPSHOT_PATH").unwrap_or_else(|_| "guides_snapshot.json".to_string()));

/// Refresh cadence and staleness
pub mod refresh {
    use super::{env, Duration, Lazy};

    /// Interval between scheduled background refreshes (in seconds)
    pub static INTERVAL_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("REFRESH_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300)
    });

    /// Age after which the served tree is reported as stale (in seconds)
    pub static STALE_AFTER_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("STALE_AFTER_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1800)
    });

    /// Scheduled refresh interval
    pub fn interval() -> Duration {
        Duration::from_secs(*INTERVAL_SECS)
    }

    /// Staleness threshold
    pub fn stale_after() -> Duration {
        Duration::from_secs(*STALE_AFTER_SECS)
    }
}

/// Provider network timeouts
pub mod network {
    use super::Duration;

    /// Connect-phase timeout (in seconds)
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Total-call timeout (in seconds)
    pub const TOTAL_TIMEOUT_SECS: u64 = 30;

    /// Connect-phase timeout
    pub fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_TIMEOUT_SECS)
    }

    /// Total-call timeout
    pub fn total_timeout() -> Duration {
        Duration::from_secs(TOTAL_TIMEOUT_SECS)
    }
}
