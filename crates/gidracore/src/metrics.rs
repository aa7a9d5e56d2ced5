//! Prometheus metrics for the guide refresh pipeline.
//!
//! Registration failures are programmer errors (duplicate metric names),
//! so the registration unwraps are acceptable here.
#![allow(clippy::unwrap_used)]

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, register_int_gauge, IntCounterVec, IntGauge};

/// Refresh attempts by outcome.
/// Labels: outcome (updated/unchanged/failed)
pub static REFRESH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "gidra_refresh_total",
        "Total number of guide refresh attempts by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Provider call retries.
/// Labels: attempt (1, 2, ...)
pub static PROVIDER_RETRIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "gidra_provider_retries_total",
        "Total number of retried provider calls by attempt number",
        &["attempt"]
    )
    .unwrap()
});

/// Number of top-level buttons in the currently served tree.
pub static TREE_MAIN_BUTTONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("gidra_tree_main_buttons", "Top-level buttons in the served guide tree").unwrap()
});

/// Number of guide texts in the currently served tree.
pub static TREE_GUIDES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("gidra_tree_guides", "Guide texts in the served guide tree").unwrap()
});

/// Age of the served tree in seconds, updated by the scheduler.
pub static TREE_AGE_SECONDS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("gidra_tree_age_seconds", "Seconds since the last successful refresh").unwrap()
});
