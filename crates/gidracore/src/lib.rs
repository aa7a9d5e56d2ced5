//! Gidracore - sheet-backed guide tree for the Gidra Telegram bot
//!
//! This library holds everything that does not depend on Telegram:
//! fetching rows from the spreadsheet provider, parsing them into the
//! two-level button tree, caching the parsed tree with change detection,
//! and the retry policy around provider calls.
//!
//! # Module Structure
//!
//! - `sheets`: provider trait and the Google Sheets REST client
//! - `tree`: row parsing and the guide tree value
//! - `cache`: refresh cache with version-token short-circuit
//! - `resolver`: label resolution for the menu layer
//! - `retry`: bounded exponential backoff for provider calls
//! - `persist`: last-known-good snapshot on disk
//! - `scheduler`: cancellable periodic refresh task

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod persist;
pub mod resolver;
pub mod retry;
pub mod scheduler;
pub mod sheets;
pub mod tree;

// Re-export commonly used types for convenience
pub use cache::{RefreshCache, RefreshOutcome};
pub use error::ProviderError;
pub use persist::TreeSnapshot;
pub use resolver::{resolve, Resolution};
pub use retry::{retry, RetryConfig, Retryable};
pub use scheduler::start_refresh_scheduler;
pub use sheets::{GoogleSheetsClient, SheetProvider};
pub use tree::{parse_rows, GuideTree, ParseStats};
