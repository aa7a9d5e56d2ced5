//! Passcode sessions: user id → implicit expiry.
//!
//! In-memory only. A restart logs everyone out, which is acceptable for a
//! shared-code bot; /reload does the same on purpose.

use moka::future::Cache;
use std::time::Duration;
use teloxide::types::UserId;

/// TTL map of authorized users.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<u64, ()>,
}

impl SessionStore {
    /// Creates a store whose entries expire `ttl` after the grant.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Cache::builder().time_to_live(ttl).build(),
        }
    }

    /// Opens a session for the user.
    pub async fn grant(&self, user: UserId) {
        self.sessions.insert(user.0, ()).await;
        log::info!("Access granted to user {}", user.0);
    }

    /// True while the user's session has not expired.
    pub async fn has_access(&self, user: UserId) -> bool {
        self.sessions.contains_key(&user.0)
    }

    /// Drops every session at once (used by /reload).
    pub fn reset_all(&self) {
        self.sessions.invalidate_all();
        log::info!("All sessions reset");
    }
}
