use lazy_regex::regex;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable.
/// Hosting panels love to hand tokens over quoted or with whitespace, so
/// the raw value is reduced to the `digits:base64ish` core first.
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    let raw = env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new());
    clean_token(&raw).unwrap_or_default()
});

/// Webhook URL for Telegram updates
/// Read from WEBHOOK_URL environment variable
pub static WEBHOOK_URL: Lazy<Option<String>> = Lazy::new(|| env::var("WEBHOOK_URL").ok());

/// Port the webhook HTTP server binds to
/// Read from WEBHOOK_PORT, default 8080
pub static WEBHOOK_PORT: Lazy<u16> = Lazy::new(|| {
    env::var("WEBHOOK_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080)
});

/// Shared access code that opens a session
/// Read from ACCESS_CODE environment variable
pub static ACCESS_CODE: Lazy<String> = Lazy::new(|| env::var("ACCESS_CODE").unwrap_or_else(|_| "infobot".to_string()));

/// Extracts a Telegram bot token from a possibly decorated env value.
pub fn clean_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('"').trim_matches('\'');
    regex!(r"\d+:[A-Za-z0-9_-]+")
        .find(trimmed)
        .map(|m| m.as_str().to_string())
}

/// Session configuration
pub mod session {
    use super::{env, Duration, Lazy};

    /// How long one access-code entry stays valid (in seconds)
    pub static TTL_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1800)
    });

    /// Session lifetime
    pub fn ttl() -> Duration {
        Duration::from_secs(*TTL_SECS)
    }
}

/// Telegram network configuration
pub mod network {
    use super::Duration;

    /// Timeout for Telegram API calls (in seconds)
    pub const TIMEOUT_SECS: u64 = 60;

    /// Telegram API call timeout
    pub fn timeout() -> Duration {
        Duration::from_secs(TIMEOUT_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_token_strips_quotes_and_spaces() {
        assert_eq!(
            clean_token(" \"123456:AAblahBLAH_token-x\" ").as_deref(),
            Some("123456:AAblahBLAH_token-x")
        );
    }

    #[test]
    fn test_clean_token_rejects_garbage() {
        assert_eq!(clean_token("not a token"), None);
        assert_eq!(clean_token(""), None);
    }
}
