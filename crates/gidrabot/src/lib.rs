//! Gidra - Telegram bot serving guide content from a Google Sheet
//!
//! The heavy lifting (sheet client, tree parsing, refresh cache, retry)
//! lives in `gidracore`; this crate adds everything Telegram-facing:
//! sessions behind the shared access code, keyboards, the callback codec
//! and the dispatcher wiring.
//!
//! # Module Structure
//!
//! - `bot`: bot instance creation and command registration
//! - `handlers`: dispatcher schema, message and callback handlers
//! - `session`: passcode sessions with TTL expiry
//! - `callback`: tagged callback payload codec with hash registry
//! - `menu`: keyboard builders
//! - `media`: guide delivery (albums, gifs, documents, text)

pub mod bot;
pub mod callback;
pub mod cli;
pub mod config;
pub mod handlers;
pub mod media;
pub mod menu;
pub mod session;

// Re-export commonly used types for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use session::SessionStore;
