//! Command line interface definitions.

use clap::{Parser, Subcommand};

/// Gidra - Telegram guide bot backed by a Google Sheet
#[derive(Parser, Debug)]
#[command(name = "gidra", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bot (long polling by default)
    Run {
        /// Serve Telegram updates over the webhook HTTP server
        #[arg(long)]
        webhook: bool,
    },
    /// Fetch the sheet once and print tree diagnostics, then exit
    Check,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
