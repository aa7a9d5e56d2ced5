use anyhow::Result;
use dotenvy::dotenv;
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use teloxide::update_listeners::Polling;
use tokio_util::sync::CancellationToken;

use gidra::callback::LabelRegistry;
use gidra::cli::{Cli, Commands};
use gidra::config;
use gidra::{create_bot, schema, setup_bot_commands, HandlerDeps, SessionStore};
use gidracore::cache::{RefreshCache, RefreshOutcome};
use gidracore::config as core_config;
use gidracore::sheets::GoogleSheetsClient;
use gidracore::tree::parse_rows;
use gidracore::{persist, start_refresh_scheduler, SheetProvider};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Main entry point for the Telegram guide bot.
///
/// # Errors
/// Returns an error if initialization fails (missing config, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    pretty_env_logger::init_timed();
    let _ = dotenv();

    match cli.command {
        Some(Commands::Run { webhook }) => {
            log::info!("Running bot (webhook: {})", webhook);
            run_bot(webhook).await
        }
        Some(Commands::Check) => run_check().await,
        None => {
            log::info!("No command specified, running bot in long polling mode");
            run_bot(false).await
        }
    }
}

/// Fetches the sheet once and prints what the bot would serve.
async fn run_check() -> Result<()> {
    let provider = build_provider()?;

    let version = provider.version_token().await?;
    let rows = provider.fetch_rows().await?;
    let (tree, stats) = parse_rows(&rows);

    println!("Sheet version: {}", version);
    println!(
        "Rows: {} total, {} skipped{}",
        stats.rows_total,
        stats.rows_skipped,
        if stats.header_stripped { " (header stripped)" } else { "" }
    );
    println!(
        "Tree: {} main button(s), {} submenu entr(ies), {} guide text(s)",
        tree.main_buttons().len(),
        tree.submenu_entry_count(),
        tree.guide_count()
    );
    for label in tree.main_buttons() {
        match tree.submenu(label) {
            Some(children) => println!("  {} -> {}", label, children.join(", ")),
            None => println!("  {}", label),
        }
    }
    Ok(())
}

async fn run_bot(use_webhook: bool) -> Result<()> {
    if config::BOT_TOKEN.is_empty() {
        anyhow::bail!("Missing required env: BOT_TOKEN");
    }
    let provider = build_provider()?;
    let cache = Arc::new(RefreshCache::new(provider));

    let snapshot_path = snapshot_path();

    // First load. A provider outage at startup is survivable as long as a
    // snapshot from a previous run exists.
    match cache.refresh(false).await {
        RefreshOutcome::Updated { .. } => {
            if let (Some(path), Some(snapshot)) = (&snapshot_path, cache.snapshot().await) {
                if let Err(e) = persist::save(path, &snapshot).await {
                    log::warn!("Failed to persist initial snapshot: {:#}", e);
                }
            }
        }
        outcome => {
            log::warn!("Initial guide load did not update: {:?}", outcome);
            if let Some(path) = &snapshot_path {
                match persist::load(path).await {
                    Ok(snapshot) => {
                        cache.seed_from_snapshot(snapshot).await;
                    }
                    Err(e) => log::warn!("No usable snapshot at {}: {:#}", path.display(), e),
                }
            }
        }
    }

    let shutdown = CancellationToken::new();
    let scheduler = start_refresh_scheduler(
        Arc::clone(&cache),
        core_config::refresh::interval(),
        snapshot_path.clone(),
        shutdown.clone(),
    );

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let deps = HandlerDeps {
        cache: Arc::clone(&cache),
        sessions: SessionStore::new(config::session::ttl()),
        labels: Arc::new(LabelRegistry::new()),
        snapshot_path,
    };
    let handler = schema(deps);

    if use_webhook {
        let Some(webhook_url) = config::WEBHOOK_URL.clone() else {
            anyhow::bail!("--webhook requires WEBHOOK_URL to be set");
        };
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], *config::WEBHOOK_PORT));
        let url = url::Url::parse(&webhook_url)?;
        log::info!("Starting bot in webhook mode at {} (listening on {})", url, addr);

        let (listener, stop_flag, router) = webhooks::axum_to_router(bot.clone(), webhooks::Options::new(addr, url))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to register webhook: {}", e))?;
        let router = router.route("/health", axum::routing::get(|| async { "ok" }));

        tokio::spawn(async move {
            let tcp = match tokio::net::TcpListener::bind(addr).await {
                Ok(tcp) => tcp,
                Err(e) => {
                    log::error!("Failed to bind webhook server on {}: {}", addr, e);
                    return;
                }
            };
            if let Err(e) = axum::serve(tcp, router).with_graceful_shutdown(stop_flag).await {
                log::error!("Webhook server error: {}", e);
            }
        });

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    } else {
        log::info!("Starting bot in long polling mode");
        let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    }

    // Dispatcher returned (ctrl-c): stop the scheduler and let any
    // in-flight provider call finish under its own timeouts.
    shutdown.cancel();
    let _ = scheduler.await;
    log::info!("Shutdown complete");
    Ok(())
}

fn build_provider() -> Result<Arc<GoogleSheetsClient>> {
    let sheet_id = core_config::SHEET_ID.clone();
    let api_key = core_config::API_KEY.clone();
    if sheet_id.is_empty() || api_key.is_empty() {
        anyhow::bail!("Missing required envs: GOOGLE_API_KEY, GOOGLE_SHEET_ID/SHEET_ID");
    }

    let client = GoogleSheetsClient::new(sheet_id, core_config::GUIDES_RANGE.clone(), SecretString::from(api_key))?;
    Ok(Arc::new(client))
}

fn snapshot_path() -> Option<PathBuf> {
    let path = core_config::SNAPSHOT_PATH.clone();
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}
