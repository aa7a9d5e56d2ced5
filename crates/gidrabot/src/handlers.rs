//! Dispatcher schema and handler chain.
//!
//! Three branches in priority order: commands, plain messages (passcode
//! entry and main-menu button presses), callback queries (submenu
//! clicks). All user-facing failure paths keep serving whatever tree is
//! cached; nothing here ever propagates a provider error to Telegram.

use std::path::PathBuf;
use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{Message, ReplyMarkup};

use gidracore::cache::{RefreshCache, RefreshOutcome};
use gidracore::resolver::{resolve, Resolution};
use gidracore::tree::MISSING_TEXT_PLACEHOLDER;

use crate::bot::Command;
use crate::callback::{decode, CallbackAction, LabelRegistry};
use crate::config;
use crate::media::send_album_and_text;
use crate::menu::{back_keyboard, main_menu_keyboard, submenu_keyboard};
use crate::session::SessionStore;

const PROMPT_CODE: &str = "Введите код доступа.";
const ACCESS_EXPIRED: &str = "Доступ истёк. Введите код доступа.";
const USE_BUTTONS: &str = "Пожалуйста, используйте кнопки ⬇️";
const NOT_READY: &str = "Контент ещё не загружен. Попробуйте через минуту или отправьте /reload.";
const ITEM_GONE: &str = "Элемент не найден. Обновите меню (/reload).";

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub cache: Arc<RefreshCache>,
    pub sessions: SessionStore,
    pub labels: Arc<LabelRegistry>,
    pub snapshot_path: Option<PathBuf>,
}

/// Creates the dispatcher handler tree. The same schema is used in
/// production and in tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callbacks = deps;

    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                    let deps = deps_commands.clone();
                    async move { handle_command(&bot, &msg, cmd, &deps).await }
                }),
        )
        .branch(Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
            let deps = deps_messages.clone();
            async move { handle_message(&bot, &msg, &deps).await }
        }))
        .branch(Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
            let deps = deps_callbacks.clone();
            async move { handle_callback(&bot, q, &deps).await }
        }))
}

async fn handle_command(bot: &Bot, msg: &Message, cmd: Command, deps: &HandlerDeps) -> Result<(), HandlerError> {
    match cmd {
        Command::Start => {
            ensure_loaded(&deps.cache).await;
            let authorized = match msg.from.as_ref() {
                Some(user) => deps.sessions.has_access(user.id).await,
                None => false,
            };

            if !authorized {
                bot.send_message(msg.chat.id, PROMPT_CODE).await?;
                return Ok(());
            }

            let tree = deps.cache.current().await;
            if tree.is_empty() {
                bot.send_message(msg.chat.id, NOT_READY).await?;
            } else {
                bot.send_message(msg.chat.id, "Главное меню:")
                    .reply_markup(main_menu_keyboard(&tree))
                    .await?;
            }
        }
        Command::Reload => {
            let outcome = deps.cache.refresh(true).await;
            deps.sessions.reset_all();

            if matches!(outcome, RefreshOutcome::Updated { .. }) {
                persist_snapshot(deps).await;
            }

            bot.send_message(msg.chat.id, reload_reply_text(&outcome)).await?;
        }
    }
    Ok(())
}

async fn handle_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    ensure_loaded(&deps.cache).await;
    let tree = deps.cache.current().await;

    let Some(text) = msg.text() else {
        bot.send_message(chat_id, USE_BUTTONS).await?;
        return Ok(());
    };
    let text = text.trim();

    if !deps.sessions.has_access(user.id).await {
        if text == config::ACCESS_CODE.as_str() {
            deps.sessions.grant(user.id).await;
            if tree.is_empty() {
                bot.send_message(chat_id, NOT_READY).await?;
            } else {
                let minutes = *config::session::TTL_SECS / 60;
                bot.send_message(
                    chat_id,
                    format!("Доступ предоставлен на {} минут. Главное меню:", minutes),
                )
                .reply_markup(main_menu_keyboard(&tree))
                .await?;
            }
        } else {
            bot.send_message(chat_id, PROMPT_CODE).await?;
        }
        return Ok(());
    }

    if tree.is_empty() {
        bot.send_message(chat_id, NOT_READY).await?;
        return Ok(());
    }

    if tree.is_main_button(text) {
        match resolve(&tree, text) {
            Resolution::Submenu(children) => {
                bot.send_message(chat_id, format!("Выберите опцию для {}:", text))
                    .reply_markup(submenu_keyboard(children, &deps.labels))
                    .await?;
            }
            Resolution::Leaf(body) => {
                let markup = ReplyMarkup::Keyboard(main_menu_keyboard(&tree));
                send_album_and_text(bot, chat_id, body, markup).await;
            }
            Resolution::NotFound => {
                bot.send_message(chat_id, ITEM_GONE).await?;
            }
        }
    } else {
        bot.send_message(chat_id, USE_BUTTONS)
            .reply_markup(main_menu_keyboard(&tree))
            .await?;
    }
    Ok(())
}

async fn handle_callback(bot: &Bot, q: CallbackQuery, deps: &HandlerDeps) -> Result<(), HandlerError> {
    // Ack immediately so the button stops spinning even if we bail later.
    let _ = bot.answer_callback_query(q.id.clone()).await;

    ensure_loaded(&deps.cache).await;
    let tree = deps.cache.current().await;

    let chat_id = match q.message.as_ref() {
        Some(m) => m.chat().id,
        None => match i64::try_from(q.from.id.0) {
            Ok(id) => ChatId(id),
            Err(_) => return Ok(()),
        },
    };

    if !deps.sessions.has_access(q.from.id).await {
        bot.send_message(chat_id, ACCESS_EXPIRED).await?;
        return Ok(());
    }

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let Some(action) = decode(data, &deps.labels, &tree) else {
        log::warn!("Unknown callback data: {} ({} labels known)", data, tree.guide_count());
        bot.send_message(chat_id, ITEM_GONE).await?;
        return Ok(());
    };

    match action {
        CallbackAction::ShowSubmenu(parent) => match tree.submenu(&parent) {
            Some(children) => {
                bot.send_message(chat_id, format!("Выберите опцию для {}:", parent))
                    .reply_markup(submenu_keyboard(children, &deps.labels))
                    .await?;
            }
            None => {
                bot.send_message(chat_id, ITEM_GONE).await?;
            }
        },
        CallbackAction::ShowLeaf(label) => {
            let body = match tree.text(&label) {
                Some(body) => body.to_string(),
                None => {
                    // The label decoded but its text is gone: the sheet
                    // moved under the button. One forced refresh before
                    // falling back to the placeholder.
                    let _ = deps.cache.refresh(true).await;
                    let fresh = deps.cache.current().await;
                    fresh.text(&label).unwrap_or(MISSING_TEXT_PLACEHOLDER).to_string()
                }
            };

            let markup = match tree.parent_of(&label) {
                Some(parent) => ReplyMarkup::InlineKeyboard(back_keyboard(parent, &deps.labels)),
                None => ReplyMarkup::Keyboard(main_menu_keyboard(&tree)),
            };
            send_album_and_text(bot, chat_id, &body, markup).await;
        }
    }
    Ok(())
}

/// Lazy first load. The scheduler owns the refresh cadence; this only
/// covers the window between startup and the first successful refresh.
async fn ensure_loaded(cache: &RefreshCache) {
    if cache.current().await.is_empty() {
        let _ = cache.refresh(false).await;
    }
}

async fn persist_snapshot(deps: &HandlerDeps) {
    let Some(path) = deps.snapshot_path.clone() else {
        return;
    };
    let Some(snapshot) = deps.cache.snapshot().await else {
        return;
    };
    tokio::spawn(async move {
        if let Err(e) = gidracore::persist::save(&path, &snapshot).await {
            log::warn!("Failed to persist snapshot after reload: {:#}", e);
        }
    });
}

fn reload_reply_text(outcome: &RefreshOutcome) -> String {
    match outcome {
        RefreshOutcome::Updated { main_buttons, guides } => format!(
            "Бот обновлён: разделов {}, гайдов {}. Введите код доступа.",
            main_buttons, guides
        ),
        RefreshOutcome::Unchanged => "Данные не изменились. Доступы сброшены, введите код доступа.".to_string(),
        RefreshOutcome::Failed(reason) => format!(
            "Не удалось обновить данные ({}). Старое меню продолжает работать. Введите код доступа.",
            reason
        ),
    }
}
