//! Guide content delivery: media links first, remaining text last.
//!
//! A guide cell is free text with media URLs mixed in. Photos and videos
//! go out as one album, gifs and documents one by one, and whatever text
//! is left after removing the URLs closes the delivery with the menu
//! keyboard attached.

use itertools::Itertools;
use lazy_regex::{lazy_regex, Lazy, Regex};
use std::path::Path;
use std::time::Duration;
use strum::Display;
use teloxide::prelude::*;
use teloxide::types::{InputFile, InputMedia, InputMediaPhoto, InputMediaVideo, ReplyMarkup};
use url::Url;

/// Telegram's cap on album size; also applied to gif/document runs so one
/// over-eager sheet cell cannot flood a chat.
const MAX_ITEMS_PER_KIND: usize = 10;

/// Sent when a guide cell contains nothing but media links.
const NEXT_SECTION_PROMPT: &str = "Выберите следующий раздел:";

static URL_RE: Lazy<Regex> = lazy_regex!(r"https?://(?:[a-zA-Z0-9]|[$-_@.&+]|[!*(),]|(?:%[0-9a-fA-F]{2}))+");

/// How one media URL is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Animation,
    Document,
}

/// Classifies a URL by its path extension. Anything unknown ships as a
/// document, which Telegram accepts for arbitrary files.
pub fn classify(url: &Url) -> MediaKind {
    let ext = Path::new(url.path())
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" | "png" | "webp" => MediaKind::Photo,
        "mp4" => MediaKind::Video,
        "gif" => MediaKind::Animation,
        _ => MediaKind::Document,
    }
}

/// Extracts parseable URLs in first-occurrence order, deduplicated.
pub fn extract_urls(text: &str) -> Vec<Url> {
    URL_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .unique()
        .filter_map(|raw| Url::parse(raw).ok())
        .collect()
}

/// Removes every URL from the text and tidies the leftover whitespace.
pub fn strip_urls(text: &str) -> String {
    let stripped = URL_RE.replace_all(text, "");
    stripped
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Splits URLs into an album (photos and videos, capped), animations and
/// documents.
pub fn split_media(urls: Vec<Url>) -> (Vec<InputMedia>, Vec<Url>, Vec<Url>) {
    let mut album = Vec::new();
    let mut animations = Vec::new();
    let mut documents = Vec::new();

    for url in urls {
        match classify(&url) {
            MediaKind::Photo => album.push(InputMedia::Photo(InputMediaPhoto::new(InputFile::url(url)))),
            MediaKind::Video => album.push(InputMedia::Video(InputMediaVideo::new(InputFile::url(url)))),
            MediaKind::Animation => animations.push(url),
            MediaKind::Document => documents.push(url),
        }
    }

    album.truncate(MAX_ITEMS_PER_KIND);
    (album, animations, documents)
}

/// Sends a guide: album, then gifs, then documents, then the remaining
/// text with the given keyboard. Individual send failures are logged and
/// skipped so one dead link never swallows the whole guide.
pub async fn send_album_and_text(bot: &Bot, chat_id: ChatId, guide_text: &str, markup: ReplyMarkup) {
    let urls = extract_urls(guide_text);
    let (album, animations, documents) = split_media(urls);

    if album.len() == 1 {
        for item in album {
            if let Err(e) = send_album_item(bot, chat_id, item).await {
                log::error!("Failed to send single media: {}", e);
            }
        }
    } else if album.len() > 1 {
        if let Err(e) = bot.send_media_group(chat_id, album.clone()).await {
            log::error!("send_media_group failed, falling back to singles: {}", e);
            for item in album {
                if let Err(e) = send_album_item(bot, chat_id, item).await {
                    log::error!("Fallback single media failed: {}", e);
                }
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
        }
    }

    for url in animations.into_iter().take(MAX_ITEMS_PER_KIND) {
        if let Err(e) = bot.send_animation(chat_id, InputFile::url(url)).await {
            log::error!("send_animation failed: {}", e);
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
    }

    for url in documents.into_iter().take(MAX_ITEMS_PER_KIND) {
        if let Err(e) = bot.send_document(chat_id, InputFile::url(url)).await {
            log::error!("send_document failed: {}", e);
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
    }

    let text = strip_urls(guide_text);
    let text = if text.is_empty() { NEXT_SECTION_PROMPT } else { text.as_str() };
    if let Err(e) = bot.send_message(chat_id, text).reply_markup(markup).await {
        log::error!("Failed to send guide text: {}", e);
    }
}

// `split_media` only ever puts photos and videos into the album.
async fn send_album_item(bot: &Bot, chat_id: ChatId, item: InputMedia) -> Result<(), teloxide::RequestError> {
    match item {
        InputMedia::Photo(photo) => bot.send_photo(chat_id, photo.media).await?,
        InputMedia::Video(video) => bot.send_video(chat_id, video.media).await?,
        other => {
            log::warn!("Unexpected album item kind: {:?}", other);
            return Ok(());
        }
    };
    Ok(())
}
