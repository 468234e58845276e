//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! These wrappers retry transient failures with exponential backoff and
//! jitter. They are used for deliveries that must not be lost to a single
//! network hiccup: admin notifications and guide documents.

use anyhow::Result;
use async_trait::async_trait;
use guidebot_core::admin::AdminNotifier;
use guidebot_core::utils::retry_telegram_operation;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, InputFile, Message, ParseMode};

/// Send a message with automatic retry on network failures.
///
/// # Errors
///
/// Returns the last error after all retries are exhausted.
pub async fn send_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    parse_mode: Option<ParseMode>,
) -> Result<Message> {
    let text = text.into();
    retry_telegram_operation(|| async {
        let mut req = bot.send_message(chat_id, text.clone());
        if let Some(pm) = parse_mode {
            req = req.parse_mode(pm);
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Send a stored document by file id, with `caption`, retrying on failure.
///
/// # Errors
///
/// Returns the last error after all retries are exhausted.
pub async fn send_document_resilient(
    bot: &Bot,
    chat_id: ChatId,
    file_id: &str,
    caption: &str,
) -> Result<Message> {
    retry_telegram_operation(|| async {
        bot.send_document(chat_id, InputFile::file_id(FileId(file_id.to_string())))
            .caption(caption.to_string())
            .await
            .map_err(|e| anyhow::anyhow!("Telegram document error: {e}"))
    })
    .await
}

/// Delivers admin notifications through the Bot API
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    /// Create a notifier sending as `bot`
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl AdminNotifier for TelegramNotifier {
    async fn send_html(&self, chat_id: i64, html: &str) -> Result<()> {
        send_message_resilient(&self.bot, ChatId(chat_id), html, Some(ParseMode::Html))
            .await
            .map(|_| ())
    }
}
