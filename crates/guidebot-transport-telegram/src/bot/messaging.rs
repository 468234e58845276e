//! Common messaging utilities for Telegram bot.
//!
//! Sending coordinator replies and splitting long plain-text listings.

use anyhow::Result;
use guidebot_core::flow::FlowReply;
use guidebot_core::utils::{split_long_message, TELEGRAM_MESSAGE_LIMIT};
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};

/// Sends coordinator replies in order.
///
/// # Errors
///
/// Returns an error if any message fails to send.
pub async fn send_flow_replies(bot: &Bot, chat_id: ChatId, replies: Vec<FlowReply>) -> Result<()> {
    for reply in replies {
        match reply {
            FlowReply::Text(text) => {
                bot.send_message(chat_id, text).await?;
            }
            FlowReply::Html(html) => {
                bot.send_message(chat_id, html)
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
        }
    }
    Ok(())
}

/// Sends a long plain-text message by splitting it into multiple parts.
///
/// # Errors
///
/// Returns an error if any message fails to send.
pub async fn send_long_message(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    for part in split_long_message(text, TELEGRAM_MESSAGE_LIMIT) {
        bot.send_message(chat_id, part).await?;
    }
    Ok(())
}
