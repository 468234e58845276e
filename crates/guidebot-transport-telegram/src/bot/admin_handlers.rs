//! Admin command handlers
//!
//! Every handler answers non-admins with the "admin only" notice.

use crate::bot::channel_audit;
use crate::bot::handlers::actor_of;
use crate::bot::menu_media;
use crate::bot::messaging::{send_flow_replies, send_long_message};
use crate::bot::services::BotServices;
use crate::bot::views;
use anyhow::Result;
use guidebot_core::flow::Actor;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{error, info, warn};

/// Sender of `msg` when they are an admin; otherwise replies with the notice
async fn admin_actor(bot: &Bot, msg: &Message, services: &BotServices) -> Result<Option<Actor>> {
    let Some(actor) = msg.from.as_ref().map(actor_of) else {
        return Ok(None);
    };
    if services.is_admin(actor.id) {
        return Ok(Some(actor));
    }

    warn!(user_id = actor.id, "Non-admin tried an admin command");
    bot.send_message(msg.chat.id, services.messages().admin_only.clone())
        .await?;
    Ok(None)
}

/// `/admin`
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn admin_menu(bot: Bot, msg: Message, services: Arc<BotServices>) -> Result<()> {
    if admin_actor(&bot, &msg, &services).await?.is_none() {
        return Ok(());
    }
    bot.send_message(msg.chat.id, views::ADMIN_MENU_TEXT).await?;
    Ok(())
}

/// `/show_guides`
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn show_guides(bot: Bot, msg: Message, services: Arc<BotServices>) -> Result<()> {
    if admin_actor(&bot, &msg, &services).await?.is_none() {
        return Ok(());
    }

    match services.catalog.list_all().await {
        Ok(guides) if guides.is_empty() => {
            bot.send_message(msg.chat.id, services.messages().no_guides.clone())
                .await?;
        }
        Ok(guides) => {
            bot.send_message(msg.chat.id, views::guides_listing(&guides))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Err(e) => {
            error!(error = %e, "Failed to list guides");
            bot.send_message(msg.chat.id, services.messages().read_failure.clone())
                .await?;
        }
    }
    Ok(())
}

/// Coordinator entry point behind a flow command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowCommand {
    /// `/add`
    Add,
    /// `/delete`
    Delete,
    /// `/confirm`
    Confirm,
    /// `/cancel`
    Cancel,
}

/// `/add`, `/delete`, `/confirm` and `/cancel`
///
/// The coordinator performs its own admin check.
///
/// # Errors
///
/// Returns an error if a reply cannot be sent.
pub async fn flow_command(
    bot: Bot,
    msg: Message,
    services: Arc<BotServices>,
    command: FlowCommand,
) -> Result<()> {
    let Some(actor) = msg.from.as_ref().map(actor_of) else {
        return Ok(());
    };
    let coordinator = &services.coordinator;
    let conversation_id = msg.chat.id.0;

    let replies = match command {
        FlowCommand::Add => coordinator.start_add(conversation_id, &actor).await,
        FlowCommand::Delete => coordinator.start_delete(conversation_id, &actor).await,
        FlowCommand::Confirm => coordinator.confirm(conversation_id, &actor).await,
        FlowCommand::Cancel => coordinator.cancel(conversation_id, &actor).await,
    };
    send_flow_replies(&bot, msg.chat.id, replies).await
}

/// `/users`
///
/// # Errors
///
/// Returns an error if a reply cannot be sent.
pub async fn users(bot: Bot, msg: Message, services: Arc<BotServices>) -> Result<()> {
    if admin_actor(&bot, &msg, &services).await?.is_none() {
        return Ok(());
    }

    match services.users.list().await {
        Ok(users) if users.is_empty() => {
            bot.send_message(msg.chat.id, views::NO_USERS_TEXT).await?;
            Ok(())
        }
        Ok(users) => send_long_message(&bot, msg.chat.id, &views::users_roster(&users)).await,
        Err(e) => {
            error!(error = %e, "Failed to list users");
            bot.send_message(msg.chat.id, views::USERS_FAILED_TEXT).await?;
            Ok(())
        }
    }
}

/// `/image_menu`
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn image_menu(bot: Bot, msg: Message, services: Arc<BotServices>) -> Result<()> {
    let Some(actor) = admin_actor(&bot, &msg, &services).await? else {
        return Ok(());
    };

    menu_media::begin(services.sessions.as_ref(), msg.chat.id.0, actor.id).await;
    info!(user_id = actor.id, "Menu media upload started");
    bot.send_message(msg.chat.id, views::MENU_MEDIA_PROMPT).await?;
    Ok(())
}

/// `/check_channel`
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn check_channel(bot: Bot, msg: Message, services: Arc<BotServices>) -> Result<()> {
    let Some(actor) = admin_actor(&bot, &msg, &services).await? else {
        return Ok(());
    };
    let Some(channel) = services.audit_channel.as_deref() else {
        bot.send_message(msg.chat.id, views::AUDIT_NOT_CONFIGURED).await?;
        return Ok(());
    };

    channel_audit::begin(services.sessions.as_ref(), msg.chat.id.0, actor.id).await;
    bot.send_message(msg.chat.id, views::audit_prompt(channel)).await?;
    Ok(())
}
