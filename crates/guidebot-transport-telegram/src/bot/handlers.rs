use crate::bot::channel_audit::{self, AuditSubmission};
use crate::bot::menu_media::{self, MediaUpload};
use crate::bot::messaging::{send_flow_replies, send_long_message};
use crate::bot::resilient::send_document_resilient;
use crate::bot::services::BotServices;
use crate::bot::subscription::GateOutcome;
use crate::bot::views::{
    self, consent_keyboard, guide_keyboard, parse_callback, subscription_keyboard, UserCallback,
};
use anyhow::Result;
use guidebot_core::flow::{Actor, Handling, IncomingDocument};
use guidebot_core::storage::UserProfile;
use guidebot_core::utils::truncate_str;
use std::sync::Arc;
use teloxide::{
    prelude::*,
    types::{ParseMode, User},
    utils::command::BotCommands,
};
use tracing::{debug, error, info};

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Sender as seen by the flow coordinator
#[must_use]
pub fn actor_of(user: &User) -> Actor {
    Actor::new(user.id.0.cast_signed(), user.username.clone())
}

/// Profile fields stored in the roster
#[must_use]
pub fn profile_of(user: &User) -> UserProfile {
    UserProfile {
        id: user.id.0.cast_signed(),
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()).filter(|n| !n.is_empty()),
        last_name: user.last_name.clone(),
        language_code: user.language_code.clone(),
    }
}

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Supported commands:")]
pub enum Command {
    /// Register and show the terms or a greeting
    #[command(description = "Start the bot.")]
    Start,
    /// Show the guide menu
    #[command(description = "Get a guide.")]
    Get,
    /// List admin commands
    #[command(description = "Admin commands.")]
    Admin,
    /// List every guide with its id
    #[command(description = "Show all guides.")]
    ShowGuides,
    /// Start adding a guide
    #[command(description = "Add a guide.")]
    Add,
    /// Start deleting a guide
    #[command(description = "Delete a guide.")]
    Delete,
    /// Confirm the pending action
    #[command(description = "Confirm the pending action.")]
    Confirm,
    /// Cancel the pending action
    #[command(description = "Cancel the pending action.")]
    Cancel,
    /// Upload the banner shown above the guide menu
    #[command(description = "Upload menu media.")]
    ImageMenu,
    /// List registered users
    #[command(description = "List registered users.")]
    Users,
    /// Check channel subscription of a list of users
    #[command(description = "Check channel subscriptions.")]
    CheckChannel,
}

/// Start handler
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn start(bot: Bot, msg: Message, services: Arc<BotServices>) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0.cast_signed();
    info!(user_id, "User initiated /start command.");

    let consented = match services.users.register(&profile_of(user)).await {
        Ok(record) => record.has_consented(),
        Err(e) => {
            error!(user_id, error = %e, "Failed to register user");
            false
        }
    };

    if consented {
        bot.send_message(msg.chat.id, views::WELCOME_BACK_TEXT).await?;
    } else {
        send_consent_prompt(&bot, msg.chat.id).await?;
    }
    Ok(())
}

/// `/get` handler
///
/// # Errors
///
/// Returns an error if a reply cannot be sent.
pub async fn get_guides(bot: Bot, msg: Message, services: Arc<BotServices>) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0.cast_signed();
    info!(user_id, "User requested the guide menu.");

    match services.users.register(&profile_of(user)).await {
        Ok(record) if !record.has_consented() => {
            return send_consent_prompt(&bot, msg.chat.id).await;
        }
        Ok(_) => {}
        Err(e) => {
            error!(user_id, error = %e, "Failed to register user");
            bot.send_message(msg.chat.id, services.messages().no_guides.clone())
                .await?;
            return Ok(());
        }
    }

    show_menu_behind_gate(&bot, msg.chat.id, user_id, &services, false).await
}

async fn send_consent_prompt(bot: &Bot, chat_id: ChatId) -> Result<()> {
    bot.send_message(chat_id, views::CONSENT_TEXT)
        .reply_markup(consent_keyboard())
        .await?;
    Ok(())
}

/// Run the subscription gate, then show the menu or the subscription prompt
async fn show_menu_behind_gate(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    services: &BotServices,
    repeated: bool,
) -> Result<()> {
    match services.subscription.check(user_id).await {
        GateOutcome::Allowed => send_guide_menu(bot, chat_id, services).await,
        GateOutcome::NotSubscribed => {
            let Some(settings) = services.subscription.settings() else {
                return send_guide_menu(bot, chat_id, services).await;
            };
            let text = if repeated {
                &settings.reminder
            } else {
                &settings.prompt
            };
            bot.send_message(chat_id, text.clone())
                .parse_mode(ParseMode::Html)
                .reply_markup(subscription_keyboard(&settings.button))
                .await?;
            Ok(())
        }
        GateOutcome::CheckFailed => {
            bot.send_message(chat_id, views::SUBSCRIPTION_CHECK_FAILED_TEXT)
                .await?;
            Ok(())
        }
    }
}

/// Menu media banner followed by the keyboard of available guides
///
/// # Errors
///
/// Returns an error if the menu cannot be sent.
pub async fn send_guide_menu(bot: &Bot, chat_id: ChatId, services: &BotServices) -> Result<()> {
    menu_media::send_menu_media(bot, chat_id, services.menu_media.as_ref()).await;

    match services.catalog.list_available().await {
        Ok(guides) if !guides.is_empty() => {
            bot.send_message(chat_id, views::CHOOSE_GUIDE_TEXT)
                .reply_markup(guide_keyboard(&guides))
                .await?;
        }
        Ok(_) => {
            bot.send_message(chat_id, services.messages().no_guides.clone())
                .await?;
        }
        Err(e) => {
            error!(error = %e, "Unable to list guides for the menu");
            bot.send_message(chat_id, services.messages().no_guides.clone())
                .await?;
        }
    }
    Ok(())
}

/// Inline button handler
///
/// # Errors
///
/// Returns an error if the callback cannot be answered or a reply cannot be sent.
pub async fn handle_callback(bot: Bot, q: CallbackQuery, services: Arc<BotServices>) -> Result<()> {
    let user_id = q.from.id.0.cast_signed();
    let Some(chat_id) = q.message.as_ref().map(|m| m.chat().id) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let Some(callback) = q.data.as_deref().and_then(parse_callback) else {
        debug!(user_id, data = ?q.data, "Ignoring unknown callback");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    match callback {
        UserCallback::Consent => {
            if let Err(e) = services.users.record_consent(&profile_of(&q.from)).await {
                error!(user_id, error = %e, "Failed to record consent");
                alert(&bot, &q, views::GENERIC_ERROR_ALERT).await?;
                return Ok(());
            }
            info!(user_id, "User accepted the terms");
            bot.answer_callback_query(q.id.clone()).await?;
            show_menu_behind_gate(&bot, chat_id, user_id, &services, false).await
        }
        UserCallback::SubscriptionCheck => {
            bot.answer_callback_query(q.id.clone()).await?;
            show_menu_behind_gate(&bot, chat_id, user_id, &services, true).await
        }
        UserCallback::Guide(guide_id) => {
            deliver_guide(&bot, &q, chat_id, guide_id, &services).await
        }
    }
}

async fn alert(bot: &Bot, q: &CallbackQuery, text: &str) -> Result<()> {
    bot.answer_callback_query(q.id.clone())
        .text(text)
        .show_alert(true)
        .await?;
    Ok(())
}

async fn deliver_guide(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    guide_id: &str,
    services: &BotServices,
) -> Result<()> {
    let user_id = q.from.id.0.cast_signed();

    let consented = services
        .users
        .get(user_id)
        .await
        .ok()
        .flatten()
        .is_some_and(|user| user.has_consented());
    if !consented {
        return alert(bot, q, views::CONSENT_REQUIRED_ALERT).await;
    }

    match services.subscription.check(user_id).await {
        GateOutcome::Allowed => {}
        GateOutcome::NotSubscribed => return alert(bot, q, views::SUBSCRIPTION_REQUIRED_ALERT).await,
        GateOutcome::CheckFailed => {
            return alert(bot, q, views::SUBSCRIPTION_CHECK_FAILED_TEXT).await;
        }
    }

    let guide = match services.catalog.get_by_id(guide_id).await {
        Ok(guide) => guide.filter(guidebot_core::storage::Guide::is_available),
        Err(e) => {
            error!(user_id, guide_id, error = %e, "Failed to look up guide");
            alert(bot, q, views::GENERIC_ERROR_ALERT).await?;
            bot.send_message(chat_id, services.messages().no_guides.clone())
                .await?;
            return Ok(());
        }
    };
    let Some(guide) = guide else {
        return alert(bot, q, views::GUIDE_UNAVAILABLE_TEXT).await;
    };

    bot.answer_callback_query(q.id.clone()).await?;
    if let Err(e) = send_document_resilient(bot, chat_id, &guide.file_id, &guide.title).await {
        error!(user_id, guide_id, error = %e, "Failed to send guide");
        bot.send_message(chat_id, views::GENERIC_ERROR_ALERT).await?;
        return Ok(());
    }
    info!(user_id, guide_id, "Guide delivered");
    Ok(())
}

/// Text message handler
///
/// Offered to the flow coordinator first, then to a pending channel audit.
///
/// # Errors
///
/// Returns an error if a reply cannot be sent.
pub async fn handle_text(bot: Bot, msg: Message, services: Arc<BotServices>) -> Result<()> {
    let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        return Ok(());
    };
    let actor = actor_of(user);
    debug!(user_id = actor.id, text = %truncate_str(text, 100), "Handling text message");

    if let Handling::Consumed(replies) = services
        .coordinator
        .handle_text(msg.chat.id.0, &actor, text)
        .await
    {
        return send_flow_replies(&bot, msg.chat.id, replies).await;
    }

    match channel_audit::take_submission(services.sessions.as_ref(), msg.chat.id.0, actor.id, text)
        .await
    {
        AuditSubmission::NotPending => Ok(()),
        AuditSubmission::Empty => {
            bot.send_message(msg.chat.id, views::AUDIT_NOTHING_PARSED)
                .await?;
            Ok(())
        }
        AuditSubmission::Usernames(usernames) => {
            run_channel_audit(&bot, msg.chat.id, &usernames, &services).await
        }
    }
}

async fn run_channel_audit(
    bot: &Bot,
    chat_id: ChatId,
    usernames: &[String],
    services: &BotServices,
) -> Result<()> {
    let Some(channel) = services.audit_channel.as_deref() else {
        bot.send_message(chat_id, views::AUDIT_NOT_CONFIGURED).await?;
        return Ok(());
    };

    bot.send_message(chat_id, views::AUDIT_IN_PROGRESS).await?;
    let checker = services.subscription.checker();
    match channel_audit::check_usernames(
        services.users.as_ref(),
        checker.as_ref(),
        channel,
        usernames,
    )
    .await
    {
        Ok(rows) => {
            info!(channel, checked = rows.len(), "Channel audit finished");
            send_long_message(bot, chat_id, &views::audit_report(channel, &rows)).await
        }
        Err(e) => {
            error!(channel, error = %e, "Channel audit failed to read the roster");
            bot.send_message(chat_id, views::USERS_FAILED_TEXT).await?;
            Ok(())
        }
    }
}

/// Document handler, used by the add guide flow
///
/// # Errors
///
/// Returns an error if a reply cannot be sent.
pub async fn handle_document(bot: Bot, msg: Message, services: Arc<BotServices>) -> Result<()> {
    let (Some(user), Some(doc)) = (msg.from.as_ref(), msg.document()) else {
        return Ok(());
    };
    let document = IncomingDocument {
        file_id: doc.file.id.0.clone(),
        file_name: doc.file_name.clone(),
        mime_type: doc.mime_type.as_ref().map(ToString::to_string),
    };

    match services
        .coordinator
        .handle_document(msg.chat.id.0, &actor_of(user), &document)
        .await
    {
        Handling::Consumed(replies) => send_flow_replies(&bot, msg.chat.id, replies).await,
        Handling::PassThrough => {
            debug!(user_id = user.id.0, "Ignoring document outside of a flow");
            Ok(())
        }
    }
}

/// Photo and video handler, used by the menu media upload
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn handle_media(bot: Bot, msg: Message, services: Arc<BotServices>) -> Result<()> {
    let Some(upload) = MediaUpload::from_message(&msg) else {
        return Ok(());
    };
    let user_id = get_user_id_safe(&msg);

    match menu_media::accept_upload(
        services.sessions.as_ref(),
        services.menu_media.as_ref(),
        msg.chat.id.0,
        user_id,
        upload,
    )
    .await
    {
        Some(reply) => {
            bot.send_message(msg.chat.id, reply).await?;
        }
        None => debug!(user_id, "Ignoring media outside of an upload"),
    }
    Ok(())
}
