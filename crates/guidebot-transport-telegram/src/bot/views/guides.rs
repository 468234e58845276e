//! User-facing UI components
//!
//! Contains keyboards, text messages, and callback data for the guide menu.

use guidebot_core::storage::Guide;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

// ─────────────────────────────────────────────────────────────────────────────
// Callback constants
// ─────────────────────────────────────────────────────────────────────────────

/// Prefix of the callback data sent by guide buttons
pub const GUIDE_CALLBACK_PREFIX: &str = "guide:";
/// Callback data for accepting the terms
pub const CONSENT_CALLBACK: &str = "consent:accept";
/// Callback data for re-checking the channel subscription
pub const SUBSCRIPTION_CALLBACK: &str = "subscription_check";

/// Parsed callback data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCallback<'a> {
    /// A guide button was pressed
    Guide(&'a str),
    /// The user accepted the terms
    Consent,
    /// The user asked to re-check the subscription
    SubscriptionCheck,
}

/// Parse callback data from an inline button
///
/// # Examples
///
/// ```
/// use guidebot_transport_telegram::bot::views::{parse_callback, UserCallback};
/// assert_eq!(parse_callback("guide:g1"), Some(UserCallback::Guide("g1")));
/// assert_eq!(parse_callback("guide:"), None);
/// ```
#[must_use]
pub fn parse_callback(data: &str) -> Option<UserCallback<'_>> {
    match data {
        CONSENT_CALLBACK => Some(UserCallback::Consent),
        SUBSCRIPTION_CALLBACK => Some(UserCallback::SubscriptionCheck),
        _ => data
            .strip_prefix(GUIDE_CALLBACK_PREFIX)
            .filter(|id| !id.is_empty())
            .map(UserCallback::Guide),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyboards
// ─────────────────────────────────────────────────────────────────────────────

/// One button per guide, one guide per row
#[must_use]
pub fn guide_keyboard(guides: &[Guide]) -> InlineKeyboardMarkup {
    let rows = guides.iter().map(|guide| {
        vec![InlineKeyboardButton::callback(
            guide.title.clone(),
            format!("{GUIDE_CALLBACK_PREFIX}{}", guide.id),
        )]
    });
    InlineKeyboardMarkup::new(rows)
}

/// Single "accept" button under the consent text
#[must_use]
pub fn consent_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "✅ Согласен",
        CONSENT_CALLBACK,
    )]])
}

/// Single "check again" button under the subscription prompt
#[must_use]
pub fn subscription_keyboard(button: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        button.to_string(),
        SUBSCRIPTION_CALLBACK,
    )]])
}

// ─────────────────────────────────────────────────────────────────────────────
// Texts
// ─────────────────────────────────────────────────────────────────────────────

/// Terms the user accepts before receiving guides (HTML)
pub const CONSENT_TEXT: &str = "👋 Привет! Здесь можно бесплатно получить наши гайды.\n\n\
Нажимая «Согласен», вы даёте согласие на обработку ваших данных Telegram \
(ID, имя и username) для выдачи гайдов.";

/// Greeting for users who already accepted the terms
pub const WELCOME_BACK_TEXT: &str =
    "С возвращением! Отправьте /get, чтобы выбрать гайд.";

/// Question above the guide keyboard
pub const CHOOSE_GUIDE_TEXT: &str = "Какой гайд вы бы хотели получить?";

/// Alert when a guide button is stale
pub const GUIDE_UNAVAILABLE_TEXT: &str = "Гайд недоступен. Попробуйте позже.";

/// Alert when the subscription gate rejects a button press
pub const SUBSCRIPTION_REQUIRED_ALERT: &str =
    "Подписка на канал необходима для доступа к гайдам.";

/// Alert when the terms were not accepted yet
pub const CONSENT_REQUIRED_ALERT: &str = "Сначала подтвердите согласие.";

/// Notice when the membership lookup failed
pub const SUBSCRIPTION_CHECK_FAILED_TEXT: &str =
    "Не удалось проверить подписку. Пожалуйста, попробуйте еще раз позже.";

/// Generic failure alert
pub const GENERIC_ERROR_ALERT: &str = "Произошла ошибка. Попробуйте позже.";
