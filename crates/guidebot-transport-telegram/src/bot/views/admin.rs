//! Admin UI components
//!
//! Texts and formatters for admin commands: catalog listing, user roster,
//! menu media upload and channel audit.

use chrono::{DateTime, Local, Utc};
use guidebot_core::storage::{Guide, RegisteredUser};
use guidebot_core::utils::escape_html;

/// List of admin commands
pub const ADMIN_MENU_TEXT: &str = "Админские команды:\n\
/admin — список админских команд.\n\
/show_guides — показать список всех гайдов.\n\
/add — добавить новый гайд.\n\
/image_menu — загрузить медиа перед меню с гайдами.\n\
/delete — удалить гайд.\n\
/users — список зарегистрированных пользователей.\n\
/check_channel — проверить подписку пользователей на канал.\n\
/confirm — подтвердить текущее действие.\n\
/cancel — отменить текущее действие.";

/// Escaped `<pre>` listing of every guide (HTML)
#[must_use]
pub fn guides_listing(guides: &[Guide]) -> String {
    let listing = guides
        .iter()
        .map(|guide| escape_html(&format!("{} | {}", guide.id, guide.title)))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Список гайдов:\n<pre>{listing}</pre>")
}

// ─────────────────────────────────────────────────────────────────────────────
// User roster
// ─────────────────────────────────────────────────────────────────────────────

/// Roster header
pub const USERS_HEADER: &str = "Зарегистрированные пользователи:";
/// Shown when nobody started the bot yet
pub const NO_USERS_TEXT: &str = "Пока ни один пользователь не зарегистрировался в боте.";
/// Shown when the roster cannot be read
pub const USERS_FAILED_TEXT: &str = "Не удалось получить список пользователей. Попробуйте позже.";

/// `dd.mm.yyyy hh:mm` in the server's local time zone
#[must_use]
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%d.%m.%Y %H:%M")
        .to_string()
}

/// One roster line, `index` is zero-based
#[must_use]
pub fn format_user_line(user: &RegisteredUser, index: usize) -> String {
    let name = [user.first_name.as_deref(), user.last_name.as_deref()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let name = if name.is_empty() { "—".to_string() } else { name };

    let username = user
        .username
        .as_deref()
        .filter(|u| !u.is_empty())
        .map_or_else(|| "нет username".to_string(), |u| format!("@{u}"));

    let registered = user
        .registered_at
        .map_or_else(|| "дата неизвестна".to_string(), format_timestamp);

    format!(
        "{}. ID {} ({username}) — {name}; зарегистрирован: {registered}",
        index + 1,
        user.id
    )
}

/// Full roster text, plain
#[must_use]
pub fn users_roster(users: &[RegisteredUser]) -> String {
    std::iter::once(USERS_HEADER.to_string())
        .chain(
            users
                .iter()
                .enumerate()
                .map(|(index, user)| format_user_line(user, index)),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

// ─────────────────────────────────────────────────────────────────────────────
// Menu media
// ─────────────────────────────────────────────────────────────────────────────

/// Upload instructions after `/image_menu`
pub const MENU_MEDIA_PROMPT: &str = "Пожалуйста, отправьте изображение или видео, которое будет \
отображаться перед меню с гайдами.\n\
Можно добавить подпись к медиасообщению — она сохранится вместе с файлом.\n\
Для отмены отправьте команду /cancel.";
/// Media stored
pub const MENU_MEDIA_SAVED: &str =
    "Медиа успешно сохранено и будет показываться перед меню с гайдами.";
/// Media could not be stored
pub const MENU_MEDIA_FAILED: &str =
    "Не удалось сохранить медиафайл. Попробуйте позже или обратитесь к разработчику.";

// ─────────────────────────────────────────────────────────────────────────────
// Channel audit
// ─────────────────────────────────────────────────────────────────────────────

/// No channel configured for `/check_channel`
pub const AUDIT_NOT_CONFIGURED: &str = "Канал для проверки подписки не настроен.";
/// Nothing usable in the submitted list
pub const AUDIT_NOTHING_PARSED: &str = "Не удалось распознать ни одного никнейма. Пожалуйста, \
вызови /check_channel ещё раз и пришли список, где каждый ник начинается с символа @ и \
размещён на отдельной строке.";
/// Sent before the lookups start
pub const AUDIT_IN_PROGRESS: &str = "Проверяю подписку, это может занять несколько секунд…";

/// `t.me/name` link for an `@name` channel
#[must_use]
pub fn channel_link(channel: &str) -> String {
    format!("t.me/{}", channel.trim_start_matches('@'))
}

/// Instructions after `/check_channel`
#[must_use]
pub fn audit_prompt(channel: &str) -> String {
    format!(
        "Пришли список никнеймов, каждый с новой строки. Пример:\n\
         @nickname1\n@nickname2\n@nickname3\n\n\
         После получения списка я проверю, подписан ли каждый из них на канал {}.",
        channel_link(channel)
    )
}

/// Subscription status of one audited username
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditStatus {
    /// Username not in the roster
    NotRegistered,
    /// Member of the channel
    Subscribed,
    /// Not a member
    NotSubscribed,
    /// Lookup failed with this reason
    CheckFailed(String),
}

/// Audit report, plain text
#[must_use]
pub fn audit_report(channel: &str, rows: &[(String, AuditStatus)]) -> String {
    if rows.is_empty() {
        return "Не удалось собрать результаты проверки.".to_string();
    }

    let mut lines = vec![format!(
        "Результаты проверки подписки на канал {}:",
        channel_link(channel)
    )];
    lines.extend(rows.iter().map(|(username, status)| match status {
        AuditStatus::NotRegistered => {
            format!("@{username} — пользователь не найден среди зарегистрированных в боте.")
        }
        AuditStatus::Subscribed => format!("@{username} — подписан ✅"),
        AuditStatus::NotSubscribed => format!("@{username} — не подписан ❌"),
        AuditStatus::CheckFailed(reason) => format!("@{username} — ошибка проверки: {reason}"),
    }));
    lines.join("\n")
}
