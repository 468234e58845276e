//! Text helpers shared by the flow coordinator and the transports.

use anyhow::Result;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

/// Maximum message length for Telegram with safety margin.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4000;

/// Escapes `&`, `<` and `>` so the text can be embedded into Telegram HTML.
///
/// # Examples
///
/// ```
/// use guidebot_core::utils::escape_html;
/// assert_eq!(escape_html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
/// ```
#[must_use]
pub fn escape_html(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Splits a plain-text message into parts no longer than `max_length` bytes.
///
/// Lines are kept whole where possible; a single line longer than the limit
/// is cut on grapheme cluster boundaries.
///
/// # Examples
///
/// ```
/// use guidebot_core::utils::split_long_message;
/// let long_msg = "1. ID 42 (@someone)\n".repeat(400);
/// let parts = split_long_message(&long_msg, 4000);
/// assert!(parts.len() > 1);
/// assert!(parts.iter().all(|p| p.len() <= 4000));
/// ```
#[must_use]
pub fn split_long_message(message: &str, max_length: usize) -> Vec<String> {
    if message.is_empty() {
        return Vec::new();
    }

    if message.len() <= max_length {
        return vec![message.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();

    for line in message.lines() {
        if line.len() > max_length {
            if !current.is_empty() {
                parts.push(current.trim_end().to_string());
                current.clear();
            }

            let mut chunk = String::new();
            for grapheme in line.graphemes(true) {
                if chunk.len() + grapheme.len() > max_length {
                    parts.push(std::mem::take(&mut chunk));
                }
                chunk.push_str(grapheme);
            }
            current.push_str(&chunk);
            current.push('\n');
            continue;
        }

        // +1 for the newline
        if current.len() + line.len() + 1 > max_length && !current.is_empty() {
            parts.push(current.trim_end().to_string());
            current.clear();
        }
        current.push_str(line);
        current.push('\n');
    }

    if !current.trim_end().is_empty() {
        parts.push(current.trim_end().to_string());
    }

    parts
}

/// Safely truncates a string to a maximum character length (not bytes).
///
/// # Examples
///
/// ```
/// use guidebot_core::utils::truncate_str;
/// assert_eq!(truncate_str("Привет, мир!", 6), "Привет");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Whether a Telegram API error will fail the same way on every attempt.
///
/// Covers chats the bot cannot write to: blocked by the user, kicked, or
/// never started.
#[must_use]
pub fn is_permanent_telegram_error(error: &anyhow::Error) -> bool {
    let message = format!("{error:#}").to_lowercase();
    message.contains("forbidden")
        || message.contains("chat not found")
        || message.contains("bot was blocked")
        || message.contains("user is deactivated")
}

/// Retry a Telegram API operation with exponential backoff and jitter.
///
/// Errors matched by [`is_permanent_telegram_error`] are returned at once.
///
/// Delays start at [`crate::config::TELEGRAM_API_INITIAL_BACKOFF_MS`] and are
/// capped at [`crate::config::TELEGRAM_API_MAX_BACKOFF_MS`]; at most
/// [`crate::config::TELEGRAM_API_MAX_RETRIES`] retries are made.
///
/// # Errors
///
/// Returns the last error if every attempt fails.
pub async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    let transient = |e: &anyhow::Error| !is_permanent_telegram_error(e);
    RetryIf::spawn(retry_strategy, operation, transient).await.map_err(|e| {
        warn!(
            "Telegram API operation failed after {} attempts: {}",
            TELEGRAM_API_MAX_RETRIES, e
        );
        e
    })
}
