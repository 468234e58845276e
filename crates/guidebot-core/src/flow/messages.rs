//! Texts sent by the admin flow coordinator
//!
//! Shared notices are configurable through [`FlowMessages`], step prompts
//! come from [`FlowPrompts`].

use crate::utils::escape_html;

// ─────────────────────────────────────────────────────────────────────────────
// Shared notices
// ─────────────────────────────────────────────────────────────────────────────

const DEFAULT_NO_GUIDES: &str = "Пока гайдов нет, но дух стройки жив! Уже завозим контент, \
ставим леса и натягиваем сетку полезных советов";

/// Notices shared between the coordinator and ordinary command handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowMessages {
    /// Sent to non-admins trying an admin action
    pub admin_only: String,
    /// Sent after a guide was created
    pub guide_added: String,
    /// Sent after a guide was removed
    pub guide_deleted: String,
    /// Sent when `/confirm` or `/cancel` has nothing to act on
    pub nothing_to_confirm: String,
    /// Sent after a flow was cancelled
    pub flow_cancelled: String,
    /// Sent when the catalog is empty
    pub no_guides: String,
    /// Sent when saving a confirmed change failed
    pub storage_failure: String,
    /// Sent when the catalog could not be read
    pub read_failure: String,
}

impl Default for FlowMessages {
    fn default() -> Self {
        Self {
            admin_only: "⛔️ Эта команда доступна только администраторам.".to_string(),
            guide_added: "✅ Гайд успешно добавлен.".to_string(),
            guide_deleted: "🗑 Гайд удалён.".to_string(),
            nothing_to_confirm: "Нет действий, ожидающих подтверждения.".to_string(),
            flow_cancelled: "Действие отменено.".to_string(),
            no_guides: DEFAULT_NO_GUIDES.to_string(),
            storage_failure: "⚠️ Не удалось сохранить изменения. Повторите /confirm позже \
                              или отмените действие через /cancel."
                .to_string(),
            read_failure: "⚠️ Не удалось загрузить список гайдов. Попробуйте позже.".to_string(),
        }
    }
}

impl FlowMessages {
    /// Replace the "no guides" notice when an override is configured
    #[must_use]
    pub fn with_no_guides(mut self, no_guides: Option<String>) -> Self {
        if let Some(text) = no_guides.filter(|t| !t.trim().is_empty()) {
            self.no_guides = text;
        }
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Step prompts
// ─────────────────────────────────────────────────────────────────────────────

/// Prompts shown while walking an admin through a flow
pub struct FlowPrompts;

impl FlowPrompts {
    /// Add flow started, asking for a title
    #[must_use]
    pub fn ask_title() -> &'static str {
        "Введите название гайда.\n\nОтправьте /cancel, если хотите прекратить добавление."
    }

    /// Title was blank
    #[must_use]
    pub fn empty_title() -> &'static str {
        "Название не должно быть пустым. Попробуйте снова или используйте /cancel."
    }

    /// Title accepted, asking for the PDF
    #[must_use]
    pub fn ask_document() -> &'static str {
        "Отправьте PDF-файл гайда в качестве документа.\n\n\
         Когда документ будет загружен, подтвердите действие командой /confirm \
         или отмените через /cancel."
    }

    /// Document is not a PDF
    #[must_use]
    pub fn not_a_pdf() -> &'static str {
        "Поддерживаются только PDF-файлы. Загрузите корректный документ или отмените /cancel."
    }

    /// Add summary before `/confirm` (HTML)
    #[must_use]
    pub fn confirm_add(title: &str, file_name: Option<&str>) -> String {
        format!(
            "Проверьте данные:\nНазвание: <b>{}</b>\nФайл: <code>{}</code>\n\n\
             Подтвердить — /confirm\nОтменить — /cancel",
            escape_html(title),
            escape_html(file_name.unwrap_or("PDF"))
        )
    }

    /// Delete flow started, listing `id | title` lines (HTML)
    #[must_use]
    pub fn delete_listing(lines: &[String]) -> String {
        format!(
            "Текущий список гайдов:\n<pre>{}</pre>\n\n\
             Отправьте ID гайда, который требуется удалить, или /cancel.",
            escape_html(&lines.join("\n"))
        )
    }

    /// Blank id
    #[must_use]
    pub fn invalid_id() -> &'static str {
        "Некорректный идентификатор. Попробуйте снова или используйте /cancel."
    }

    /// No guide with that id
    #[must_use]
    pub fn guide_not_found() -> &'static str {
        "Гайд не найден. Проверьте ID и попробуйте ещё раз или отмените /cancel."
    }

    /// Delete summary before `/confirm` (HTML)
    #[must_use]
    pub fn confirm_delete(guide_id: &str, title: &str) -> String {
        format!(
            "Подтвердите удаление гайда:\nID: <code>{}</code>\nНазвание: <b>{}</b>\n\n\
             Подтвердить — /confirm\nОтменить — /cancel",
            escape_html(guide_id),
            escape_html(title)
        )
    }

    /// Guide disappeared between selection and confirmation
    #[must_use]
    pub fn already_deleted() -> &'static str {
        "Гайд не найден. Возможно, он уже был удалён."
    }

    /// Fan-out text sent to every admin after a deletion (HTML)
    #[must_use]
    pub fn deletion_notice(actor: &str, title: &str) -> String {
        format!(
            "Админ {} удалил гайд «{}».",
            escape_html(actor),
            escape_html(title)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_is_escaped() {
        let text = FlowPrompts::delete_listing(&["g1 | <Land> & Co".to_string()]);
        assert!(text.contains("<pre>g1 | &lt;Land&gt; &amp; Co</pre>"));
    }

    #[test]
    fn test_confirm_add_defaults_file_name() {
        let text = FlowPrompts::confirm_add("Roof", None);
        assert!(text.contains("<b>Roof</b>"));
        assert!(text.contains("<code>PDF</code>"));
    }

    #[test]
    fn test_deletion_notice_escapes_actor_and_title() {
        let text = FlowPrompts::deletion_notice("@a<b>", "R&D");
        assert_eq!(text, "Админ @a&lt;b&gt; удалил гайд «R&amp;D».");
    }

    #[test]
    fn test_no_guides_override() {
        let messages = FlowMessages::default().with_no_guides(Some("Пусто".to_string()));
        assert_eq!(messages.no_guides, "Пусто");

        let untouched = FlowMessages::default().with_no_guides(Some("  ".to_string()));
        assert_eq!(untouched.no_guides, DEFAULT_NO_GUIDES);
    }
}
