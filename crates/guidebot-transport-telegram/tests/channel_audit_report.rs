//! End-to-end channel audit: admin arms the audit, submits a list, gets a report.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use guidebot_core::session::{InMemorySessionStore, SessionStore};
use guidebot_core::storage::{Guide, JsonUserRegistry, UserProfile, UserRegistry};
use guidebot_transport_telegram::bot::channel_audit::{
    begin, check_usernames, take_submission, AuditSubmission,
};
use guidebot_transport_telegram::bot::subscription::MembershipChecker;
use guidebot_transport_telegram::bot::views::{
    audit_report, guide_keyboard, parse_callback, UserCallback,
};
use tempfile::tempdir;

struct Channel {
    members: Vec<i64>,
    broken: Vec<i64>,
}

#[async_trait]
impl MembershipChecker for Channel {
    async fn is_member(&self, _channel: &str, user_id: i64) -> Result<bool> {
        if self.broken.contains(&user_id) {
            return Err(anyhow!("Too Many Requests"));
        }
        Ok(self.members.contains(&user_id))
    }
}

async fn roster(dir: &std::path::Path) -> JsonUserRegistry {
    let users = JsonUserRegistry::new(dir.join("users.json"));
    for (id, username) in [(101, "Marina_K"), (102, "petrov_ivan"), (103, "slow_user")] {
        users
            .register(&UserProfile {
                id,
                username: Some(username.to_string()),
                first_name: Some("Test".to_string()),
                ..UserProfile::default()
            })
            .await
            .expect("register");
    }
    users
}

#[tokio::test]
async fn test_admin_gets_report_for_submitted_list() {
    let dir = tempdir().expect("tempdir");
    let users = roster(dir.path()).await;
    let sessions = InMemorySessionStore::new();
    let channel = Channel {
        members: vec![101],
        broken: vec![103],
    };

    begin(&sessions, 500, 1).await;
    let submission = take_submission(
        &sessions,
        500,
        1,
        "@marina_k\nhttps://t.me/petrov_ivan\n@slow_user\n@stranger\n@x",
    )
    .await;
    let AuditSubmission::Usernames(names) = submission else {
        panic!("expected usernames, got {submission:?}");
    };
    assert_eq!(names.len(), 4);
    assert!(sessions.get(500).await.is_empty());

    let rows = check_usernames(&users, &channel, "@goalevaya", &names)
        .await
        .expect("rows");
    let report = audit_report("@goalevaya", &rows);

    assert_eq!(
        report,
        "Результаты проверки подписки на канал t.me/goalevaya:\n\
         @marina_k — подписан ✅\n\
         @petrov_ivan — не подписан ❌\n\
         @slow_user — ошибка проверки: Too Many Requests\n\
         @stranger — пользователь не найден среди зарегистрированных в боте."
    );
}

#[tokio::test]
async fn test_audit_in_one_chat_does_not_leak_into_another() {
    let sessions = InMemorySessionStore::new();
    begin(&sessions, 500, 1).await;

    assert_eq!(
        take_submission(&sessions, 600, 1, "@marina_k").await,
        AuditSubmission::NotPending
    );
    assert!(sessions.get(500).await.channel_audit.is_some());
}

#[test]
fn test_guide_buttons_round_trip_through_callback_parser() {
    let guides = vec![Guide {
        id: "a1b2c3d4".to_string(),
        title: "Как выбрать участок".to_string(),
        file_id: "BQACAgIAAx".to_string(),
        created_at: None,
    }];
    let keyboard = guide_keyboard(&guides);
    let button = &keyboard.inline_keyboard[0][0];

    let teloxide::types::InlineKeyboardButtonKind::CallbackData(data) = &button.kind else {
        panic!("expected callback button");
    };
    assert_eq!(parse_callback(data), Some(UserCallback::Guide("a1b2c3d4")));
}
