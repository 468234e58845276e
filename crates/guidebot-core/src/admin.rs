//! Admin authorization and fan-out notifications

use crate::config::NOTIFY_MAX_CONCURRENCY;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of a fan-out notification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifySummary {
    /// Number of admins the message reached
    pub delivered: usize,
    /// Admins the message could not be delivered to
    pub failed: Vec<i64>,
}

/// Delivery channel for admin notifications
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminNotifier: Send + Sync {
    /// Send an HTML message to a single admin
    async fn send_html(&self, chat_id: i64, html: &str) -> Result<()>;
}

/// Who the admins are and how to reach all of them
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Whether `user_id` is an administrator
    fn is_admin(&self, user_id: i64) -> bool;

    /// Send `message` to every admin not listed in `excluding`.
    ///
    /// Best effort: a failed delivery is logged and does not affect the others.
    async fn notify_all(&self, message: &str, excluding: &[i64]) -> NotifySummary;
}

/// Admin directory over a fixed id list
pub struct AdminService {
    admin_ids: Vec<i64>,
    notifier: Arc<dyn AdminNotifier>,
}

impl AdminService {
    /// Create the directory; duplicate ids are collapsed
    pub fn new(admin_ids: impl IntoIterator<Item = i64>, notifier: Arc<dyn AdminNotifier>) -> Self {
        let mut ids: Vec<i64> = Vec::new();
        for id in admin_ids {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Self {
            admin_ids: ids,
            notifier,
        }
    }
}

#[async_trait]
impl AdminDirectory for AdminService {
    fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    async fn notify_all(&self, message: &str, excluding: &[i64]) -> NotifySummary {
        let targets: Vec<i64> = self
            .admin_ids
            .iter()
            .copied()
            .filter(|id| !excluding.contains(id))
            .collect();

        let results: Vec<(i64, Result<()>)> = stream::iter(targets)
            .map(|admin_id| async move {
                (admin_id, self.notifier.send_html(admin_id, message).await)
            })
            .buffer_unordered(NOTIFY_MAX_CONCURRENCY)
            .collect()
            .await;

        let mut summary = NotifySummary::default();
        for (admin_id, result) in results {
            match result {
                Ok(()) => summary.delivered += 1,
                Err(e) => {
                    error!(admin_id = admin_id, error = %e, "Failed to send admin notification");
                    summary.failed.push(admin_id);
                }
            }
        }
        summary.failed.sort_unstable();

        info!(
            delivered = summary.delivered,
            failed = summary.failed.len(),
            "Admin notification fan-out finished"
        );
        summary
    }
}
