//! Collaborators shared by every handler

use crate::bot::subscription::SubscriptionGuard;
use guidebot_core::admin::AdminDirectory;
use guidebot_core::flow::{AdminFlowCoordinator, FlowMessages};
use guidebot_core::session::SessionStore;
use guidebot_core::storage::{GuideCatalog, MenuMediaStore, UserRegistry};
use std::sync::Arc;

/// Repositories and services injected into the dispatcher
pub struct BotServices {
    /// Guide catalog
    pub catalog: Arc<dyn GuideCatalog>,
    /// User roster
    pub users: Arc<dyn UserRegistry>,
    /// Menu banner
    pub menu_media: Arc<dyn MenuMediaStore>,
    /// Admin list and notifications
    pub admins: Arc<dyn AdminDirectory>,
    /// Per-conversation sessions
    pub sessions: Arc<dyn SessionStore>,
    /// Add/delete guide flows
    pub coordinator: Arc<AdminFlowCoordinator>,
    /// Channel subscription gate
    pub subscription: Arc<SubscriptionGuard>,
    /// Channel checked by `/check_channel`
    pub audit_channel: Option<String>,
}

impl BotServices {
    /// Shared notices
    #[must_use]
    pub fn messages(&self) -> &FlowMessages {
        self.coordinator.messages()
    }

    /// Whether `user_id` is an administrator
    #[must_use]
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admins.is_admin(user_id)
    }
}
