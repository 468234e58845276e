//! Per-conversation session state
//!
//! A session is keyed by the conversation (chat) id and holds every pending
//! multi-step interaction of that conversation. An absent session is the same
//! as a session with nothing pending.

use crate::flow::FlowState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Pending menu media upload started with `/image_menu`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuMediaFlow {
    /// Admin whose next photo or video is stored
    pub initiator_id: i64,
}

/// Pending channel audit started with `/check_channel`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelAudit {
    /// Admin whose next text is treated as the username list
    pub initiator_id: i64,
    /// When the audit was requested
    pub requested_at: DateTime<Utc>,
}

/// Everything pending in one conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Add/delete guide flow
    pub admin_flow: Option<FlowState>,
    /// Menu media upload
    pub menu_media_flow: Option<MenuMediaFlow>,
    /// Channel subscription audit
    pub channel_audit: Option<ChannelAudit>,
}

impl Session {
    /// Whether nothing is pending
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.admin_flow.is_none() && self.menu_media_flow.is_none() && self.channel_audit.is_none()
    }

    /// The admin flow, but only when `user_id` started it
    #[must_use]
    pub fn admin_flow_of(&self, user_id: i64) -> Option<&FlowState> {
        self.admin_flow
            .as_ref()
            .filter(|flow| flow.initiator_id == user_id)
    }
}

/// Storage for conversation sessions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current session of the conversation, default when absent
    async fn get(&self, conversation_id: i64) -> Session;
    /// Replace the session of the conversation
    async fn set(&self, conversation_id: i64, session: Session);
}

/// Process-local session store
///
/// Sessions are lost on restart, which leaves stalled flows behind at worst.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<i64, Session>>,
}

impl InMemorySessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations with something pending
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no conversation has anything pending
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, conversation_id: i64) -> Session {
        self.sessions
            .read()
            .await
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn set(&self, conversation_id: i64, session: Session) {
        let mut sessions = self.sessions.write().await;
        if session.is_empty() {
            sessions.remove(&conversation_id);
        } else {
            sessions.insert(conversation_id, session);
        }
    }
}
