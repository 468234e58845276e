//! Admin flow coordinator
//!
//! Walks an admin through adding and deleting guides. Every inbound text or
//! document is offered here first; only messages that advance the sender's
//! own flow are consumed, everything else passes through to the ordinary
//! handlers.

use super::messages::{FlowMessages, FlowPrompts};
use super::state::{AddStage, DeleteStage, FlowStage, FlowState, UploadedDocument};
use crate::admin::AdminDirectory;
use crate::session::{Session, SessionStore};
use crate::storage::GuideCatalog;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const PDF_MIME_TYPE: &str = "application/pdf";

/// Sender of an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Telegram user id
    pub id: i64,
    /// Username without the at sign
    pub username: Option<String>,
}

impl Actor {
    /// Create an actor
    pub fn new(id: i64, username: Option<String>) -> Self {
        Self { id, username }
    }

    /// `@username`, falling back to `ID <id>`
    #[must_use]
    pub fn attribution(&self) -> String {
        match self.username.as_deref().filter(|u| !u.is_empty()) {
            Some(username) => format!("@{username}"),
            None => format!("ID {}", self.id),
        }
    }
}

/// Document attached to an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingDocument {
    /// Telegram file id
    pub file_id: String,
    /// File name reported by the client
    pub file_name: Option<String>,
    /// MIME type reported by the client
    pub mime_type: Option<String>,
}

impl IncomingDocument {
    /// Whether the document is a PDF by MIME type or by extension
    #[must_use]
    pub fn is_pdf(&self) -> bool {
        self.mime_type.as_deref() == Some(PDF_MIME_TYPE)
            || self
                .file_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().ends_with(".pdf"))
    }
}

/// A reply to send back to the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowReply {
    /// Plain text
    Text(String),
    /// Telegram HTML
    Html(String),
}

impl FlowReply {
    /// Reply body regardless of format
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Html(text) => text,
        }
    }
}

/// Whether the coordinator took an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handling {
    /// The message belonged to a flow; send these replies
    Consumed(Vec<FlowReply>),
    /// Not ours, let the next handler have it
    PassThrough,
}

impl Handling {
    fn reply(reply: FlowReply) -> Self {
        Self::Consumed(vec![reply])
    }

    /// Whether the message was consumed
    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        matches!(self, Self::Consumed(_))
    }
}

fn text(body: impl Into<String>) -> FlowReply {
    FlowReply::Text(body.into())
}

/// Orchestrates the add and delete guide sequences
pub struct AdminFlowCoordinator {
    sessions: Arc<dyn SessionStore>,
    catalog: Arc<dyn GuideCatalog>,
    admins: Arc<dyn AdminDirectory>,
    messages: FlowMessages,
}

impl AdminFlowCoordinator {
    /// Create a coordinator over the given collaborators
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        catalog: Arc<dyn GuideCatalog>,
        admins: Arc<dyn AdminDirectory>,
        messages: FlowMessages,
    ) -> Self {
        Self {
            sessions,
            catalog,
            admins,
            messages,
        }
    }

    /// Shared notices
    #[must_use]
    pub const fn messages(&self) -> &FlowMessages {
        &self.messages
    }

    fn admin_only(&self) -> FlowReply {
        text(self.messages.admin_only.clone())
    }

    async fn store_flow(&self, conversation_id: i64, mut session: Session, flow: Option<FlowState>) {
        session.admin_flow = flow;
        self.sessions.set(conversation_id, session).await;
    }

    /// Start the add flow, replacing whatever flow the conversation had
    pub async fn start_add(&self, conversation_id: i64, actor: &Actor) -> Vec<FlowReply> {
        if !self.admins.is_admin(actor.id) {
            return vec![self.admin_only()];
        }

        let session = self.sessions.get(conversation_id).await;
        self.store_flow(conversation_id, session, Some(FlowState::add(actor.id)))
            .await;

        info!(user_id = actor.id, conversation_id, "Add guide flow started");
        vec![text(FlowPrompts::ask_title())]
    }

    /// Start the delete flow with a listing of all guides.
    ///
    /// With an empty catalog no flow is started.
    pub async fn start_delete(&self, conversation_id: i64, actor: &Actor) -> Vec<FlowReply> {
        if !self.admins.is_admin(actor.id) {
            return vec![self.admin_only()];
        }

        let guides = match self.catalog.list_all().await {
            Ok(guides) => guides,
            Err(e) => {
                error!(user_id = actor.id, error = %e, "Failed to list guides for deletion");
                return vec![text(self.messages.read_failure.clone())];
            }
        };

        if guides.is_empty() {
            return vec![text(self.messages.no_guides.clone())];
        }

        let lines: Vec<String> = guides
            .iter()
            .map(|guide| format!("{} | {}", guide.id, guide.title))
            .collect();

        let session = self.sessions.get(conversation_id).await;
        self.store_flow(conversation_id, session, Some(FlowState::delete(actor.id)))
            .await;

        info!(user_id = actor.id, conversation_id, guides = guides.len(), "Delete guide flow started");
        vec![FlowReply::Html(FlowPrompts::delete_listing(&lines))]
    }

    /// Offer an inbound text to the coordinator.
    ///
    /// Consumed only when the sender owns the flow and it waits for a title
    /// or an id. Commands are never consumed.
    pub async fn handle_text(&self, conversation_id: i64, actor: &Actor, body: &str) -> Handling {
        let session = self.sessions.get(conversation_id).await;
        let Some(flow) = session.admin_flow_of(actor.id).cloned() else {
            return Handling::PassThrough;
        };

        if !self.admins.is_admin(actor.id) {
            return Handling::reply(self.admin_only());
        }

        if body.starts_with('/') {
            return Handling::PassThrough;
        }

        match flow.stage {
            FlowStage::Add(AddStage::AwaitingTitle) => {
                let title = body.trim();
                if title.is_empty() {
                    return Handling::reply(text(FlowPrompts::empty_title()));
                }

                let next = FlowState {
                    initiator_id: flow.initiator_id,
                    stage: FlowStage::Add(AddStage::AwaitingDocument {
                        title: title.to_string(),
                    }),
                };
                self.store_flow(conversation_id, session, Some(next)).await;
                debug!(user_id = actor.id, "Guide title collected");
                Handling::reply(text(FlowPrompts::ask_document()))
            }
            FlowStage::Delete(DeleteStage::AwaitingId) => {
                let guide_id = body.trim();
                if guide_id.is_empty() {
                    return Handling::reply(text(FlowPrompts::invalid_id()));
                }

                let guide = match self.catalog.get_by_id(guide_id).await {
                    Ok(Some(guide)) => guide,
                    Ok(None) => return Handling::reply(text(FlowPrompts::guide_not_found())),
                    Err(e) => {
                        error!(user_id = actor.id, guide_id, error = %e, "Failed to look up guide");
                        return Handling::reply(text(self.messages.read_failure.clone()));
                    }
                };

                let reply = FlowReply::Html(FlowPrompts::confirm_delete(&guide.id, &guide.title));
                let next = FlowState {
                    initiator_id: flow.initiator_id,
                    stage: FlowStage::Delete(DeleteStage::AwaitingConfirmation {
                        guide_id: guide.id,
                        guide_title: guide.title,
                    }),
                };
                self.store_flow(conversation_id, session, Some(next)).await;
                Handling::reply(reply)
            }
            _ => Handling::PassThrough,
        }
    }

    /// Offer an inbound document to the coordinator.
    ///
    /// Consumed only when the sender owns an add flow waiting for the PDF.
    pub async fn handle_document(
        &self,
        conversation_id: i64,
        actor: &Actor,
        document: &IncomingDocument,
    ) -> Handling {
        let session = self.sessions.get(conversation_id).await;
        let Some(flow) = session.admin_flow_of(actor.id).cloned() else {
            return Handling::PassThrough;
        };

        if !self.admins.is_admin(actor.id) {
            return Handling::reply(self.admin_only());
        }

        let FlowStage::Add(AddStage::AwaitingDocument { title }) = flow.stage else {
            return Handling::PassThrough;
        };

        if !document.is_pdf() {
            debug!(user_id = actor.id, mime_type = ?document.mime_type, "Rejected non-PDF upload");
            return Handling::reply(text(FlowPrompts::not_a_pdf()));
        }

        let reply = FlowReply::Html(FlowPrompts::confirm_add(
            &title,
            document.file_name.as_deref(),
        ));
        let next = FlowState {
            initiator_id: flow.initiator_id,
            stage: FlowStage::Add(AddStage::AwaitingConfirmation {
                title,
                document: UploadedDocument {
                    file_id: document.file_id.clone(),
                    file_name: document.file_name.clone(),
                },
            }),
        };
        self.store_flow(conversation_id, session, Some(next)).await;
        Handling::reply(reply)
    }

    /// Commit the sender's flow if it waits for confirmation.
    ///
    /// A storage failure keeps the flow so `/confirm` can be retried.
    pub async fn confirm(&self, conversation_id: i64, actor: &Actor) -> Vec<FlowReply> {
        if !self.admins.is_admin(actor.id) {
            return vec![self.admin_only()];
        }

        let session = self.sessions.get(conversation_id).await;
        let Some(flow) = session.admin_flow_of(actor.id).cloned() else {
            return vec![text(self.messages.nothing_to_confirm.clone())];
        };

        match flow.stage {
            FlowStage::Add(AddStage::AwaitingConfirmation { title, document }) => {
                if let Err(e) = self.catalog.create(&title, &document.file_id).await {
                    error!(user_id = actor.id, title = %title, error = %e, "Failed to create guide");
                    return vec![text(self.messages.storage_failure.clone())];
                }

                self.store_flow(conversation_id, session, None).await;
                vec![text(self.messages.guide_added.clone())]
            }
            FlowStage::Delete(DeleteStage::AwaitingConfirmation { guide_id, .. }) => {
                let removed = match self.catalog.delete_by_id(&guide_id).await {
                    Ok(removed) => removed,
                    Err(e) => {
                        error!(user_id = actor.id, guide_id = %guide_id, error = %e, "Failed to delete guide");
                        return vec![text(self.messages.storage_failure.clone())];
                    }
                };

                let Some(removed) = removed else {
                    warn!(user_id = actor.id, guide_id = %guide_id, "Guide vanished before deletion");
                    self.store_flow(conversation_id, session, None).await;
                    return vec![text(FlowPrompts::already_deleted())];
                };

                let notice = FlowPrompts::deletion_notice(&actor.attribution(), &removed.title);
                let summary = self.admins.notify_all(&notice, &[]).await;
                if !summary.failed.is_empty() {
                    warn!(failed = ?summary.failed, "Some admins missed the deletion notice");
                }

                self.store_flow(conversation_id, session, None).await;
                vec![text(self.messages.guide_deleted.clone())]
            }
            _ => vec![text(self.messages.nothing_to_confirm.clone())],
        }
    }

    /// Cancel the sender's flow, or a pending menu media upload
    pub async fn cancel(&self, conversation_id: i64, actor: &Actor) -> Vec<FlowReply> {
        if !self.admins.is_admin(actor.id) {
            return vec![self.admin_only()];
        }

        let mut session = self.sessions.get(conversation_id).await;

        if session.admin_flow_of(actor.id).is_some() {
            self.store_flow(conversation_id, session, None).await;
            info!(user_id = actor.id, conversation_id, "Admin flow cancelled");
            return vec![text(self.messages.flow_cancelled.clone())];
        }

        if session.menu_media_flow.take().is_some() {
            self.sessions.set(conversation_id, session).await;
            info!(user_id = actor.id, conversation_id, "Menu media upload cancelled");
            return vec![text(self.messages.flow_cancelled.clone())];
        }

        vec![text(self.messages.nothing_to_confirm.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{InMemorySessionStore, MenuMediaFlow};
    use crate::storage::{Guide, StorageError};
    use crate::testing::{guide, mock_admins, mock_catalog_with};
    use std::path::PathBuf;

    const ADMIN: i64 = 100;
    const CHAT: i64 = 100;

    fn admin() -> Actor {
        Actor::new(ADMIN, Some("boss".to_string()))
    }

    fn pdf(file_id: &str) -> IncomingDocument {
        IncomingDocument {
            file_id: file_id.to_string(),
            file_name: Some("guide.PDF".to_string()),
            mime_type: None,
        }
    }

    fn coordinator(
        sessions: Arc<InMemorySessionStore>,
        catalog: crate::storage::guides::MockGuideCatalog,
    ) -> AdminFlowCoordinator {
        AdminFlowCoordinator::new(
            sessions,
            Arc::new(catalog),
            Arc::new(mock_admins(&[ADMIN])),
            FlowMessages::default(),
        )
    }

    fn io_failure() -> StorageError {
        StorageError::Io {
            path: PathBuf::from("data/guides.json"),
            source: std::io::Error::other("disk full"),
        }
    }

    #[test]
    fn test_attribution() {
        assert_eq!(admin().attribution(), "@boss");
        assert_eq!(Actor::new(5, None).attribution(), "ID 5");
        assert_eq!(Actor::new(5, Some(String::new())).attribution(), "ID 5");
    }

    #[test]
    fn test_pdf_detection() {
        assert!(pdf("x").is_pdf());
        let by_mime = IncomingDocument {
            file_id: "x".to_string(),
            file_name: None,
            mime_type: Some("application/pdf".to_string()),
        };
        assert!(by_mime.is_pdf());
        let docx = IncomingDocument {
            file_id: "x".to_string(),
            file_name: Some("guide.docx".to_string()),
            mime_type: Some("application/msword".to_string()),
        };
        assert!(!docx.is_pdf());
    }

    #[tokio::test]
    async fn test_failed_create_keeps_flow_for_retry() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let mut catalog = mock_catalog_with(Vec::new());
        catalog
            .expect_create()
            .times(1)
            .returning(|_, _| Err(io_failure()));
        let coordinator = coordinator(Arc::clone(&sessions), catalog);

        coordinator.start_add(CHAT, &admin()).await;
        coordinator.handle_text(CHAT, &admin(), "Roof Guide").await;
        coordinator
            .handle_document(CHAT, &admin(), &pdf("doc123"))
            .await;

        let replies = coordinator.confirm(CHAT, &admin()).await;
        assert_eq!(replies, vec![FlowReply::Text(FlowMessages::default().storage_failure)]);

        let flow = sessions.get(CHAT).await.admin_flow.expect("flow kept");
        assert!(matches!(
            flow.stage,
            FlowStage::Add(AddStage::AwaitingConfirmation { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_flow_and_skips_notification() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let mut catalog = mock_catalog_with(vec![guide("g1", "Land")]);
        catalog
            .expect_delete_by_id()
            .times(1)
            .returning(|_| Err(io_failure()));
        let coordinator = coordinator(Arc::clone(&sessions), catalog);

        coordinator.start_delete(CHAT, &admin()).await;
        coordinator.handle_text(CHAT, &admin(), "g1").await;
        let replies = coordinator.confirm(CHAT, &admin()).await;

        assert_eq!(replies[0].text(), FlowMessages::default().storage_failure);
        assert!(sessions.get(CHAT).await.admin_flow.is_some());
    }

    #[tokio::test]
    async fn test_vanished_guide_clears_flow() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let mut catalog = mock_catalog_with(vec![guide("g1", "Land")]);
        catalog.expect_delete_by_id().returning(|_| Ok(None));
        let coordinator = coordinator(Arc::clone(&sessions), catalog);

        coordinator.start_delete(CHAT, &admin()).await;
        coordinator.handle_text(CHAT, &admin(), " g1 ").await;
        let replies = coordinator.confirm(CHAT, &admin()).await;

        assert_eq!(replies[0].text(), FlowPrompts::already_deleted());
        assert!(sessions.get(CHAT).await.admin_flow.is_none());
    }

    #[tokio::test]
    async fn test_listing_failure_starts_no_flow() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let mut catalog = crate::storage::guides::MockGuideCatalog::new();
        catalog.expect_list_all().returning(|| Err(io_failure()));
        let coordinator = coordinator(Arc::clone(&sessions), catalog);

        let replies = coordinator.start_delete(CHAT, &admin()).await;
        assert_eq!(replies[0].text(), FlowMessages::default().read_failure);
        assert!(sessions.get(CHAT).await.admin_flow.is_none());
    }

    #[tokio::test]
    async fn test_lookup_failure_reports_read_error_and_keeps_waiting_for_id() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let mut catalog = crate::storage::guides::MockGuideCatalog::new();
        catalog
            .expect_list_all()
            .returning(|| Ok(vec![guide("g1", "Land")]));
        catalog.expect_get_by_id().returning(|_| Err(io_failure()));
        let coordinator = coordinator(Arc::clone(&sessions), catalog);

        coordinator.start_delete(CHAT, &admin()).await;
        let handling = coordinator.handle_text(CHAT, &admin(), "g1").await;

        let Handling::Consumed(replies) = handling else {
            panic!("expected the id to be consumed, got {handling:?}");
        };
        assert_eq!(replies[0].text(), FlowMessages::default().read_failure);
        assert_ne!(
            FlowMessages::default().read_failure,
            FlowMessages::default().storage_failure
        );
        assert_eq!(
            sessions.get(CHAT).await.admin_flow,
            Some(FlowState::delete(ADMIN))
        );
    }

    #[tokio::test]
    async fn test_commands_are_not_consumed() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let coordinator = coordinator(Arc::clone(&sessions), mock_catalog_with(Vec::new()));

        coordinator.start_add(CHAT, &admin()).await;
        let handling = coordinator.handle_text(CHAT, &admin(), "/users").await;

        assert_eq!(handling, Handling::PassThrough);
        assert_eq!(
            sessions.get(CHAT).await.admin_flow,
            Some(FlowState::add(ADMIN))
        );
    }

    #[tokio::test]
    async fn test_text_at_document_step_passes_through() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let coordinator = coordinator(Arc::clone(&sessions), mock_catalog_with(Vec::new()));

        coordinator.start_add(CHAT, &admin()).await;
        coordinator.handle_text(CHAT, &admin(), "Roof").await;
        let handling = coordinator.handle_text(CHAT, &admin(), "hello").await;

        assert_eq!(handling, Handling::PassThrough);
    }

    #[tokio::test]
    async fn test_cancel_clears_pending_menu_media_upload() {
        let sessions = Arc::new(InMemorySessionStore::new());
        sessions
            .set(
                CHAT,
                Session {
                    menu_media_flow: Some(MenuMediaFlow { initiator_id: ADMIN }),
                    ..Session::default()
                },
            )
            .await;
        let coordinator = coordinator(Arc::clone(&sessions), mock_catalog_with(Vec::new()));

        let replies = coordinator.cancel(CHAT, &admin()).await;
        assert_eq!(replies[0].text(), FlowMessages::default().flow_cancelled);
        assert!(sessions.get(CHAT).await.is_empty());
    }

    #[tokio::test]
    async fn test_non_admin_gets_notice_on_every_entry_point() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let coordinator = coordinator(Arc::clone(&sessions), mock_catalog_with(Vec::new()));
        let stranger = Actor::new(7, None);
        let notice = FlowMessages::default().admin_only;

        for replies in [
            coordinator.start_add(7, &stranger).await,
            coordinator.start_delete(7, &stranger).await,
            coordinator.confirm(7, &stranger).await,
            coordinator.cancel(7, &stranger).await,
        ] {
            assert_eq!(replies, vec![FlowReply::Text(notice.clone())]);
        }
        assert!(sessions.get(7).await.is_empty());
    }

    #[tokio::test]
    async fn test_flow_of_demoted_admin_is_consumed_with_notice() {
        let sessions = Arc::new(InMemorySessionStore::new());
        sessions
            .set(
                CHAT,
                Session {
                    admin_flow: Some(FlowState::add(55)),
                    ..Session::default()
                },
            )
            .await;
        let coordinator = coordinator(Arc::clone(&sessions), mock_catalog_with(Vec::<Guide>::new()));

        let handling = coordinator
            .handle_text(CHAT, &Actor::new(55, None), "Title")
            .await;

        assert_eq!(
            handling,
            Handling::Consumed(vec![FlowReply::Text(FlowMessages::default().admin_only)])
        );
        assert_eq!(sessions.get(CHAT).await.admin_flow, Some(FlowState::add(55)));
    }
}
