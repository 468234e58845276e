use async_trait::async_trait;
use guidebot_core::admin::{AdminDirectory, NotifySummary};
use guidebot_core::flow::{
    Actor, AdminFlowCoordinator, FlowMessages, FlowState, FlowStep, IncomingDocument,
};
use guidebot_core::session::{InMemorySessionStore, SessionStore};
use guidebot_core::storage::{Guide, GuideCatalog, StorageError};
use proptest::prelude::*;
use std::sync::Arc;
use tokio::sync::RwLock;

const CHAT: i64 = -42;
const ADMINS: [i64; 2] = [1, 2];

/// Catalog kept in memory with predictable ids `g0`, `g1`, ...
#[derive(Default)]
struct MemoryCatalog {
    guides: RwLock<Vec<Guide>>,
    next_id: RwLock<usize>,
}

#[async_trait]
impl GuideCatalog for MemoryCatalog {
    async fn list_all(&self) -> Result<Vec<Guide>, StorageError> {
        Ok(self.guides.read().await.clone())
    }

    async fn list_available(&self) -> Result<Vec<Guide>, StorageError> {
        let guides = self.guides.read().await;
        Ok(guides.iter().filter(|g| g.is_available()).cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Guide>, StorageError> {
        Ok(self.guides.read().await.iter().find(|g| g.id == id).cloned())
    }

    async fn create(&self, title: &str, file_id: &str) -> Result<Guide, StorageError> {
        let mut next = self.next_id.write().await;
        let guide = Guide {
            id: format!("g{next}"),
            title: title.to_string(),
            file_id: file_id.to_string(),
            created_at: None,
        };
        *next += 1;
        self.guides.write().await.push(guide.clone());
        Ok(guide)
    }

    async fn delete_by_id(&self, id: &str) -> Result<Option<Guide>, StorageError> {
        let mut guides = self.guides.write().await;
        let position = guides.iter().position(|g| g.id == id);
        Ok(position.map(|p| guides.remove(p)))
    }
}

struct StaticAdmins;

#[async_trait]
impl AdminDirectory for StaticAdmins {
    fn is_admin(&self, user_id: i64) -> bool {
        ADMINS.contains(&user_id)
    }

    async fn notify_all(&self, _message: &str, _excluding: &[i64]) -> NotifySummary {
        NotifySummary {
            delivered: ADMINS.len(),
            failed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
enum Op {
    StartAdd(i64),
    StartDelete(i64),
    Text(i64, String),
    Document(i64, bool),
    Confirm(i64),
    Cancel(i64),
}

impl Op {
    const fn actor_id(&self) -> i64 {
        match self {
            Self::StartAdd(id)
            | Self::StartDelete(id)
            | Self::Text(id, _)
            | Self::Document(id, _)
            | Self::Confirm(id)
            | Self::Cancel(id) => *id,
        }
    }
}

fn actor_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![Just(1_i64), Just(2_i64), Just(3_i64)]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let text = prop_oneof![
        "g[0-3]",
        "[a-zA-Z ]{0,8}",
        Just("/cancel".to_string()),
    ];
    prop_oneof![
        actor_strategy().prop_map(Op::StartAdd),
        actor_strategy().prop_map(Op::StartDelete),
        (actor_strategy(), text).prop_map(|(id, body)| Op::Text(id, body)),
        (actor_strategy(), any::<bool>()).prop_map(|(id, is_pdf)| Op::Document(id, is_pdf)),
        actor_strategy().prop_map(Op::Confirm),
        actor_strategy().prop_map(Op::Cancel),
    ]
}

fn document(is_pdf: bool) -> IncomingDocument {
    IncomingDocument {
        file_id: "file".to_string(),
        file_name: Some(if is_pdf { "a.pdf" } else { "a.txt" }.to_string()),
        mime_type: None,
    }
}

struct World {
    sessions: Arc<InMemorySessionStore>,
    catalog: Arc<MemoryCatalog>,
    coordinator: AdminFlowCoordinator,
}

fn world() -> World {
    let sessions = Arc::new(InMemorySessionStore::new());
    let catalog = Arc::new(MemoryCatalog::default());
    let coordinator = AdminFlowCoordinator::new(
        Arc::clone(&sessions) as Arc<dyn SessionStore>,
        Arc::clone(&catalog) as Arc<dyn GuideCatalog>,
        Arc::new(StaticAdmins),
        FlowMessages::default(),
    );
    World {
        sessions,
        catalog,
        coordinator,
    }
}

async fn apply(world: &World, op: &Op) {
    let actor = Actor::new(op.actor_id(), None);
    match op {
        Op::StartAdd(_) => {
            world.coordinator.start_add(CHAT, &actor).await;
        }
        Op::StartDelete(_) => {
            world.coordinator.start_delete(CHAT, &actor).await;
        }
        Op::Text(_, body) => {
            world.coordinator.handle_text(CHAT, &actor, body).await;
        }
        Op::Document(_, is_pdf) => {
            world
                .coordinator
                .handle_document(CHAT, &actor, &document(*is_pdf))
                .await;
        }
        Op::Confirm(_) => {
            world.coordinator.confirm(CHAT, &actor).await;
        }
        Op::Cancel(_) => {
            world.coordinator.cancel(CHAT, &actor).await;
        }
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

proptest! {
    /// The catalog only changes when the flow owner confirms a finished flow.
    #[test]
    fn catalog_changes_only_on_owner_confirmation(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let rt = runtime();
        rt.block_on(async {
            let world = world();

            for op in &ops {
                let flow_before: Option<FlowState> = world.sessions.get(CHAT).await.admin_flow;
                let len_before = world.catalog.list_all().await.map(|g| g.len()).unwrap_or_default();

                apply(&world, op).await;

                let flow_after = world.sessions.get(CHAT).await.admin_flow;
                let len_after = world.catalog.list_all().await.map(|g| g.len()).unwrap_or_default();

                if len_after != len_before {
                    let before = flow_before.as_ref();
                    prop_assert!(matches!(op, Op::Confirm(_)), "{:?} mutated the catalog", op);
                    prop_assert_eq!(before.map(|f| f.initiator_id), Some(op.actor_id()));
                    prop_assert_eq!(before.map(FlowState::step), Some(FlowStep::AwaitingConfirmation));
                    prop_assert!(flow_after.is_none());
                }

                let owns_flow = flow_before.as_ref().is_some_and(|f| f.initiator_id == op.actor_id());
                if matches!(op, Op::Text(..) | Op::Document(..) | Op::Confirm(_) | Op::Cancel(_)) && !owns_flow {
                    prop_assert_eq!(&flow_after, &flow_before, "{:?} touched a foreign flow", op);
                }

                if matches!(op, Op::Cancel(_)) {
                    prop_assert_eq!(len_after, len_before);
                    if owns_flow && ADMINS.contains(&op.actor_id()) {
                        prop_assert!(flow_after.is_none());
                    }
                }

                if let Some(flow) = &flow_after {
                    prop_assert!(ADMINS.contains(&flow.initiator_id));
                }
            }
            Ok(())
        })?;
    }

    /// A valid add sequence creates exactly one guide with the trimmed title.
    #[test]
    fn valid_add_sequence_creates_one_guide(title in "[ ]{0,3}[a-zA-Zа-яА-Я0-9][a-zA-Zа-яА-Я0-9 ]{0,30}") {
        let rt = runtime();
        rt.block_on(async {
            let world = world();
            let admin = Actor::new(1, None);

            world.coordinator.start_add(CHAT, &admin).await;
            world.coordinator.handle_text(CHAT, &admin, &title).await;
            world.coordinator.handle_document(CHAT, &admin, &document(true)).await;
            world.coordinator.confirm(CHAT, &admin).await;

            let guides = world.catalog.list_all().await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(guides.len(), 1);
            prop_assert_eq!(guides[0].title.as_str(), title.trim());
            prop_assert_eq!(guides[0].file_id.as_str(), "file");
            prop_assert!(world.sessions.get(CHAT).await.admin_flow.is_none());
            Ok(())
        })?;
    }

    /// Cancelling at any step leaves the catalog untouched and clears the flow.
    #[test]
    fn cancel_at_any_step_never_mutates(steps in 0_usize..4) {
        let rt = runtime();
        rt.block_on(async {
            let world = world();
            let admin = Actor::new(2, None);

            world.coordinator.start_add(CHAT, &admin).await;
            if steps > 0 {
                world.coordinator.handle_text(CHAT, &admin, "Roof").await;
            }
            if steps > 1 {
                world.coordinator.handle_document(CHAT, &admin, &document(true)).await;
            }
            if steps > 2 {
                world.coordinator.handle_text(CHAT, &admin, "ignored").await;
            }
            world.coordinator.cancel(CHAT, &admin).await;

            prop_assert!(world.catalog.list_all().await.map(|g| g.is_empty()).unwrap_or(false));
            prop_assert!(world.sessions.get(CHAT).await.admin_flow.is_none());
            Ok(())
        })?;
    }
}
