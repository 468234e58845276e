//! Multi-step admin flows for managing the guide catalog

/// Flow orchestration
pub mod coordinator;
/// Notices and step prompts
pub mod messages;
/// Typed flow state
pub mod state;

pub use coordinator::{Actor, AdminFlowCoordinator, FlowReply, Handling, IncomingDocument};
pub use messages::{FlowMessages, FlowPrompts};
pub use state::{AddStage, DeleteStage, FlowMode, FlowStage, FlowState, FlowStep, UploadedDocument};
