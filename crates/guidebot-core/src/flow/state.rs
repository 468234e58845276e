//! Typed admin flow state
//!
//! Each stage carries exactly the data collected so far, so a later stage
//! cannot be reached without the payload of the earlier ones.

/// Document received during the add flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    /// Telegram file id
    pub file_id: String,
    /// Original file name, if the client sent one
    pub file_name: Option<String>,
}

/// Stages of the add guide flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddStage {
    /// Waiting for the guide title
    AwaitingTitle,
    /// Title collected, waiting for the PDF
    AwaitingDocument {
        /// Trimmed, non-empty title
        title: String,
    },
    /// Everything collected, waiting for `/confirm`
    AwaitingConfirmation {
        /// Trimmed, non-empty title
        title: String,
        /// Uploaded PDF
        document: UploadedDocument,
    },
}

/// Stages of the delete guide flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteStage {
    /// Waiting for the id of the guide to delete
    AwaitingId,
    /// Guide resolved, waiting for `/confirm`
    AwaitingConfirmation {
        /// Id of the guide to delete
        guide_id: String,
        /// Title at the time of selection
        guide_title: String,
    },
}

/// Which sequence a flow is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowMode {
    /// Adding a guide
    Add,
    /// Deleting a guide
    Delete,
}

/// Flat view of the current step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    /// Add: waiting for a title
    AwaitingTitle,
    /// Add: waiting for a document
    AwaitingDocument,
    /// Delete: waiting for an id
    AwaitingId,
    /// Either mode: waiting for `/confirm`
    AwaitingConfirmation,
}

/// Stage of a flow together with its mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStage {
    /// Add guide flow
    Add(AddStage),
    /// Delete guide flow
    Delete(DeleteStage),
}

/// One admin flow, owned by the conversation session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowState {
    /// Admin who started the flow; nobody else may advance it
    pub initiator_id: i64,
    /// Current stage with its payload
    pub stage: FlowStage,
}

impl FlowState {
    /// Fresh add flow waiting for a title
    #[must_use]
    pub const fn add(initiator_id: i64) -> Self {
        Self {
            initiator_id,
            stage: FlowStage::Add(AddStage::AwaitingTitle),
        }
    }

    /// Fresh delete flow waiting for an id
    #[must_use]
    pub const fn delete(initiator_id: i64) -> Self {
        Self {
            initiator_id,
            stage: FlowStage::Delete(DeleteStage::AwaitingId),
        }
    }

    /// Mode of the flow
    #[must_use]
    pub const fn mode(&self) -> FlowMode {
        match self.stage {
            FlowStage::Add(_) => FlowMode::Add,
            FlowStage::Delete(_) => FlowMode::Delete,
        }
    }

    /// Current step
    #[must_use]
    pub const fn step(&self) -> FlowStep {
        match self.stage {
            FlowStage::Add(AddStage::AwaitingTitle) => FlowStep::AwaitingTitle,
            FlowStage::Add(AddStage::AwaitingDocument { .. }) => FlowStep::AwaitingDocument,
            FlowStage::Delete(DeleteStage::AwaitingId) => FlowStep::AwaitingId,
            FlowStage::Add(AddStage::AwaitingConfirmation { .. })
            | FlowStage::Delete(DeleteStage::AwaitingConfirmation { .. }) => {
                FlowStep::AwaitingConfirmation
            }
        }
    }
}
