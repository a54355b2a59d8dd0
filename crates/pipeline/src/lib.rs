//! Metered asynchronous generation workflow.
//!
//! [`workflow::SceneWorkflow`] sequences credit reservation, provider
//! submission, bounded polling, artifact materialization, and record
//! persistence against injected collaborator traits ([`ports`]),
//! enforcing the invariant that a credit is spent if and only if a
//! durable artifact and record exist.

pub mod ports;
pub mod workflow;

pub use ports::{
    ArtifactError, ArtifactStore, BalanceError, BalanceStore, GenerationProvider, NewGenerationRecord,
    OperationHandle, OperationOutput, OperationState, ProviderError, RecordError, RecordStore,
    Reservation, SceneRequest,
};
pub use workflow::{GenerateError, SceneGenerated, SceneWorkflow, WorkflowConfig};
