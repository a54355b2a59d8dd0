//! Collaborator interfaces injected into the workflow.
//!
//! The workflow never talks to Postgres, the provider, or S3 directly;
//! it is parametrized over these four traits so the HTTP adapter and
//! the test fakes drive the exact same orchestration code.

use async_trait::async_trait;

use reelgen_core::scene::SceneStyle;
use reelgen_core::types::DbId;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Ephemeral input to one workflow run. Not persisted on its own.
#[derive(Debug, Clone)]
pub struct SceneRequest {
    pub user_id: DbId,
    pub prompt: String,
    pub style: SceneStyle,
}

// ---------------------------------------------------------------------------
// Balance store (credit ledger)
// ---------------------------------------------------------------------------

/// Outcome of a successful credit reservation.
#[derive(Debug, Clone, Copy)]
pub struct Reservation {
    /// Balance remaining after the debit.
    pub remaining: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum BalanceError {
    #[error("insufficient credits")]
    InsufficientCredits,
    #[error("credit account not found")]
    UserNotFound,
    #[error("balance store unavailable: {0}")]
    Unavailable(String),
}

/// Atomic per-user credit ledger.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Atomically debit one credit. Two concurrent reservations against
    /// a balance of 1 must not both succeed.
    async fn reserve(&self, user_id: DbId) -> Result<Reservation, BalanceError>;

    /// Unconditionally credit one unit back. Best-effort compensation,
    /// not transactional with the original debit.
    async fn refund(&self, user_id: DbId) -> Result<(), BalanceError>;
}

// ---------------------------------------------------------------------------
// Generation provider
// ---------------------------------------------------------------------------

/// Opaque handle to in-flight provider work.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle(pub String);

impl std::fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a finished operation's output: a transient download
/// URL plus its media type.
#[derive(Debug, Clone)]
pub struct OperationOutput {
    pub media_url: String,
    pub content_type: String,
}

/// State of an operation as observed by one poll.
#[derive(Debug, Clone)]
pub enum OperationState {
    Pending,
    Done(OperationOutput),
    /// Provider-reported failure detail, surfaced verbatim in logs but
    /// translated to a generic failure for the caller.
    Failed(String),
}

/// Transport-level provider failure (submit, poll, or download).
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// External generative-media provider.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Submit a generation request, returning a pollable handle.
    async fn submit(&self, request: &SceneRequest) -> Result<OperationHandle, ProviderError>;

    /// Re-check an operation. Idempotent once the operation is terminal.
    async fn poll(&self, handle: &OperationHandle) -> Result<OperationState, ProviderError>;

    /// Download the finished artifact bytes from the output reference.
    async fn fetch(&self, output: &OperationOutput) -> Result<Vec<u8>, ProviderError>;
}

// ---------------------------------------------------------------------------
// Artifact store
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ArtifactError(pub String);

/// Durable, append-only artifact storage.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store bytes at `key` with the given content type, publicly
    /// readable, and return the stable public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, ArtifactError>;
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

/// Immutable audit entry for one successful generation.
#[derive(Debug, Clone)]
pub struct NewGenerationRecord {
    pub user_id: DbId,
    pub prompt: String,
    pub style: SceneStyle,
    pub video_url: String,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RecordError(pub String);

/// Append-only generation record persistence.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert one record with a server-assigned timestamp, returning
    /// its system-generated id.
    async fn insert(&self, record: NewGenerationRecord) -> Result<DbId, RecordError>;
}
