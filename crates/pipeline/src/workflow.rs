//! The scene-generation workflow orchestrator.
//!
//! One [`SceneWorkflow::generate`] call runs the full sequence:
//! reserve credit → submit → poll (bounded) → materialize → record.
//! A credit is spent if and only if a durable artifact and record
//! exist; every failure after reservation triggers exactly one refund.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use reelgen_core::artifact;
use reelgen_core::poll::PollPolicy;
use reelgen_core::types::DbId;

use crate::ports::{
    ArtifactStore, BalanceError, BalanceStore, GenerationProvider, NewGenerationRecord,
    OperationHandle, OperationOutput, OperationState, RecordStore, SceneRequest,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for one workflow instance, fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct WorkflowConfig {
    /// Bounded polling policy for provider operations.
    pub poll: PollPolicy,
}

// ---------------------------------------------------------------------------
// Result and error taxonomy
// ---------------------------------------------------------------------------

/// Success payload returned to the caller.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SceneGenerated {
    /// Stable public URL of the stored video artifact.
    pub video_url: String,
    /// Id of the persisted generation record.
    pub generation_id: DbId,
    /// Credit balance after the debit.
    pub remaining_credits: i64,
}

/// Typed workflow failure.
///
/// The first three variants occur before any credit is spent; all
/// others are raised only after a reservation and therefore always
/// travel through the refund path.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("insufficient credits")]
    InsufficientCredits,

    #[error("credit account not found")]
    UserNotFound,

    #[error("credit ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// Provider rejected or failed the generation (includes a finished
    /// operation with no output). The detail is logged; callers see
    /// only the generic kind.
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    #[error("generation timed out after {}s", .0.as_secs())]
    GenerationTimeout(Duration),

    #[error("failed to download generated video: {0}")]
    DownloadFailed(String),

    #[error("failed to store video artifact: {0}")]
    UploadFailed(String),

    #[error("failed to record generation: {0}")]
    PersistenceError(String),

    /// The workflow was cancelled cooperatively (e.g. shutdown). The
    /// reserved credit is still refunded before this is returned.
    #[error("generation cancelled")]
    Cancelled,
}

impl GenerateError {
    /// Whether this failure occurred after a credit was reserved and
    /// therefore obligates a refund.
    pub fn refundable(&self) -> bool {
        !matches!(
            self,
            GenerateError::InsufficientCredits
                | GenerateError::UserNotFound
                | GenerateError::LedgerUnavailable(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Orchestrator over the four injected collaborators.
///
/// Stateless across invocations: all durable state lives behind the
/// collaborator traits, so one instance is created per process and
/// shared across concurrent requests.
pub struct SceneWorkflow<B, P, A, R> {
    balance: B,
    provider: P,
    artifacts: A,
    records: R,
    config: WorkflowConfig,
}

impl<B, P, A, R> SceneWorkflow<B, P, A, R>
where
    B: BalanceStore,
    P: GenerationProvider,
    A: ArtifactStore,
    R: RecordStore,
{
    pub fn new(balance: B, provider: P, artifacts: A, records: R, config: WorkflowConfig) -> Self {
        Self {
            balance,
            provider,
            artifacts,
            records,
            config,
        }
    }

    /// Run one generation end to end.
    ///
    /// Returns the success payload, or a single typed failure. Partial
    /// states (artifact without record, credit spent without refund)
    /// are never surfaced as success. Cancelling `cancel` stops the
    /// workflow at the next suspension point; the refund still runs.
    pub async fn generate(
        &self,
        request: SceneRequest,
        cancel: &CancellationToken,
    ) -> Result<SceneGenerated, GenerateError> {
        let reservation = self
            .balance
            .reserve(request.user_id)
            .await
            .map_err(|e| match e {
                BalanceError::InsufficientCredits => GenerateError::InsufficientCredits,
                BalanceError::UserNotFound => GenerateError::UserNotFound,
                BalanceError::Unavailable(detail) => GenerateError::LedgerUnavailable(detail),
            })?;

        // Correlates the reservation with its (possible) refund in logs
        // for manual reconciliation.
        let correlation = Uuid::new_v4();
        tracing::info!(
            user_id = request.user_id,
            remaining = reservation.remaining,
            correlation = %correlation,
            "Credit reserved",
        );

        match self.run_reserved(&request, cancel).await {
            Ok((video_url, generation_id)) => {
                tracing::info!(
                    user_id = request.user_id,
                    generation_id,
                    correlation = %correlation,
                    "Scene generation completed",
                );
                Ok(SceneGenerated {
                    video_url,
                    generation_id,
                    remaining_credits: reservation.remaining,
                })
            }
            Err(err) => {
                // Every error past this point obligates exactly one refund.
                self.refund(request.user_id, correlation).await;
                Err(err)
            }
        }
    }

    /// Everything that happens after a credit has been reserved.
    ///
    /// Kept separate from [`generate`](Self::generate) so the refund
    /// wrapper there runs exactly once per failed instance.
    async fn run_reserved(
        &self,
        request: &SceneRequest,
        cancel: &CancellationToken,
    ) -> Result<(String, DbId), GenerateError> {
        let handle = self
            .provider
            .submit(request)
            .await
            .map_err(|e| GenerateError::GenerationFailed(e.to_string()))?;
        tracing::info!(user_id = request.user_id, operation = %handle, "Generation submitted");

        let output = self.await_operation(&handle, cancel).await?;

        let bytes = self
            .provider
            .fetch(&output)
            .await
            .map_err(|e| GenerateError::DownloadFailed(e.to_string()))?;

        let key = artifact::scene_video_key(request.user_id, chrono::Utc::now(), Uuid::new_v4());
        let video_url = self
            .artifacts
            .put(&key, bytes, &output.content_type)
            .await
            .map_err(|e| GenerateError::UploadFailed(e.to_string()))?;

        let generation_id = self
            .records
            .insert(NewGenerationRecord {
                user_id: request.user_id,
                prompt: request.prompt.clone(),
                style: request.style,
                video_url: video_url.clone(),
            })
            .await
            .map_err(|e| GenerateError::PersistenceError(e.to_string()))?;

        Ok((video_url, generation_id))
    }

    /// Poll the operation on a fixed interval until it is terminal, the
    /// policy's attempt cap is exhausted, or `cancel` fires.
    ///
    /// A transport error on a single poll is logged and retried on the
    /// next attempt; only a provider-reported failure (or a finished
    /// operation without output) fails the workflow outright.
    async fn await_operation(
        &self,
        handle: &OperationHandle,
        cancel: &CancellationToken,
    ) -> Result<OperationOutput, GenerateError> {
        let policy = self.config.poll;
        for attempt in 1..=policy.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(operation = %handle, attempt, "Generation cancelled while polling");
                    return Err(GenerateError::Cancelled);
                }
                _ = tokio::time::sleep(policy.interval) => {}
            }

            match self.provider.poll(handle).await {
                Ok(OperationState::Pending) => {
                    tracing::debug!(operation = %handle, attempt, "Operation still pending");
                }
                Ok(OperationState::Done(output)) => {
                    tracing::info!(operation = %handle, attempt, "Operation completed");
                    return Ok(output);
                }
                Ok(OperationState::Failed(detail)) => {
                    tracing::warn!(operation = %handle, attempt, detail = %detail, "Operation failed");
                    return Err(GenerateError::GenerationFailed(detail));
                }
                Err(e) => {
                    tracing::warn!(operation = %handle, attempt, error = %e, "Poll attempt failed");
                }
            }
        }

        tracing::warn!(operation = %handle, "Operation did not complete within poll budget");
        Err(GenerateError::GenerationTimeout(policy.max_wait()))
    }

    /// Compensate a failed instance. Refund failures are alerted for
    /// manual reconciliation, never propagated: the caller should see
    /// the original workflow error.
    async fn refund(&self, user_id: DbId, correlation: Uuid) {
        match self.balance.refund(user_id).await {
            Ok(()) => {
                tracing::info!(user_id, correlation = %correlation, "Credit refunded");
            }
            Err(e) => {
                tracing::error!(
                    user_id,
                    correlation = %correlation,
                    error = %e,
                    "ALERT: credit refund failed, manual reconciliation required",
                );
            }
        }
    }
}
