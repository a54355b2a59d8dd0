//! Adapter impls binding the workflow's collaborator traits to the
//! concrete database, provider, and storage clients.
//!
//! Each adapter is created once per process and reused across
//! invocations; all inner clients are pooled or cheaply cloneable.

use async_trait::async_trait;

use reelgen_core::scene;
use reelgen_core::types::DbId;
use reelgen_db::models::generation::CreateSceneGeneration;
use reelgen_db::repositories::{CreditRepo, GenerationRepo, ReserveOutcome};
use reelgen_db::DbPool;
use reelgen_pipeline::{
    ArtifactError, ArtifactStore, BalanceError, BalanceStore, GenerationProvider,
    NewGenerationRecord, OperationHandle, OperationState, ProviderError, RecordError, RecordStore,
    Reservation, SceneRequest, SceneWorkflow, WorkflowConfig,
};
use reelgen_provider::api::{GenerationSettings, VideoApi};
use reelgen_provider::operation;
use reelgen_storage::S3ObjectStore;

/// Workflow type with all production adapters bound.
pub type AppWorkflow = SceneWorkflow<PgBalanceStore, SceneProvider, S3Artifacts, PgRecordStore>;

/// Assemble the production workflow from its concrete collaborators.
pub fn build_workflow(
    pool: DbPool,
    api: VideoApi,
    settings: GenerationSettings,
    store: S3ObjectStore,
    config: WorkflowConfig,
) -> AppWorkflow {
    SceneWorkflow::new(
        PgBalanceStore { pool: pool.clone() },
        SceneProvider { api, settings },
        S3Artifacts { store },
        PgRecordStore { pool },
        config,
    )
}

// ---------------------------------------------------------------------------
// Balance store
// ---------------------------------------------------------------------------

/// Credit ledger backed by the `credit_accounts` table.
pub struct PgBalanceStore {
    pub pool: DbPool,
}

#[async_trait]
impl BalanceStore for PgBalanceStore {
    async fn reserve(&self, user_id: DbId) -> Result<Reservation, BalanceError> {
        let outcome = CreditRepo::reserve(&self.pool, user_id)
            .await
            .map_err(|e| BalanceError::Unavailable(e.to_string()))?;
        match outcome {
            ReserveOutcome::Reserved { remaining } => Ok(Reservation {
                remaining: remaining as i64,
            }),
            ReserveOutcome::Insufficient => Err(BalanceError::InsufficientCredits),
            ReserveOutcome::NotFound => Err(BalanceError::UserNotFound),
        }
    }

    async fn refund(&self, user_id: DbId) -> Result<(), BalanceError> {
        let matched = CreditRepo::refund(&self.pool, user_id)
            .await
            .map_err(|e| BalanceError::Unavailable(e.to_string()))?;
        if matched {
            Ok(())
        } else {
            // The account vanished between reserve and refund. Surface it
            // so the workflow raises the reconciliation alert.
            Err(BalanceError::Unavailable(format!(
                "no credit account matched user {user_id}"
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Generation provider
// ---------------------------------------------------------------------------

/// Generative-video provider bound to the REST client.
pub struct SceneProvider {
    pub api: VideoApi,
    pub settings: GenerationSettings,
}

#[async_trait]
impl GenerationProvider for SceneProvider {
    async fn submit(&self, request: &SceneRequest) -> Result<OperationHandle, ProviderError> {
        let prompt = scene::provider_prompt(&request.prompt, request.style);
        let handle = self
            .api
            .submit(&prompt, &self.settings)
            .await
            .map_err(|e| ProviderError(e.to_string()))?;
        Ok(OperationHandle(handle.0))
    }

    async fn poll(&self, handle: &OperationHandle) -> Result<OperationState, ProviderError> {
        let status = self
            .api
            .check_operation(&operation::OperationHandle(handle.0.clone()))
            .await
            .map_err(|e| ProviderError(e.to_string()))?;

        if !status.is_terminal() {
            return Ok(OperationState::Pending);
        }
        if let Some(error) = status.error {
            return Ok(OperationState::Failed(error.message));
        }
        match status.output {
            Some(output) => Ok(OperationState::Done(reelgen_pipeline::OperationOutput {
                media_url: output.video_url,
                content_type: output.mime_type,
            })),
            // Terminal without output or error: nothing to materialize.
            None => Ok(OperationState::Failed(
                "operation finished without a video output".to_string(),
            )),
        }
    }

    async fn fetch(
        &self,
        output: &reelgen_pipeline::OperationOutput,
    ) -> Result<Vec<u8>, ProviderError> {
        self.api
            .download(&output.media_url)
            .await
            .map_err(|e| ProviderError(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Artifact store
// ---------------------------------------------------------------------------

/// Artifact storage backed by the S3 bucket.
pub struct S3Artifacts {
    pub store: S3ObjectStore,
}

#[async_trait]
impl ArtifactStore for S3Artifacts {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ArtifactError> {
        self.store
            .put_public(key, bytes, content_type)
            .await
            .map_err(|e| ArtifactError(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

/// Generation records backed by the `scene_generations` table.
pub struct PgRecordStore {
    pub pool: DbPool,
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, record: NewGenerationRecord) -> Result<DbId, RecordError> {
        let row = GenerationRepo::insert(
            &self.pool,
            &CreateSceneGeneration {
                user_id: record.user_id,
                prompt: record.prompt,
                style: record.style.as_str().to_string(),
                video_url: record.video_url,
            },
        )
        .await
        .map_err(|e| RecordError(e.to_string()))?;
        Ok(row.id)
    }
}
