//! Handler for the scene-generation endpoint.
//!
//! Route:
//! - `POST /scenes/generate` — run one metered generation end to end

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use reelgen_core::scene::{self, SceneStyle};
use reelgen_core::types::DbId;
use reelgen_pipeline::SceneRequest;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /scenes/generate`.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateSceneRequest {
    pub user_id: DbId,
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    /// One of the closed style set; unknown values are rejected at
    /// deserialization.
    pub style: SceneStyle,
}

/// POST /api/v1/scenes/generate
///
/// Validates the request, then runs the full workflow: reserve credit,
/// submit, poll, store the artifact, record the generation. The caller
/// receives either the complete success payload or a single typed
/// error; partial states are never exposed.
pub async fn generate_scene(
    State(state): State<AppState>,
    Json(input): Json<GenerateSceneRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    // Rejects whitespace-only prompts the length validator accepts.
    scene::validate_prompt(&input.prompt).map_err(AppError::Core)?;

    let request = SceneRequest {
        user_id: input.user_id,
        prompt: input.prompt,
        style: input.style,
    };

    // Run on a detached task so a client disconnect cannot drop the
    // workflow mid-flight and abandon a reserved credit; the shutdown
    // token remains the only cancellation path.
    let workflow = Arc::clone(&state.workflow);
    let cancel = state.shutdown.clone();
    let generated = tokio::spawn(async move { workflow.generate(request, &cancel).await })
        .await
        .map_err(|e| AppError::InternalError(format!("generation task failed: {e}")))??;

    Ok(Json(DataResponse { data: generated }))
}
