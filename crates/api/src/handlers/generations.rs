//! Handler for generation history.
//!
//! Route:
//! - `GET /users/{user_id}/generations` — past generations, newest first

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use reelgen_core::types::DbId;
use reelgen_db::repositories::GenerationRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/users/{user_id}/generations
pub async fn list_generations(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let generations = GenerationRepo::list_for_user(&state.pool, user_id).await?;
    Ok(Json(DataResponse { data: generations }))
}
