//! Handler for credit balance lookups.
//!
//! Route:
//! - `GET /users/{user_id}/credits` — current balance

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use reelgen_core::error::CoreError;
use reelgen_core::types::DbId;
use reelgen_db::repositories::CreditRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Balance snapshot returned by the credits endpoint.
#[derive(Debug, Serialize)]
pub struct CreditBalanceResponse {
    pub user_id: DbId,
    pub credits: i32,
}

/// GET /api/v1/users/{user_id}/credits
pub async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let account = CreditRepo::find_by_user_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "CreditAccount",
            id: user_id,
        }))?;

    Ok(Json(DataResponse {
        data: CreditBalanceResponse {
            user_id: account.user_id,
            credits: account.credits,
        },
    }))
}
