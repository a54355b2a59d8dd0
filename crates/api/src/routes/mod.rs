pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// All `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/scenes/generate", post(handlers::scenes::generate_scene))
        .route(
            "/users/{user_id}/credits",
            get(handlers::credits::get_balance),
        )
        .route(
            "/users/{user_id}/generations",
            get(handlers::generations::list_generations),
        )
}
