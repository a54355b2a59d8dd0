use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::adapters::AppWorkflow;
use crate::config::ServerConfig;

/// Shared application state available to all axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: reelgen_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The scene-generation workflow with production adapters bound.
    pub workflow: Arc<AppWorkflow>,
    /// Cancelled on shutdown; in-flight generations observe it at their
    /// next poll interval and refund before exiting.
    pub shutdown: CancellationToken,
}
