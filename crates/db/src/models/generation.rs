//! Scene generation record model and DTOs.

use serde::Serialize;
use sqlx::FromRow;

use reelgen_core::types::{DbId, Timestamp};

/// Full row from the `scene_generations` table.
///
/// One immutable row per successful generation, linking the user, their
/// request parameters, and the durable artifact URL. Rows are never
/// updated or deleted by the workflow.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SceneGeneration {
    pub id: DbId,
    pub user_id: DbId,
    pub prompt: String,
    /// Stable style token, e.g. `"anime"` (see `reelgen_core::scene`).
    pub style: String,
    pub video_url: String,
    pub created_at: Timestamp,
}

/// DTO for inserting a new generation record.
#[derive(Debug, Clone)]
pub struct CreateSceneGeneration {
    pub user_id: DbId,
    pub prompt: String,
    pub style: String,
    pub video_url: String,
}
