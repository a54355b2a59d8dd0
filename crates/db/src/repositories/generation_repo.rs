//! Repository for the `scene_generations` table.

use sqlx::PgPool;

use reelgen_core::types::DbId;

use crate::models::generation::{CreateSceneGeneration, SceneGeneration};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, prompt, style, video_url, created_at";

/// Provides insert and listing for generation records.
pub struct GenerationRepo;

impl GenerationRepo {
    /// Insert a new generation record, returning the created row.
    ///
    /// `created_at` is server-assigned by the column default.
    pub async fn insert(
        pool: &PgPool,
        input: &CreateSceneGeneration,
    ) -> Result<SceneGeneration, sqlx::Error> {
        let query = format!(
            "INSERT INTO scene_generations (user_id, prompt, style, video_url)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SceneGeneration>(&query)
            .bind(input.user_id)
            .bind(&input.prompt)
            .bind(&input.style)
            .bind(&input.video_url)
            .fetch_one(pool)
            .await
    }

    /// Find a generation record by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SceneGeneration>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scene_generations WHERE id = $1");
        sqlx::query_as::<_, SceneGeneration>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's generation records, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<SceneGeneration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scene_generations
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, SceneGeneration>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
