//! Artifact key construction for generated scene videos.
//!
//! Keys are deterministic in shape and collision-resistant within a
//! user's namespace: a millisecond timestamp plus a random UUID means
//! two concurrent generations by the same user can never collide.

use uuid::Uuid;

use crate::types::{DbId, Timestamp};

/// Storage prefix for generated scene videos.
pub const SCENE_PREFIX: &str = "generated-scenes";
/// Content type stamped on every uploaded scene video.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
/// File extension for generated scene videos.
pub const VIDEO_EXTENSION: &str = "mp4";

/// Build the object key for a generated scene video.
///
/// Shape: `generated-scenes/{user_id}/{timestamp_millis}-{uuid}.mp4`.
pub fn scene_video_key(user_id: DbId, created: Timestamp, unique: Uuid) -> String {
    format!(
        "{SCENE_PREFIX}/{user_id}/{}-{unique}.{VIDEO_EXTENSION}",
        created.timestamp_millis()
    )
}
