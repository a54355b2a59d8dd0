//! Scene request domain types: the closed style set, prompt validation,
//! and the fixed generation settings sent to the provider.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Generation defaults
// ---------------------------------------------------------------------------

/// Upper bound on user prompt length, in characters.
pub const MAX_PROMPT_CHARS: usize = 2000;
/// Length of each generated clip in seconds.
pub const DEFAULT_DURATION_SECS: u32 = 8;
/// Aspect ratio requested from the provider.
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

// ---------------------------------------------------------------------------
// Scene styles
// ---------------------------------------------------------------------------

/// Visual style for a generated scene.
///
/// This is a closed set: requests carrying any other value are rejected
/// at deserialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneStyle {
    #[serde(rename = "anime")]
    Anime,
    #[serde(rename = "3d_render")]
    Render3d,
    #[serde(rename = "realistic")]
    Realistic,
    #[serde(rename = "claymation")]
    Claymation,
}

/// All valid scene styles.
pub const ALL_STYLES: &[SceneStyle] = &[
    SceneStyle::Anime,
    SceneStyle::Render3d,
    SceneStyle::Realistic,
    SceneStyle::Claymation,
];

impl SceneStyle {
    /// Stable wire/storage token for this style.
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneStyle::Anime => "anime",
            SceneStyle::Render3d => "3d_render",
            SceneStyle::Realistic => "realistic",
            SceneStyle::Claymation => "claymation",
        }
    }

    /// Phrase appended to the user prompt when building the provider prompt.
    pub fn prompt_descriptor(&self) -> &'static str {
        match self {
            SceneStyle::Anime => "Japanese anime style",
            SceneStyle::Render3d => "polished 3D render",
            SceneStyle::Realistic => "photorealistic live-action footage",
            SceneStyle::Claymation => "claymation stop-motion style",
        }
    }
}

impl std::fmt::Display for SceneStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SceneStyle {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_STYLES
            .iter()
            .copied()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid scene style '{s}'. Must be one of: {}",
                    ALL_STYLES
                        .iter()
                        .map(|v| v.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Prompt validation
// ---------------------------------------------------------------------------

/// Validate a user prompt before any credit is reserved.
///
/// - Must contain at least one non-whitespace character.
/// - Must not exceed [`MAX_PROMPT_CHARS`] characters.
pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::Validation(
            "Prompt must not be empty".to_string(),
        ));
    }
    let chars = prompt.chars().count();
    if chars > MAX_PROMPT_CHARS {
        return Err(CoreError::Validation(format!(
            "Prompt is {chars} characters; the maximum is {MAX_PROMPT_CHARS}"
        )));
    }
    Ok(())
}

/// Build the full prompt sent to the provider from the user prompt and
/// the selected style.
pub fn provider_prompt(prompt: &str, style: SceneStyle) -> String {
    format!("{}. Style: {}.", prompt.trim(), style.prompt_descriptor())
}
