//! Typed representations of provider operations.

use serde::Deserialize;

/// Opaque handle to an in-flight generation operation.
///
/// Never persisted; lives only for the duration of one workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle(pub String);

impl std::fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of an operation as reported by the provider.
///
/// Terminal when `done` is true: either `error` carries the provider's
/// failure detail or `output` carries the generated video reference.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<OperationErrorDetail>,
    #[serde(default)]
    pub output: Option<OperationOutputRef>,
}

/// Provider-reported failure payload.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationErrorDetail {
    pub message: String,
}

/// Reference to the generated video: a time-limited download URL plus
/// its media type.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationOutputRef {
    pub video_url: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

fn default_mime_type() -> String {
    "video/mp4".to_string()
}

impl OperationStatus {
    /// Whether the operation has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.done
    }
}
