//! Pure domain logic for the scene-generation platform.
//!
//! No I/O lives here: this crate defines the shared type aliases, the
//! domain error taxonomy, scene styles and prompt validation, artifact
//! key construction, and the bounded polling policy used by the
//! generation workflow.

pub mod artifact;
pub mod error;
pub mod poll;
pub mod scene;
pub mod types;
