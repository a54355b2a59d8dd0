//! HTTP client for the external generative-video provider.
//!
//! Wraps the provider's REST API (generation submission, operation
//! polling, output download) using [`reqwest`]. Operation handles are
//! opaque; re-polling a terminal operation returns the same terminal
//! payload without side effects.

pub mod api;
pub mod operation;
