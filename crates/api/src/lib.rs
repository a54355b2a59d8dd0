//! HTTP surface for the scene-generation service.
//!
//! Thin axum adapters over the workflow in `reelgen-pipeline`: request
//! DTOs, the JSON error envelope, and the adapter impls that bind the
//! database, provider, and storage crates to the workflow's
//! collaborator traits.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;
