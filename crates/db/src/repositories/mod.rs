pub mod credit_repo;
pub mod generation_repo;

pub use credit_repo::{CreditRepo, ReserveOutcome};
pub use generation_repo::GenerationRepo;
