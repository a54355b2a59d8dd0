pub mod account;
pub mod generation;
