pub mod credits;
pub mod generations;
pub mod scenes;
