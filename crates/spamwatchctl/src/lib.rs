//! Spamwatch control library - exposes modules for testing.

pub mod client;
pub mod display;
pub mod errors;
pub mod export;
