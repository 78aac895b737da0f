//! Configuration Module
//!
//! Handles settings loading, validation, and key lookup.

pub mod manager;
pub mod types;

pub use manager::ConfigManager;
pub use types::*;
