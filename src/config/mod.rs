//! Configuration management for spicetify-watch
//!
//! This module provides the two layers every command starts from:
//! - **store**: the INI config store (`config.ini`) with case-insensitive lookups
//! - **paths**: the persistent-state root directory and its fixed subdirectories

pub mod paths;
pub mod store;

// Re-export commonly used types
pub use paths::{ensure_dir, SpicetifyPaths};
pub use store::{ConfigStore, Ini, Section};
