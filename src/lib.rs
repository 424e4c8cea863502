#![forbid(unsafe_code)]

pub mod apply;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod host;
pub mod prompt;
pub mod reload;
pub mod theme;
pub mod watch;
