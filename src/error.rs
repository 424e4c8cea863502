//! Error taxonomy shared by every component
//!
//! Startup errors carry the remedy shown to the user before the process exits.
//! Errors raised inside a watch reaction either disable a feature
//! (`ColorFileUnreadable`, `ColorFileEmpty`) or are reported and retried on the
//! next change (`ReloadConnectionFailed`).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Config file missing, unreadable or not valid INI
    #[error("cannot read config file {}: {reason}", path.display())]
    ConfigUnreadable { path: PathBuf, reason: String },

    /// Persisting the config failed (callers log it and continue)
    #[error("cannot write config file {}: {source}", path.display())]
    ConfigWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// User-supplied path does not exist
    #[error(
        "{} does not exist or is not a valid path. Please manually set \"{key}\" in config.ini to the correct {what}.",
        path.display()
    )]
    PathInvalid {
        key: &'static str,
        what: &'static str,
        path: PathBuf,
    },

    /// Neither configured nor detectable
    #[error("Cannot detect {what} location. Please manually set \"{key}\" in config.ini")]
    AutoDetectFailed {
        key: &'static str,
        what: &'static str,
    },

    #[error("Theme \"{0}\" not found")]
    ThemeNotFound(String),

    #[error("Config \"current_theme\" is blank. No theme asset to watch.")]
    ThemeNotConfigured,

    #[error("Cannot open file {}: {reason}", path.display())]
    ColorFileUnreadable { path: PathBuf, reason: String },

    #[error("No section found in {}", .0.display())]
    ColorFileEmpty(PathBuf),

    /// A required directory could not be created
    #[error("cannot create directory {}: {source}", path.display())]
    FilesystemUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Extension \"{0}\" not found.")]
    ExtensionNotFound(String),

    #[error("No extension to watch.")]
    NoExtensionToWatch,

    #[error("Nothing to watch: enable replace_colors, inject_css or overwrite_assets for a theme that ships the matching files.")]
    NothingToWatch,

    /// The notification subscription could not be established
    #[error("cannot watch {}: {reason}", path.display())]
    WatchSetupFailed { path: PathBuf, reason: String },

    /// The running subscription reported an error or a reaction failed
    #[error("watch failed: {0}")]
    WatchFailed(String),

    #[error("could not reload Spotify: {0}")]
    ReloadConnectionFailed(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
