//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Persistent-state directory layout
pub mod paths {
    /// Environment variable overriding the persistent-state root directory
    pub const CONFIG_ROOT_ENV: &str = "SPICETIFY_CONFIG";

    /// Directory name under the XDG config dir (Linux/macOS)
    pub const APP_DIR: &str = "spicetify";

    /// Hidden directory name under the user profile (Windows)
    pub const WINDOWS_APP_DIR: &str = ".spicetify";

    /// Config file name inside the root directory
    pub const CONFIG_FILENAME: &str = "config.ini";

    pub const BACKUP_DIR: &str = "Backup";
    pub const THEMES_DIR: &str = "Themes";
    pub const EXTENSIONS_DIR: &str = "Extensions";
    pub const CUSTOM_APPS_DIR: &str = "CustomApps";
    pub const EXTRACTED_DIR: &str = "Extracted";
    pub const RAW_DIR: &str = "Raw";
    pub const THEMED_DIR: &str = "Themed";

    /// Destination for Windows Store (AppX) installs, which are read-only
    pub const APPX_DIR: &str = "AppX";
}

/// Config file sections and keys
pub mod config {
    pub const SETTING_SECTION: &str = "Setting";
    pub const BACKUP_SECTION: &str = "Backup";
    pub const PREPROCESSES_SECTION: &str = "Preprocesses";
    pub const ADDITIONAL_OPTIONS_SECTION: &str = "AdditionalOptions";

    pub const SPOTIFY_PATH: &str = "spotify_path";
    pub const PREFS_PATH: &str = "prefs_path";
    pub const CURRENT_THEME: &str = "current_theme";
    pub const COLOR_SCHEME: &str = "color_scheme";
    pub const REPLACE_COLORS: &str = "replace_colors";
    pub const INJECT_CSS: &str = "inject_css";
    pub const OVERWRITE_ASSETS: &str = "overwrite_assets";
    pub const CHECK_UPGRADE: &str = "check_spicetify_upgrade";
    pub const EXTENSIONS: &str = "extensions";

    /// Separator for list values such as `extensions`
    pub const LIST_SEPARATOR: char = '|';

    /// Theme written into a freshly generated config
    pub const DEFAULT_THEME: &str = "SpicetifyDefault";
}

/// Theme folder layout
pub mod theme {
    pub const COLOR_FILE: &str = "color.ini";
    pub const CSS_FILE: &str = "user.css";
    pub const ASSETS_DIR: &str = "assets";

    /// Section index used when no color scheme is configured or it is unknown
    pub const FALLBACK_SCHEME_INDEX: usize = 1;
}

/// Spotify install layout
pub mod host {
    /// Apps folder inside the install directory
    pub const APPS_DIR: &str = "Apps";

    /// Folder that receives extensions and stylesheets
    pub const ZLINK_DIR: &str = "zlink";

    pub const LOGIN_DIR: &str = "login";
    pub const CSS_DIR: &str = "css";
    pub const COLORS_CSS: &str = "colors.css";

    /// Marker in the install path of Windows Store builds
    pub const APPX_MARKER: &str = "SpotifyAB.SpotifyMusic";

    /// Process name used when stopping a running client
    #[cfg(windows)]
    pub const PROCESS_NAME: &str = "Spotify.exe";
    #[cfg(not(windows))]
    pub const PROCESS_NAME: &str = "spotify";
}

/// Chrome DevTools remote debugging
pub mod devtools {
    pub const PORT: u16 = 9222;

    /// Flag passed to the client when relaunching it with remote control enabled
    pub const LAUNCH_FLAG: &str = "--remote-debugging-port=9222";

    /// Target type carrying the main window
    pub const PAGE_TARGET: &str = "page";

    /// Expression evaluated in the page to reload injected content
    pub const RELOAD_EXPRESSION: &str = "window.location.reload()";
}

/// File watching
pub mod watch {
    /// Debounce window that coalesces back-to-back notifications
    pub const DEBOUNCE_MS: u64 = 200;
}

/// Console prompt
pub mod prompt {
    /// Invalid answers tolerated before the default answer is used
    pub const MAX_ATTEMPTS: usize = 5;
}
