//! Persistent-state directory resolution
//!
//! Every directory handed out here exists on return. Downstream code writes
//! into them without checking again.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::paths::*;
use crate::error::{Error, Result};

/// Root directory plus its fixed subdirectories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpicetifyPaths {
    pub root: PathBuf,
    pub backup: PathBuf,
    pub themes: PathBuf,
    pub extensions: PathBuf,
    pub custom_apps: PathBuf,
    pub raw: PathBuf,
    pub themed: PathBuf,
    /// Directory of the running executable, searched after the user directories
    pub bundled_root: Option<PathBuf>,
}

impl SpicetifyPaths {
    /// Resolve the root from the environment and create the full layout
    pub fn resolve() -> Result<Self> {
        Self::from_root(resolve_config_root()?)
    }

    /// Create the layout under an already chosen root
    pub fn from_root(root: PathBuf) -> Result<Self> {
        ensure_dir(&root)?;
        let user_folder = |name: &str| -> Result<PathBuf> {
            let dir = root.join(name);
            ensure_dir(&dir)?;
            Ok(dir)
        };

        let extracted = user_folder(EXTRACTED_DIR)?;
        let raw = extracted.join(RAW_DIR);
        ensure_dir(&raw)?;
        let themed = extracted.join(THEMED_DIR);
        ensure_dir(&themed)?;

        Ok(Self {
            backup: user_folder(BACKUP_DIR)?,
            themes: user_folder(THEMES_DIR)?,
            extensions: user_folder(EXTENSIONS_DIR)?,
            custom_apps: user_folder(CUSTOM_APPS_DIR)?,
            raw,
            themed,
            bundled_root: executable_dir(),
            root,
        })
    }

    /// Override the bundled lookup directory
    pub fn with_bundled_root(mut self, bundled_root: Option<PathBuf>) -> Self {
        self.bundled_root = bundled_root;
        self
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILENAME)
    }

    /// User directory first, then the one shipped next to the executable
    fn search_dirs(&self, user_dir: &Path, bundled_name: &str) -> Vec<PathBuf> {
        let mut dirs = vec![user_dir.to_path_buf()];
        if let Some(bundled) = &self.bundled_root {
            dirs.push(bundled.join(bundled_name));
        }
        dirs
    }

    pub fn theme_search_dirs(&self) -> Vec<PathBuf> {
        self.search_dirs(&self.themes, THEMES_DIR)
    }

    pub fn extension_search_dirs(&self) -> Vec<PathBuf> {
        self.search_dirs(&self.extensions, EXTENSIONS_DIR)
    }

    /// Locate `theme_name` in the user themes directory, then next to the executable
    pub fn resolve_theme_folder(&self, theme_name: &str) -> Result<PathBuf> {
        find_in(&self.theme_search_dirs(), theme_name)
            .ok_or_else(|| Error::ThemeNotFound(theme_name.to_string()))
    }
}

/// First `dir/name` that exists
pub fn find_in(dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
    dirs.iter().map(|dir| dir.join(name)).find(|p| p.exists())
}

/// Resolve the persistent-state root from the process environment and create it
pub fn resolve_config_root() -> Result<PathBuf> {
    resolve_config_root_with(|key| env::var(key).ok())
}

/// Same as [`resolve_config_root`] with an injectable environment lookup
pub fn resolve_config_root_with<F>(lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let root = config_root_location(lookup);
    ensure_dir(&root)?;
    Ok(root)
}

fn config_root_location<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(root) = non_empty(CONFIG_ROOT_ENV) {
        debug!(env = CONFIG_ROOT_ENV, root = %root, "Using config root override");
        return PathBuf::from(root);
    }

    let home = || dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

    if cfg!(windows) {
        let profile = non_empty("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(home);
        profile.join(WINDOWS_APP_DIR)
    } else {
        let parent = non_empty("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                non_empty("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(home)
                    .join(".config")
            });
        parent.join(APP_DIR)
    }
}

/// Create `path` (and parents) if it does not exist yet
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    builder
        .create(path)
        .map_err(|source| Error::FilesystemUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), "Created directory");
    Ok(())
}

/// Directory containing the running executable
pub fn executable_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}
