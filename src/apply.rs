//! Re-application of theme files into the Spotify install
//!
//! Runs after every change the watcher reports. Stylesheets land in both the
//! main (`zlink`) and `login` apps; assets mirror the `Apps` layout.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::constants::host::{COLORS_CSS, CSS_DIR, LOGIN_DIR, ZLINK_DIR};
use crate::constants::theme::CSS_FILE;
use crate::theme::{ColorScheme, ThemeSettings};

fn css_dirs(app_dest_path: &Path) -> [PathBuf; 2] {
    [
        app_dest_path.join(ZLINK_DIR).join(CSS_DIR),
        app_dest_path.join(LOGIN_DIR).join(CSS_DIR),
    ]
}

/// CSS custom properties for every color in the scheme
pub fn color_css(scheme: Option<&ColorScheme>) -> String {
    let mut css = String::from(":root {\n");
    for (name, value) in scheme.map(|s| s.colors.as_slice()).unwrap_or_default() {
        let value = value.trim();
        let value = if value.starts_with('#') || value.starts_with("var(") {
            value.to_string()
        } else {
            format!("#{value}")
        };
        let _ = writeln!(css, "    --modspotify_{name}: {value};");
    }
    css.push_str("}\n");
    css
}

/// Write `colors.css` and `user.css` for the current settings
///
/// Disabled features still get written as empty stylesheets so stale
/// content from a previous run is cleared.
pub fn update_css(settings: &ThemeSettings, app_dest_path: &Path) -> Result<()> {
    let colors = if settings.replace_colors {
        color_css(settings.color_scheme.as_ref())
    } else {
        color_css(None)
    };

    let user_css = match settings.css_path() {
        Some(path) if settings.inject_css => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => String::new(),
    };

    for dir in css_dirs(app_dest_path) {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        fs::write(dir.join(COLORS_CSS), &colors)
            .with_context(|| format!("Failed to write {}", dir.join(COLORS_CSS).display()))?;
        fs::write(dir.join(CSS_FILE), &user_css)
            .with_context(|| format!("Failed to write {}", dir.join(CSS_FILE).display()))?;
    }

    info!(
        colors = settings.replace_colors,
        css = settings.inject_css,
        "Custom CSS is updated"
    );
    Ok(())
}

/// Copy the theme's asset tree over the app destination
///
/// Entries that cannot be read are logged and skipped; the rest still sync.
pub fn update_assets(assets_path: &Path, app_dest_path: &Path) -> Result<()> {
    let mut copied = 0u64;
    let mut skipped = 0u64;

    for entry in WalkDir::new(assets_path) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable asset");
                skipped += 1;
                continue;
            }
        };
        let relative = entry
            .path()
            .strip_prefix(assets_path)
            .context("Failed to compute relative asset path")?;
        let dest_path = app_dest_path.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest_path)
                .with_context(|| format!("Failed to create {}", dest_path.display()))?;
        } else {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::copy(entry.path(), &dest_path).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), dest_path.display())
            })?;
            debug!(asset = %relative.display(), "Copied asset");
            copied += 1;
        }
    }

    info!(files = copied, skipped = skipped, "Themes assets are updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scheme() -> ColorScheme {
        ColorScheme {
            name: "Dark".to_string(),
            colors: vec![
                ("main_fg".to_string(), "ffffff".to_string()),
                ("main_bg".to_string(), "#000000".to_string()),
            ],
        }
    }

    #[test]
    fn test_color_css_variables() {
        let css = color_css(Some(&scheme()));
        assert!(css.contains("--modspotify_main_fg: #ffffff;"));
        assert!(css.contains("--modspotify_main_bg: #000000;"));
        assert_eq!(color_css(None), ":root {\n}\n");
    }

    #[test]
    fn test_update_css_writes_both_apps() {
        let dir = TempDir::new().unwrap();
        let theme = dir.path().join("theme");
        fs::create_dir_all(&theme).unwrap();
        fs::write(theme.join(CSS_FILE), ".main { color: red }").unwrap();
        let apps = dir.path().join("Apps");

        let settings = ThemeSettings {
            replace_colors: true,
            inject_css: true,
            theme_folder: Some(theme),
            color_scheme: Some(scheme()),
            ..Default::default()
        };
        update_css(&settings, &apps).unwrap();

        for css_dir in css_dirs(&apps) {
            assert!(fs::read_to_string(css_dir.join(COLORS_CSS))
                .unwrap()
                .contains("--modspotify_main_fg"));
            assert_eq!(
                fs::read_to_string(css_dir.join(CSS_FILE)).unwrap(),
                ".main { color: red }"
            );
        }
    }

    #[test]
    fn test_update_css_clears_disabled_features() {
        let dir = TempDir::new().unwrap();
        let apps = dir.path().join("Apps");
        update_css(&ThemeSettings::default(), &apps).unwrap();

        let zlink = apps.join(ZLINK_DIR).join(CSS_DIR);
        assert_eq!(fs::read_to_string(zlink.join(CSS_FILE)).unwrap(), "");
        assert_eq!(fs::read_to_string(zlink.join(COLORS_CSS)).unwrap(), ":root {\n}\n");
    }

    #[test]
    fn test_update_assets_mirrors_tree() {
        let dir = TempDir::new().unwrap();
        let assets = dir.path().join("assets");
        fs::create_dir_all(assets.join("zlink").join("images")).unwrap();
        fs::write(assets.join("zlink").join("images").join("logo.png"), "png").unwrap();
        fs::write(assets.join("glue.css"), "css").unwrap();
        let apps = dir.path().join("Apps");

        update_assets(&assets, &apps).unwrap();
        assert_eq!(
            fs::read_to_string(apps.join("zlink").join("images").join("logo.png")).unwrap(),
            "png"
        );
        assert_eq!(fs::read_to_string(apps.join("glue.css")).unwrap(), "css");
    }

    #[test]
    fn test_unreadable_assets_are_skipped() {
        let dir = TempDir::new().unwrap();
        let apps = dir.path().join("Apps");

        update_assets(&dir.path().join("vanished-assets"), &apps).unwrap();
        assert!(!apps.exists());
    }
}
