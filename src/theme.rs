//! Effective theme settings
//!
//! A flag from `[Setting]` only turns on when the resource it needs exists in
//! the theme folder. Settings are recomputed from scratch on every call, so a
//! watch reaction can rebuild them without touching any shared state.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use crate::config::paths::find_in;
use crate::config::{ConfigStore, Ini, Section, SpicetifyPaths};
use crate::constants::config::*;
use crate::constants::theme::*;
use crate::error::{Error, Result};

/// Color scheme chosen from a theme's `color.ini`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    pub name: String,
    /// Color name → color value, in file order
    pub colors: Vec<(String, String)>,
}

impl ColorScheme {
    fn from_section(section: &Section) -> Self {
        Self {
            name: section.name().to_string(),
            colors: section
                .entries()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Activation flags after reconciling preferences with the theme folder contents
#[derive(Debug, Default)]
pub struct ThemeSettings {
    pub replace_colors: bool,
    pub inject_css: bool,
    pub overwrite_assets: bool,
    pub theme_folder: Option<PathBuf>,
    pub color_scheme: Option<ColorScheme>,
    /// Why `replace_colors` was turned off despite `color.ini` being present
    pub color_problem: Option<Error>,
}

impl ThemeSettings {
    /// Resolve effective settings from the `[Setting]` section and the filesystem
    ///
    /// An empty `current_theme` yields all flags off with no theme folder.
    /// A theme name that cannot be found is [`Error::ThemeNotFound`].
    pub fn resolve(store: &ConfigStore, paths: &SpicetifyPaths) -> Result<Self> {
        let setting = store.section(SETTING_SECTION);

        let theme_name = setting.get_string(CURRENT_THEME);
        if theme_name.is_empty() {
            debug!("current_theme is blank, theme features disabled");
            return Ok(Self::default());
        }

        let theme_folder = paths.resolve_theme_folder(&theme_name)?;
        let color_path = theme_folder.join(COLOR_FILE);

        let mut settings = Self {
            replace_colors: setting.get_bool(REPLACE_COLORS, false) && color_path.exists(),
            inject_css: setting.get_bool(INJECT_CSS, false)
                && theme_folder.join(CSS_FILE).exists(),
            overwrite_assets: setting.get_bool(OVERWRITE_ASSETS, false)
                && theme_folder.join(ASSETS_DIR).exists(),
            theme_folder: Some(theme_folder),
            color_scheme: None,
            color_problem: None,
        };

        if settings.replace_colors {
            match select_color_scheme(&color_path, &setting.get_string(COLOR_SCHEME)) {
                Ok(scheme) => {
                    debug!(scheme = %scheme.name, colors = scheme.colors.len(), "Selected color scheme");
                    settings.color_scheme = Some(scheme);
                }
                Err(e) => {
                    error!(error = %e, "Color replacement disabled");
                    settings.replace_colors = false;
                    settings.color_problem = Some(e);
                }
            }
        }

        Ok(settings)
    }

    pub fn color_path(&self) -> Option<PathBuf> {
        self.theme_folder.as_ref().map(|f| f.join(COLOR_FILE))
    }

    pub fn css_path(&self) -> Option<PathBuf> {
        self.theme_folder.as_ref().map(|f| f.join(CSS_FILE))
    }

    pub fn assets_path(&self) -> Option<PathBuf> {
        self.theme_folder.as_ref().map(|f| f.join(ASSETS_DIR))
    }
}

/// Pick the color scheme named `scheme_name` from `color_path`
///
/// Falls back to the second section in file order when the name is empty or
/// unknown. The first section is conventionally reserved for format metadata.
pub fn select_color_scheme(color_path: &Path, scheme_name: &str) -> Result<ColorScheme> {
    let contents = fs::read_to_string(color_path).map_err(|e| Error::ColorFileUnreadable {
        path: color_path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let colors = Ini::parse(&contents).map_err(|reason| Error::ColorFileUnreadable {
        path: color_path.to_path_buf(),
        reason,
    })?;

    let sections = colors.sections();
    if sections.len() <= FALLBACK_SCHEME_INDEX {
        return Err(Error::ColorFileEmpty(color_path.to_path_buf()));
    }

    let section = if scheme_name.is_empty() {
        &sections[FALLBACK_SCHEME_INDEX]
    } else {
        colors.get(scheme_name).unwrap_or_else(|| {
            warn!(scheme = %scheme_name, fallback = %sections[FALLBACK_SCHEME_INDEX].name(), "Color scheme not found, using fallback");
            &sections[FALLBACK_SCHEME_INDEX]
        })
    };

    Ok(ColorScheme::from_section(section))
}

/// Locate an extension file by name in the user extensions directory, then next to the executable
pub fn resolve_extension_path(name: &str, paths: &SpicetifyPaths) -> Result<PathBuf> {
    find_in(&paths.extension_search_dirs(), name)
        .ok_or_else(|| Error::ExtensionNotFound(name.to_string()))
}

/// Resolve every configured extension, skipping (and reporting) the missing ones
///
/// Fails with [`Error::NoExtensionToWatch`] only when nothing was found.
pub fn resolve_extension_list(names: &[String], paths: &SpicetifyPaths) -> Result<Vec<PathBuf>> {
    let found: Vec<PathBuf> = names
        .iter()
        .filter_map(|name| {
            resolve_extension_path(name, paths)
                .inspect_err(|e| error!(error = %e, "Skipping extension"))
                .ok()
        })
        .collect();

    if found.is_empty() {
        return Err(Error::NoExtensionToWatch);
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const COLORS: &str = "\
[Main]
format = 1

[SchemeA]
main_fg = ffffff
main_bg = 000000

[SchemeB]
main_fg = 111111
";

    struct Fixture {
        _dir: TempDir,
        paths: SpicetifyPaths,
        store: ConfigStore,
    }

    impl Fixture {
        fn new(setting: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let paths = SpicetifyPaths::from_root(dir.path().join("state"))
                .unwrap()
                .with_bundled_root(None);
            let config = paths.config_file();
            fs::write(&config, format!("[Setting]\n{setting}")).unwrap();
            let store = ConfigStore::load(&config).unwrap();
            Self {
                _dir: dir,
                paths,
                store,
            }
        }

        fn theme(&self, name: &str) -> PathBuf {
            let folder = self.paths.themes.join(name);
            fs::create_dir_all(&folder).unwrap();
            folder
        }

        fn resolve(&self) -> ThemeSettings {
            ThemeSettings::resolve(&self.store, &self.paths).unwrap()
        }
    }

    const ALL_ON: &str = "replace_colors = 1\ninject_css = 1\noverwrite_assets = 1\n";

    #[test]
    fn test_blank_theme_disables_everything() {
        let fixture = Fixture::new(&format!("current_theme =\n{ALL_ON}"));
        let settings = fixture.resolve();
        assert!(!settings.replace_colors);
        assert!(!settings.inject_css);
        assert!(!settings.overwrite_assets);
        assert!(settings.theme_folder.is_none());
    }

    #[test]
    fn test_missing_theme_is_theme_not_found() {
        let fixture = Fixture::new(&format!("current_theme = Ghost\n{ALL_ON}"));
        let result = ThemeSettings::resolve(&fixture.store, &fixture.paths);
        assert!(matches!(result, Err(Error::ThemeNotFound(name)) if name == "Ghost"));
    }

    #[test]
    fn test_flags_require_resources() {
        let fixture = Fixture::new(&format!("current_theme = Bare\n{ALL_ON}"));
        let folder = fixture.theme("Bare");
        fs::write(folder.join(CSS_FILE), "body {}").unwrap();

        let settings = fixture.resolve();
        assert!(settings.inject_css);
        assert!(!settings.replace_colors);
        assert!(!settings.overwrite_assets);
        assert_eq!(settings.theme_folder, Some(folder));
    }

    #[test]
    fn test_flags_require_preference() {
        let fixture = Fixture::new("current_theme = Full\nreplace_colors = 0\ninject_css = 0\n");
        let folder = fixture.theme("Full");
        fs::write(folder.join(COLOR_FILE), COLORS).unwrap();
        fs::write(folder.join(CSS_FILE), "").unwrap();
        fs::create_dir_all(folder.join(ASSETS_DIR)).unwrap();

        let settings = fixture.resolve();
        assert!(!settings.replace_colors);
        assert!(!settings.inject_css);
        assert!(!settings.overwrite_assets);
        assert!(settings.color_scheme.is_none());
    }

    #[test]
    fn test_assets_flag() {
        let fixture = Fixture::new(&format!("current_theme = Art\n{ALL_ON}"));
        let folder = fixture.theme("Art");
        assert!(!fixture.resolve().overwrite_assets);

        fs::create_dir_all(folder.join(ASSETS_DIR)).unwrap();
        assert!(fixture.resolve().overwrite_assets);
    }

    #[test]
    fn test_scheme_fallback_is_second_section() {
        let fixture = Fixture::new(&format!("current_theme = Colors\n{ALL_ON}"));
        let folder = fixture.theme("Colors");
        fs::write(folder.join(COLOR_FILE), COLORS).unwrap();

        let settings = fixture.resolve();
        assert!(settings.replace_colors);
        let scheme = settings.color_scheme.unwrap();
        assert_eq!(scheme.name, "SchemeA");
        assert_eq!(scheme.colors[0], ("main_fg".to_string(), "ffffff".to_string()));
    }

    #[test]
    fn test_scheme_selection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(COLOR_FILE);
        fs::write(&path, COLORS).unwrap();

        assert_eq!(select_color_scheme(&path, "").unwrap().name, "SchemeA");
        assert_eq!(select_color_scheme(&path, "SchemeB").unwrap().name, "SchemeB");
        assert_eq!(select_color_scheme(&path, "schemeb").unwrap().name, "SchemeB");
        assert_eq!(select_color_scheme(&path, "Nonexistent").unwrap().name, "SchemeA");
    }

    #[test]
    fn test_single_section_disables_colors() {
        let fixture = Fixture::new(&format!("current_theme = One\n{ALL_ON}"));
        let folder = fixture.theme("One");
        fs::write(folder.join(COLOR_FILE), "[Only]\nmain_fg = ffffff\n").unwrap();

        let settings = fixture.resolve();
        assert!(!settings.replace_colors);
        assert!(settings.color_scheme.is_none());
        assert!(matches!(settings.color_problem, Some(Error::ColorFileEmpty(_))));
    }

    #[test]
    fn test_unparsable_color_file_disables_colors() {
        let fixture = Fixture::new(&format!("current_theme = Broken\n{ALL_ON}"));
        let folder = fixture.theme("Broken");
        fs::write(folder.join(COLOR_FILE), "[Main\n").unwrap();

        let settings = fixture.resolve();
        assert!(!settings.replace_colors);
        assert!(matches!(
            settings.color_problem,
            Some(Error::ColorFileUnreadable { .. })
        ));
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let fixture = Fixture::new(&format!("current_theme = Colors\n{ALL_ON}"));
        let folder = fixture.theme("Colors");
        fs::write(folder.join(COLOR_FILE), COLORS).unwrap();

        let first = fixture.resolve();
        let second = fixture.resolve();
        assert_eq!(first.color_scheme, second.color_scheme);
        assert_eq!(first.theme_folder, second.theme_folder);
    }

    #[test]
    fn test_extension_list_partial_and_empty() {
        let fixture = Fixture::new("");
        fs::write(fixture.paths.extensions.join("a.js"), "").unwrap();
        fs::write(fixture.paths.extensions.join("c.js"), "").unwrap();

        let names: Vec<String> = ["a.js", "b.js", "c.js"].iter().map(|s| s.to_string()).collect();
        let found = resolve_extension_list(&names, &fixture.paths).unwrap();
        assert_eq!(
            found,
            vec![fixture.paths.extensions.join("a.js"), fixture.paths.extensions.join("c.js")]
        );

        let missing = vec!["x.js".to_string(), "y.js".to_string()];
        assert!(matches!(
            resolve_extension_list(&missing, &fixture.paths),
            Err(Error::NoExtensionToWatch)
        ));
        assert!(matches!(
            resolve_extension_list(&[], &fixture.paths),
            Err(Error::NoExtensionToWatch)
        ));
    }

    #[test]
    fn test_extension_path_bundled_fallback() {
        let fixture = Fixture::new("");
        let bundled = fixture.paths.root.join("bin");
        fs::create_dir_all(bundled.join("Extensions")).unwrap();
        fs::write(bundled.join("Extensions").join("shipped.js"), "").unwrap();

        let paths = fixture.paths.clone().with_bundled_root(Some(bundled.clone()));
        assert_eq!(
            resolve_extension_path("shipped.js", &paths).unwrap(),
            bundled.join("Extensions").join("shipped.js")
        );
        assert!(matches!(
            resolve_extension_path("shipped.js", &fixture.paths),
            Err(Error::ExtensionNotFound(_))
        ));
    }
}
