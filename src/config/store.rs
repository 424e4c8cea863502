//! INI-backed configuration store
//!
//! Sections and keys keep their on-disk spelling and file order, but every
//! lookup is case-insensitive. The same parser reads theme `color.ini` files,
//! where section order matters. Comment lines and value quoting survive a
//! load/write cycle; blank lines and key alignment do not.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::config::*;
use crate::error::{Error, Result};

/// Name given to keys that appear before the first section header
pub const DEFAULT_SECTION: &str = "DEFAULT";

static EMPTY_SECTION: Section = Section {
    name: String::new(),
    lines: Vec::new(),
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry {
        key: String,
        value: String,
        /// Quote character the value was written with
        quote: Option<char>,
    },
    Comment(String),
}

/// A named group of key/value pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    lines: Vec<Line>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the section holds no keys (comments do not count)
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Key/value pairs in file order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry { key, value, .. } => Some((key.as_str(), value.as_str())),
            Line::Comment(_) => None,
        })
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        self.entries()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Value of `key`, or an empty string when absent
    pub fn get_string(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_default().to_string()
    }

    /// Value of `key`, or `default` when absent
    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.lookup(key).unwrap_or(default).to_string()
    }

    /// Boolean value of `key`; absent or unparsable values yield `default`
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.lookup(key).and_then(parse_bool).unwrap_or(default)
    }

    /// Splits the value of `key` on `separator`, trimming items and dropping empty ones
    pub fn get_list(&self, key: &str, separator: char) -> Vec<String> {
        self.lookup(key)
            .map(|value| {
                value
                    .split(separator)
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sets `key`, replacing an existing value regardless of key case
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.insert(key, value.into(), None);
    }

    fn insert(&mut self, key: &str, value: String, quote: Option<char>) {
        let existing = self.lines.iter_mut().find_map(|line| match line {
            Line::Entry { key: k, value: v, .. } if k.eq_ignore_ascii_case(key) => Some(v),
            _ => None,
        });
        match existing {
            Some(slot) => *slot = value,
            None => self.lines.push(Line::Entry {
                key: key.to_string(),
                value,
                quote,
            }),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "n" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Ordered list of sections parsed from INI text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ini {
    /// Comments above the first section header
    preamble: Vec<String>,
    sections: Vec<Section>,
}

impl Ini {
    /// Parses INI text. Repeated headers merge into the first occurrence.
    /// Keys before any header land in a leading `DEFAULT` section, which only
    /// exists when it holds at least one key.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut ini = Ini::default();
        let mut current: Option<usize> = None;

        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim().trim_start_matches('\u{feff}');
            if line.is_empty() {
                continue;
            }

            if line.starts_with(';') || line.starts_with('#') {
                match current {
                    Some(index) => ini.sections[index].lines.push(Line::Comment(line.to_string())),
                    None => ini.preamble.push(line.to_string()),
                }
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or_else(|| format!("line {}: unclosed section header", number + 1))?
                    .trim();
                if name.is_empty() {
                    return Err(format!("line {}: empty section name", number + 1));
                }
                current = Some(ini.index_or_insert(name));
                continue;
            }

            let (key, value, quote) = split_key_value(line)
                .ok_or_else(|| format!("line {}: key-value delimiter not found", number + 1))?;
            if key.is_empty() {
                return Err(format!("line {}: empty key name", number + 1));
            }

            let index = match current {
                Some(index) => index,
                None => {
                    let index = ini.index_or_insert(DEFAULT_SECTION);
                    current = Some(index);
                    index
                }
            };
            ini.sections[index].insert(key, value.to_string(), quote);
        }

        Ok(ini)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Existing section, or a shared empty one
    pub fn section(&self, name: &str) -> &Section {
        self.get(name).unwrap_or(&EMPTY_SECTION)
    }

    /// Existing section, created at the end when missing
    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        let index = self.index_or_insert(name);
        &mut self.sections[index]
    }

    fn index_or_insert(&mut self, name: &str) -> usize {
        match self
            .sections
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
        {
            Some(index) => index,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        }
    }
}

fn split_key_value(line: &str) -> Option<(&str, &str, Option<char>)> {
    let delimiter = line.find('=').or_else(|| line.find(':'))?;
    let key = line[..delimiter].trim();
    let (value, quote) = unquote(line[delimiter + 1..].trim());
    Some((key, value, quote))
}

fn unquote(value: &str) -> (&str, Option<char>) {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return (&value[1..value.len() - 1], Some(quote));
        }
    }
    (value, None)
}

impl fmt::Display for Ini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for comment in &self.preamble {
            writeln!(f, "{comment}")?;
        }
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 || !self.preamble.is_empty() {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", section.name)?;
            let width = section.entries().map(|(k, _)| k.len()).max().unwrap_or(0);
            for line in &section.lines {
                match line {
                    Line::Entry {
                        key,
                        value,
                        quote: Some(q),
                    } => writeln!(f, "{key:<width$} = {q}{value}{q}")?,
                    Line::Entry { key, value, .. } => writeln!(f, "{key:<width$} = {value}")?,
                    Line::Comment(comment) => writeln!(f, "{comment}")?,
                }
            }
        }
        Ok(())
    }
}

/// The user's `config.ini`, bound to the file it was loaded from
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    ini: Ini,
}

impl ConfigStore {
    /// Load config from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::ConfigUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let ini = Ini::parse(&contents).map_err(|reason| Error::ConfigUnreadable {
            path: path.to_path_buf(),
            reason,
        })?;
        debug!(path = %path.display(), sections = ini.sections.len(), "Loaded config");
        Ok(Self {
            path: path.to_path_buf(),
            ini,
        })
    }

    /// Load config from `path`, generating the default template first if the file is missing
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        let store = Self {
            path: path.to_path_buf(),
            ini: default_template(),
        };
        store.write()?;
        info!(path = %path.display(), "Generated config file for user to edit");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn section(&self, name: &str) -> &Section {
        self.ini.section(name)
    }

    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        self.ini.section_mut(name)
    }

    /// Persist the whole store back to its origin path
    pub fn write(&self) -> Result<()> {
        fs::write(&self.path, self.ini.to_string()).map_err(|source| Error::ConfigWriteFailed {
            path: self.path.clone(),
            source,
        })
    }
}

fn default_template() -> Ini {
    let mut ini = Ini::default();

    let setting = ini.section_mut(SETTING_SECTION);
    setting.set(SPOTIFY_PATH, "");
    setting.set(PREFS_PATH, "");
    setting.set(CURRENT_THEME, DEFAULT_THEME);
    setting.set(COLOR_SCHEME, "");
    setting.set(INJECT_CSS, "1");
    setting.set(REPLACE_COLORS, "1");
    setting.set(OVERWRITE_ASSETS, "0");
    setting.set(CHECK_UPGRADE, "0");

    let preprocesses = ini.section_mut(PREPROCESSES_SECTION);
    preprocesses.set("disable_sentry", "1");
    preprocesses.set("disable_ui_logging", "1");
    preprocesses.set("remove_rtl_rule", "1");
    preprocesses.set("expose_apis", "1");

    let options = ini.section_mut(ADDITIONAL_OPTIONS_SECTION);
    options.set(EXTENSIONS, "");
    options.set("custom_apps", "");

    let backup = ini.section_mut(BACKUP_SECTION);
    backup.set("version", "");

    ini
}
