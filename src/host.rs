//! Spotify install discovery and process control

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{error, info, warn};

use crate::config::{ensure_dir, ConfigStore, SpicetifyPaths};
use crate::constants::config::{PREFS_PATH, SETTING_SECTION, SPOTIFY_PATH};
use crate::constants::host::{APPS_DIR, APPX_MARKER, PROCESS_NAME};
use crate::constants::paths::APPX_DIR;
use crate::error::Error;
use crate::reload::Relauncher;

/// Locations inside the Spotify install used by the watch commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub spotify_path: PathBuf,
    pub prefs_path: PathBuf,
    /// `Apps` folder inside the install
    pub app_path: PathBuf,
    /// Where modified apps are written (differs from `app_path` for Windows Store installs)
    pub app_dest_path: PathBuf,
    pub is_appx: bool,
}

/// Validate or auto-detect `spotify_path` and `prefs_path`
///
/// Detected values are stored in the config and persisted right away. A failed
/// write is logged and does not stop startup.
pub fn init_host_paths(
    store: &mut ConfigStore,
    paths: &SpicetifyPaths,
) -> crate::error::Result<HostPaths> {
    init_host_paths_with(store, paths, find_app_path, find_pref_file_path)
}

fn init_host_paths_with<A, P>(
    store: &mut ConfigStore,
    paths: &SpicetifyPaths,
    detect_app: A,
    detect_prefs: P,
) -> crate::error::Result<HostPaths>
where
    A: FnOnce() -> Option<PathBuf>,
    P: FnOnce() -> Option<PathBuf>,
{
    let spotify_path = configured_or_detected(store, SPOTIFY_PATH, "directory of Spotify", detect_app)?;
    let prefs_path = configured_or_detected(store, PREFS_PATH, "path of \"prefs\" file", detect_prefs)?;

    let is_appx = cfg!(windows) && spotify_path.to_string_lossy().contains(APPX_MARKER);
    let app_path = spotify_path.join(APPS_DIR);
    let app_dest_path = if is_appx {
        paths.root.join(APPX_DIR)
    } else {
        app_path.clone()
    };
    ensure_dir(&app_dest_path)?;

    Ok(HostPaths {
        spotify_path,
        prefs_path,
        app_path,
        app_dest_path,
        is_appx,
    })
}

fn configured_or_detected<F>(
    store: &mut ConfigStore,
    key: &'static str,
    what: &'static str,
    detect: F,
) -> crate::error::Result<PathBuf>
where
    F: FnOnce() -> Option<PathBuf>,
{
    let configured = store.section(SETTING_SECTION).get_string(key);
    if !configured.is_empty() {
        let path = PathBuf::from(configured);
        if !path.exists() {
            return Err(Error::PathInvalid { key, what, path });
        }
        return Ok(path);
    }

    let detected = detect().ok_or(Error::AutoDetectFailed { key, what })?;
    info!(key = key, path = %detected.display(), "Auto-detected path");
    store
        .section_mut(SETTING_SECTION)
        .set(key, detected.to_string_lossy());
    if let Err(e) = store.write() {
        error!(error = %e, "Failed to save auto-detected path");
    }
    Ok(detected)
}

fn first_existing(candidates: Vec<PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|p| p.exists())
}

/// Spotify install directory
pub fn find_app_path() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if cfg!(windows) {
        if let Some(roaming) = dirs::config_dir() {
            candidates.push(roaming.join("Spotify"));
        }
    } else if cfg!(target_os = "macos") {
        candidates.push(PathBuf::from("/Applications/Spotify.app/Contents/Resources"));
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join("Applications/Spotify.app/Contents/Resources"));
        }
    } else {
        candidates.extend(
            [
                "/opt/spotify",
                "/opt/spotify/spotify-client",
                "/usr/share/spotify",
                "/usr/libexec/spotify",
                "/var/lib/flatpak/app/com.spotify.Client/x86_64/stable/active/files/extra/share/spotify",
            ]
            .into_iter()
            .map(PathBuf::from),
        );
        if let Some(data) = dirs::data_dir() {
            candidates.push(data.join("spotify-launcher/install/usr/share/spotify"));
            candidates.push(
                data.join("flatpak/app/com.spotify.Client/x86_64/stable/active/files/extra/share/spotify"),
            );
        }
    }

    first_existing(candidates)
}

/// Spotify `prefs` file
pub fn find_pref_file_path() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if cfg!(windows) {
        if let Some(roaming) = dirs::config_dir() {
            candidates.push(roaming.join("Spotify").join("prefs"));
        }
        if let Some(local) = dirs::data_local_dir() {
            candidates.push(
                local.join("Packages/SpotifyAB.SpotifyMusic_zpdnekdrzrea0/LocalState/Spotify/prefs"),
            );
        }
    } else if cfg!(target_os = "macos") {
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join("Library/Application Support/Spotify/prefs"));
        }
    } else {
        if let Some(config) = dirs::config_dir() {
            candidates.push(config.join("spotify").join("prefs"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".var/app/com.spotify.Client/config/spotify/prefs"));
        }
    }

    first_existing(candidates)
}

/// Copy `src` into `dest_dir`, keeping its file name
pub fn copy_file(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = src
        .file_name()
        .with_context(|| format!("{} has no file name", src.display()))?;
    let dest = dest_dir.join(name);
    std::fs::copy(src, &dest)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dest_dir.display()))?;
    Ok(dest)
}

/// Stops running Spotify processes and starts the client again
pub struct ProcessRelauncher {
    spotify_path: PathBuf,
}

impl ProcessRelauncher {
    pub fn new(spotify_path: PathBuf) -> Self {
        Self { spotify_path }
    }

    fn stop_running(&self) {
        let status = if cfg!(windows) {
            Command::new("taskkill")
                .args(["/F", "/IM", PROCESS_NAME])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
        } else {
            Command::new("pkill")
                .args(["-x", PROCESS_NAME])
                .status()
        };
        if let Err(e) = status {
            // Nothing running is not an error; missing tooling is worth a note
            warn!(error = %e, "Failed to stop running Spotify");
        }
    }

    fn launch_command(&self, flag: &str) -> Command {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.args(["-a", "Spotify", "--args", flag]);
            cmd
        } else {
            let binary = if cfg!(windows) { "Spotify.exe" } else { "spotify" };
            let mut cmd = Command::new(self.spotify_path.join(binary));
            cmd.arg(flag);
            cmd
        }
    }
}

impl Relauncher for ProcessRelauncher {
    fn relaunch(&self, flag: &str) -> Result<()> {
        self.stop_running();
        let child = self
            .launch_command(flag)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to launch Spotify")?;
        info!(pid = child.id(), flag = flag, "Launched Spotify");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        paths: SpicetifyPaths,
        store: ConfigStore,
    }

    fn fixture(setting: &str) -> Fixture {
        let dir = TempDir::new().unwrap();
        let paths = SpicetifyPaths::from_root(dir.path().join("state")).unwrap();
        fs::write(paths.config_file(), format!("[Setting]\n{setting}")).unwrap();
        let store = ConfigStore::load(&paths.config_file()).unwrap();
        Fixture { dir, paths, store }
    }

    #[test]
    fn test_configured_paths_are_used() {
        let probe = TempDir::new().unwrap();
        let spotify = probe.path().join("spotify");
        let prefs = probe.path().join("prefs");
        fs::create_dir_all(&spotify).unwrap();
        fs::write(&prefs, "").unwrap();

        let mut f = fixture(&format!(
            "spotify_path = {}\nprefs_path = {}\n",
            spotify.display(),
            prefs.display()
        ));
        let host = init_host_paths_with(&mut f.store, &f.paths, || panic!("no detect"), || panic!("no detect"))
            .unwrap();
        assert_eq!(host.spotify_path, spotify);
        assert_eq!(host.prefs_path, prefs);
        assert_eq!(host.app_path, spotify.join(APPS_DIR));
        assert!(host.app_dest_path.is_dir());
    }

    #[test]
    fn test_invalid_configured_path() {
        let mut f = fixture("spotify_path = /no/such/spotify\n");
        let result = init_host_paths_with(&mut f.store, &f.paths, || None, || None);
        assert!(matches!(
            result,
            Err(Error::PathInvalid { key: SPOTIFY_PATH, .. })
        ));
    }

    #[test]
    fn test_detected_paths_are_persisted() {
        let mut f = fixture("");
        let spotify = f.dir.path().join("detected-spotify");
        let prefs = f.dir.path().join("detected-prefs");
        fs::create_dir_all(&spotify).unwrap();
        fs::write(&prefs, "").unwrap();

        init_host_paths_with(
            &mut f.store,
            &f.paths,
            || Some(spotify.clone()),
            || Some(prefs.clone()),
        )
        .unwrap();

        let reloaded = ConfigStore::load(&f.paths.config_file()).unwrap();
        let setting = reloaded.section(SETTING_SECTION);
        assert_eq!(PathBuf::from(setting.get_string(SPOTIFY_PATH)), spotify);
        assert_eq!(PathBuf::from(setting.get_string(PREFS_PATH)), prefs);
    }

    #[test]
    fn test_detection_failure() {
        let mut f = fixture("");
        let spotify = f.dir.path().join("spotify");
        fs::create_dir_all(&spotify).unwrap();

        let result = init_host_paths_with(&mut f.store, &f.paths, || Some(spotify.clone()), || None);
        assert!(matches!(
            result,
            Err(Error::AutoDetectFailed { key: PREFS_PATH, .. })
        ));
    }

    #[test]
    fn test_copy_file_into_dir() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("ext.js");
        let dest_dir = dir.path().join("zlink");
        fs::write(&src, "console.log(1)").unwrap();
        fs::create_dir_all(&dest_dir).unwrap();

        let dest = copy_file(&src, &dest_dir).unwrap();
        assert_eq!(dest, dest_dir.join("ext.js"));
        assert_eq!(fs::read_to_string(dest).unwrap(), "console.log(1)");

        assert!(copy_file(&dir.path().join("missing.js"), &dest_dir).is_err());
    }
}
