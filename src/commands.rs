//! Watch commands
//!
//! Each command resolves its targets once, optionally starts a live reload
//! session, then blocks in a [`Dispatcher`] until a fatal error.

use anyhow::{Context, Result};
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

use crate::apply;
use crate::config::{ConfigStore, SpicetifyPaths};
use crate::constants::config::{ADDITIONAL_OPTIONS_SECTION, EXTENSIONS, LIST_SEPARATOR};
use crate::constants::host::ZLINK_DIR;
use crate::error::Error;
use crate::host::{copy_file, HostPaths, ProcessRelauncher};
use crate::prompt::Prompt;
use crate::reload::{CdpClient, DevTools, ReloadClient, Relauncher, SessionState};
use crate::theme::{resolve_extension_list, ThemeSettings};
use crate::watch::{Dispatcher, WatchTarget};

const RESTART_QUESTION: &str =
    "Spotify is not running with remote debugging. Restart it now? [Y/n] ";

/// Everything a command needs, built once at startup
pub struct AppContext {
    pub paths: SpicetifyPaths,
    pub store: ConfigStore,
    pub host: HostPaths,
    pub prompt: Prompt,
}

/// Log a fatal error with its remedy and terminate
pub fn exit_fatal(err: &anyhow::Error) -> ! {
    error!("{err:#}");
    std::process::exit(1);
}

/// Flat targets for the theme files whose feature is active
fn theme_file_targets(settings: &ThemeSettings) -> Vec<WatchTarget> {
    let mut targets = Vec::new();
    if settings.replace_colors {
        targets.extend(settings.color_path().map(WatchTarget::file));
    }
    if settings.inject_css {
        targets.extend(settings.css_path().map(WatchTarget::file));
    }
    targets
}

/// Folder inside the install that receives changed extension files
fn extension_dir(host: &HostPaths) -> PathBuf {
    host.app_path.join(ZLINK_DIR)
}

/// Re-resolve settings and rewrite the stylesheets
fn refresh_css(ctx: &AppContext, changed: &Path) -> Result<()> {
    let settings = ThemeSettings::resolve(&ctx.store, &ctx.paths)?;
    apply::update_css(&settings, &ctx.host.app_dest_path)?;
    info!(path = %changed.display(), "Theme file is updated");
    Ok(())
}

fn spawn_asset_watcher<D>(
    assets_path: PathBuf,
    app_dest_path: PathBuf,
    reloader: Option<Arc<ReloadClient<D>>>,
) -> Result<thread::JoinHandle<Result<Infallible>>>
where
    D: DevTools + 'static,
{
    // Subscribe before spawning so setup errors surface on the caller
    let dispatcher = Dispatcher::new(vec![WatchTarget::recursive(assets_path.clone())])?;

    thread::Builder::new()
        .name("asset-watcher".to_string())
        .spawn(move || {
            let reload = reloader.map(|client| move || client.reload_and_report());
            let result = dispatcher.run(
                |_changed: &Path| -> Result<()> {
                    apply::update_assets(&assets_path, &app_dest_path)?;
                    Ok(())
                },
                reload,
            );
            result.map_err(anyhow::Error::from)
        })
        .context("Failed to spawn asset watcher thread")
}

/// Watch the current theme and re-apply it on every change
pub fn watch_theme(ctx: &AppContext, live: bool) -> Result<Infallible> {
    let settings = ThemeSettings::resolve(&ctx.store, &ctx.paths)?;
    if settings.theme_folder.is_none() {
        return Err(Error::ThemeNotConfigured.into());
    }
    if let Some(problem) = &settings.color_problem {
        error!(error = %problem, "Colors will not be watched");
    }

    let reloader = if live {
        Some(start_live_update(ctx)?)
    } else {
        None
    };

    let file_targets = theme_file_targets(&settings);

    let asset_watcher = match settings.assets_path() {
        Some(assets_path) if settings.overwrite_assets => Some(spawn_asset_watcher(
            assets_path,
            ctx.host.app_dest_path.clone(),
            reloader.clone(),
        )?),
        _ => None,
    };

    if file_targets.is_empty() {
        let Some(handle) = asset_watcher else {
            return Err(Error::NothingToWatch.into());
        };
        return match handle.join() {
            Ok(result) => result,
            Err(_) => anyhow::bail!("Asset watcher thread panicked"),
        };
    }

    if let Some(handle) = asset_watcher {
        // Flat watch below never returns; a failing asset watcher ends the process
        thread::Builder::new()
            .name("asset-watcher-monitor".to_string())
            .spawn(move || match handle.join() {
                Ok(Err(e)) => exit_fatal(&e),
                Ok(Ok(never)) => match never {},
                Err(_) => exit_fatal(&anyhow::anyhow!("Asset watcher thread panicked")),
            })
            .context("Failed to spawn asset watcher monitor")?;
    }

    let dispatcher = Dispatcher::new(file_targets)?;
    let reload = reloader.map(|client| move || client.reload_and_report());
    let never = dispatcher.run(|changed: &Path| refresh_css(ctx, changed), reload)?;
    match never {}
}

/// Watch the configured extensions and push each changed file into the client
pub fn watch_extensions(ctx: &AppContext, live: bool) -> Result<Infallible> {
    let names = ctx
        .store
        .section(ADDITIONAL_OPTIONS_SECTION)
        .get_list(EXTENSIONS, LIST_SEPARATOR);
    let found = resolve_extension_list(&names, &ctx.paths)?;

    let reloader = if live {
        Some(start_live_update(ctx)?)
    } else {
        None
    };

    let zlink = extension_dir(&ctx.host);
    let dispatcher = Dispatcher::new(found.into_iter().map(WatchTarget::file).collect())?;
    let reload = reloader.map(|client| move || client.reload_and_report());

    let never = dispatcher.run(
        |changed: &Path| -> Result<()> {
            copy_file(changed, &zlink)?;
            info!("Extension \"{}\" is updated.", changed.display());
            Ok(())
        },
        reload,
    )?;
    match never {}
}

/// Bind a reload session, asking to restart Spotify when none is reachable
pub fn start_live_update(ctx: &AppContext) -> Result<Arc<ReloadClient<CdpClient>>> {
    let client = Arc::new(ReloadClient::new(CdpClient::new()?));
    let relauncher = ProcessRelauncher::new(ctx.host.spotify_path.clone());
    start_session(&client, &relauncher, ctx.prompt);
    Ok(client)
}

fn start_session<D: DevTools>(
    client: &ReloadClient<D>,
    relauncher: &dyn Relauncher,
    prompt: Prompt,
) -> SessionState {
    client.ensure_session(relauncher, || prompt.ask(RESTART_QUESTION, true, true))
}
