#![forbid(unsafe_code)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use spicetify_watch::commands::{exit_fatal, watch_extensions, watch_theme, AppContext};
use spicetify_watch::config::{ConfigStore, SpicetifyPaths};
use spicetify_watch::host::init_host_paths;
use spicetify_watch::prompt::Prompt;

#[derive(Debug, Parser)]
#[command(name = "spicetify-watch", version, about = "Watch Spotify themes and extensions and apply changes live")]
struct Cli {
    /// Never prompt; use each question's quiet-mode answer
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Re-apply the current theme (or extensions) whenever its files change
    Watch {
        /// Watch the configured extensions instead of the theme
        #[arg(short, long)]
        extension: bool,

        /// Reload Spotify after each change
        #[arg(short, long = "live-update")]
        live_update: bool,
    },
    /// Print the config root directory
    ConfigDir,
}

fn init_tracing() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let paths = SpicetifyPaths::resolve()?;

    let (extension, live_update) = match cli.command {
        Command::ConfigDir => {
            println!("{}", paths.root.display());
            return Ok(());
        }
        Command::Watch {
            extension,
            live_update,
        } => (extension, live_update),
    };

    let mut store = ConfigStore::load_or_create(&paths.config_file())?;
    let host = init_host_paths(&mut store, &paths)?;
    info!(spotify = %host.spotify_path.display(), apps = %host.app_dest_path.display(), "Spotify located");

    let ctx = AppContext {
        paths,
        store,
        host,
        prompt: Prompt::new(cli.quiet),
    };

    let never = if extension {
        watch_extensions(&ctx, live_update)?
    } else {
        watch_theme(&ctx, live_update)?
    };
    match never {}
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("failed to initialize logging: {e}");
    }

    if let Err(e) = run(cli) {
        exit_fatal(&e);
    }
}
