//! Live reload of the running Spotify client
//!
//! The client exposes a remote-control endpoint only when launched with
//! remote debugging enabled. [`ReloadClient`] binds at most one endpoint per
//! process and sends one reload directive per call. There is no retry loop:
//! a failed attempt unbinds the endpoint, and the next file change runs
//! discovery again.

mod devtools;

pub use devtools::CdpClient;

use std::sync::{Mutex, PoisonError};
use tracing::{error, info, warn};

use crate::constants::devtools::LAUNCH_FLAG;
use crate::error::{Error, Result};

/// Remote-control surface of the host application
pub trait DevTools: Send + Sync {
    /// Single probe for an already running endpoint
    fn discover_endpoint(&self) -> Option<String>;

    /// Open a short-lived connection to `endpoint` and issue one reload directive
    fn send_reload(&self, endpoint: &str) -> Result<()>;
}

/// Restarts the host application with an extra command-line flag
pub trait Relauncher {
    fn relaunch(&self, flag: &str) -> anyhow::Result<()>;
}

/// Outcome of [`ReloadClient::ensure_session`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// An endpoint was found and bound
    Bound(String),
    /// No endpoint yet; the host was asked to restart with remote debugging
    Relaunched,
    /// No endpoint and no restart
    Unbound,
}

pub struct ReloadClient<D> {
    devtools: D,
    endpoint: Mutex<Option<String>>,
}

impl<D: DevTools> ReloadClient<D> {
    pub fn new(devtools: D) -> Self {
        Self {
            devtools,
            endpoint: Mutex::new(None),
        }
    }

    /// Currently bound endpoint, if any
    pub fn endpoint(&self) -> Option<String> {
        self.endpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn bind(&self, endpoint: Option<String>) {
        *self.endpoint.lock().unwrap_or_else(PoisonError::into_inner) = endpoint;
    }

    /// Probe once and bind the endpoint if one is found
    pub fn discover_endpoint(&self) -> Option<String> {
        let found = self.devtools.discover_endpoint();
        if found.is_some() {
            self.bind(found.clone());
        }
        found
    }

    /// Make sure a debug session exists or has been requested
    ///
    /// `confirm` is only consulted when no endpoint is found. The relaunch is
    /// fire-and-forget: later reload attempts pick the endpoint up lazily.
    pub fn ensure_session<F>(&self, relauncher: &dyn Relauncher, confirm: F) -> SessionState
    where
        F: FnOnce() -> bool,
    {
        if let Some(endpoint) = self.discover_endpoint() {
            info!(endpoint = %endpoint, "Connected to Spotify remote debugging");
            return SessionState::Bound(endpoint);
        }

        if !confirm() {
            warn!("Spotify is not running with remote debugging, live update disabled until it is");
            return SessionState::Unbound;
        }

        match relauncher.relaunch(LAUNCH_FLAG) {
            Ok(()) => {
                info!(flag = LAUNCH_FLAG, "Restarted Spotify with remote debugging");
                SessionState::Relaunched
            }
            Err(e) => {
                error!(error = ?e, "Failed to restart Spotify");
                SessionState::Unbound
            }
        }
    }

    /// Send one reload directive, discovering the endpoint first if none is bound
    pub fn reload(&self) -> Result<()> {
        let endpoint = match self.endpoint() {
            Some(endpoint) => endpoint,
            None => self.discover_endpoint().ok_or_else(|| {
                Error::ReloadConnectionFailed("no remote debugging endpoint found".to_string())
            })?,
        };

        self.devtools.send_reload(&endpoint).inspect_err(|_| {
            // Stale after a client restart; rediscover on the next change
            self.bind(None);
        })
    }

    /// [`reload`](Self::reload) with the outcome reported to the user
    pub fn reload_and_report(&self) {
        match self.reload() {
            Ok(()) => info!("Spotify reloaded"),
            Err(e) => {
                error!(error = %e, "Could not reload Spotify");
                info!("Close Spotify and run \"spicetify-watch watch -l\" again.");
            }
        }
    }
}
