//! Chrome DevTools Protocol transport
//!
//! Discovery reads the HTTP target listing (`/json/list`) and picks the first
//! `page` target. A reload opens the page's WebSocket, sends one
//! `Runtime.evaluate` command and closes the socket again.

use anyhow::{Context, Result};
use futures_util::SinkExt;
use serde::{Deserialize, Serialize};
use tokio::runtime::{Builder, Runtime};
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use super::DevTools;
use crate::constants::devtools::{PAGE_TARGET, PORT, RELOAD_EXPRESSION};
use crate::error::Error;

/// One entry of the `/json/list` response
#[derive(Debug, Deserialize)]
struct TargetInfo {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    ws_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct EvaluateParams<'a> {
    expression: &'a str,
}

#[derive(Debug, Serialize)]
struct CdpCommand<'a> {
    id: u32,
    method: &'a str,
    params: EvaluateParams<'a>,
}

fn reload_command() -> CdpCommand<'static> {
    CdpCommand {
        id: 0,
        method: "Runtime.evaluate",
        params: EvaluateParams {
            expression: RELOAD_EXPRESSION,
        },
    }
}

fn pick_page_endpoint(targets: Vec<TargetInfo>) -> Option<String> {
    targets
        .into_iter()
        .filter(|t| t.kind == PAGE_TARGET)
        .find_map(|t| t.ws_url)
}

/// DevTools client driving its own single-threaded runtime
///
/// Safe to share between watch threads: each call blocks the calling thread
/// on the runtime until its own request completes.
pub struct CdpClient {
    runtime: Runtime,
    http: reqwest::Client,
    list_url: String,
}

impl CdpClient {
    /// Client for the default remote debugging port
    pub fn new() -> Result<Self> {
        Self::with_port(PORT)
    }

    pub fn with_port(port: u16) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build runtime for DevTools client")?;
        Ok(Self {
            runtime,
            http: reqwest::Client::new(),
            list_url: format!("http://127.0.0.1:{port}/json/list"),
        })
    }

    async fn fetch_targets(&self) -> Result<Vec<TargetInfo>> {
        self.http
            .get(&self.list_url)
            .send()
            .await
            .context(format!("Failed to query {}", self.list_url))?
            .json::<Vec<TargetInfo>>()
            .await
            .context("Failed to parse DevTools target list")
    }
}

async fn send_reload_directive(endpoint: &str) -> Result<()> {
    let (mut socket, _response) = tokio_tungstenite::connect_async(endpoint)
        .await
        .context(format!("Failed to connect to {endpoint}"))?;

    let payload = serde_json::to_string(&reload_command())
        .context("Failed to serialize reload command")?;
    socket
        .send(Message::Text(payload))
        .await
        .context("Failed to send reload command")?;

    // Spotify tears the page down while reloading, so a failed close is expected
    let _ = socket.close(None).await;
    Ok(())
}

impl DevTools for CdpClient {
    fn discover_endpoint(&self) -> Option<String> {
        self.runtime
            .block_on(self.fetch_targets())
            .inspect_err(|e| debug!(error = ?e, "No DevTools endpoint"))
            .ok()
            .and_then(pick_page_endpoint)
    }

    fn send_reload(&self, endpoint: &str) -> crate::error::Result<()> {
        self.runtime
            .block_on(send_reload_directive(endpoint))
            .map_err(|e| Error::ReloadConnectionFailed(format!("{e:#}")))
    }
}
