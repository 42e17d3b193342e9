//! Launching Chrome or attaching to a running DevTools endpoint.

use std::path::{Path, PathBuf};

use chromiumoxide::handler::HandlerConfig;
use chromiumoxide::{Browser, BrowserConfig, Handler};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::BrowserEngineConfig;
use crate::error::{AgentError, Result};

/// Common Chrome executable paths to check.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

const CHROME_COMMANDS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// A connected browser and the task draining its CDP event loop.
pub(crate) struct Launched {
    pub browser: Browser,
    pub handler: JoinHandle<()>,
}

/// Connect to `remote_url` when configured, otherwise launch a local Chrome.
pub(crate) async fn launch(config: &BrowserEngineConfig) -> Result<Launched> {
    if let Some(remote_url) = config.remote_url.as_deref() {
        return connect_remote(remote_url, config).await;
    }

    info!("Launching browser (headless={})", config.headless);

    let chrome_path = find_chrome(config.chrome_path.as_deref())?;
    let mut builder = BrowserConfig::builder()
        .chrome_executable(chrome_path)
        .request_timeout(config.timeout_duration());

    // with_head means NOT headless
    if !config.headless {
        builder = builder.with_head();
    }

    for arg in config.launch_args() {
        builder = builder.arg(arg);
    }

    let browser_config = builder
        .build()
        .map_err(|e| AgentError::BrowserUnavailable(format!("Invalid browser config: {}", e)))?;

    let (browser, handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| AgentError::BrowserUnavailable(format!("Failed to launch browser: {}", e)))?;

    Ok(Launched {
        browser,
        handler: spawn_handler(handler),
    })
}

/// Find a Chrome executable: the configured path, well-known install
/// locations, then `PATH`.
fn find_chrome(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(AgentError::BrowserUnavailable(format!(
            "Configured Chrome not found: {}",
            path.display()
        )));
    }

    for path in CHROME_PATHS {
        let p = Path::new(path);
        if p.exists() {
            info!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    for cmd in CHROME_COMMANDS {
        if let Ok(path) = which::which(cmd) {
            info!("Found Chrome in PATH: {}", path.display());
            return Ok(path);
        }
    }

    Err(AgentError::BrowserUnavailable(
        "Chrome/Chromium not found. Please install it:\n\
         - Arch/Manjaro: sudo pacman -S chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium\n\
         - Or set CHROME_PATH / BROWSER_URL"
            .to_string(),
    ))
}

/// HTTP form of a DevTools URL's `/json/version` endpoint.
fn version_endpoint(url: &str) -> String {
    let http_url = url
        .replace("ws://", "http://")
        .replace("wss://", "https://");
    format!("{}/json/version", http_url.trim_end_matches('/'))
}

async fn connect_remote(url: &str, config: &BrowserEngineConfig) -> Result<Launched> {
    info!(
        "Connecting to remote browser at {} (timeout: {}s)",
        url, config.timeout
    );

    let unavailable =
        |e: reqwest::Error| AgentError::BrowserUnavailable(format!("{}: {}", url, e));

    let resp: serde_json::Value = reqwest::Client::new()
        .get(version_endpoint(url))
        .timeout(config.timeout_duration())
        .send()
        .await
        .map_err(unavailable)?
        .json()
        .await
        .map_err(unavailable)?;

    let ws_url = resp
        .get("webSocketDebuggerUrl")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            AgentError::BrowserUnavailable("No webSocketDebuggerUrl in response".to_string())
        })?;

    info!("Connecting to WebSocket: {}", ws_url);

    let handler_config = HandlerConfig {
        request_timeout: config.timeout_duration(),
        ..Default::default()
    };

    let (browser, handler) = Browser::connect_with_config(ws_url, handler_config)
        .await
        .map_err(|e| {
            AgentError::BrowserUnavailable(format!("Failed to connect to remote browser: {}", e))
        })?;

    Ok(Launched {
        browser,
        handler: spawn_handler(handler),
    })
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("Browser handler stopped: {}", e);
                break;
            }
        }
    })
}
