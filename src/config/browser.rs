//! Browser engine configuration types.
//!
//! These types live here (always compiled) rather than behind
//! `#[cfg(feature = "browser")]` so that config parsing works without the
//! browser feature.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Flags that hide the automation-controlled marker and keep Chrome usable
/// inside containers.
pub const AUTOMATION_SUPPRESSION_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--no-sandbox",
    "--disable-dev-shm-usage",
];

/// Browser engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Navigation and selector-wait timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// Explicit Chrome/Chromium executable. Searched for when unset.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Additional Chrome arguments, appended after the suppression flags.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to an existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            timeout: default_timeout(),
            proxy: None,
            chrome_path: None,
            chrome_args: Vec::new(),
            remote_url: None,
        }
    }
}

impl BrowserEngineConfig {
    /// Apply environment variable overrides.
    ///
    /// - `BROWSER_URL` - Remote Chrome DevTools URL
    /// - `CHROME_PATH` - Chrome executable to launch
    /// - `SOCKS_PROXY` - SOCKS proxy for browser traffic (e.g., "socks5://127.0.0.1:9050")
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(val) = non_empty_env("BROWSER_URL") {
            self.remote_url = Some(val);
        }

        if let Some(val) = non_empty_env("CHROME_PATH") {
            self.chrome_path = Some(PathBuf::from(val));
        }

        // Set proxy from SOCKS_PROXY if not already configured
        if self.proxy.is_none() {
            self.proxy = non_empty_env("SOCKS_PROXY");
        }

        self
    }

    /// Full launch argument list: suppression flags, proxy, then extras.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args: Vec<String> = AUTOMATION_SUPPRESSION_ARGS
            .iter()
            .map(|s| s.to_string())
            .collect();

        if let Some(ref proxy) = self.proxy {
            args.push(format!("--proxy-server={}", proxy));
        }

        for extra in &self.chrome_args {
            if !args.contains(extra) {
                args.push(extra.clone());
            }
        }

        args
    }

    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

pub fn default_headless() -> bool {
    true
}

pub fn default_timeout() -> u64 {
    30
}
