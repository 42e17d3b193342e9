//! Agent configuration.
//!
//! The host hands the agent a loosely typed option bag; it is parsed once
//! into [`AgentConfig`] with every malformed value falling back to its
//! default. A TOML file plus environment overrides serve the CLI.

mod browser;

pub use browser::{
    default_headless, default_timeout, BrowserEngineConfig, AUTOMATION_SUPPRESSION_ARGS,
};

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AgentError, Result};

/// Chapter translation languages offered by the site.
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "es", "es-la", "fr", "jp", "pt", "pt-br"];

/// Host option keys.
pub const OPTION_LANGUAGE: &str = "Language";
pub const OPTION_PAGE_LOADING_TIMEOUT: &str = "PageLoadingTimeout";
pub const OPTION_TIME_ZONE: &str = "TimeZone";

const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_PAGE_DELAY_MS: u64 = 5_000;
const DEFAULT_TIMEZONE: &str = "UTC";

/// How the page's notion of "now" is pinned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClockPolicy {
    /// Always report the same instant.
    Fixed { instant: DateTime<Utc> },
    /// Freeze at the host's wall clock when the page is prepared.
    HostNow,
}

impl Default for ClockPolicy {
    fn default() -> Self {
        Self::Fixed {
            instant: default_frozen_instant(),
        }
    }
}

impl ClockPolicy {
    /// The instant a page prepared right now should observe.
    pub fn resolve(&self) -> DateTime<Utc> {
        match self {
            Self::Fixed { instant } => *instant,
            Self::HostNow => Utc::now(),
        }
    }
}

/// 2025-11-21T12:00:00Z
pub fn default_frozen_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 21, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Chapter translation language; substituted into chapter URLs.
    #[serde(default = "default_language")]
    pub language: String,

    /// Delay between reveal steps, in milliseconds.
    #[serde(default = "default_page_delay_ms")]
    pub page_loading_delay_ms: u64,

    /// IANA timezone the browser emulates.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub clock: ClockPolicy,

    #[serde(default)]
    pub browser: BrowserEngineConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            page_loading_delay_ms: default_page_delay_ms(),
            timezone: default_timezone(),
            clock: ClockPolicy::default(),
            browser: BrowserEngineConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Parse the host's option bag. Never fails: unknown or malformed
    /// values keep their defaults.
    pub fn from_options(options: &HashMap<String, serde_json::Value>) -> Self {
        let mut config = Self::default();

        if let Some(value) = options.get(OPTION_LANGUAGE) {
            match value.as_str().and_then(normalize_language) {
                Some(lang) => config.language = lang,
                None => warn!("Ignoring unsupported language option: {}", value),
            }
        }

        if let Some(value) = options.get(OPTION_PAGE_LOADING_TIMEOUT) {
            match parse_delay_ms(value) {
                Some(ms) => config.page_loading_delay_ms = ms,
                None => warn!("Ignoring malformed page loading timeout: {}", value),
            }
        }

        if let Some(value) = options.get(OPTION_TIME_ZONE) {
            match value.as_str().map(str::trim).filter(|s| !s.is_empty()) {
                Some(tz) => config.timezone = tz.to_string(),
                None => warn!("Ignoring malformed timezone option: {}", value),
            }
        }

        config
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AgentError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let mut config: Self =
            toml::from_str(raw).map_err(|e| AgentError::Config(e.to_string()))?;
        config.language = normalize_language(&config.language).unwrap_or_else(|| {
            warn!(
                "Unsupported language '{}', falling back to {}",
                config.language, DEFAULT_LANGUAGE
            );
            default_language()
        });
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// - `MANGAFIRE_LANGUAGE` - translation language
    /// - `MANGAFIRE_PAGE_DELAY_MS` - reveal step delay
    /// - `MANGAFIRE_TIMEZONE` - emulated timezone
    ///
    /// plus the browser overrides from [`BrowserEngineConfig::with_env_overrides`].
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(lang) = std::env::var("MANGAFIRE_LANGUAGE")
            .ok()
            .and_then(|v| normalize_language(&v))
        {
            self.language = lang;
        }

        if let Some(ms) = std::env::var("MANGAFIRE_PAGE_DELAY_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.page_loading_delay_ms = ms;
        }

        if let Ok(tz) = std::env::var("MANGAFIRE_TIMEZONE") {
            if !tz.trim().is_empty() {
                self.timezone = tz.trim().to_string();
            }
        }

        self.browser = self.browser.with_env_overrides();
        self
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_loading_delay_ms)
    }
}

/// Lowercase and check against [`SUPPORTED_LANGUAGES`].
pub fn normalize_language(raw: &str) -> Option<String> {
    let lang = raw.trim().to_lowercase();
    SUPPORTED_LANGUAGES
        .contains(&lang.as_str())
        .then_some(lang)
}

/// Accepts the host's string form ("5000") as well as plain numbers.
fn parse_delay_ms(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        serde_json::Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_page_delay_ms() -> u64 {
    DEFAULT_PAGE_DELAY_MS
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(pairs: &[(&str, serde_json::Value)]) -> HashMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_from_options_empty_uses_defaults() {
        let config = AgentConfig::from_options(&HashMap::new());
        assert_eq!(config, AgentConfig::default());
        assert_eq!(config.language, "en");
        assert_eq!(config.page_loading_delay_ms, 5_000);
        assert_eq!(config.timezone, "UTC");
    }

    #[test]
    fn test_from_options_reads_values() {
        let config = AgentConfig::from_options(&options(&[
            (OPTION_LANGUAGE, json!("PT-BR")),
            (OPTION_PAGE_LOADING_TIMEOUT, json!("2500")),
            (OPTION_TIME_ZONE, json!("America/Sao_Paulo")),
        ]));
        assert_eq!(config.language, "pt-br");
        assert_eq!(config.page_loading_delay_ms, 2_500);
        assert_eq!(config.timezone, "America/Sao_Paulo");
        assert_eq!(config.page_delay(), Duration::from_millis(2_500));
    }

    #[test]
    fn test_from_options_fails_closed() {
        let config = AgentConfig::from_options(&options(&[
            (OPTION_LANGUAGE, json!(42)),
            (OPTION_PAGE_LOADING_TIMEOUT, json!("soon")),
            (OPTION_TIME_ZONE, json!("  ")),
        ]));
        assert_eq!(config, AgentConfig::default());

        let config = AgentConfig::from_options(&options(&[
            (OPTION_LANGUAGE, json!("klingon")),
            (OPTION_PAGE_LOADING_TIMEOUT, json!(-5)),
        ]));
        assert_eq!(config.language, "en");
        assert_eq!(config.page_loading_delay_ms, 5_000);
    }

    #[test]
    fn test_from_options_numeric_delay() {
        let config =
            AgentConfig::from_options(&options(&[(OPTION_PAGE_LOADING_TIMEOUT, json!(750))]));
        assert_eq!(config.page_loading_delay_ms, 750);
    }

    #[test]
    fn test_from_toml() {
        let raw = r#"
            language = "fr"
            page_loading_delay_ms = 1200
            timezone = "Europe/Paris"

            [clock]
            mode = "host_now"

            [browser]
            headless = false
            timeout = 45
        "#;
        let config = AgentConfig::from_toml(raw).unwrap();
        assert_eq!(config.language, "fr");
        assert_eq!(config.page_loading_delay_ms, 1200);
        assert_eq!(config.timezone, "Europe/Paris");
        assert_eq!(config.clock, ClockPolicy::HostNow);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.timeout, 45);
    }

    #[test]
    fn test_from_toml_fixed_clock_and_bad_language() {
        let raw = r#"
            language = "xx"

            [clock]
            mode = "fixed"
            instant = "2024-01-02T03:04:05Z"
        "#;
        let config = AgentConfig::from_toml(raw).unwrap();
        assert_eq!(config.language, "en");
        assert_eq!(
            config.clock.resolve(),
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_from_toml_invalid() {
        assert!(matches!(
            AgentConfig::from_toml("language = ["),
            Err(AgentError::Config(_))
        ));
    }

    #[test]
    fn test_default_clock_is_fixed() {
        assert_eq!(
            ClockPolicy::default().resolve().to_rfc3339(),
            "2025-11-21T12:00:00+00:00"
        );
    }
}
