//! Page preparation applied before the first navigation.
//!
//! Scripts are rendered as plain strings so their content can be checked
//! without a browser; [`EvasionProfile::apply`] installs them together with
//! the user-agent and timezone overrides.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::{AgentConfig, ClockPolicy};

use super::stealth::STEALTH_SCRIPTS;

/// Single console argument the site logs to detect scripted access.
pub const CONSOLE_PROBE_SENTINEL: &str = "[object HTMLDivElement]";

/// User agent presented to the site.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Suppress the console detection probe and turn `location.reload` into a
/// logged no-op.
pub fn console_guard_script() -> String {
    format!(
        r#"
    (() => {{
        const originalLog = console.log;
        console.log = function(...args) {{
            if (args.length === 1 && String(args[0]) === {sentinel}) {{
                return;
            }}
            return originalLog.apply(console, args);
        }};
        try {{
            window.location.reload = () => console.log('Reload prevented');
        }} catch (e) {{}}
    }})();
    "#,
        sentinel = js_string(CONSOLE_PROBE_SENTINEL)
    )
}

/// Replace `Date` so that `new Date()` and `Date.now()` report `instant`.
/// Construction with arguments still builds real dates.
pub fn frozen_clock_script(instant: DateTime<Utc>) -> String {
    let iso = instant.to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        r#"
    (() => {{
        const fixedDate = new Date({iso});
        Date = class extends Date {{
            constructor(...args) {{
                if (args.length === 0) {{
                    return fixedDate;
                }}
                return super(...args);
            }}
            static now() {{
                return fixedDate.getTime();
            }}
        }};
    }})();
    "#,
        iso = js_string(&iso)
    )
}

/// Quote a value as a JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Everything the evasion layer installs on a page.
#[derive(Debug, Clone)]
pub struct EvasionProfile {
    pub user_agent: String,
    pub timezone: String,
    pub clock: ClockPolicy,
}

impl EvasionProfile {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timezone: config.timezone.clone(),
            clock: config.clock.clone(),
        }
    }

    /// Pre-navigation scripts in installation order. The clock is resolved
    /// now, so a host-clock policy freezes at preparation time.
    pub fn scripts(&self) -> Vec<String> {
        let mut scripts = vec![console_guard_script()];
        scripts.extend(STEALTH_SCRIPTS.iter().map(|s| s.to_string()));
        scripts.push(frozen_clock_script(self.clock.resolve()));
        scripts
    }
}

#[cfg(feature = "browser")]
impl EvasionProfile {
    /// Prepare `page` before it navigates anywhere.
    ///
    /// Every step is best-effort: a failure is logged and the remaining
    /// steps still run.
    pub async fn apply(&self, page: &super::PageSession) {
        use tracing::{debug, warn};

        debug!("Applying evasion profile (timezone={})", self.timezone);

        for script in self.scripts() {
            if let Err(e) = page.install_pre_navigation_script(&script).await {
                warn!("Pre-navigation script not installed: {}", e);
            }
        }

        if let Err(e) = page.set_user_agent(&self.user_agent).await {
            warn!("User agent override failed: {}", e);
        }

        if let Err(e) = page.emulate_timezone(&self.timezone).await {
            warn!("Timezone emulation failed for {}: {}", self.timezone, e);
        }
    }
}
