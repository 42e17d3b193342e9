//! Fingerprint patches installed before any site script runs.
//! Based on puppeteer-extra-plugin-stealth techniques.
//!
//! Each patch is wrapped in its own function scope: pre-navigation scripts
//! share one global lexical scope and would otherwise clash on `const`.

pub const STEALTH_SCRIPTS: &[&str] = &[
    // Remove webdriver property
    r#"
    (() => {
        Object.defineProperty(navigator, 'webdriver', {
            get: () => undefined,
            configurable: true
        });
    })();
    "#,
    // Chrome object expected by site checks
    r#"
    (() => {
        if (!window.chrome) {
            window.chrome = { runtime: {}, loadTimes: function() {}, csi: function() {}, app: {} };
        }
    })();
    "#,
    // Permissions query for notifications
    r#"
    (() => {
        const originalQuery = window.navigator.permissions.query;
        window.navigator.permissions.query = (parameters) => (
            parameters.name === 'notifications' ?
            Promise.resolve({ state: Notification.permission }) :
            originalQuery(parameters)
        );
    })();
    "#,
    // Plugins list of a regular desktop Chrome
    r#"
    (() => {
        Object.defineProperty(navigator, 'plugins', {
            get: () => [
                { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer', description: 'Portable Document Format' },
                { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai', description: '' },
                { name: 'Native Client', filename: 'internal-nacl-plugin', description: '' }
            ],
            configurable: true
        });
    })();
    "#,
    // Languages
    r#"
    (() => {
        Object.defineProperty(navigator, 'languages', {
            get: () => ['en-US', 'en'],
            configurable: true
        });
    })();
    "#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_are_self_contained() {
        for script in STEALTH_SCRIPTS {
            let trimmed = script.trim();
            assert!(trimmed.starts_with("(() => {"), "{}", trimmed);
            assert!(trimmed.ends_with("})();"), "{}", trimmed);
        }
    }
}
