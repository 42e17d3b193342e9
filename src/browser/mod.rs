//! Browser automation layer.
//!
//! Pure pieces (scripts, request policy, console sink) are always compiled;
//! the chromiumoxide-backed session and page primitives need the `browser`
//! feature.

pub mod evasion;
pub mod intercept;
mod stealth;

#[cfg(feature = "browser")]
mod launch;
#[cfg(feature = "browser")]
mod page;
#[cfg(feature = "browser")]
mod session;

pub use evasion::{
    console_guard_script, frozen_clock_script, EvasionProfile, CONSOLE_PROBE_SENTINEL,
    DEFAULT_USER_AGENT,
};
pub use intercept::{
    ConsoleEntry, ConsoleSink, InterceptedRequest, LandingOnly, RequestPolicy, TracingConsoleSink,
};
pub use stealth::STEALTH_SCRIPTS;

#[cfg(feature = "browser")]
pub use page::PageSession;
#[cfg(feature = "browser")]
pub use session::{BrowserSession, SharedBrowser};
