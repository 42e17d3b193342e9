//! Request interception policy and console capture.
//!
//! The allow/abort decision is a pure predicate so it can be tested without
//! a browser; the page session only forwards paused requests to it.

use tracing::debug;

/// A request paused by the interception layer.
#[derive(Debug, Clone, Copy)]
pub struct InterceptedRequest<'a> {
    pub url: &'a str,
    /// True for top-level and frame document loads.
    pub is_document: bool,
}

/// Decides whether a paused request continues or is aborted.
pub trait RequestPolicy: Send + Sync {
    fn should_allow(&self, request: &InterceptedRequest<'_>) -> bool;
}

impl<F> RequestPolicy for F
where
    F: Fn(&InterceptedRequest<'_>) -> bool + Send + Sync,
{
    fn should_allow(&self, request: &InterceptedRequest<'_>) -> bool {
        self(request)
    }
}

/// Keeps a page pinned to one route: document loads whose URL does not
/// contain the route are aborted, every other resource passes.
#[derive(Debug, Clone)]
pub struct LandingOnly {
    route: String,
}

impl LandingOnly {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
        }
    }
}

impl RequestPolicy for LandingOnly {
    fn should_allow(&self, request: &InterceptedRequest<'_>) -> bool {
        !request.is_document || request.url.contains(&self.route)
    }
}

/// One console API call observed on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleEntry {
    pub level: String,
    pub text: String,
}

/// Receives console output from a page.
pub trait ConsoleSink: Send + Sync {
    fn on_console_message(&self, entry: &ConsoleEntry);
}

/// Forwards console output to `tracing` at debug level under the
/// `mangafire_agent::console` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConsoleSink;

impl ConsoleSink for TracingConsoleSink {
    fn on_console_message(&self, entry: &ConsoleEntry) {
        debug!(target: "mangafire_agent::console", level = %entry.level, "{}", entry.text);
    }
}
