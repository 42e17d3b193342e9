//! Agent error types.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Browser unavailable: {0}")]
    BrowserUnavailable(String),
    #[cfg(feature = "browser")]
    #[error("Browser command failed: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),
    #[error("Navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },
    #[error("Timed out after {}s waiting for {what}", after.as_secs_f64())]
    Timeout { what: String, after: Duration },
    #[error("Page script failed: {0}")]
    Script(String),
    #[error("Search token unavailable: {0}")]
    TokenUnavailable(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            after,
        }
    }

    pub fn navigation(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures caused by the caller cancelling the operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
