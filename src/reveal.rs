//! Progressive reveal of lazily loaded chapter images.
//!
//! The reader materializes one full-resolution image at a time as its page
//! indicator changes, so images are captured one step at a time: select
//! index `i`, wait, then read back the image for `i`.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cancel::{ensure_active, pause};
use crate::error::Result;

/// Container holding the reader's page indicator.
pub const PROGRESS_BAR: &str = "#progress-bar";
pub const PAGE_COUNTER: &str = "#progress-bar .total-page";
pub const PAGE_ITEMS: &str = "#progress-bar ul li[data-page]";

/// Indicator entry for 1-based page `index`.
pub fn page_item_selector(index: usize) -> String {
    format!("#progress-bar ul li[data-page='{}']", index)
}

/// Loaded image for 1-based page `index`.
pub fn page_image_selector(index: usize) -> String {
    format!(
        "#page-wrapper img[data-number='{0}'][src], .page img[data-number='{0}'][src]",
        index
    )
}

/// Expected page count: the counter's leading integer when the counter
/// exists (0 when it is not numeric), otherwise the number of indicator
/// items.
pub fn resolve_page_count(counter_text: Option<&str>, item_count: usize) -> usize {
    match counter_text {
        Some(text) => {
            let digits: String = text
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().unwrap_or(0)
        }
        None => item_count,
    }
}

/// What the reveal loop needs from a loaded chapter reader.
#[async_trait]
pub trait RevealSurface: Send + Sync {
    /// Wait for the reader's page indicator. Fails with
    /// [`AgentError::Timeout`](crate::AgentError::Timeout) when the page is
    /// not a reader.
    async fn wait_ready(&self) -> Result<()>;

    async fn expected_page_count(&self) -> Result<usize>;

    /// Select page `index`. A missing indicator entry is not an error.
    async fn reveal(&self, index: usize) -> Result<()>;

    /// Markup of the image for page `index`, if it has materialized.
    async fn capture(&self, index: usize) -> Result<Option<String>>;
}

/// Result of one reveal pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealOutcome {
    pub expected: usize,
    /// Captured image markup in reveal order.
    pub captured: Vec<String>,
    /// 1-based indices whose image never appeared.
    pub missing: Vec<usize>,
}

/// Drives the reveal loop with a fixed delay per step.
#[derive(Debug, Clone, Copy)]
pub struct RevealController {
    delay: Duration,
}

impl RevealController {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn collect(
        &self,
        surface: &dyn RevealSurface,
        cancel: &CancellationToken,
    ) -> Result<RevealOutcome> {
        ensure_active(cancel)?;
        surface.wait_ready().await?;

        let expected = surface.expected_page_count().await?;
        info!("Number of pages expected: {}", expected);

        let mut outcome = RevealOutcome {
            expected,
            ..Default::default()
        };

        for index in 1..=expected {
            surface.reveal(index).await?;
            pause(cancel, self.delay).await?;

            match surface.capture(index).await? {
                Some(markup) => outcome.captured.push(markup),
                None => {
                    warn!("Page {} did not load within {:?}", index, self.delay);
                    outcome.missing.push(index);
                }
            }
        }

        info!(
            "Captured {} of {} pages",
            outcome.captured.len(),
            outcome.expected
        );
        Ok(outcome)
    }
}

#[cfg(feature = "browser")]
pub use live::PageRevealSurface;

#[cfg(feature = "browser")]
mod live {
    use async_trait::async_trait;

    use super::*;
    use crate::browser::PageSession;

    /// [`RevealSurface`] backed by a chapter reader open in a browser tab.
    pub struct PageRevealSurface<'a> {
        page: &'a PageSession,
    }

    impl<'a> PageRevealSurface<'a> {
        pub fn new(page: &'a PageSession) -> Self {
            Self { page }
        }
    }

    #[async_trait]
    impl RevealSurface for PageRevealSurface<'_> {
        async fn wait_ready(&self) -> Result<()> {
            self.page.wait_for_selector(PROGRESS_BAR).await
        }

        async fn expected_page_count(&self) -> Result<usize> {
            let counter = self.page.query_text(PAGE_COUNTER).await?;
            let items = match counter {
                Some(_) => 0,
                None => self.page.count(PAGE_ITEMS).await?,
            };
            Ok(resolve_page_count(counter.as_deref(), items))
        }

        async fn reveal(&self, index: usize) -> Result<()> {
            self.page.click(&page_item_selector(index)).await?;
            Ok(())
        }

        async fn capture(&self, index: usize) -> Result<Option<String>> {
            self.page.query_outer_html(&page_image_selector(index)).await
        }
    }
}
