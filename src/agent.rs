//! Host-facing catalog operations.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::browser::{BrowserSession, ConsoleSink, EvasionProfile, PageSession, TracingConsoleSink};
use crate::cancel::ensure_active;
use crate::catalog::{scoped, Catalog, DocumentSource};
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::extract::parse_pages;
use crate::models::{
    Chapter, Page, PagedResult, PaginationOptions, SeriesDetail, SeriesRef, SeriesSummary,
};
use crate::reveal::{PageRevealSurface, RevealController};
use crate::token::read_token;
use crate::utils::SiteUrl;

pub const FAVICON_URL: &str = "https://s.mfcdn.cc/assets/sites/mangafire/favicon.png";

/// Crawler agent for mangafire.to.
///
/// Holds one lazily launched browser for its whole lifetime. Every call
/// opens its own tab and closes it before returning.
pub struct MangaFireAgent {
    config: AgentConfig,
    catalog: Catalog,
    session: BrowserSession,
    profile: EvasionProfile,
    console: Arc<dyn ConsoleSink>,
}

impl MangaFireAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            catalog: Catalog::new(SiteUrl::default(), config.language.clone()),
            session: BrowserSession::new(config.browser.clone()),
            profile: EvasionProfile::from_config(&config),
            console: Arc::new(TracingConsoleSink),
            config,
        }
    }

    /// Build from the host's option bag.
    pub fn from_options(options: &HashMap<String, serde_json::Value>) -> Self {
        Self::new(AgentConfig::from_options(options))
    }

    /// Send page console output somewhere other than `tracing`.
    pub fn with_console_sink(mut self, sink: Arc<dyn ConsoleSink>) -> Self {
        self.console = sink;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn get_favicon(&self) -> &'static str {
        FAVICON_URL
    }

    /// One page of search results.
    ///
    /// The continuation token is a 1-based page number; the result always
    /// points at the next page, so callers stop on an empty page.
    pub async fn search(
        &self,
        query: &str,
        pagination: &PaginationOptions,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<SeriesSummary>> {
        self.catalog.search(self, query, pagination, cancel).await
    }

    pub async fn get_by_id(&self, id: &str, cancel: &CancellationToken) -> Result<SeriesDetail> {
        self.catalog.series(self, id, cancel).await
    }

    /// Every chapter of `series` in the configured language, as one page.
    pub async fn get_chapters(
        &self,
        series: &SeriesRef,
        _pagination: &PaginationOptions,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<Chapter>> {
        self.catalog.chapters(self, series, cancel).await
    }

    /// Page images of `chapter` in reading order. A URL that does not open
    /// a chapter reader fails with [`AgentError::Timeout`].
    pub async fn get_chapter_pages(
        &self,
        chapter: &Chapter,
        cancel: &CancellationToken,
    ) -> Result<Vec<Page>> {
        if chapter.uri.trim().is_empty() {
            return Err(AgentError::InvalidUrl(format!(
                "chapter {} has no URL",
                chapter.id
            )));
        }

        let controller = RevealController::new(self.config.page_delay());
        let outcome = self
            .with_page(cancel, |page| async move {
                page.goto(&chapter.uri).await?;
                controller
                    .collect(&PageRevealSurface::new(&page), page.cancel_token())
                    .await
            })
            .await?;

        let pages = parse_pages(&outcome.captured, &chapter.to_ref(), self.catalog.site());
        info!("Number of pages found: {}", pages.len());
        Ok(pages)
    }

    /// Run `work` on a fresh, prepared tab and close the tab afterwards
    /// whatever the outcome.
    async fn with_page<T, F, Fut>(&self, cancel: &CancellationToken, work: F) -> Result<T>
    where
        F: FnOnce(PageSession) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        ensure_active(cancel)?;
        let page = self.session.new_page(cancel).await?;
        scoped(page, |page| async move {
            self.prepare(&page).await?;
            work(page).await
        })
        .await
    }

    async fn prepare(&self, page: &PageSession) -> Result<()> {
        page.capture_console(Arc::clone(&self.console)).await?;
        self.profile.apply(page).await;
        Ok(())
    }

    /// Release the browser without waiting. Safe to call repeatedly.
    pub fn dispose(&self) {
        self.session.dispose();
    }

    /// Close the browser and wait for it to exit. Never fails.
    pub async fn dispose_async(&self) {
        self.session.dispose_async().await;
    }
}

#[async_trait]
impl DocumentSource for MangaFireAgent {
    async fn search_token(&self, cancel: &CancellationToken) -> Result<String> {
        let site = self.catalog.site();
        self.with_page(cancel, |page| async move { read_token(&page, site).await })
            .await
    }

    /// Load `url` on a prepared tab and return the document HTML.
    async fn document(&self, url: &str, cancel: &CancellationToken) -> Result<String> {
        self.with_page(cancel, |page| async move {
            page.goto(url).await?;
            page.content().await
        })
        .await
    }
}
