//! Catalog operations over an abstract document source.
//!
//! [`Catalog`] owns the request flow (token, URL, extraction, paging) while a
//! [`DocumentSource`] supplies the rendered HTML. The agent backs the source
//! with a browser; tests back it with canned pages.

use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cancel::ensure_active;
use crate::error::{AgentError, Result};
use crate::extract::{parse_chapters, parse_search_results, parse_series_detail};
use crate::models::{
    Chapter, PagedResult, PaginationOptions, SeriesDetail, SeriesRef, SeriesSummary,
};
use crate::utils::SiteUrl;

/// Supplies search tokens and rendered documents.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// A fresh search verification token.
    async fn search_token(&self, cancel: &CancellationToken) -> Result<String>;

    /// HTML of `url` after it finished loading.
    async fn document(&self, url: &str, cancel: &CancellationToken) -> Result<String>;
}

/// A tab-like resource that must be released once a request is done.
#[async_trait]
pub trait ScopedPage: Clone + Send + Sync {
    async fn release(&self);
}

/// Run `work` on `page` and release the page afterwards, whether `work`
/// succeeded, failed or was cancelled through its token.
pub async fn scoped<P, T, F, Fut>(page: P, work: F) -> Result<T>
where
    P: ScopedPage,
    F: FnOnce(P) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let result = work(page.clone()).await;
    page.release().await;
    if let Err(ref e) = result {
        debug!("Page work failed: {}", e);
    }
    result
}

/// Request flow for search, series detail and chapter listing.
#[derive(Debug, Clone)]
pub struct Catalog {
    site: SiteUrl,
    language: String,
}

impl Catalog {
    pub fn new(site: SiteUrl, language: impl Into<String>) -> Self {
        Self {
            site,
            language: language.into(),
        }
    }

    pub fn site(&self) -> &SiteUrl {
        &self.site
    }

    /// One page of search results.
    ///
    /// The continuation token is a 1-based page number; the result always
    /// points at the next page, so callers stop on an empty page. A token
    /// failure fails the search.
    pub async fn search(
        &self,
        source: &dyn DocumentSource,
        query: &str,
        pagination: &PaginationOptions,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<SeriesSummary>> {
        ensure_active(cancel)?;
        let page_number = pagination.page_number();

        let token = source.search_token(cancel).await?;
        let url = self
            .site
            .search(query, &token, &self.language, page_number);
        let html = source.document(&url, cancel).await?;
        let results = parse_search_results(&html, &self.site);
        info!(
            "Search '{}' page {}: {} results",
            query,
            page_number,
            results.len()
        );

        Ok(PagedResult::continued(results, page_number))
    }

    pub async fn series(
        &self,
        source: &dyn DocumentSource,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<SeriesDetail> {
        let id = require_id(id)?;
        let html = source.document(&self.site.series(id), cancel).await?;
        Ok(parse_series_detail(&html, id, &self.site))
    }

    /// Every chapter of `series` in the configured language, as one page.
    pub async fn chapters(
        &self,
        source: &dyn DocumentSource,
        series: &SeriesRef,
        cancel: &CancellationToken,
    ) -> Result<PagedResult<Chapter>> {
        let id = require_id(&series.id)?;
        let html = source.document(&self.site.series(id), cancel).await?;
        let chapters = parse_chapters(&html, series, &self.language, &self.site);
        info!("Found {} chapters for {}", chapters.len(), id);
        Ok(PagedResult::complete(chapters))
    }
}

fn require_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        Err(AgentError::InvalidUrl("empty series id".to_string()))
    } else {
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::cancel::until_cancelled;
    use crate::models::Pagination;

    const RESULTS_HTML: &str = r#"
        <div class="unit item-1"><div class="info"><a href="/manga/abc123">Example</a></div></div>
        <div class="unit item-2"><div class="info"><a href="/manga/def456">Other</a></div></div>
    "#;

    /// Serves a fixed document and records every URL it was asked for.
    struct CannedSource {
        token: std::result::Result<&'static str, &'static str>,
        html: &'static str,
        requested: Mutex<Vec<String>>,
    }

    impl CannedSource {
        fn new(token: std::result::Result<&'static str, &'static str>, html: &'static str) -> Self {
            Self {
                token,
                html,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DocumentSource for CannedSource {
        async fn search_token(&self, _cancel: &CancellationToken) -> Result<String> {
            self.token
                .map(str::to_string)
                .map_err(|reason| AgentError::TokenUnavailable(reason.to_string()))
        }

        async fn document(&self, url: &str, _cancel: &CancellationToken) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(self.html.to_string())
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(SiteUrl::default(), "en")
    }

    #[tokio::test]
    async fn test_search_advances_continuation_token() {
        let source = CannedSource::new(Ok("tok"), RESULTS_HTML);
        let result = catalog()
            .search(
                &source,
                "one piece",
                &PaginationOptions::with_token("2"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.continuation_token(), Some("3"));
        assert_eq!(
            *source.requested.lock().unwrap(),
            vec![
                "https://mangafire.to/filter?keyword=one+piece&vrf=tok&language%5B%5D=en&page=2"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_search_without_token_starts_at_page_one() {
        let source = CannedSource::new(Ok("tok"), "<html></html>");
        let result = catalog()
            .search(&source, "x", &PaginationOptions::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(result.continuation_token(), Some("2"));
    }

    #[tokio::test]
    async fn test_token_failure_fails_search() {
        let source = CannedSource::new(Err("input[name='vrf'] not found"), RESULTS_HTML);
        let result = catalog()
            .search(&source, "x", &PaginationOptions::default(), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(AgentError::TokenUnavailable(_))));
        // the listing is never requested
        assert!(source.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chapters_are_one_complete_page() {
        let source = CannedSource::new(Ok("tok"), "<html></html>");
        let result = catalog()
            .chapters(&source, &SeriesRef::new("abc123"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            result.pagination,
            Pagination::Counts {
                total: 0,
                page_size: 0,
                returned: 0
            }
        );
        assert_eq!(
            *source.requested.lock().unwrap(),
            vec!["https://mangafire.to/manga/abc123".to_string()]
        );
    }

    #[tokio::test]
    async fn test_blank_series_id_is_rejected() {
        let source = CannedSource::new(Ok("tok"), "<html></html>");
        let result = catalog()
            .series(&source, "  ", &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(AgentError::InvalidUrl(_))));
        assert!(source.requested.lock().unwrap().is_empty());
    }

    #[derive(Clone, Default)]
    struct TrackedPage {
        released: Arc<AtomicBool>,
        releases: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ScopedPage for TrackedPage {
        async fn release(&self) {
            self.released.store(true, Ordering::SeqCst);
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_scoped_releases_after_success() {
        let page = TrackedPage::default();
        let value = scoped(page.clone(), |_| async { Ok(5) }).await.unwrap();
        assert_eq!(value, 5);
        assert_eq!(page.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scoped_releases_after_error() {
        let page = TrackedPage::default();
        let result: Result<()> = scoped(page.clone(), |_| async {
            Err(AgentError::timeout("#progress-bar", Duration::from_secs(30)))
        })
        .await;

        assert!(matches!(result, Err(AgentError::Timeout { .. })));
        assert!(page.released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_scoped_releases_after_cancellation() {
        let page = TrackedPage::default();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result: Result<()> = scoped(page.clone(), |_| async {
            until_cancelled(&cancel, std::future::pending()).await
        })
        .await;

        assert!(matches!(result, Err(AgentError::Cancelled)));
        assert_eq!(page.releases.load(Ordering::SeqCst), 1);
    }
}
