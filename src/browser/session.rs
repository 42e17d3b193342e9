//! Lazily created browser shared by every call on one agent.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::{Browser, Page};
use tokio::sync::{OnceCell, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cancel::until_cancelled;
use crate::config::BrowserEngineConfig;
use crate::error::{AgentError, Result};

use super::launch::launch;
use super::page::PageSession;

fn disposed() -> AgentError {
    AgentError::BrowserUnavailable("browser session disposed".to_string())
}

/// A value created on first use and shared afterwards.
///
/// Concurrent first callers wait on the same launch. A failed launch is not
/// remembered, so the next caller tries again. Once closed, nothing is
/// launched any more.
pub(crate) struct LazyShared<T> {
    cell: OnceCell<Arc<T>>,
    closed: AtomicBool,
}

impl<T> LazyShared<T> {
    pub(crate) fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_started(&self) -> bool {
        self.cell.initialized()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Refuse further launches. True only for the first call.
    pub(crate) fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn get(&self) -> Option<&Arc<T>> {
        self.cell.get()
    }

    pub(crate) async fn get_or_launch<F, Fut>(&self, launch: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.is_closed() {
            return Err(disposed());
        }
        let value = self
            .cell
            .get_or_try_init(|| async { launch().await.map(Arc::new) })
            .await?;
        Ok(Arc::clone(value))
    }
}

/// A live browser. Taken out of the lock when the session is disposed.
///
/// Tabs are opened under a read lock so they never wait on each other;
/// releasing the browser needs the write lock.
pub struct SharedBrowser {
    browser: RwLock<Option<Browser>>,
    handler: JoinHandle<()>,
}

impl SharedBrowser {
    async fn open_tab(&self, timeout: Duration) -> Result<Page> {
        let guard = self.browser.read().await;
        let browser = guard.as_ref().ok_or_else(disposed)?;
        match tokio::time::timeout(timeout, browser.new_page("about:blank")).await {
            Ok(page) => Ok(page?),
            Err(_) => Err(AgentError::timeout("new tab", timeout)),
        }
    }

    /// Drop the browser now if no tab is being opened. Dropping the handle
    /// terminates a launched child process.
    fn try_release(&self) -> bool {
        match self.browser.try_write() {
            Ok(mut guard) => {
                if guard.take().is_some() {
                    info!("Browser released");
                }
                self.handler.abort();
                true
            }
            Err(_) => false,
        }
    }

    async fn release(&self) {
        let taken = self.browser.write().await.take();
        if let Some(mut browser) = taken {
            debug!("Closing browser");
            if let Err(e) = browser.close().await {
                error!("Failed to close browser: {}", e);
            }
            if let Err(e) = browser.wait().await {
                error!("Failed waiting for browser exit: {}", e);
            }
            info!("Browser closed");
        }
        self.handler.abort();
    }
}

impl Drop for SharedBrowser {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Owns at most one browser for its whole lifetime.
///
/// The browser is created on the first [`BrowserSession::acquire`];
/// concurrent first callers wait on the same launch. Once disposed the
/// session never launches again.
pub struct BrowserSession {
    config: BrowserEngineConfig,
    browser: LazyShared<SharedBrowser>,
}

impl BrowserSession {
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self {
            config,
            browser: LazyShared::new(),
        }
    }

    pub fn config(&self) -> &BrowserEngineConfig {
        &self.config
    }

    /// True once a browser has been launched or connected.
    pub fn is_started(&self) -> bool {
        self.browser.is_started()
    }

    pub fn is_disposed(&self) -> bool {
        self.browser.is_closed()
    }

    /// The shared browser, launching it on first use.
    pub async fn acquire(&self) -> Result<Arc<SharedBrowser>> {
        let shared = self
            .browser
            .get_or_launch(|| async {
                let launched = launch(&self.config).await?;
                Ok::<_, AgentError>(SharedBrowser {
                    browser: RwLock::new(Some(launched.browser)),
                    handler: launched.handler,
                })
            })
            .await?;

        // disposed while the launch was in flight
        if self.is_disposed() {
            shared.try_release();
            return Err(disposed());
        }
        Ok(shared)
    }

    /// Open a blank tab bound to `cancel`.
    pub async fn new_page(&self, cancel: &CancellationToken) -> Result<PageSession> {
        let shared = until_cancelled(cancel, self.acquire()).await?;
        let timeout = self.config.timeout_duration();

        let page = until_cancelled(cancel, shared.open_tab(timeout)).await?;

        // a sync dispose that found a tab opening leaves the release to us
        if self.is_disposed() {
            if let Err(e) = page.close().await {
                debug!("Page close failed: {}", e);
            }
            shared.try_release();
            return Err(disposed());
        }

        Ok(PageSession::new(page, timeout, cancel.clone()))
    }

    /// Release the browser without waiting for it to exit.
    ///
    /// If a tab is being opened at that moment, the call opening it
    /// releases the browser once it finishes. Idempotent.
    pub fn dispose(&self) {
        if !self.browser.close() {
            return;
        }
        let Some(shared) = self.browser.get() else {
            return;
        };
        if !shared.try_release() {
            warn!("Browser busy opening a tab during dispose; it is released when that finishes");
        }
    }

    /// Close the browser and wait for the process to exit. Failures are
    /// logged. Idempotent.
    pub async fn dispose_async(&self) {
        self.browser.close();
        if let Some(shared) = self.browser.get() {
            shared.release().await;
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.dispose();
    }
}
