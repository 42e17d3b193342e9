//! Typed interaction primitives over one browser tab.
//!
//! All in-page scripting goes through the small set of operations here.
//! Each one is bounded by the session timeout and races the caller's
//! cancellation token.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
    FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, ResourceType, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cancel::{pause, until_cancelled};
use crate::catalog::ScopedPage;
use crate::error::{AgentError, Result};

use super::evasion::js_string;
use super::intercept::{ConsoleEntry, ConsoleSink, InterceptedRequest, RequestPolicy};

/// Interval between DOM polls while waiting on a condition.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of a single-element lookup in the page.
#[derive(Debug, Deserialize)]
struct Probe {
    found: bool,
    value: Option<String>,
}

/// Build a script that looks up `selector` and evaluates `accessor`
/// against the element bound to `el`.
fn probe_script(selector: &str, accessor: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); \
         if (!el) return {{ found: false, value: null }}; \
         const v = {}; \
         return {{ found: true, value: v == null ? null : String(v) }}; }})()",
        js_string(selector),
        accessor
    )
}

fn count_script(selector: &str) -> String {
    format!(
        "(() => ({{ count: document.querySelectorAll({}).length }}))()",
        js_string(selector)
    )
}

fn click_script(selector: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); \
         if (!el) return {{ clicked: false }}; \
         el.click(); return {{ clicked: true }}; }})()",
        js_string(selector)
    )
}

const READY_STATE_SCRIPT: &str = "(() => ({ state: document.readyState }))()";

/// One open tab plus the background listeners attached to it.
///
/// Cloning shares the tab; [`PageSession::close`] tears it down for all
/// clones.
#[derive(Clone)]
pub struct PageSession {
    page: Page,
    timeout: Duration,
    cancel: CancellationToken,
    listeners: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl PageSession {
    pub fn new(page: Page, timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            page,
            timeout,
            cancel,
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Bound a CDP call by the session timeout and the cancel token.
    async fn run<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, CdpError>>,
    {
        let timeout = self.timeout;
        until_cancelled(&self.cancel, async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result.map_err(AgentError::from),
                Err(_) => Err(AgentError::timeout(what, timeout)),
            }
        })
        .await
    }

    async fn eval<T: DeserializeOwned>(&self, what: &str, script: String) -> Result<T> {
        let result = self.run(what, self.page.evaluate(script)).await?;
        result
            .into_value::<T>()
            .map_err(|e| AgentError::Script(format!("{}: {}", what, e)))
    }

    fn track(&self, task: JoinHandle<()>) {
        match self.listeners.lock() {
            Ok(mut listeners) => listeners.push(task),
            Err(poisoned) => poisoned.into_inner().push(task),
        }
    }

    /// Install a script that runs in every new document before site code.
    pub async fn install_pre_navigation_script(&self, source: &str) -> Result<()> {
        self.run(
            "pre-navigation script",
            self.page
                .execute(AddScriptToEvaluateOnNewDocumentParams::new(source)),
        )
        .await?;
        Ok(())
    }

    pub async fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        self.run(
            "user agent override",
            self.page
                .execute(SetUserAgentOverrideParams::new(user_agent)),
        )
        .await?;
        Ok(())
    }

    pub async fn emulate_timezone(&self, timezone: &str) -> Result<()> {
        self.run(
            "timezone override",
            self.page.execute(SetTimezoneOverrideParams::new(timezone)),
        )
        .await?;
        Ok(())
    }

    /// Navigate and wait for the document to finish loading.
    pub async fn goto(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        match self.run("navigation", self.page.goto(url)).await {
            Ok(_) => {}
            Err(AgentError::Browser(e)) => return Err(AgentError::navigation(url, e)),
            Err(e) => return Err(e),
        }
        self.wait_for_load().await
    }

    /// Poll `document.readyState` until it reports `complete`.
    pub async fn wait_for_load(&self) -> Result<()> {
        #[derive(Deserialize)]
        struct ReadyState {
            state: String,
        }

        let deadline = tokio::time::Instant::now() + self.timeout;
        loop {
            let ready: ReadyState = self
                .eval("document ready state", READY_STATE_SCRIPT.to_string())
                .await?;
            if ready.state == "complete" {
                debug!("Page ready state: complete");
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(AgentError::timeout("page load", self.timeout));
            }
            pause(&self.cancel, POLL_INTERVAL).await?;
        }
    }

    /// Wait until at least one element matches `selector`.
    pub async fn wait_for_selector(&self, selector: &str) -> Result<()> {
        debug!("Waiting for selector: {}", selector);
        let deadline = tokio::time::Instant::now() + self.timeout;
        loop {
            if self.count(selector).await? > 0 {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(AgentError::timeout(selector, self.timeout));
            }
            pause(&self.cancel, POLL_INTERVAL).await?;
        }
    }

    async fn probe(&self, selector: &str, accessor: &str) -> Result<Option<String>> {
        let probe: Probe = self.eval(selector, probe_script(selector, accessor)).await?;
        Ok(if probe.found { probe.value } else { None })
    }

    /// Attribute of the first match, `None` when absent.
    pub async fn query_attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        self.probe(selector, &format!("el.getAttribute({})", js_string(name)))
            .await
    }

    /// Current `value` property of the first matching form control.
    pub async fn query_value(&self, selector: &str) -> Result<Option<String>> {
        self.probe(selector, "el.value").await
    }

    pub async fn query_outer_html(&self, selector: &str) -> Result<Option<String>> {
        self.probe(selector, "el.outerHTML").await
    }

    pub async fn query_text(&self, selector: &str) -> Result<Option<String>> {
        self.probe(selector, "el.textContent").await
    }

    pub async fn count(&self, selector: &str) -> Result<usize> {
        #[derive(Deserialize)]
        struct Count {
            count: usize,
        }

        let count: Count = self.eval(selector, count_script(selector)).await?;
        Ok(count.count)
    }

    /// Click the first match. Returns false when nothing matched.
    pub async fn click(&self, selector: &str) -> Result<bool> {
        #[derive(Deserialize)]
        struct Clicked {
            clicked: bool,
        }

        let clicked: Clicked = self.eval(selector, click_script(selector)).await?;
        Ok(clicked.clicked)
    }

    pub async fn focus(&self, selector: &str) -> Result<()> {
        let element = self.run(selector, self.page.find_element(selector)).await?;
        self.run(selector, element.focus()).await?;
        Ok(())
    }

    /// Type `text` into the first match as key events.
    pub async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        let element = self.run(selector, self.page.find_element(selector)).await?;
        self.run(selector, element.type_str(text)).await?;
        Ok(())
    }

    /// Serialized HTML of the current document.
    pub async fn content(&self) -> Result<String> {
        self.run("page content", self.page.content()).await
    }

    /// Route every request through `policy`, aborting the ones it rejects.
    pub async fn intercept_requests(&self, policy: Arc<dyn RequestPolicy>) -> Result<()> {
        let mut events = self
            .run(
                "request interception",
                self.page.event_listener::<EventRequestPaused>(),
            )
            .await?;
        let page = self.page.clone();

        self.track(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let request = InterceptedRequest {
                    url: &event.request.url,
                    is_document: event.resource_type == ResourceType::Document,
                };
                let outcome = if policy.should_allow(&request) {
                    page.execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ())
                } else {
                    debug!("Aborting navigation to {}", event.request.url);
                    page.execute(FailRequestParams::new(
                        event.request_id.clone(),
                        ErrorReason::Aborted,
                    ))
                    .await
                    .map(|_| ())
                };
                if let Err(e) = outcome {
                    debug!("Paused request not resolved: {}", e);
                }
            }
        }));

        self.run(
            "request interception",
            self.page.execute(FetchEnableParams::default()),
        )
        .await?;
        Ok(())
    }

    /// Forward console API calls to `sink`.
    pub async fn capture_console(&self, sink: Arc<dyn ConsoleSink>) -> Result<()> {
        let mut events = self
            .run(
                "console capture",
                self.page.event_listener::<EventConsoleApiCalled>(),
            )
            .await?;

        self.track(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let text = event
                    .args
                    .iter()
                    .filter_map(|arg| match &arg.value {
                        Some(serde_json::Value::String(s)) => Some(s.clone()),
                        Some(other) => Some(other.to_string()),
                        None => arg.description.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                let entry = ConsoleEntry {
                    level: format!("{:?}", event.r#type).to_lowercase(),
                    text,
                };
                sink.on_console_message(&entry);
            }
        }));
        Ok(())
    }

    /// Stop listeners and close the tab. Errors are logged, not returned.
    pub async fn close(&self) {
        let listeners = match self.listeners.lock() {
            Ok(mut listeners) => std::mem::take(&mut *listeners),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for listener in listeners {
            listener.abort();
        }

        if let Err(e) = self.page.clone().close().await {
            debug!("Page close failed: {}", e);
        }
    }
}

#[async_trait]
impl ScopedPage for PageSession {
    async fn release(&self) {
        self.close().await;
    }
}
