//! Reveal loop driven against a scripted reader, feeding the page extractor.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use mangafire_agent::extract::parse_pages;
use mangafire_agent::models::ChapterRef;
use mangafire_agent::reveal::{
    resolve_page_count, RevealController, RevealSurface, PROGRESS_BAR,
};
use mangafire_agent::utils::SiteUrl;
use mangafire_agent::{AgentError, Result};

/// A reader whose images only exist after their index was selected, and
/// which can lose some of them entirely.
struct ScriptedReader {
    /// Whether `#progress-bar` ever shows up.
    ready: bool,
    counter: Option<&'static str>,
    items: usize,
    lost: Vec<usize>,
    selected: Mutex<Vec<usize>>,
}

impl ScriptedReader {
    fn new(counter: Option<&'static str>, items: usize) -> Self {
        Self {
            ready: true,
            counter,
            items,
            lost: Vec::new(),
            selected: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RevealSurface for ScriptedReader {
    async fn wait_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(AgentError::timeout(PROGRESS_BAR, Duration::from_secs(30)))
        }
    }

    async fn expected_page_count(&self) -> Result<usize> {
        Ok(resolve_page_count(self.counter, self.items))
    }

    async fn reveal(&self, index: usize) -> Result<()> {
        self.selected.lock().unwrap().push(index);
        Ok(())
    }

    async fn capture(&self, index: usize) -> Result<Option<String>> {
        let selected = self.selected.lock().unwrap().contains(&index);
        if !selected || self.lost.contains(&index) {
            return Ok(None);
        }
        Ok(Some(format!(
            r#"<img data-number="{0}" src="/cdn/ch1/{0}.webp">"#,
            index
        )))
    }
}

fn chapter() -> ChapterRef {
    ChapterRef {
        id: "chapter-1".into(),
        uri: "https://mangafire.to/read/abc123/en/chapter-1".into(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_pages_come_back_in_reveal_order() {
    let reader = ScriptedReader::new(Some("3"), 0);
    let controller = RevealController::new(Duration::from_secs(2));

    let outcome = controller
        .collect(&reader, &CancellationToken::new())
        .await
        .unwrap();
    let pages = parse_pages(&outcome.captured, &chapter(), &SiteUrl::default());

    let numbers: Vec<f64> = pages.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1.0, 2.0, 3.0]);
    assert_eq!(pages[2].image_url, "https://mangafire.to/cdn/ch1/3.webp");
    assert!(outcome.missing.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_count_falls_back_to_indicator_items() {
    let reader = ScriptedReader::new(None, 2);
    let outcome = RevealController::new(Duration::from_millis(10))
        .collect(&reader, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.expected, 2);
    assert_eq!(outcome.captured.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_non_numeric_counter_means_no_pages() {
    let reader = ScriptedReader::new(Some("?"), 5);
    let outcome = RevealController::new(Duration::from_secs(5))
        .collect(&reader, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.expected, 0);
    assert!(reader.selected.lock().unwrap().is_empty());
    assert!(parse_pages(&outcome.captured, &chapter(), &SiteUrl::default()).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_lost_page_leaves_a_gap() {
    let mut reader = ScriptedReader::new(Some("5"), 0);
    reader.lost = vec![2, 4];

    let outcome = RevealController::new(Duration::from_millis(500))
        .collect(&reader, &CancellationToken::new())
        .await
        .unwrap();
    let pages = parse_pages(&outcome.captured, &chapter(), &SiteUrl::default());

    assert_eq!(outcome.missing, vec![2, 4]);
    let ids: Vec<&str> = pages.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["page-1", "page-3", "page-5"]);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let reader = ScriptedReader::new(Some("3"), 0);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = RevealController::new(Duration::from_secs(1))
        .collect(&reader, &cancel)
        .await;
    assert!(matches!(result, Err(AgentError::Cancelled)));
    assert!(reader.selected.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_page_without_reader_is_an_error() {
    let mut reader = ScriptedReader::new(Some("4"), 0);
    reader.ready = false;

    let result = RevealController::new(Duration::from_secs(1))
        .collect(&reader, &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(AgentError::Timeout { .. })));
    assert!(reader.selected.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reader_without_counter_or_items_is_empty() {
    let reader = ScriptedReader::new(None, 0);
    let outcome = RevealController::new(Duration::from_secs(1))
        .collect(&reader, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.expected, 0);
    assert!(outcome.captured.is_empty());
}
