//! Page images captured during the reveal loop.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;

use super::parse::{attr, parse_decimal, selector};
use crate::models::{ChapterRef, Page};
use crate::utils::SiteUrl;

static IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img"));

/// Map captured `<img>` markup to pages, keeping the order given.
///
/// Images without a numeric `data-number` or a `src` are skipped.
pub fn parse_pages<S: AsRef<str>>(fragments: &[S], chapter: &ChapterRef, site: &SiteUrl) -> Vec<Page> {
    let mut pages = Vec::new();

    for fragment in fragments {
        let fragment = Html::parse_fragment(fragment.as_ref());
        for img in fragment.select(&IMAGE) {
            let Some(page_number) = attr(img, "data-number").and_then(parse_decimal) else {
                debug!("Skipping image without page number");
                continue;
            };

            let image_url = site.normalize(attr(img, "src").unwrap_or_default());
            if image_url.is_empty() {
                debug!("Skipping page {} without image source", page_number);
                continue;
            }

            pages.push(Page::new(chapter.clone(), page_number, image_url));
        }
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter() -> ChapterRef {
        ChapterRef {
            id: "chapter-7".into(),
            uri: "https://mangafire.to/read/abc123/en/chapter-7".into(),
        }
    }

    #[test]
    fn test_parse_pages_keeps_given_order() {
        let fragments = vec![
            r#"<img data-number="2" src="https://cdn.example/2.jpg">"#.to_string(),
            r#"<img data-number="1" src="/static/1.jpg">"#.to_string(),
        ];
        let pages = parse_pages(&fragments, &chapter(), &SiteUrl::default());
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].id, "page-2");
        assert_eq!(pages[0].image_url, "https://cdn.example/2.jpg");
        assert_eq!(pages[1].page_number, 1.0);
        assert_eq!(pages[1].image_url, "https://mangafire.to/static/1.jpg");
        assert_eq!(pages[1].chapter_id, "chapter-7");
    }

    #[test]
    fn test_parse_pages_skips_unidentified() {
        let fragments = [
            r#"<img src="https://cdn.example/x.jpg">"#,
            r#"<img data-number="abc" src="https://cdn.example/y.jpg">"#,
            r#"<img data-number="3" src="">"#,
            r#"<img data-number="4" src="https://cdn.example/4.jpg">"#,
        ];
        let pages = parse_pages(&fragments, &chapter(), &SiteUrl::default());
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, "page-4");
    }
}
