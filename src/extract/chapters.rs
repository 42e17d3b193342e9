//! Chapter list on a series detail page.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;

use super::parse::{attr, child_elements, decimal_or_zero, selector, text_of, volume_label_number};
use crate::models::{Chapter, SeriesRef};
use crate::utils::{decode_entities, last_segment, rewrite_language, SiteUrl};

static ACTIVE_LANGUAGE: LazyLock<Selector> = LazyLock::new(|| {
    selector("div.tab-content[data-name='chapter'] div.dropdown-menu > a.active")
});
static CHAPTER_ITEMS: LazyLock<Selector> = LazyLock::new(|| {
    selector("div.tab-content[data-name='chapter'] ul.scroll-sm > li.item")
});

/// Every chapter listed for `series`, in page order.
///
/// Chapter links are rewritten from the site's active language to
/// `language`. Items without a resolvable id are skipped.
pub fn parse_chapters(html: &str, series: &SeriesRef, language: &str, site: &SiteUrl) -> Vec<Chapter> {
    let document = Html::parse_document(html);

    let active_language = document
        .select(&ACTIVE_LANGUAGE)
        .next()
        .and_then(|a| attr(a, "data-code"))
        .unwrap_or_default();

    let mut chapters = Vec::new();
    for item in document.select(&CHAPTER_ITEMS) {
        let Some(link) = child_elements(item, "a").next() else {
            continue;
        };

        let href = attr(link, "href").unwrap_or_default();
        let uri = site.normalize(&rewrite_language(href, active_language, language));
        let Some(id) = last_segment(&uri) else {
            debug!("Skipping chapter without id (href: {:?})", href);
            continue;
        };

        let chapter_number = attr(item, "data-number")
            .map(decimal_or_zero)
            .unwrap_or(0.0);
        let volume_number = attr(link, "title")
            .and_then(volume_label_number)
            .unwrap_or(0.0);
        let title = child_elements(link, "span")
            .next()
            .map(|span| decode_entities(&text_of(span)))
            .filter(|t| !t.is_empty());

        chapters.push(Chapter {
            id,
            title,
            series: series.clone(),
            volume_number,
            chapter_number,
            uri,
        });
    }

    chapters
}
