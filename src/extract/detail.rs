//! Series detail page.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::parse::{
    attr, child_elements, decimal_or_zero, first_year, non_empty_text, selector, text_of,
};
use crate::models::{is_family_safe, ReleaseStatus, SeriesDetail};
use crate::utils::{decode_entities, file_name, SiteUrl};

static ROOT: LazyLock<Selector> = LazyLock::new(|| selector("#manga-page"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h1[itemprop='name']"));
static ALT_TITLES: LazyLock<Selector> = LazyLock::new(|| selector("h6"));
static COVER: LazyLock<Selector> =
    LazyLock::new(|| selector("aside.content div.poster img"));
static BACKGROUND: LazyLock<Selector> = LazyLock::new(|| selector("div.detail-bg > img"));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| selector("div.description"));
static SHARE_WIDGET: LazyLock<Selector> =
    LazyLock::new(|| selector("div.sharethis-inline-share-buttons"));
static STATUS: LazyLock<Selector> = LazyLock::new(|| selector("aside.content p"));
static META_SPANS: LazyLock<Selector> = LazyLock::new(|| selector("div.meta span"));
static META_ROWS: LazyLock<Selector> = LazyLock::new(|| selector("div.meta div"));
static GENRES: LazyLock<Selector> = LazyLock::new(|| selector("div.meta a[href*='/genre/']"));
static RATING: LazyLock<Selector> = LazyLock::new(|| selector("span.live-score"));

const PUBLISHED_LABEL: &str = "Published:";

/// Map a detail page. The id is the one the caller navigated with.
///
/// Lookups are scoped to `#manga-page` when present, the whole document
/// otherwise.
pub fn parse_series_detail(html: &str, id: &str, site: &SiteUrl) -> SeriesDetail {
    let document = Html::parse_document(html);
    let root = document
        .select(&ROOT)
        .next()
        .unwrap_or_else(|| document.root_element());

    let title = first(root, &TITLE).and_then(non_empty_text);
    let alternative_titles = first(root, &ALT_TITLES)
        .map(|h6| split_alternative_titles(&text_of(h6)))
        .unwrap_or_default();

    let cover_url = first(root, &COVER)
        .and_then(|img| attr(img, "src"))
        .map(|src| site.normalize(src))
        .filter(|u| !u.is_empty());
    let cover_file_name = cover_url.as_deref().and_then(file_name);
    let background_url = first(root, &BACKGROUND)
        .and_then(|img| attr(img, "src"))
        .map(|src| site.normalize(src))
        .filter(|u| !u.is_empty());

    let description = first(root, &DESCRIPTION)
        .map(|d| decode_entities(&text_of(d)))
        .filter(|d| !d.is_empty());

    let website_url = first(root, &SHARE_WIDGET)
        .and_then(|w| attr(w, "data-url"))
        .map(|u| site.normalize(u))
        .unwrap_or_default();

    let release_status = first(root, &STATUS)
        .map(|p| ReleaseStatus::from_status_text(&text_of(p)))
        .unwrap_or_default();

    let authors = authors(root);
    let genres: Vec<String> = root.select(&GENRES).map(text_of).collect();
    let publication_year = published_text(root).as_deref().and_then(first_year);
    let rating = first(root, &RATING)
        .map(|r| decimal_or_zero(&text_of(r)))
        .unwrap_or(0.0);
    let is_family_safe = is_family_safe(&genres);

    SeriesDetail {
        id: id.to_string(),
        title,
        alternative_titles,
        description,
        authors,
        genres,
        cover_url,
        cover_file_name,
        background_url,
        website_url,
        publication_year,
        rating,
        release_status,
        is_family_safe,
    }
}

/// Split the `;`-delimited alternative title field into Alt1, Alt2, ...
/// dropping empty segments.
pub fn split_alternative_titles(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(i, part)| (format!("Alt{}", i + 1), part.to_string()))
        .collect()
}

fn first<'a>(root: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    root.select(selector).next()
}

/// Links of every meta span holding an `a[itemprop=author]`, in document
/// order. Writer and artist rows are separate spans.
fn authors(root: ElementRef<'_>) -> Vec<String> {
    root.select(&META_SPANS)
        .filter(|span| {
            child_elements(*span, "a").any(|a| attr(a, "itemprop") == Some("author"))
        })
        .flat_map(|span| child_elements(span, "a").map(text_of))
        .collect()
}

/// Second span of the meta row whose first label reads "Published:".
fn published_text(root: ElementRef<'_>) -> Option<String> {
    root.select(&META_ROWS).find_map(|row| {
        let mut spans = child_elements(row, "span");
        let label = spans.next()?;
        if text_of(label) != PUBLISHED_LABEL {
            return None;
        }
        spans.next().map(|value| value.text().collect::<String>())
    })
}
