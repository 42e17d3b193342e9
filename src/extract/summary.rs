//! Search listing cards.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::parse::{
    attr, chapter_label_number, max_label_number, non_empty_text, selector, text_of,
    volume_label_number,
};
use crate::models::SeriesSummary;
use crate::utils::{file_name, last_segment, SiteUrl};

/// Shown when a card carries no synopsis, which listing cards never do.
pub const NO_DESCRIPTION: &str = "No Description Available";

static CARD: LazyLock<Selector> = LazyLock::new(|| selector("div.unit[class*='item-']"));
static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| selector("div.info > a"));
static COVER: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static TYPE_LABEL: LazyLock<Selector> = LazyLock::new(|| selector("span.type"));
static CHAPTER_LINKS: LazyLock<Selector> =
    LazyLock::new(|| selector("ul.content[data-name='chap'] > li > a"));
static VOLUME_LINKS: LazyLock<Selector> =
    LazyLock::new(|| selector("ul.content[data-name='vol'] > li > a"));

/// Every summary card on a search results page, in document order.
pub fn parse_search_results(html: &str, site: &SiteUrl) -> Vec<SeriesSummary> {
    let document = Html::parse_document(html);
    document
        .select(&CARD)
        .map(|card| parse_summary_card(card, site))
        .collect()
}

/// Map one listing card.
pub fn parse_summary_card(card: ElementRef<'_>, site: &SiteUrl) -> SeriesSummary {
    let title_link = card.select(&TITLE_LINK).next();
    let title = title_link.and_then(non_empty_text);
    let website_url = title_link
        .and_then(|a| attr(a, "href"))
        .map(|href| site.normalize(href))
        .unwrap_or_default();
    let id = last_segment(&website_url);

    let cover_url = card
        .select(&COVER)
        .next()
        .and_then(|img| attr(img, "src"))
        .map(|src| site.normalize(src))
        .filter(|u| !u.is_empty());
    let cover_file_name = cover_url.as_deref().and_then(file_name);

    let tags = card
        .select(&TYPE_LABEL)
        .next()
        .and_then(non_empty_text)
        .into_iter()
        .collect();

    let mut links = BTreeMap::new();
    let chapter_labels = collect_links(card, &CHAPTER_LINKS, site, &mut links);
    let volume_labels = collect_links(card, &VOLUME_LINKS, site, &mut links);

    SeriesSummary {
        id,
        title,
        description: NO_DESCRIPTION.to_string(),
        cover_url,
        cover_file_name,
        website_url,
        tags,
        links,
        latest_chapter_number: max_label_number(&chapter_labels, chapter_label_number),
        latest_volume_number: max_label_number(&volume_labels, volume_label_number),
    }
}

/// Record label -> URL pairs and return the labels seen.
fn collect_links(
    card: ElementRef<'_>,
    links_selector: &Selector,
    site: &SiteUrl,
    links: &mut BTreeMap<String, String>,
) -> Vec<String> {
    card.select(links_selector)
        .map(|a| {
            let label = text_of(a);
            let href = site.normalize(attr(a, "href").unwrap_or_default());
            links.insert(label.clone(), href);
            label
        })
        .collect()
}
