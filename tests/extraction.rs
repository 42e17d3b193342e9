//! Extractor tests against saved page fixtures.

use mangafire_agent::extract::{
    parse_chapters, parse_pages, parse_search_results, parse_series_detail, NO_DESCRIPTION,
};
use mangafire_agent::models::{ChapterRef, ReleaseStatus, SeriesRef};
use mangafire_agent::utils::SiteUrl;

const SEARCH_HTML: &str = include_str!("fixtures/search.html");
const DETAIL_HTML: &str = include_str!("fixtures/detail.html");
const CHAPTERS_HTML: &str = include_str!("fixtures/chapters.html");

#[test]
fn test_search_page_cards() {
    let results = parse_search_results(SEARCH_HTML, &SiteUrl::default());
    assert_eq!(results.len(), 2);

    let first = &results[0];
    assert_eq!(first.id.as_deref(), Some("abc123"));
    assert_eq!(first.title.as_deref(), Some("Example Series"));
    assert_eq!(first.website_url, "https://mangafire.to/manga/abc123");
    assert_eq!(first.description, NO_DESCRIPTION);
    assert_eq!(
        first.cover_url.as_deref(),
        Some("https://static.mfcdn.nl/i/a/b/cover.jpg")
    );
    assert_eq!(first.cover_file_name.as_deref(), Some("cover.jpg"));
    assert_eq!(first.tags, vec!["Manga".to_string()]);
    // max wins regardless of listing order
    assert_eq!(first.latest_chapter_number, 12.0);
    assert_eq!(first.latest_volume_number, 3.0);
    assert_eq!(first.links.len(), 4);
    assert_eq!(
        first.links.get("Chap 12 EN").map(String::as_str),
        Some("https://mangafire.to/read/abc123/en/chapter-12")
    );

    let second = &results[1];
    assert_eq!(second.id.as_deref(), Some("one-shot.x9"));
    assert_eq!(
        second.cover_url.as_deref(),
        Some("https://mangafire.to/assets/no-cover.png")
    );
    assert_eq!(second.latest_chapter_number, 0.0);
    assert_eq!(second.latest_volume_number, 0.0);
    assert!(second.links.is_empty());
}

#[test]
fn test_search_page_without_cards() {
    let results = parse_search_results("<html><body><p>No results</p></body></html>", &SiteUrl::default());
    assert!(results.is_empty());
}

#[test]
fn test_detail_page() {
    let detail = parse_series_detail(DETAIL_HTML, "abc123", &SiteUrl::default());

    assert_eq!(detail.id, "abc123");
    assert_eq!(detail.title.as_deref(), Some("Example Series"));
    assert_eq!(detail.alternative_title("Alt1"), Some("Alt A"));
    assert_eq!(detail.alternative_title("Alt2"), Some("Alt B"));
    assert_eq!(detail.alternative_titles.len(), 2);
    assert_eq!(
        detail.description.as_deref(),
        Some(r#"A story about "cats" & dogs."#)
    );
    assert_eq!(detail.authors, vec!["Jane Doe", "John Roe"]);
    assert_eq!(detail.genres, vec!["Action", "Comedy"]);
    assert!(detail.is_family_safe);
    assert_eq!(detail.publication_year, Some(2019));
    assert_eq!(detail.rating, 8.71);
    assert_eq!(detail.release_status, ReleaseStatus::Continuing);
    assert_eq!(detail.website_url, "https://mangafire.to/manga/abc123");
    assert_eq!(detail.cover_file_name.as_deref(), Some("cover.jpg"));
    assert_eq!(
        detail.background_url.as_deref(),
        Some("https://static.mfcdn.nl/i/a/b/bg.jpg")
    );
}

#[test]
fn test_detail_page_explicit_genre() {
    let html = DETAIL_HTML.replace(
        r#"<a href="/genre/comedy">Comedy</a>"#,
        r#"<a href="/genre/ecchi">Ecchi</a>"#,
    );
    let detail = parse_series_detail(&html, "abc123", &SiteUrl::default());
    assert!(!detail.is_family_safe);
}

#[test]
fn test_detail_page_empty_document() {
    let detail = parse_series_detail("<html></html>", "zzz", &SiteUrl::default());
    assert_eq!(detail.id, "zzz");
    assert!(detail.title.is_none());
    assert!(detail.alternative_titles.is_empty());
    assert!(detail.authors.is_empty());
    assert_eq!(detail.publication_year, None);
    assert_eq!(detail.rating, 0.0);
    assert!(detail.is_family_safe);
}

#[test]
fn test_chapter_list_with_language_rewrite() {
    let series = SeriesRef::new("abc123");
    let chapters = parse_chapters(CHAPTERS_HTML, &series, "fr", &SiteUrl::default());

    // the item without a link is skipped
    assert_eq!(chapters.len(), 3);

    let first = &chapters[0];
    assert_eq!(first.id, "chapter-12.5");
    assert_eq!(first.uri, "https://mangafire.to/read/abc123/fr/chapter-12.5");
    assert_eq!(first.chapter_number, 12.5);
    assert_eq!(first.volume_number, 3.0);
    assert_eq!(first.title.as_deref(), Some("Chapter 12.5: Tom & Jerry"));
    assert_eq!(first.series, series);

    assert_eq!(chapters[1].volume_number, 0.0);

    let extra = &chapters[2];
    assert_eq!(extra.id, "chapter-extra");
    assert_eq!(extra.chapter_number, 0.0);
    assert_eq!(extra.volume_number, 0.0);
    assert!(extra.title.is_none());
}

#[test]
fn test_chapter_list_same_language() {
    let chapters = parse_chapters(
        CHAPTERS_HTML,
        &SeriesRef::new("abc123"),
        "en",
        &SiteUrl::default(),
    );
    assert_eq!(chapters[1].uri, "https://mangafire.to/read/abc123/en/chapter-12");
}

#[test]
fn test_captured_page_images() {
    let chapter = ChapterRef {
        id: "chapter-12".into(),
        uri: "https://mangafire.to/read/abc123/en/chapter-12".into(),
    };
    let captured = [
        r#"<img data-number="1" src="https://static.mfcdn.nl/p/1.jpg" class="loaded">"#,
        r#"<img data-number="2">"#,
        r#"<img data-number="3" src="/p/3.jpg">"#,
    ];

    let pages = parse_pages(&captured, &chapter, &SiteUrl::default());
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].id, "page-1");
    assert_eq!(pages[0].page_number, 1.0);
    assert_eq!(pages[0].chapter_id, "chapter-12");
    assert_eq!(pages[1].id, "page-3");
    assert_eq!(pages[1].image_url, "https://mangafire.to/p/3.jpg");
}
