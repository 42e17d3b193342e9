//! Chapter and page entities.

use serde::{Deserialize, Serialize};

use super::series::SeriesRef;

/// One chapter of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Last path segment of `uri`.
    pub id: String,
    pub title: Option<String>,
    pub series: SeriesRef,
    /// Zero when the chapter carries no volume label.
    pub volume_number: f64,
    pub chapter_number: f64,
    /// Absolute reader URL, rewritten to the requested language.
    pub uri: String,
}

impl Chapter {
    pub fn to_ref(&self) -> ChapterRef {
        ChapterRef {
            id: self.id.clone(),
            uri: self.uri.clone(),
        }
    }
}

/// Back-reference from a page to its chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRef {
    pub id: String,
    pub uri: String,
}

/// One page image of a chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// "page-{number}".
    pub id: String,
    pub chapter_id: String,
    pub page_number: f64,
    pub image_url: String,
    pub chapter: ChapterRef,
}

impl Page {
    pub fn new(chapter: ChapterRef, page_number: f64, image_url: String) -> Self {
        Self {
            id: format!("page-{}", page_number),
            chapter_id: chapter.id.clone(),
            page_number,
            image_url,
            chapter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_format() {
        let chapter = ChapterRef {
            id: "chapter-1".into(),
            uri: "https://mangafire.to/read/abc/en/chapter-1".into(),
        };
        let page = Page::new(chapter.clone(), 3.0, "https://cdn.example/3.jpg".into());
        assert_eq!(page.id, "page-3");
        assert_eq!(page.chapter_id, "chapter-1");

        let half = Page::new(chapter, 3.5, "https://cdn.example/3b.jpg".into());
        assert_eq!(half.id, "page-3.5");
    }
}
