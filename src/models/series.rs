//! Series entities: search cards and full detail pages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Genre markers that make a series unsuitable for family browsing.
pub const EXPLICIT_GENRE_MARKERS: &[&str] = &["adult", "harem", "ecchi", "shota", "sexual"];

/// Publication state of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
    #[default]
    Continuing,
    Completed,
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continuing => "continuing",
            Self::Completed => "completed",
        }
    }

    /// Classify the status line shown on a detail page.
    pub fn from_status_text(text: &str) -> Self {
        let text = text.to_lowercase();
        if text.contains("releasing") {
            Self::Continuing
        } else if text.contains("completed") {
            Self::Completed
        } else {
            Self::Continuing
        }
    }
}

/// A series as shown on a search listing card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Last path segment of the card link. Absent when the card has no link.
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: String,
    pub cover_url: Option<String>,
    pub cover_file_name: Option<String>,
    pub website_url: String,
    /// Type label (Manga, One_shot, ...).
    pub tags: Vec<String>,
    /// Chapter/volume link label -> absolute URL.
    pub links: BTreeMap<String, String>,
    pub latest_chapter_number: f64,
    pub latest_volume_number: f64,
}

/// A series detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesDetail {
    pub id: String,
    pub title: Option<String>,
    /// ("Alt1", title), ("Alt2", title), ... in source order.
    pub alternative_titles: Vec<(String, String)>,
    pub description: Option<String>,
    pub authors: Vec<String>,
    pub genres: Vec<String>,
    pub cover_url: Option<String>,
    pub cover_file_name: Option<String>,
    pub background_url: Option<String>,
    /// Canonical URL from the share widget.
    pub website_url: String,
    pub publication_year: Option<i32>,
    pub rating: f64,
    pub release_status: ReleaseStatus,
    pub is_family_safe: bool,
}

impl SeriesDetail {
    pub fn to_ref(&self) -> SeriesRef {
        SeriesRef {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }

    /// Look up an alternative title by key ("Alt1", ...).
    pub fn alternative_title(&self, key: &str) -> Option<&str> {
        self.alternative_titles
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Back-reference from a chapter to its series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRef {
    pub id: String,
    pub title: Option<String>,
}

impl SeriesRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
        }
    }
}

impl From<&SeriesDetail> for SeriesRef {
    fn from(detail: &SeriesDetail) -> Self {
        detail.to_ref()
    }
}

/// False iff any genre contains an explicit marker, ignoring case.
pub fn is_family_safe<S: AsRef<str>>(genres: &[S]) -> bool {
    !genres.iter().any(|g| is_explicit_genre(g.as_ref()))
}

fn is_explicit_genre(genre: &str) -> bool {
    if genre.trim().is_empty() {
        return false;
    }
    let genre = genre.to_lowercase();
    EXPLICIT_GENRE_MARKERS.iter().any(|m| genre.contains(m))
}
