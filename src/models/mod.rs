//! Catalog entities produced by the extractors.
//!
//! Every entity is built fresh per call and never mutated afterwards.

mod chapter;
mod paged;
mod series;

pub use chapter::{Chapter, ChapterRef, Page};
pub use paged::{PagedResult, Pagination, PaginationOptions};
pub use series::{
    is_family_safe, ReleaseStatus, SeriesDetail, SeriesRef, SeriesSummary, EXPLICIT_GENRE_MARKERS,
};
