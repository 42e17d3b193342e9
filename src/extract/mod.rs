//! Document extractors.
//!
//! Pure functions from page markup to catalog entities. A missing node
//! yields a default field, never an error.

mod chapters;
mod detail;
pub mod parse;
mod pages;
mod summary;

pub use chapters::parse_chapters;
pub use detail::{parse_series_detail, split_alternative_titles};
pub use pages::parse_pages;
pub use summary::{parse_search_results, parse_summary_card, NO_DESCRIPTION};
