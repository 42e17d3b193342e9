//! Shared utility functions.
//!
//! - `html`: HTML entity decoding for text lifted out of markup
//! - `url`: link resolution against the site origin

mod html;
mod url;

pub use html::decode_entities;
pub use url::{file_name, last_segment, rewrite_language, SiteUrl, SITE_ORIGIN};
