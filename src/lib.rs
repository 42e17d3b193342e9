//! mangafire-agent - catalog crawler for mangafire.to.
//!
//! Drives a real Chrome through CDP to read series, chapters and chapter
//! page images from a site that blocks plain HTTP scraping. Extraction
//! from HTML is pure and usable without the `browser` feature.

pub mod browser;
pub mod cancel;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod reveal;
pub mod utils;

#[cfg(feature = "browser")]
mod agent;
#[cfg(feature = "browser")]
pub mod token;

#[cfg(feature = "browser")]
pub use agent::{MangaFireAgent, FAVICON_URL};
pub use catalog::{Catalog, DocumentSource};
pub use config::AgentConfig;
pub use error::{AgentError, Result};
