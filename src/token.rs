//! Search verification token.
//!
//! The site mints the `vrf` token in client-side script on its landing
//! page once the search box is used, so it can only be read back from a
//! real page after simulated typing.

use std::sync::Arc;

use tracing::{debug, info};

use crate::browser::{LandingOnly, PageSession};
use crate::error::{AgentError, Result};
use crate::utils::SiteUrl;

/// Route the token page is pinned to.
pub const LANDING_ROUTE: &str = "/home";
pub const SEARCH_INPUT: &str = "input[name='keyword']";
pub const TOKEN_INPUT: &str = "input[name='vrf']";
/// Query typed to make the site mint a token.
pub const DECOY_QUERY: &str = "One Piece";

/// Read a search token on a freshly prepared page.
///
/// Loads the landing page, pins the tab to it, then types the decoy query
/// so the site's script fills in the hidden token input. A search box that
/// never appears fails with a timeout; there is no retry.
pub async fn read_token(page: &PageSession, site: &SiteUrl) -> Result<String> {
    page.goto(&site.home()).await?;
    page.intercept_requests(Arc::new(LandingOnly::new(LANDING_ROUTE)))
        .await?;

    page.wait_for_selector(SEARCH_INPUT).await?;
    page.focus(SEARCH_INPUT).await?;
    page.type_text(SEARCH_INPUT, DECOY_QUERY).await?;

    let value = page.query_value(TOKEN_INPUT).await?;
    let token = validate_token(value)?;
    info!("Search token acquired");
    debug!("Search token: {}", token);
    Ok(token)
}

/// A present, non-blank value is a token; anything else means the page
/// never minted one.
fn validate_token(value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(token) if !token.is_empty() => Ok(token),
        Some(_) => Err(AgentError::TokenUnavailable(format!(
            "{} is empty",
            TOKEN_INPUT
        ))),
        None => Err(AgentError::TokenUnavailable(format!(
            "{} not found",
            TOKEN_INPUT
        ))),
    }
}
