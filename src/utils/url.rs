//! Link resolution against the fixed site origin.

use url::Url;

/// The only origin this agent talks to.
pub const SITE_ORIGIN: &str = "https://mangafire.to";

/// Resolves raw `href`/`src` values into absolute URLs.
#[derive(Debug, Clone)]
pub struct SiteUrl {
    origin: Url,
}

impl Default for SiteUrl {
    fn default() -> Self {
        Self {
            origin: Url::parse(SITE_ORIGIN).expect("SITE_ORIGIN is a valid URL"),
        }
    }
}

impl SiteUrl {
    pub fn new(origin: Url) -> Self {
        Self { origin }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Resolve a raw link.
    ///
    /// Blank input yields an empty string; an absolute URL is returned
    /// re-serialized; anything else is joined onto the origin.
    pub fn normalize(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() {
            return String::new();
        }

        if !raw.starts_with('/') {
            if let Ok(absolute) = Url::parse(raw) {
                return absolute.to_string();
            }
        }

        match self.origin.join(raw) {
            Ok(resolved) => resolved.to_string(),
            Err(_) => String::new(),
        }
    }

    /// Absolute URL for a site route such as `home` or `manga/{id}`.
    pub fn route(&self, path: &str) -> String {
        self.normalize(&format!("/{}", path.trim_start_matches('/')))
    }

    /// Landing page the search token is minted on.
    pub fn home(&self) -> String {
        self.route("home")
    }

    pub fn series(&self, id: &str) -> String {
        self.route(&format!("manga/{}", id))
    }

    /// Search listing for one page of results.
    pub fn search(&self, keyword: &str, token: &str, language: &str, page: u32) -> String {
        let mut url = self.origin.clone();
        url.set_path("/filter");
        url.query_pairs_mut()
            .append_pair("keyword", keyword)
            .append_pair("vrf", token)
            .append_pair("language[]", language)
            .append_pair("page", &page.to_string());
        url.to_string()
    }
}

/// Swap the site's active reading-language segment for the requested one.
///
/// Only the site-detected code is case-normalized. With no detected code
/// the href is returned untouched.
pub fn rewrite_language(href: &str, active: &str, requested: &str) -> String {
    let active = active.trim().to_lowercase();
    if active.is_empty() {
        return href.to_string();
    }
    href.replace(&format!("/{}/", active), &format!("/{}/", requested))
}

/// Last non-empty path segment of an absolute URL.
pub fn last_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| s.to_string())
}

/// File name component of a URL's path.
pub fn file_name(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let name = parsed.path_segments()?.last()?;
    (!name.is_empty()).then(|| name.to_string())
}
