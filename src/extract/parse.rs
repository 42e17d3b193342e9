//! Shared lookup and number-parsing helpers for the extractors.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

static CHAPTER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Chap\s+(\d+(?:\.\d+)?)").unwrap());
static VOLUME_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Vol\s+(\d+(?:\.\d+)?)").unwrap());
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

/// Compile a selector used by the extractors. All of them are literals.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

/// Trimmed text content of an element.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Trimmed text, `None` when blank.
pub fn non_empty_text(element: ElementRef<'_>) -> Option<String> {
    Some(text_of(element)).filter(|t| !t.is_empty())
}

pub fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}

/// Child elements with a given tag name, in document order.
pub fn child_elements<'a>(
    element: ElementRef<'a>,
    tag: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == tag)
}

/// Locale-invariant decimal parse. Negative, non-finite and malformed
/// input all yield `None`.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
}

/// Decimal or zero.
pub fn decimal_or_zero(raw: &str) -> f64 {
    parse_decimal(raw).unwrap_or(0.0)
}

/// Number following "Chap" in a link label.
pub fn chapter_label_number(label: &str) -> Option<f64> {
    capture_number(&CHAPTER_LABEL, label)
}

/// Number following "Vol" in a link label or title.
pub fn volume_label_number(label: &str) -> Option<f64> {
    capture_number(&VOLUME_LABEL, label)
}

/// Largest number any label yields; zero when none match.
pub fn max_label_number<I, S>(labels: I, number: fn(&str) -> Option<f64>) -> f64
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels
        .into_iter()
        .filter_map(|label| number(label.as_ref()))
        .fold(0.0, f64::max)
}

/// First standalone four-digit run.
pub fn first_year(text: &str) -> Option<i32> {
    YEAR.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
}

fn capture_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_decimal(m.as_str()))
}
