//! Film detail page parser

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

static TRAILING_PARENTHESIZED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\([^()]*\)\s*$").expect("trailing parenthesis regex should compile")
});

/// Fields scraped from a film detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilmDetails {
    /// Display title with any trailing parenthesized suffix removed
    pub title: Option<String>,

    /// Catalogue identifier, when the page carries a parseable one
    pub catalogue_id: Option<u64>,
}

/// Parses a detail page once and extracts both fields
pub fn parse_detail_page(html: &str) -> FilmDetails {
    let document = Html::parse_document(html);
    FilmDetails {
        title: title_from_document(&document),
        catalogue_id: catalogue_id_from_document(&document),
    }
}

/// Extracts the catalogue identifier from a `data-tmdb-id` attribute
pub fn extract_catalogue_id(html: &str) -> Option<u64> {
    catalogue_id_from_document(&Html::parse_document(html))
}

/// Extracts the display title
///
/// Prefers the `og:title` meta value and falls back to the first `<h1>`.
/// A trailing parenthesized suffix such as a year is stripped.
///
/// ```
/// use reel_dates::scrape::extract_title;
///
/// let html = r#"<head><meta property="og:title" content="Heat (1995)"></head>"#;
/// assert_eq!(extract_title(html), Some("Heat".to_string()));
/// ```
pub fn extract_title(html: &str) -> Option<String> {
    title_from_document(&Html::parse_document(html))
}

fn catalogue_id_from_document(document: &Html) -> Option<u64> {
    let selector = Selector::parse("[data-tmdb-id]").ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("data-tmdb-id"))
        .find_map(|value| value.trim().parse::<u64>().ok())
}

fn title_from_document(document: &Html) -> Option<String> {
    og_title(document)
        .or_else(|| first_heading(document))
        .and_then(|raw| clean_title(&raw))
}

fn og_title(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[property="og:title"]"#).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
}

fn first_heading(document: &Html) -> Option<String> {
    let selector = Selector::parse("h1").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>())
}

/// Collapses whitespace and strips one trailing parenthesized suffix
fn clean_title(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let stripped = TRAILING_PARENTHESIZED.replace(&collapsed, "");
    let title = stripped.trim();

    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
