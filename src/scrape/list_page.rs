//! List page parser
//!
//! Extracts film identifiers and the page count from a list page. Missing or
//! malformed markup yields empty results rather than errors.

use scraper::{Html, Selector};
use std::collections::HashSet;

/// Attributes that carry a film identifier, in order of preference
const IDENTIFIER_ATTRIBUTES: [&str; 2] = ["data-film-slug", "data-item-slug"];

/// Extracts unique film identifiers from a list page
///
/// Values are trimmed, empty values are skipped and duplicates are dropped
/// while keeping first-seen order.
///
/// # Example
///
/// ```
/// use reel_dates::scrape::extract_identifiers;
///
/// let html = r#"<ul>
///     <li><div data-film-slug="heat-1995"></div></li>
///     <li><div data-film-slug="thief"></div></li>
///     <li><div data-film-slug="heat-1995"></div></li>
/// </ul>"#;
/// assert_eq!(extract_identifiers(html), vec!["heat-1995", "thief"]);
/// ```
pub fn extract_identifiers(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut identifiers = Vec::new();
    let mut seen = HashSet::new();

    let Ok(selector) = Selector::parse("[data-film-slug], [data-item-slug]") else {
        return identifiers;
    };

    for element in document.select(&selector) {
        let value = IDENTIFIER_ATTRIBUTES
            .iter()
            .filter_map(|attr| element.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty());

        if let Some(identifier) = value {
            if seen.insert(identifier.to_string()) {
                identifiers.push(identifier.to_string());
            }
        }
    }

    identifiers
}

/// Determines how many pages the list has
///
/// Returns 1 when there is no pagination block or when the label of the last
/// pagination control is not a number.
pub fn extract_page_count(html: &str) -> u32 {
    let document = Html::parse_document(html);

    let Ok(container) = Selector::parse(".paginate-pages") else {
        return 1;
    };
    let Ok(item) = Selector::parse("li") else {
        return 1;
    };

    let Some(pagination) = document.select(&container).next() else {
        return 1;
    };

    pagination
        .select(&item)
        .last()
        .map(|li| li.text().collect::<String>())
        .and_then(|label| label.trim().parse::<u32>().ok())
        .filter(|count| *count >= 1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <ul class="poster-list">
            <li><div class="film-poster" data-film-slug="the-thing"></div></li>
            <li><div class="film-poster" data-film-slug=" alien "></div></li>
            <li><div class="film-poster" data-film-slug=""></div></li>
            <li><div class="react-component" data-item-slug="the-fly"></div></li>
            <li><div class="film-poster" data-film-slug="the-thing"></div></li>
          </ul>
          <div class="paginate-pages"><ul>
            <li class="paginate-page"><a href="/u/list/l/">1</a></li>
            <li class="paginate-page"><a href="/u/list/l/page/2/">2</a></li>
            <li class="paginate-page unseen-pages">&hellip;</li>
            <li class="paginate-page"><a href="/u/list/l/page/7/">7</a></li>
          </ul></div>
        </body></html>
    "#;

    #[test]
    fn test_extract_identifiers_in_first_seen_order() {
        assert_eq!(
            extract_identifiers(PAGE),
            vec!["the-thing", "alien", "the-fly"]
        );
    }

    #[test]
    fn test_extract_identifiers_is_idempotent() {
        assert_eq!(extract_identifiers(PAGE), extract_identifiers(PAGE));
    }

    #[test]
    fn test_extract_identifiers_no_items() {
        assert!(extract_identifiers("<html><body><p>Empty</p></body></html>").is_empty());
        assert!(extract_identifiers("").is_empty());
    }

    #[test]
    fn test_film_slug_preferred_over_item_slug() {
        let html = r#"<div data-item-slug="b" data-film-slug="a"></div>"#;
        assert_eq!(extract_identifiers(html), vec!["a"]);
    }

    #[test]
    fn test_page_count_from_last_control() {
        assert_eq!(extract_page_count(PAGE), 7);
    }

    #[test]
    fn test_page_count_without_pagination() {
        assert_eq!(extract_page_count("<html><body></body></html>"), 1);
    }

    #[test]
    fn test_page_count_unparseable_label() {
        let html = r#"<div class="paginate-pages"><ul><li>1</li><li>Next</li></ul></div>"#;
        assert_eq!(extract_page_count(html), 1);
    }

    #[test]
    fn test_page_count_empty_pagination() {
        let html = r#"<div class="paginate-pages"></div>"#;
        assert_eq!(extract_page_count(html), 1);
    }
}
