//! Deterministic ordering of results
//!
//! Keys, in order:
//! 1. country release date, earliest first
//! 2. digital release date, earliest first
//! 3. display name, in dictionary order (accents and case ignored first,
//!    then the raw name)
//! 4. film query
//!
//! Absent dates and names sort after every present value.

use crate::pipeline::types::FilmResult;
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Sorts results in place; the sort is stable
pub fn sort_results(results: &mut [FilmResult]) {
    results.sort_by(compare_results);
}

pub fn compare_results(a: &FilmResult, b: &FilmResult) -> Ordering {
    absent_last(a.country_date(), b.country_date())
        .then_with(|| absent_last(a.digital_date(), b.digital_date()))
        .then_with(|| compare_names(a.film_name.as_deref(), b.film_name.as_deref()))
        .then_with(|| a.film_query.cmp(&b.film_query))
}

/// Dictionary order of two display names, absent names last
///
/// Names are compared on their folded form first, so "alien" < "Étoile" <
/// "Zodiac". Names that fold to the same key fall back to byte order.
pub fn compare_names(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => collation_key(a)
            .cmp(&collation_key(b))
            .then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Lowercased name with diacritics removed
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn absent_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
