//! HTML parsing for list pages and film detail pages
//!
//! Extraction is best-effort against third-party markup: absent elements
//! produce empty or `None` results, never errors.

mod detail_page;
mod list_page;

pub use detail_page::{extract_catalogue_id, extract_title, parse_detail_page, FilmDetails};
pub use list_page::{extract_identifiers, extract_page_count};
