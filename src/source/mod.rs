//! Film sources
//!
//! A source turns a request into the list of films to resolve. Two sources
//! exist behind the `FilmSource` trait:
//! - `ListingSource` scrapes a paginated public list
//! - `SpreadsheetSource` reads a CSV export of a spreadsheet

mod listing;
mod spreadsheet;

pub use listing::ListingSource;
pub use spreadsheet::{parse_sheet, sheet_export_url, SpreadsheetSource};

use crate::pipeline::StageTracker;
use crate::ReelError;
use async_trait::async_trait;
use std::collections::HashSet;

/// One film to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// List identifier (slug) or detail page URL
    pub query: String,

    /// Display name already known from the source
    pub known_name: Option<String>,

    /// Catalogue identifier already known from the source
    pub known_catalogue_id: Option<u64>,
}

impl SourceEntry {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            known_name: None,
            known_catalogue_id: None,
        }
    }
}

/// Produces the films of one request
#[async_trait]
pub trait FilmSource: Send + Sync {
    /// Short human-readable description for logs
    fn describe(&self) -> String;

    /// Collects unique entries, advancing `tracker` through the collection stages
    ///
    /// Failing to retrieve the first document is an error; later pages are
    /// skipped on failure.
    async fn collect(&self, tracker: &mut StageTracker) -> Result<Vec<SourceEntry>, ReelError>;
}

/// Appends entries whose query has not been seen yet, keeping first-seen order
pub(crate) fn merge_unique(
    into: &mut Vec<SourceEntry>,
    seen: &mut HashSet<String>,
    entries: impl IntoIterator<Item = SourceEntry>,
) -> usize {
    let before = into.len();
    for entry in entries {
        if seen.insert(entry.query.clone()) {
            into.push(entry);
        }
    }
    into.len() - before
}
