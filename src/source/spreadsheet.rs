//! Spreadsheet import
//!
//! Reads films from the CSV export of a spreadsheet. The first row is used as
//! a header when it names a known column; otherwise every row is data and the
//! first column holds the film identifier.

use crate::fetch::{FetchOptions, Fetcher};
use crate::pipeline::StageTracker;
use crate::source::{merge_unique, FilmSource, SourceEntry};
use crate::ReelError;
use async_trait::async_trait;
use std::collections::HashSet;
use url::Url;

const QUERY_COLUMNS: [&str; 4] = ["film_query", "slug", "letterboxd", "url"];
const NAME_COLUMNS: [&str; 3] = ["film_name", "name", "title"];
const CATALOGUE_ID_COLUMNS: [&str; 2] = ["tmdb_id", "tmdb"];

/// Films listed in a spreadsheet export
#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    fetcher: Fetcher,
    sheet_url: String,
}

impl SpreadsheetSource {
    pub fn new(fetcher: Fetcher, sheet_url: &str) -> Self {
        Self {
            fetcher,
            sheet_url: sheet_url.trim().to_string(),
        }
    }
}

#[async_trait]
impl FilmSource for SpreadsheetSource {
    fn describe(&self) -> String {
        format!("spreadsheet {}", self.sheet_url)
    }

    async fn collect(&self, _tracker: &mut StageTracker) -> Result<Vec<SourceEntry>, ReelError> {
        let export_url = sheet_export_url(&self.sheet_url)?;
        tracing::info!("Reading films from {}", export_url);

        let fetched = self
            .fetcher
            .fetch(&export_url, &FetchOptions::default())
            .await
            .map_err(|source| ReelError::FirstPage {
                url: export_url.clone(),
                source,
            })?;

        let entries = parse_sheet(&fetched.body)?;
        tracing::info!("Collected {} unique films from {}", entries.len(), self.describe());
        Ok(entries)
    }
}

/// Rewrites a spreadsheet share URL to its CSV export URL
///
/// `https://docs.google.com/spreadsheets/d/<id>/edit#gid=<gid>` becomes
/// `https://docs.google.com/spreadsheets/d/<id>/export?format=csv&gid=<gid>`.
/// Any other URL is returned unchanged.
pub fn sheet_export_url(raw: &str) -> Result<String, ReelError> {
    let url = Url::parse(raw.trim())?;

    let is_google_sheet = url
        .host_str()
        .map_or(false, |host| host.ends_with("docs.google.com"));
    if !is_google_sheet || url.path().contains("/export") || url.path().ends_with("/pub") {
        return Ok(url.to_string());
    }

    let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
    let sheet_id = segments
        .windows(3)
        .find(|w| w[0] == "spreadsheets" && w[1] == "d")
        .map(|w| w[2])
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            ReelError::InvalidRequest(format!("no spreadsheet id in sheet_url '{}'", raw))
        })?;

    let gid = url
        .query_pairs()
        .find(|(key, _)| key == "gid")
        .map(|(_, value)| value.into_owned())
        .or_else(|| {
            url.fragment().and_then(|fragment| {
                url::form_urlencoded::parse(fragment.as_bytes())
                    .find(|(key, _)| key == "gid")
                    .map(|(_, value)| value.into_owned())
            })
        });

    let mut export = Url::parse(&format!(
        "https://docs.google.com/spreadsheets/d/{}/export",
        sheet_id
    ))?;
    {
        let mut query = export.query_pairs_mut();
        query.append_pair("format", "csv");
        if let Some(gid) = gid {
            query.append_pair("gid", &gid);
        }
    }
    Ok(export.to_string())
}

/// Parses CSV rows into unique source entries
pub fn parse_sheet(body: &str) -> Result<Vec<SourceEntry>, ReelError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?);
    }

    let mut query_col = 0;
    let mut name_col = None;
    let mut id_col = None;
    let mut data_start = 0;

    if let Some(first) = rows.first() {
        let find = |names: &[&str]| {
            first
                .iter()
                .position(|cell| names.iter().any(|name| cell.eq_ignore_ascii_case(name)))
        };
        let header_query = find(&QUERY_COLUMNS[..]);
        name_col = find(&NAME_COLUMNS[..]);
        id_col = find(&CATALOGUE_ID_COLUMNS[..]);

        if header_query.is_some() || name_col.is_some() || id_col.is_some() {
            query_col = header_query.unwrap_or(0);
            data_start = 1;
        }
    }

    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let parsed = rows.iter().skip(data_start).filter_map(|row| {
        let query = row.get(query_col).map(str::trim).filter(|q| !q.is_empty())?;
        let cell = |col: Option<usize>| {
            col.and_then(|c| row.get(c))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        Some(SourceEntry {
            query: query.to_string(),
            known_name: cell(name_col).map(str::to_string),
            known_catalogue_id: cell(id_col).and_then(|v| v.parse::<u64>().ok()),
        })
    });
    merge_unique(&mut entries, &mut seen, parsed);

    Ok(entries)
}
