//! Request and response types of the release-date pipeline

use crate::catalogue::{parse_display_date, ReleaseSummary, ReleaseType};
use crate::{error_chain, ReelError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inbound request
///
/// Either `sheet_url`, or both `username` and `list_slug`, must be given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRequest {
    #[serde(default, alias = "user")]
    pub username: Option<String>,

    #[serde(default, alias = "list")]
    pub list_slug: Option<String>,

    #[serde(default)]
    pub sheet_url: Option<String>,

    #[serde(default)]
    pub country: Option<String>,

    #[serde(default)]
    pub exclude_premieres: bool,
}

/// Where the films of a request come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Listing { username: String, list_slug: String },
    Spreadsheet { url: String },
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub source: SourceSpec,

    /// Uppercase ISO 3166-1 alpha-2 code
    pub country: String,

    /// Release types counted toward the country date; None accepts all
    pub allowed_types: Option<Vec<u32>>,
}

impl ReleaseRequest {
    pub fn for_list(username: &str, list_slug: &str, country: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            list_slug: Some(list_slug.to_string()),
            country: Some(country.to_string()),
            ..Self::default()
        }
    }

    pub fn for_sheet(sheet_url: &str, country: &str) -> Self {
        Self {
            sheet_url: Some(sheet_url.to_string()),
            country: Some(country.to_string()),
            ..Self::default()
        }
    }

    pub fn excluding_premieres(mut self) -> Self {
        self.exclude_premieres = true;
        self
    }

    /// Checks required fields and normalizes them
    pub fn validate(&self) -> Result<ValidatedRequest, ReelError> {
        let country = non_blank(&self.country)
            .ok_or_else(|| ReelError::InvalidRequest("country is required".to_string()))?;
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ReelError::InvalidRequest(format!(
                "country must be a two-letter ISO code, got '{}'",
                country
            )));
        }

        let source = if let Some(url) = non_blank(&self.sheet_url) {
            SourceSpec::Spreadsheet {
                url: url.to_string(),
            }
        } else {
            match (non_blank(&self.username), non_blank(&self.list_slug)) {
                (Some(username), Some(list_slug)) => SourceSpec::Listing {
                    username: username.trim_matches('/').to_string(),
                    list_slug: list_slug.trim_matches('/').to_string(),
                },
                _ => {
                    return Err(ReelError::InvalidRequest(
                        "either sheet_url or both username and list_slug are required"
                            .to_string(),
                    ))
                }
            }
        };

        Ok(ValidatedRequest {
            source,
            country: country.to_ascii_uppercase(),
            allowed_types: self
                .exclude_premieres
                .then(ReleaseType::without_premieres),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// One output row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmResult {
    /// Identifier the film was listed under
    pub film_query: String,

    pub film_name: Option<String>,

    pub tmdb_id: Option<u64>,

    /// Earliest release in the target country, day-month-year
    pub country_release: Option<String>,

    pub country_release_type: Option<u32>,

    /// Earliest digital release in any country, day-month-year
    pub digital_release: Option<String>,

    pub digital_release_type: Option<u32>,

    /// Non-fatal problems met while building this row
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error: Vec<String>,
}

impl FilmResult {
    pub fn new(film_query: impl Into<String>) -> Self {
        Self {
            film_query: film_query.into(),
            film_name: None,
            tmdb_id: None,
            country_release: None,
            country_release_type: None,
            digital_release: None,
            digital_release_type: None,
            error: Vec::new(),
        }
    }

    /// A row carrying only an error message
    pub fn failed(film_query: impl Into<String>, message: impl Into<String>) -> Self {
        let mut result = Self::new(film_query);
        result.push_error(message);
        result
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.error.push(message.into());
    }

    pub fn apply_summary(&mut self, summary: &ReleaseSummary) {
        if let Some(country) = &summary.country {
            self.country_release = Some(country.display_date());
            self.country_release_type = Some(country.release_type);
        }
        if let Some(digital) = &summary.digital {
            self.digital_release = Some(digital.display_date());
            self.digital_release_type = Some(digital.release_type);
        }
    }

    pub fn country_date(&self) -> Option<NaiveDate> {
        self.country_release.as_deref().and_then(parse_display_date)
    }

    pub fn digital_date(&self) -> Option<NaiveDate> {
        self.digital_release.as_deref().and_then(parse_display_date)
    }
}

/// Outbound response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseResponse {
    pub ok: bool,

    pub results: Vec<FilmResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ReleaseResponse {
    pub fn success(results: Vec<FilmResult>) -> Self {
        Self {
            ok: true,
            results,
            error: None,
            detail: None,
        }
    }

    /// Failure with the error as message and its causes as detail
    pub fn failure(err: &ReelError) -> Self {
        let detail = std::error::Error::source(err).map(error_chain);
        Self {
            ok: false,
            results: Vec::new(),
            error: Some(err.to_string()),
            detail,
        }
    }
}
