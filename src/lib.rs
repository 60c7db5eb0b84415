//! Reel-Dates: earliest release dates for a film list
//!
//! This crate reads the films of a public list (or a spreadsheet export),
//! resolves each film to its catalogue identifier, looks up release dates for
//! a target country and returns a sorted table of the earliest known dates.

pub mod catalogue;
pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod scrape;
pub mod source;

use thiserror::Error;

/// Main error type for Reel-Dates operations
#[derive(Debug, Error)]
pub enum ReelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to retrieve the first page of {url}")]
    FirstPage {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Invalid pipeline transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: pipeline::PipelineStage,
        to: pipeline::PipelineStage,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised by the resilient fetcher
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out after {timeout_secs}s: {url}")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("Network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}: {snippet}")]
    Status {
        url: String,
        status: u16,
        snippet: String,
    },

    #[error("Giving up on {url} after {attempts} attempts")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        source: Box<FetchError>,
    },

    #[error("Could not route {url} through relay: {message}")]
    Relay { url: String, message: String },
}

impl FetchError {
    /// Returns true for statuses that signal blocking or rate limiting
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == 403 || *status == 429)
    }

    /// Returns the error at the bottom of an `Exhausted` chain
    pub fn last_cause(&self) -> &FetchError {
        match self {
            Self::Exhausted { source, .. } => source.last_cause(),
            other => other,
        }
    }
}

/// Result type alias for Reel-Dates operations
pub type Result<T> = std::result::Result<T, ReelError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Formats an error together with its `source()` chain, outermost first
///
/// A cause whose message is already part of the previous one is not repeated.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(cause) = current {
        let message = cause.to_string();
        if !parts.last().map_or(false, |last| last.contains(&message)) {
            parts.push(message);
        }
        current = cause.source();
    }
    parts.join(": ")
}

// Re-export commonly used types
pub use catalogue::{ReleaseType, DIGITAL_RELEASE_CODE};
pub use config::Config;
pub use pipeline::{FilmResult, ReleasePipeline, ReleaseRequest, ReleaseResponse};
