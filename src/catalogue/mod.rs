//! Movie metadata catalogue
//!
//! This module contains:
//! - The release-dates API client
//! - Wire types of the release-dates response
//! - Earliest-date extraction for a country and for digital releases

mod client;
mod dates;
mod types;

pub use client::CatalogueClient;
pub use dates::{
    earliest_country_release, earliest_digital_release, extract_release_dates,
    parse_display_date, parse_release_date, DatedRelease, ReleaseSummary, DISPLAY_DATE_FORMAT,
};
pub use types::{
    CountryReleases, ReleaseDatesResponse, ReleaseEvent, ReleaseType, DIGITAL_RELEASE_CODE,
};
