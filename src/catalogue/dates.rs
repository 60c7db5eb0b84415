//! Earliest-date extraction from release-dates responses
//!
//! Two dates are computed from one response:
//! - the earliest event of the target country, optionally restricted to an
//!   allow-list of release-type codes
//! - the earliest digital event across every country; the allow-list never
//!   applies here
//!
//! Events whose date is missing or malformed are skipped.

use crate::catalogue::types::{ReleaseDatesResponse, ReleaseEvent, DIGITAL_RELEASE_CODE};
use chrono::NaiveDate;

/// Output format of release dates
pub const DISPLAY_DATE_FORMAT: &str = "%d-%m-%Y";

/// A release date tagged with its release-type code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatedRelease {
    pub date: NaiveDate,
    pub release_type: u32,
}

impl DatedRelease {
    /// Day-month-year form, e.g. `10-04-2021`
    pub fn display_date(&self) -> String {
        self.date.format(DISPLAY_DATE_FORMAT).to_string()
    }
}

/// Both earliest dates of one film
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseSummary {
    pub country: Option<DatedRelease>,
    pub digital: Option<DatedRelease>,
}

/// Computes the country and digital earliest releases of a response
///
/// # Example
///
/// ```
/// use reel_dates::catalogue::{extract_release_dates, ReleaseDatesResponse};
///
/// let response: ReleaseDatesResponse = serde_json::from_str(r#"{"results": [
///     {"iso_3166_1": "US", "release_dates": [
///         {"release_date": "2021-05-01T00:00:00.000Z", "type": 3},
///         {"release_date": "2021-04-10T00:00:00.000Z", "type": 4}]},
///     {"iso_3166_1": "GB", "release_dates": [
///         {"release_date": "2021-03-01T00:00:00.000Z", "type": 4}]}
/// ]}"#).unwrap();
///
/// let summary = extract_release_dates(&response, "us", None);
/// assert_eq!(summary.country.unwrap().display_date(), "10-04-2021");
/// assert_eq!(summary.digital.unwrap().display_date(), "01-03-2021");
/// ```
pub fn extract_release_dates(
    response: &ReleaseDatesResponse,
    country: &str,
    allowed_types: Option<&[u32]>,
) -> ReleaseSummary {
    ReleaseSummary {
        country: earliest_country_release(response, country, allowed_types),
        digital: earliest_digital_release(response),
    }
}

/// Earliest qualifying event of the first entry matching `country`
pub fn earliest_country_release(
    response: &ReleaseDatesResponse,
    country: &str,
    allowed_types: Option<&[u32]>,
) -> Option<DatedRelease> {
    let entry = response
        .results
        .iter()
        .find(|entry| entry.country.trim().eq_ignore_ascii_case(country.trim()))?;

    earliest(entry.release_dates.iter(), |code| {
        allowed_types.map_or(true, |allowed| allowed.contains(&code))
    })
}

/// Earliest digital event across all countries
pub fn earliest_digital_release(response: &ReleaseDatesResponse) -> Option<DatedRelease> {
    earliest(
        response
            .results
            .iter()
            .flat_map(|entry| entry.release_dates.iter()),
        |code| code == DIGITAL_RELEASE_CODE,
    )
}

/// Picks the earliest event accepted by `accept`; ties keep the first seen
fn earliest<'a>(
    events: impl Iterator<Item = &'a ReleaseEvent>,
    accept: impl Fn(u32) -> bool,
) -> Option<DatedRelease> {
    events
        .filter_map(dated)
        .filter(|release| accept(release.release_type))
        .fold(None, |best: Option<DatedRelease>, candidate| match best {
            Some(current) if current.date <= candidate.date => Some(current),
            _ => Some(candidate),
        })
}

/// Events without a type code or a parseable date are dropped
fn dated(event: &ReleaseEvent) -> Option<DatedRelease> {
    let release_type = event.release_type?;
    let date = parse_release_date(event.release_date.as_deref()?)?;
    Some(DatedRelease { date, release_type })
}

/// Parses the calendar-date prefix of an ISO 8601 timestamp
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let prefix = raw.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Parses a day-month-year display date back into a calendar date
pub fn parse_display_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DISPLAY_DATE_FORMAT).ok()
}
