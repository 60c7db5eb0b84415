//! Wire types of the catalogue's release-dates endpoint

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Release-type code of digital / streaming availability
pub const DIGITAL_RELEASE_CODE: u32 = 4;

/// Kind of release event, as numbered by the catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReleaseType {
    Premiere,
    TheatricalLimited,
    Theatrical,
    Digital,
    Physical,
    Tv,
}

impl ReleaseType {
    pub fn code(&self) -> u32 {
        match self {
            Self::Premiere => 1,
            Self::TheatricalLimited => 2,
            Self::Theatrical => 3,
            Self::Digital => DIGITAL_RELEASE_CODE,
            Self::Physical => 5,
            Self::Tv => 6,
        }
    }

    /// Returns None for codes the catalogue does not define
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Premiere),
            2 => Some(Self::TheatricalLimited),
            3 => Some(Self::Theatrical),
            4 => Some(Self::Digital),
            5 => Some(Self::Physical),
            6 => Some(Self::Tv),
            _ => None,
        }
    }

    pub fn all() -> [Self; 6] {
        [
            Self::Premiere,
            Self::TheatricalLimited,
            Self::Theatrical,
            Self::Digital,
            Self::Physical,
            Self::Tv,
        ]
    }

    /// Allow-list of every type except premieres
    pub fn without_premieres() -> Vec<u32> {
        Self::all()
            .iter()
            .filter(|t| **t != Self::Premiere)
            .map(Self::code)
            .collect()
    }
}

/// Body of `GET /3/movie/{id}/release_dates`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDatesResponse {
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub results: Vec<CountryReleases>,
}

/// Release events of one country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryReleases {
    /// ISO 3166-1 alpha-2 code
    #[serde(rename = "iso_3166_1")]
    pub country: String,

    #[serde(default)]
    pub release_dates: Vec<ReleaseEvent>,
}

/// One dated release event
///
/// A field holding a value of the wrong JSON type reads as `None`, so one
/// malformed event never spoils the rest of the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseEvent {
    /// ISO 8601 timestamp, e.g. `2021-04-10T00:00:00.000Z`
    #[serde(default, deserialize_with = "lenient")]
    pub release_date: Option<String>,

    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub release_type: Option<u32>,

    #[serde(default, deserialize_with = "lenient")]
    pub certification: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub note: Option<String>,
}

/// Reads any JSON value and keeps it only when it converts to `T`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
