//! Catalogue API client
//!
//! Only built when a bearer token is configured; without one, the pipeline
//! skips metadata lookups and records the skip on each film.

use crate::catalogue::types::ReleaseDatesResponse;
use crate::config::CatalogueConfig;
use crate::fetch::{FetchOptions, Fetcher};
use crate::ReelError;

/// Client for the release-dates endpoint
#[derive(Debug, Clone)]
pub struct CatalogueClient {
    fetcher: Fetcher,
    base_url: String,
    token: String,
}

impl CatalogueClient {
    pub fn new(fetcher: Fetcher, base_url: &str, token: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Returns None when the configuration carries no token
    pub fn from_config(fetcher: Fetcher, config: &CatalogueConfig) -> Option<Self> {
        config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self::new(fetcher, &config.base_url, token))
    }

    pub fn release_dates_url(&self, catalogue_id: u64) -> String {
        format!("{}/3/movie/{}/release_dates", self.base_url, catalogue_id)
    }

    /// Fetches the release dates of one film
    ///
    /// Calls go straight to the API (never through the relay) and inherit the
    /// fetcher's retry and timeout behavior.
    pub async fn fetch_release_dates(
        &self,
        catalogue_id: u64,
    ) -> Result<ReleaseDatesResponse, ReelError> {
        let url = self.release_dates_url(catalogue_id);
        let options = FetchOptions::direct().with_bearer(&self.token);

        tracing::debug!("Fetching release dates for catalogue id {}", catalogue_id);
        let page = self.fetcher.fetch(&url, &options).await?;
        let response = serde_json::from_str(&page.body)?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetcherConfig;

    fn fetcher() -> Fetcher {
        Fetcher::from_config(&FetcherConfig::default()).unwrap()
    }

    #[test]
    fn test_release_dates_url() {
        let client = CatalogueClient::new(fetcher(), "https://api.example.org/", "t");
        assert_eq!(
            client.release_dates_url(1091),
            "https://api.example.org/3/movie/1091/release_dates"
        );
    }

    #[test]
    fn test_from_config_requires_token() {
        let mut config = CatalogueConfig::default();
        assert!(CatalogueClient::from_config(fetcher(), &config).is_none());

        config.token = Some("token".to_string());
        assert!(CatalogueClient::from_config(fetcher(), &config).is_some());
    }
}
