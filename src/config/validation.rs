use crate::config::types::{CatalogueConfig, Config, FetcherConfig, ListingConfig, PipelineConfig};
use crate::ConfigError;
use url::Url;

/// Longest exponential backoff a retry may wait (five minutes)
const MAX_BACKOFF_CAP_MS: u64 = 300_000;

/// Largest random jitter added to a backoff
const MAX_JITTER_MS: u64 = 60_000;

/// Most list pages a single request may walk
const MAX_PAGES_LIMIT: u32 = 1_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_listing_config(&config.listing)?;
    validate_catalogue_config(&config.catalogue)?;
    validate_pipeline_config(&config.pipeline)?;
    Ok(())
}

fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 120, got {}",
            config.timeout_secs
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_cap_ms > MAX_BACKOFF_CAP_MS {
        return Err(ConfigError::Validation(format!(
            "backoff_cap_ms must be at most {}, got {}",
            MAX_BACKOFF_CAP_MS, config.backoff_cap_ms
        )));
    }

    if config.jitter_ms > MAX_JITTER_MS {
        return Err(ConfigError::Validation(format!(
            "jitter_ms must be at most {}, got {}",
            MAX_JITTER_MS, config.jitter_ms
        )));
    }

    if config.backoff_base_ms > config.backoff_cap_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_base_ms ({}) cannot exceed backoff_cap_ms ({})",
            config.backoff_base_ms, config.backoff_cap_ms
        )));
    }

    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user_agents must contain at least one entry".to_string(),
        ));
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user_agents cannot contain empty entries".to_string(),
        ));
    }

    if let Some(relay) = &config.relay_url {
        validate_http_url("relay_url", relay)?;
    }

    Ok(())
}

fn validate_listing_config(config: &ListingConfig) -> Result<(), ConfigError> {
    validate_http_url("listing.base_url", &config.base_url)
}

fn validate_catalogue_config(config: &CatalogueConfig) -> Result<(), ConfigError> {
    validate_http_url("catalogue.base_url", &config.base_url)?;

    if matches!(&config.token, Some(token) if token.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "catalogue token cannot be blank; omit it instead".to_string(),
        ));
    }

    Ok(())
}

fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 16 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 16, got {}",
            config.concurrency
        )));
    }

    if config.max_pages < 1 || config.max_pages > MAX_PAGES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and {}, got {}",
            MAX_PAGES_LIMIT, config.max_pages
        )));
    }

    if config.page_delay_min_ms > config.page_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "page_delay_min_ms ({}) cannot exceed page_delay_max_ms ({})",
            config.page_delay_min_ms, config.page_delay_max_ms
        )));
    }

    Ok(())
}

/// Validates that a value parses as an absolute http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}
