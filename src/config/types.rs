use serde::Deserialize;

/// Main configuration structure for Reel-Dates
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub catalogue: CatalogueConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Outbound request behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,

    /// Total attempts before a fetch fails
    pub max_attempts: u32,

    /// Base delay for exponential backoff (milliseconds)
    pub backoff_base_ms: u64,

    /// Upper bound of the exponential part of the backoff (milliseconds)
    pub backoff_cap_ms: u64,

    /// Maximum random jitter added to each backoff (milliseconds)
    pub jitter_ms: u64,

    /// User-Agent pool, rotated round-robin per attempt
    pub user_agents: Vec<String>,

    /// Optional relay endpoint; the original URL is passed as `?url=`
    pub relay_url: Option<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_attempts: 4,
            backoff_base_ms: 400,
            backoff_cap_ms: 8_000,
            jitter_ms: 250,
            user_agents: default_user_agents(),
            relay_url: None,
        }
    }
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Film-list host
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ListingConfig {
    pub base_url: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://letterboxd.com".to_string(),
        }
    }
}

/// Metadata catalogue API
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CatalogueConfig {
    pub base_url: String,

    /// Bearer token; metadata lookups are skipped when absent
    pub token: Option<String>,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org".to_string(),
            token: None,
        }
    }
}

/// Fan-out and politeness settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Number of concurrent item workers
    pub concurrency: usize,

    /// Lower bound of the randomized delay between list pages (milliseconds)
    pub page_delay_min_ms: u64,

    /// Upper bound of the randomized delay between list pages (milliseconds)
    pub page_delay_max_ms: u64,

    /// Pause after each item task (milliseconds)
    pub item_delay_ms: u64,

    /// Upper bound on list pages fetched, whatever the pagination claims
    pub max_pages: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            page_delay_min_ms: 300,
            page_delay_max_ms: 900,
            item_delay_ms: 150,
            max_pages: 100,
        }
    }
}
