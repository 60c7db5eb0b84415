//! Resilient HTTP fetcher
//!
//! This module handles every outbound GET request, including:
//! - Building the HTTP client
//! - Per-attempt timeouts
//! - Retry with capped exponential backoff and jitter
//! - Identifying headers chosen per attempt by an `IdentityStrategy`
//! - Optional rewriting through a forwarding relay

use crate::config::FetcherConfig;
use crate::fetch::identity::{identity_from_pool, IdentityStrategy};
use crate::fetch::retry::RetryPolicy;
use crate::{FetchError, FetchResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Longest body excerpt carried in a status error
const SNIPPET_LEN: usize = 200;

/// A successfully fetched response body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,
}

/// Per-call request options
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Headers added on top of the identity headers
    pub headers: HeaderMap,

    /// Route through the configured relay, when there is one
    pub use_relay: bool,

    /// Overrides the policy's attempt count for this call
    pub max_attempts: Option<u32>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            headers: HeaderMap::new(),
            use_relay: true,
            max_attempts: None,
        }
    }
}

impl FetchOptions {
    /// Options that bypass the relay
    pub fn direct() -> Self {
        Self {
            use_relay: false,
            ..Self::default()
        }
    }

    /// Adds an `Authorization: Bearer` header; an invalid token is ignored
    pub fn with_bearer(mut self, token: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            self.headers.insert(AUTHORIZATION, value);
        }
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

/// Builds the underlying HTTP client
///
/// User-Agent is not set here; it is chosen per attempt by the identity strategy.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP GET with timeout, retries and pluggable identity
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    identity: Arc<dyn IdentityStrategy>,
    relay: Option<Url>,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(
        client: Client,
        policy: RetryPolicy,
        identity: Arc<dyn IdentityStrategy>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            policy,
            identity,
            relay: None,
            timeout,
        }
    }

    /// Builds a fetcher from the `[fetcher]` configuration section
    ///
    /// # Example
    ///
    /// ```no_run
    /// use reel_dates::config::FetcherConfig;
    /// use reel_dates::fetch::Fetcher;
    ///
    /// let fetcher = Fetcher::from_config(&FetcherConfig::default()).unwrap();
    /// ```
    pub fn from_config(config: &FetcherConfig) -> crate::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = build_http_client(timeout)?;
        let mut fetcher = Self::new(
            client,
            RetryPolicy::from_config(config),
            identity_from_pool(&config.user_agents),
            timeout,
        );
        if let Some(relay) = &config.relay_url {
            fetcher = fetcher.with_relay(Url::parse(relay)?);
        }
        Ok(fetcher)
    }

    pub fn with_relay(mut self, relay: Url) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Returns the URL actually requested for `url`
    ///
    /// With a relay configured and `use_relay` set, the original URL is passed
    /// as the relay's `url` query parameter.
    pub fn request_url(&self, url: &str, use_relay: bool) -> FetchResult<String> {
        match (&self.relay, use_relay) {
            (Some(relay), true) => {
                if Url::parse(url).is_err() {
                    return Err(FetchError::Relay {
                        url: url.to_string(),
                        message: "target is not an absolute URL".to_string(),
                    });
                }
                let mut routed = relay.clone();
                routed.query_pairs_mut().append_pair("url", url);
                Ok(routed.to_string())
            }
            _ => Ok(url.to_string()),
        }
    }

    /// Fetches a URL, retrying failed attempts
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Return body |
    /// | 403 / 429 | Retry (blocking or rate limiting) |
    /// | Other non-2xx | Retry, body snippet kept for the final error |
    /// | Timeout | Retry |
    /// | Network error | Retry |
    ///
    /// After the last attempt fails, returns `FetchError::Exhausted` wrapping
    /// the last cause.
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> FetchResult<FetchedPage> {
        let target = self.request_url(url, options.use_relay)?;
        let max_attempts = options
            .max_attempts
            .unwrap_or(self.policy.max_attempts)
            .max(1);

        let mut attempt = 1;
        loop {
            match self.attempt(&target, options).await {
                Ok(page) => {
                    tracing::debug!("Fetched {} (attempt {}/{})", url, attempt, max_attempts);
                    return Ok(page);
                }
                Err(err) if attempt >= max_attempts => {
                    tracing::warn!(
                        "Fetch of {} failed on final attempt {}/{}: {}",
                        url,
                        attempt,
                        max_attempts,
                        err
                    );
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = self.policy.backoff(attempt);
                    if err.is_rate_limited() {
                        tracing::warn!(
                            "Blocked or rate limited on {} (attempt {}/{}), backing off {}ms",
                            url,
                            attempt,
                            max_attempts,
                            delay.as_millis()
                        );
                    } else {
                        tracing::warn!(
                            "Attempt {}/{} for {} failed: {}; retrying in {}ms",
                            attempt,
                            max_attempts,
                            url,
                            err,
                            delay.as_millis()
                        );
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Performs a single request attempt bounded by the timeout
    async fn attempt(&self, target: &str, options: &FetchOptions) -> FetchResult<FetchedPage> {
        let mut headers = self.identity.next_headers();
        headers.extend(options.headers.clone());

        let request = async {
            let response = self
                .client
                .get(target)
                .headers(headers)
                .send()
                .await
                .map_err(|e| self.classify(target, e))?;

            let status = response.status();
            let final_url = response.url().to_string();
            let body = response.text().await.map_err(|e| self.classify(target, e))?;

            if !status.is_success() {
                return Err(FetchError::Status {
                    url: target.to_string(),
                    status: status.as_u16(),
                    snippet: body_snippet(&body),
                });
            }

            Ok::<FetchedPage, FetchError>(FetchedPage {
                url: final_url,
                status: status.as_u16(),
                body,
            })
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: target.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }),
        }
    }

    fn classify(&self, target: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: target.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            FetchError::Network {
                url: target.to_string(),
                source: err,
            }
        }
    }
}

/// Collapses whitespace and truncates a body for error messages
fn body_snippet(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= SNIPPET_LEN {
        collapsed
    } else {
        let truncated: String = collapsed.chars().take(SNIPPET_LEN).collect();
        format!("{}...", truncated)
    }
}
