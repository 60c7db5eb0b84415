//! Outbound HTTP for every upstream host
//!
//! This module contains:
//! - The resilient fetcher (timeouts, retries, relay routing)
//! - The retry policy and its backoff arithmetic
//! - Pluggable identity strategies for request headers

mod fetcher;
mod identity;
mod retry;

pub use fetcher::{build_http_client, FetchOptions, FetchedPage, Fetcher};
pub use identity::{identity_from_pool, FixedIdentity, IdentityStrategy, RotatingIdentity};
pub use retry::RetryPolicy;
