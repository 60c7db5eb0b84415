//! Identifying headers sent with each request attempt
//!
//! The header set is a pluggable strategy so the fetcher never special-cases
//! how a client identity is chosen.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Chooses the identifying headers for the next request attempt
pub trait IdentityStrategy: Send + Sync + Debug {
    /// User-Agent for the next attempt
    fn next_user_agent(&self) -> String;

    /// Full header set for the next attempt
    fn next_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.next_user_agent()) {
            headers.insert(USER_AGENT, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/json;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));
        headers
    }
}

/// Always sends the same User-Agent
#[derive(Debug, Clone)]
pub struct FixedIdentity {
    user_agent: String,
}

impl FixedIdentity {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl IdentityStrategy for FixedIdentity {
    fn next_user_agent(&self) -> String {
        self.user_agent.clone()
    }
}

/// Cycles round-robin through a fixed pool of User-Agents
#[derive(Debug)]
pub struct RotatingIdentity {
    agents: Vec<String>,
    cursor: AtomicUsize,
}

impl RotatingIdentity {
    /// Returns `None` for an empty pool
    pub fn new(agents: Vec<String>) -> Option<Self> {
        if agents.is_empty() {
            return None;
        }
        Some(Self {
            agents,
            cursor: AtomicUsize::new(0),
        })
    }
}

impl IdentityStrategy for RotatingIdentity {
    fn next_user_agent(&self) -> String {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.agents.len();
        self.agents[index].clone()
    }
}

/// Builds the strategy matching a configured User-Agent pool
///
/// A single entry yields a fixed identity, several entries rotate.
pub fn identity_from_pool(agents: &[String]) -> Arc<dyn IdentityStrategy> {
    match agents {
        [] => Arc::new(FixedIdentity::new(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))),
        [single] => Arc::new(FixedIdentity::new(single.clone())),
        many => match RotatingIdentity::new(many.to_vec()) {
            Some(rotating) => Arc::new(rotating),
            None => Arc::new(FixedIdentity::new(many[0].clone())),
        },
    }
}
