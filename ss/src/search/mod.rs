//! Web search backends
//!
//! One operation: run a text query and return up to `max_results` hits.
//! DuckDuckGo needs no key and is the default; Tavily, Brave and SerpAPI
//! read their keys from the environment.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

mod api;
mod duckduckgo;

pub use api::{BraveSearch, SerpApiSearch, TavilySearch};
pub use duckduckgo::DuckDuckGoSearch;

use crate::config::SearchConfig;

/// Browser-like user agent; the DuckDuckGo HTML endpoint rejects obvious bots
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// One raw search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub body: String,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            body: body.into(),
        }
    }
}

/// Errors from a search backend
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{provider} API error {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Failed to parse search response: {0}")]
    Parse(String),

    #[error("No API key for {provider}. Set the {env} environment variable.")]
    MissingApiKey { provider: &'static str, env: &'static str },

    #[error("Unknown search provider: '{0}'. Supported: duckduckgo, tavily, brave, serpapi")]
    UnknownProvider(String),
}

/// A web text search collaborator
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Run `query`, returning at most `max_results` hits
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}

/// Build the HTTP client shared by all backends
pub(crate) fn build_http(timeout: Duration) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(SearchError::Request)
}

/// Read a provider key from the environment
fn key_from_env(provider: &'static str, env: &'static str) -> Result<String, SearchError> {
    std::env::var(env)
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or(SearchError::MissingApiKey { provider, env })
}

/// Create the backend named in config
pub fn create_backend(config: &SearchConfig) -> Result<Arc<dyn SearchBackend>, SearchError> {
    debug!(provider = %config.provider, "create_backend: called");
    let timeout = Duration::from_millis(config.timeout_ms);
    match config.provider.as_str() {
        "duckduckgo" | "ddg" => Ok(Arc::new(DuckDuckGoSearch::new(timeout)?)),
        "tavily" => {
            let key = key_from_env("tavily", "TAVILY_API_KEY")?;
            Ok(Arc::new(TavilySearch::new(key, timeout)?))
        }
        "brave" => {
            let key = key_from_env("brave", "BRAVE_API_KEY")?;
            Ok(Arc::new(BraveSearch::new(key, timeout)?))
        }
        "serpapi" => {
            let key = key_from_env("serpapi", "SERPAPI_KEY")?;
            Ok(Arc::new(SerpApiSearch::new(key, timeout)?))
        }
        other => Err(SearchError::UnknownProvider(other.to_string())),
    }
}
