//! Keyed search APIs: Tavily, Brave Search and SerpAPI

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{SearchBackend, SearchError, SearchHit, build_http};

/// Turn a non-success response into an API error
async fn check_status(provider: &'static str, response: reqwest::Response) -> Result<Value, SearchError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        return Err(SearchError::Api {
            provider,
            status,
            message,
        });
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| SearchError::Parse(e.to_string()))
}

/// Map a JSON array of results into hits using the provider's field names
fn hits_from(results: Option<&Vec<Value>>, url_key: &str, body_key: &str, max_results: usize) -> Vec<SearchHit> {
    results
        .map(|results| {
            results
                .iter()
                .take(max_results)
                .map(|r| SearchHit {
                    title: r["title"].as_str().unwrap_or("(no title)").to_string(),
                    url: r[url_key].as_str().unwrap_or("").to_string(),
                    body: r[body_key].as_str().unwrap_or("").to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Tavily search API
pub struct TavilySearch {
    api_key: String,
    http: reqwest::Client,
}

impl TavilySearch {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, SearchError> {
        Ok(Self {
            api_key,
            http: build_http(timeout)?,
        })
    }
}

#[async_trait]
impl SearchBackend for TavilySearch {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        debug!(%query, max_results, "TavilySearch::search: called");
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "search_depth": "basic"
        });

        let response = self.http.post("https://api.tavily.com/search").json(&body).send().await?;
        let result = check_status("tavily", response).await?;
        Ok(hits_from(result["results"].as_array(), "url", "content", max_results))
    }
}

/// Brave Search API
pub struct BraveSearch {
    api_key: String,
    http: reqwest::Client,
}

impl BraveSearch {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, SearchError> {
        Ok(Self {
            api_key,
            http: build_http(timeout)?,
        })
    }
}

#[async_trait]
impl SearchBackend for BraveSearch {
    fn name(&self) -> &'static str {
        "brave"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        debug!(%query, max_results, "BraveSearch::search: called");
        let response = self
            .http
            .get("https://api.search.brave.com/res/v1/web/search")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", &max_results.to_string())])
            .send()
            .await?;

        let result = check_status("brave", response).await?;
        Ok(hits_from(
            result["web"]["results"].as_array(),
            "url",
            "description",
            max_results,
        ))
    }
}

/// SerpAPI (Google engine)
pub struct SerpApiSearch {
    api_key: String,
    http: reqwest::Client,
}

impl SerpApiSearch {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, SearchError> {
        Ok(Self {
            api_key,
            http: build_http(timeout)?,
        })
    }
}

#[async_trait]
impl SearchBackend for SerpApiSearch {
    fn name(&self) -> &'static str {
        "serpapi"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        debug!(%query, max_results, "SerpApiSearch::search: called");
        let response = self
            .http
            .get("https://serpapi.com/search")
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", &max_results.to_string()),
                ("engine", "google"),
            ])
            .send()
            .await?;

        let result = check_status("serpapi", response).await?;
        Ok(hits_from(
            result["organic_results"].as_array(),
            "link",
            "snippet",
            max_results,
        ))
    }
}
