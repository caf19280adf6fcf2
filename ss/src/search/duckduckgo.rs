//! DuckDuckGo HTML search (no API key)

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use scraper::{Html, Selector};
use tracing::debug;

use super::{SearchBackend, SearchError, SearchHit, build_http};

const ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Scrapes the DuckDuckGo HTML results page
pub struct DuckDuckGoSearch {
    http: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(timeout: Duration) -> Result<Self, SearchError> {
        Ok(Self {
            http: build_http(timeout)?,
        })
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoSearch {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        debug!(%query, max_results, "DuckDuckGoSearch::search: called");
        let response = self
            .http
            .post(ENDPOINT)
            .form(&[("q", query)])
            .header("Accept", "text/html")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                provider: "duckduckgo",
                status,
                message,
            });
        }

        let body = response.text().await?;
        let hits = parse_results(&body, max_results)?;
        debug!(count = hits.len(), "DuckDuckGoSearch::search: parsed results");
        Ok(hits)
    }
}

fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::Parse(format!("bad selector '{}': {}", css, e)))
}

/// Extract hits from a results page
///
/// Sponsored results and results without a title are skipped; the page's
/// order is kept.
pub(crate) fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
    let result_sel = selector(".result:not(.result--ad)")?;
    let link_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let doc = Html::parse_document(html);
    let mut hits = Vec::new();

    for result in doc.select(&result_sel) {
        if hits.len() >= max_results {
            break;
        }

        let link = result.select(&link_sel).next();
        let title = link
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default()
            .trim()
            .to_string();
        if title.is_empty() {
            continue;
        }

        let url = link
            .and_then(|el| el.value().attr("href"))
            .map(extract_ddg_url)
            .unwrap_or_default();

        let body = result
            .select(&snippet_sel)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default()
            .trim()
            .to_string();

        hits.push(SearchHit { title, url, body });
    }

    Ok(hits)
}

/// DDG wraps result URLs in redirect links like
/// `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`.
/// Extract and percent-decode the destination.
fn extract_ddg_url(href: &str) -> String {
    if let Some(pos) = href.find("uddg=") {
        let start = pos + 5;
        let end = href[start..].find('&').map(|i| start + i).unwrap_or(href.len());
        let encoded = &href[start..end];
        if !encoded.is_empty() {
            return percent_decode_str(encoded).decode_utf8_lossy().into_owned();
        }
    }
    href.to_string()
}
