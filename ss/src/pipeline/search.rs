//! Item search stage
//!
//! One item in, one text block out. Search failures are folded into the
//! block so the run always continues.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tracing::{debug, error, info};

use crate::agents::{Capability, FunctionHandler};
use crate::config::{SearchConfig, ShoppingConfig};
use crate::search::{SearchBackend, SearchHit};

/// Query biased toward the configured retailers and the current month
pub fn build_query(item: &str, country: &str, retailers: &[String], today: NaiveDate) -> String {
    format!(
        "{} price {} {} {}",
        item,
        country,
        retailers.join(" "),
        today.format("%Y-%m")
    )
}

/// Best-effort store name: the title up to its first hyphen
pub fn store_label(title: &str) -> &str {
    title.split('-').next().unwrap_or(title).trim()
}

/// One search hit as presented to the models
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResultRecord {
    pub store: String,
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub timestamp: NaiveDate,
}

impl SearchResultRecord {
    pub fn from_hit(hit: &SearchHit, timestamp: NaiveDate) -> Self {
        Self {
            store: store_label(&hit.title).to_string(),
            title: hit.title.clone(),
            url: hit.url.clone(),
            snippet: hit.body.clone(),
            timestamp,
        }
    }
}

impl fmt::Display for SearchResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Store: {}\nProduct: {}\nURL: {}\nDetails: {}\nTimestamp: {}",
            self.store,
            self.title,
            self.url,
            self.snippet,
            self.timestamp.format("%Y-%m-%d")
        )
    }
}

/// Records separated by a blank line
pub fn format_records(records: &[SearchResultRecord]) -> String {
    records.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n\n")
}

/// Runs the per-item search against a backend
pub struct ItemSearch {
    backend: Arc<dyn SearchBackend>,
    country: String,
    retailers: Vec<String>,
    max_results: usize,
}

impl ItemSearch {
    pub fn new(backend: Arc<dyn SearchBackend>, shopping: &ShoppingConfig, search: &SearchConfig) -> Self {
        Self {
            backend,
            country: shopping.country.clone(),
            retailers: shopping.retailers.clone(),
            max_results: search.max_results,
        }
    }

    /// Search `item` as of today
    pub async fn search_item(&self, item: &str) -> String {
        self.search_item_on(item, Local::now().date_naive()).await
    }

    /// Search `item` as of `today`; never fails
    pub async fn search_item_on(&self, item: &str, today: NaiveDate) -> String {
        let query = build_query(item, &self.country, &self.retailers, today);
        debug!(%item, %query, backend = self.backend.name(), "ItemSearch::search_item_on: called");

        match self.backend.search(&query, self.max_results).await {
            Ok(hits) if hits.is_empty() => {
                info!(%item, "No search results");
                format!("No price information found for {}.", item)
            }
            Ok(hits) => {
                info!(%item, count = hits.len(), "Search results found");
                let records: Vec<_> = hits.iter().map(|h| SearchResultRecord::from_hit(h, today)).collect();
                format_records(&records)
            }
            Err(e) => {
                error!(%item, error = %e, "Error searching prices");
                format!("Error searching prices: {}", e)
            }
        }
    }
}

#[async_trait]
impl FunctionHandler for ItemSearch {
    async fn call(&self, capability: Capability, input: &serde_json::Value) -> Result<String, String> {
        debug!(?capability, "ItemSearch::call: called");
        match capability {
            Capability::SearchPrices => {
                let item = input["item"]
                    .as_str()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| "search_prices needs a non-empty 'item' string".to_string())?;
                Ok(self.search_item(item).await)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::mock::MockSearch;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    fn stage(mock: MockSearch) -> (Arc<MockSearch>, ItemSearch) {
        let mock = Arc::new(mock);
        let search = ItemSearch::new(mock.clone(), &ShoppingConfig::default(), &SearchConfig::default());
        (mock, search)
    }

    #[test]
    fn test_build_query_default_market() {
        let retailers = ShoppingConfig::default().retailers;
        assert_eq!(
            build_query("milk", "South Africa", &retailers, day()),
            "milk price South Africa Makro Checkers Shoprite Woolworths PnP 2026-03"
        );
    }

    #[test]
    fn test_store_label() {
        assert_eq!(store_label("Checkers - Clover Milk 2L"), "Checkers");
        assert_eq!(store_label("Woolworths Full Cream Milk"), "Woolworths Full Cream Milk");
        assert_eq!(store_label("  Makro-Bulk-Deals "), "Makro");
        assert_eq!(store_label("- leading hyphen"), "");
    }

    #[test]
    fn test_record_display() {
        let hit = SearchHit::new(
            "Shoprite - Albany Bread 700g",
            "https://shoprite.co.za/bread",
            "R17.99 this week",
        );
        let record = SearchResultRecord::from_hit(&hit, day());
        assert_eq!(
            record.to_string(),
            "Store: Shoprite\nProduct: Shoprite - Albany Bread 700g\nURL: https://shoprite.co.za/bread\n\
             Details: R17.99 this week\nTimestamp: 2026-03-07"
        );
    }

    #[tokio::test]
    async fn test_search_item_formats_hits() {
        let (mock, search) = stage(MockSearch::new().with_hits(
            "eggs",
            vec![
                SearchHit::new("Checkers - Eggs 18", "https://a", "R54.99"),
                SearchHit::new("PnP Eggs", "https://b", "R59.99"),
            ],
        ));

        let block = search.search_item_on("eggs", day()).await;

        assert!(block.starts_with("Store: Checkers\nProduct: Checkers - Eggs 18"));
        assert!(block.contains("\n\nStore: PnP Eggs\n"));
        assert_eq!(block.matches("Timestamp: 2026-03-07").count(), 2);
        assert_eq!(mock.queries().len(), 1);
        assert!(mock.queries()[0].starts_with("eggs price South Africa"));
    }

    #[tokio::test]
    async fn test_search_item_zero_results() {
        let (_, search) = stage(MockSearch::new());
        assert_eq!(
            search.search_item_on("milk", day()).await,
            "No price information found for milk."
        );
    }

    #[tokio::test]
    async fn test_search_item_failure_is_contained() {
        let (_, search) = stage(MockSearch::new().failing_for("bread"));
        let block = search.search_item_on("bread", day()).await;
        assert!(block.starts_with("Error searching prices: "));
        assert!(block.contains("simulated outage"));
    }

    #[tokio::test]
    async fn test_function_handler_validates_input() {
        let (mock, search) = stage(MockSearch::new());

        let err = search
            .call(Capability::SearchPrices, &serde_json::json!({"item": "  "}))
            .await
            .unwrap_err();
        assert!(err.contains("item"));
        assert!(mock.queries().is_empty());

        let out = search
            .call(Capability::SearchPrices, &serde_json::json!({"item": "rice"}))
            .await
            .unwrap();
        assert_eq!(out, "No price information found for rice.");
    }
}
