//! The shopping pipeline
//!
//! Strictly linear: search every item in list order, join the blocks,
//! analyze once, recommend once. Search failures are contained in the
//! search stage; model failures end the run.

use std::sync::Arc;

use chrono::Utc;
use eyre::Context;
use tracing::{debug, error, info, warn};

mod aggregate;
mod error;
mod events;
mod search;

pub use aggregate::{SEPARATOR, join_blocks};
pub use error::PipelineError;
pub use events::{EventSender, PipelineEvent, PipelineStatus};
pub use search::{ItemSearch, SearchResultRecord, build_query, format_records, store_label};

use crate::agents::Agents;
use crate::config::{Config, SearchMode};
use crate::domain::{Region, ShoppingList, ShoppingReport};
use crate::llm::{LlmClient, Message, create_client};
use crate::prompts::{PromptContext, PromptLoader};
use crate::search::create_backend;
use events::emit;

/// Collaborators and settings for running the pipeline
pub struct Pipeline {
    llm: Arc<dyn LlmClient>,
    search: ItemSearch,
    agents: Agents,
    country: String,
    mode: SearchMode,
}

impl Pipeline {
    pub fn new(llm: Arc<dyn LlmClient>, search: ItemSearch, agents: Agents, config: &Config) -> Self {
        Self {
            llm,
            search,
            agents,
            country: config.shopping.country.clone(),
            mode: config.search.mode,
        }
    }

    /// Build the configured LLM client, search backend and agents
    pub fn from_config(config: &Config, loader: &PromptLoader) -> eyre::Result<Self> {
        debug!(llm = %config.llm.provider, search = %config.search.provider, "Pipeline::from_config: called");
        let llm = create_client(&config.llm).context("Failed to create LLM client")?;
        let backend = create_backend(&config.search).context("Failed to create search backend")?;
        let context = PromptContext::from_shopping(&config.shopping);
        let agents = Agents::load(loader, &context, config.llm.max_tokens)?;
        let search = ItemSearch::new(backend, &config.shopping, &config.search);
        Ok(Self::new(llm, search, agents, config))
    }

    pub fn agents(&self) -> &Agents {
        &self.agents
    }

    /// Run the whole pipeline for `list`
    ///
    /// `region` only labels the report. When `events` is given, status
    /// changes are published on it.
    pub async fn run(
        &self,
        list: &ShoppingList,
        region: Region,
        events: Option<&EventSender>,
    ) -> Result<ShoppingReport, PipelineError> {
        debug!(items = list.len(), %region, mode = ?self.mode, "Pipeline::run: called");
        let result = self.run_stages(list, region, events).await;
        match &result {
            Ok(_) => {
                emit(events, PipelineEvent::StatusChanged(PipelineStatus::Done));
                emit(events, PipelineEvent::Finished);
            }
            Err(e) => {
                error!(stage = e.stage(), error = %e, "Pipeline run failed");
                emit(events, PipelineEvent::StatusChanged(PipelineStatus::Failed));
                emit(events, PipelineEvent::Failed(e.to_string()));
            }
        }
        result
    }

    async fn run_stages(
        &self,
        list: &ShoppingList,
        region: Region,
        events: Option<&EventSender>,
    ) -> Result<ShoppingReport, PipelineError> {
        if list.is_empty() {
            return Err(PipelineError::EmptyList);
        }

        info!(items = list.len(), "Searching for prices");
        emit(events, PipelineEvent::StatusChanged(PipelineStatus::Searching));
        let total = list.len();
        let mut blocks = Vec::with_capacity(total);
        for (i, item) in list.iter().enumerate() {
            emit(
                events,
                PipelineEvent::SearchingItem {
                    index: i + 1,
                    total,
                    item: item.to_string(),
                },
            );
            blocks.push(self.search_block(item).await);
        }
        let raw_prices = join_blocks(&blocks);

        info!("Analyzing prices");
        emit(events, PipelineEvent::StatusChanged(PipelineStatus::Analyzing));
        let analysis = self
            .agents
            .analyzer
            .run(self.llm.as_ref(), vec![Message::user(self.analysis_message(&raw_prices))])
            .await
            .map_err(PipelineError::Analysis)?;

        info!("Creating shopping plan");
        emit(events, PipelineEvent::StatusChanged(PipelineStatus::Recommending));
        let plan = self
            .agents
            .recommender
            .run(self.llm.as_ref(), vec![Message::user(self.recommendation_message(&analysis))])
            .await
            .map_err(PipelineError::Recommendation)?;

        info!("Analysis complete");
        Ok(ShoppingReport {
            items: list.items().to_vec(),
            region,
            raw_prices,
            analysis,
            plan,
            generated_at: Utc::now(),
        })
    }

    /// One item's raw block in the configured search mode
    async fn search_block(&self, item: &str) -> String {
        match self.mode {
            SearchMode::Direct => self.search.search_item(item).await,
            SearchMode::Agent => {
                let message = Message::user(format!("Find current prices for {} in {} stores", item, self.country));
                match self
                    .agents
                    .searcher
                    .run_with_functions(self.llm.as_ref(), vec![message], &self.search)
                    .await
                {
                    Ok(text) if !text.trim().is_empty() => text,
                    Ok(_) => {
                        warn!(%item, "Searcher returned no text, using direct search");
                        self.search.search_item(item).await
                    }
                    Err(e) => {
                        warn!(%item, error = %e, "Searcher failed, using direct search");
                        self.search.search_item(item).await
                    }
                }
            }
        }
    }

    fn analysis_message(&self, raw_prices: &str) -> String {
        format!(
            "Analyze these {} prices and find the best deals:\n{}",
            self.country, raw_prices
        )
    }

    fn recommendation_message(&self, analysis: &str) -> String {
        format!(
            "Create a shopping plan for {} stores based on this analysis:\n{}",
            self.country, analysis
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Agent, AgentRole};
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, LlmError, StopReason, TokenUsage, ToolCall};
    use crate::search::SearchHit;
    use crate::search::mock::MockSearch;
    use tokio::sync::mpsc;

    fn agents() -> Agents {
        Agents {
            searcher: Agent::new(AgentRole::Searcher, "searcher"),
            analyzer: Agent::new(AgentRole::Analyzer, "analyzer"),
            recommender: Agent::new(AgentRole::Recommender, "recommender"),
        }
    }

    fn pipeline(llm: Arc<MockLlmClient>, search: Arc<MockSearch>, mode: SearchMode) -> Pipeline {
        let mut config = Config::default();
        config.search.mode = mode;
        let item_search = ItemSearch::new(search, &config.shopping, &config.search);
        Pipeline::new(llm, item_search, agents(), &config)
    }

    fn list(items: &[&str]) -> ShoppingList {
        items.iter().collect()
    }

    fn text_of(message: &Message) -> &str {
        message.content.as_text().unwrap_or_default()
    }

    #[test]
    fn test_from_config_defaults() {
        let p = Pipeline::from_config(&Config::default(), &PromptLoader::embedded_only()).unwrap();
        assert_eq!(p.agents().searcher.name, "SA Price Searcher");
        assert!(p.agents().recommender.instructions.contains("ZAR"));
    }

    #[tokio::test]
    async fn test_empty_list_rejected_before_any_call() {
        let llm = Arc::new(MockLlmClient::new(vec![]));
        let search = Arc::new(MockSearch::new());
        let p = pipeline(llm.clone(), search.clone(), SearchMode::Direct);

        let err = p.run(&ShoppingList::new(), Region::Gauteng, None).await.unwrap_err();

        assert!(matches!(err, PipelineError::EmptyList));
        assert!(search.queries().is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_searches_each_item_once_in_order() {
        let llm = Arc::new(MockLlmClient::new(vec![
            CompletionResponse::text("analysis"),
            CompletionResponse::text("plan"),
        ]));
        let search = Arc::new(MockSearch::new());
        let p = pipeline(llm, search.clone(), SearchMode::Direct);

        p.run(&list(&["milk", "bread", "milk", "eggs"]), Region::Gauteng, None)
            .await
            .unwrap();

        let items: Vec<String> = search
            .queries()
            .iter()
            .map(|q| q.split(" price ").next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(items, vec!["milk", "bread", "milk", "eggs"]);
    }

    #[tokio::test]
    async fn test_zero_results_flow_through_both_models() {
        let llm = Arc::new(MockLlmClient::new(vec![
            CompletionResponse::text("the analysis"),
            CompletionResponse::text("the plan"),
        ]));
        let p = pipeline(llm.clone(), Arc::new(MockSearch::new()), SearchMode::Direct);

        let report = p.run(&list(&["milk", "bread"]), Region::WesternCape, None).await.unwrap();

        let expected_raw = "No price information found for milk.\n\n---\n\nNo price information found for bread.";
        assert_eq!(report.raw_prices, expected_raw);
        assert_eq!(report.analysis, "the analysis");
        assert_eq!(report.plan, "the plan");
        assert_eq!(report.region, Region::WesternCape);
        assert_eq!(report.items, vec!["milk", "bread"]);

        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].system_prompt, "analyzer");
        assert_eq!(
            text_of(&requests[0].messages[0]),
            format!("Analyze these South Africa prices and find the best deals:\n{}", expected_raw)
        );
        assert_eq!(requests[1].system_prompt, "recommender");
        assert_eq!(
            text_of(&requests[1].messages[0]),
            "Create a shopping plan for South Africa stores based on this analysis:\nthe analysis"
        );
    }

    #[tokio::test]
    async fn test_failing_search_still_completes() {
        let llm = Arc::new(MockLlmClient::new(vec![
            CompletionResponse::text("analysis"),
            CompletionResponse::text("plan"),
        ]));
        let search = Arc::new(
            MockSearch::new()
                .failing_for("bread")
                .with_hits("milk", vec![SearchHit::new("Makro - Milk 6x1L", "https://m", "R109")]),
        );
        let p = pipeline(llm, search, SearchMode::Direct);

        let report = p.run(&list(&["milk", "bread"]), Region::Gauteng, None).await.unwrap();

        let blocks: Vec<&str> = report.raw_prices.split(SEPARATOR).collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("Store: Makro\n"));
        assert!(blocks[1].starts_with("Error searching prices: "));
    }

    #[tokio::test]
    async fn test_analysis_failure_skips_recommendation() {
        let llm = Arc::new(MockLlmClient::scripted(vec![
            Err(LlmError::ApiError {
                status: 503,
                message: "overloaded".to_string(),
            }),
            Ok(CompletionResponse::text("never used")),
        ]));
        let p = pipeline(llm.clone(), Arc::new(MockSearch::new()), SearchMode::Direct);

        let err = p.run(&list(&["milk"]), Region::Gauteng, None).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Analysis(LlmError::ApiError { status: 503, ref message }) if message == "overloaded"
        ));
        assert!(err.to_string().starts_with("Shopping list processing failed: "));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_recommendation_failure() {
        let llm = Arc::new(MockLlmClient::scripted(vec![
            Ok(CompletionResponse::text("analysis")),
            Err(LlmError::InvalidResponse("truncated".to_string())),
        ]));
        let p = pipeline(llm, Arc::new(MockSearch::new()), SearchMode::Direct);

        let err = p.run(&list(&["milk"]), Region::Gauteng, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Recommendation(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_events_follow_status_machine() {
        let llm = Arc::new(MockLlmClient::new(vec![
            CompletionResponse::text("analysis"),
            CompletionResponse::text("plan"),
        ]));
        let p = pipeline(llm, Arc::new(MockSearch::new()), SearchMode::Direct);
        let (tx, mut rx) = mpsc::unbounded_channel();

        p.run(&list(&["milk", "bread"]), Region::Gauteng, Some(&tx)).await.unwrap();
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                PipelineEvent::StatusChanged(PipelineStatus::Searching),
                PipelineEvent::SearchingItem {
                    index: 1,
                    total: 2,
                    item: "milk".to_string()
                },
                PipelineEvent::SearchingItem {
                    index: 2,
                    total: 2,
                    item: "bread".to_string()
                },
                PipelineEvent::StatusChanged(PipelineStatus::Analyzing),
                PipelineEvent::StatusChanged(PipelineStatus::Recommending),
                PipelineEvent::StatusChanged(PipelineStatus::Done),
                PipelineEvent::Finished,
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_event_carries_message() {
        let llm = Arc::new(MockLlmClient::new(vec![]));
        let p = pipeline(llm, Arc::new(MockSearch::new()), SearchMode::Direct);
        let (tx, mut rx) = mpsc::unbounded_channel();

        assert!(p.run(&list(&["milk"]), Region::Gauteng, Some(&tx)).await.is_err());
        drop(tx);

        let mut last = None;
        while let Some(event) = rx.recv().await {
            last = Some(event);
        }
        match last {
            Some(PipelineEvent::Failed(message)) => {
                assert!(message.starts_with("Shopping list processing failed: "));
            }
            other => panic!("Expected Failed event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_agent_mode_uses_searcher_output() {
        let llm = Arc::new(MockLlmClient::new(vec![
            CompletionResponse {
                content: None,
                tool_calls: vec![ToolCall {
                    id: "call_1".to_string(),
                    name: "search_prices".to_string(),
                    input: serde_json::json!({"item": "milk"}),
                }],
                stop_reason: StopReason::ToolUse,
                usage: TokenUsage::default(),
            },
            CompletionResponse::text("Milk: R29.99 at Checkers"),
            CompletionResponse::text("analysis"),
            CompletionResponse::text("plan"),
        ]));
        let search = Arc::new(MockSearch::new());
        let p = pipeline(llm.clone(), search.clone(), SearchMode::Agent);

        let report = p.run(&list(&["milk"]), Region::Gauteng, None).await.unwrap();

        assert_eq!(report.raw_prices, "Milk: R29.99 at Checkers");
        assert_eq!(search.queries().len(), 1);
        let requests = llm.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(
            text_of(&requests[0].messages[0]),
            "Find current prices for milk in South Africa stores"
        );
    }

    #[tokio::test]
    async fn test_agent_mode_falls_back_to_direct_search() {
        let llm = Arc::new(MockLlmClient::scripted(vec![
            Err(LlmError::InvalidResponse("searcher down".to_string())),
            Ok(CompletionResponse::text("analysis")),
            Ok(CompletionResponse::text("plan")),
        ]));
        let search = Arc::new(MockSearch::new());
        let p = pipeline(llm, search.clone(), SearchMode::Agent);

        let report = p.run(&list(&["milk"]), Region::Gauteng, None).await.unwrap();

        assert_eq!(report.raw_prices, "No price information found for milk.");
        assert_eq!(search.queries().len(), 1);
        assert_eq!(report.plan, "plan");
    }

    #[tokio::test]
    async fn test_agent_mode_turn_cap_falls_back_to_direct_search() {
        let narrated_tool_turn = |i: usize| CompletionResponse {
            content: Some("Let me search for that.".to_string()),
            tool_calls: vec![ToolCall {
                id: format!("call_{}", i),
                name: "search_prices".to_string(),
                input: serde_json::json!({"item": "milk"}),
            }],
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::default(),
        };
        let mut replies: Vec<_> = (0..crate::agents::MAX_TURNS).map(narrated_tool_turn).collect();
        replies.push(CompletionResponse::text("analysis"));
        replies.push(CompletionResponse::text("plan"));
        let llm = Arc::new(MockLlmClient::new(replies));
        let search = Arc::new(MockSearch::new().with_hits(
            "milk",
            vec![SearchHit::new("Makro - Clover Milk 2L", "https://makro.example/milk", "R32.99")],
        ));
        let p = pipeline(llm, search.clone(), SearchMode::Agent);

        let report = p.run(&list(&["milk"]), Region::Gauteng, None).await.unwrap();

        assert!(report.raw_prices.starts_with("Store: Makro\nProduct: Makro - Clover Milk 2L"));
        assert!(!report.raw_prices.contains("Let me search for that."));
        // One query per tool call, then the direct fallback
        assert_eq!(search.queries().len(), crate::agents::MAX_TURNS + 1);
        assert_eq!(report.plan, "plan");
    }
}
