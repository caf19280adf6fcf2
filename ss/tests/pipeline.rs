//! End-to-end pipeline tests against scripted collaborators

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use smartshopper::config::Config;
use smartshopper::domain::{Region, ShoppingList};
use smartshopper::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use smartshopper::pipeline::{ItemSearch, Pipeline, PipelineError, PipelineEvent, PipelineStatus};
use smartshopper::prompts::{PromptContext, PromptLoader};
use smartshopper::search::{SearchBackend, SearchError, SearchHit};
use smartshopper::Agents;

/// Replies in order and records every request
struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    fn new(replies: Vec<Result<CompletionResponse, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn user_messages(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.messages.first().and_then(|m| m.content.as_text()).map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".to_string())))
    }
}

/// One hit per item, except items containing "offline"
struct StoreSearch {
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl SearchBackend for StoreSearch {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        if query.contains("offline") {
            return Err(SearchError::Parse("backend offline".to_string()));
        }
        let item = query.split(" price ").next().unwrap_or(query);
        Ok(vec![SearchHit::new(
            format!("Checkers - {}", item),
            format!("https://checkers.example/{}", item.replace(' ', "-")),
            "R19.99",
        )])
    }
}

fn pipeline(llm: Arc<ScriptedLlm>, search: Arc<StoreSearch>) -> Pipeline {
    let config = Config::default();
    let context = PromptContext::from_shopping(&config.shopping);
    let agents = Agents::load(&PromptLoader::embedded_only(), &context, 1024).unwrap();
    let search = ItemSearch::new(search, &config.shopping, &config.search);
    Pipeline::new(llm, search, agents, &config)
}

fn store() -> Arc<StoreSearch> {
    Arc::new(StoreSearch {
        queries: Mutex::new(Vec::new()),
    })
}

#[tokio::test]
async fn test_full_run_produces_report() {
    let llm = ScriptedLlm::new(vec![
        Ok(CompletionResponse::text("Checkers wins on both")),
        Ok(CompletionResponse::text("1. Go to Checkers")),
    ]);
    let search = store();
    let list: ShoppingList = ["milk", "brown bread"].into_iter().collect();

    let report = pipeline(llm.clone(), search.clone())
        .run(&list, Region::FreeState, None)
        .await
        .unwrap();

    assert_eq!(report.items, vec!["milk", "brown bread"]);
    assert_eq!(report.region, Region::FreeState);
    assert_eq!(report.analysis, "Checkers wins on both");
    assert_eq!(report.plan, "1. Go to Checkers");
    assert!(report.raw_prices.contains("Product: Checkers - milk"));
    assert!(report.raw_prices.contains("\n\n---\n\nStore: Checkers\nProduct: Checkers - brown bread"));

    let queries = search.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 2);
    assert!(queries[0].starts_with("milk price South Africa"));
    assert!(queries[1].starts_with("brown bread price South Africa"));

    let messages = llm.user_messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].starts_with("Analyze these South Africa prices and find the best deals:\n"));
    assert!(messages[0].contains("https://checkers.example/brown-bread"));
    assert_eq!(
        messages[1],
        "Create a shopping plan for South Africa stores based on this analysis:\nCheckers wins on both"
    );

    let markdown = report.to_markdown();
    assert!(markdown.contains("Free State"));
    assert!(markdown.contains("1. Go to Checkers"));
}

#[tokio::test]
async fn test_search_outage_does_not_stop_run() {
    let llm = ScriptedLlm::new(vec![
        Ok(CompletionResponse::text("partial data")),
        Ok(CompletionResponse::text("plan anyway")),
    ]);
    let list: ShoppingList = ["offline cheese", "eggs"].into_iter().collect();

    let report = pipeline(llm, store()).run(&list, Region::Gauteng, None).await.unwrap();

    let blocks: Vec<&str> = report.raw_prices.split("\n\n---\n\n").collect();
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].starts_with("Error searching prices: "));
    assert!(blocks[1].starts_with("Store: Checkers"));
    assert_eq!(report.plan, "plan anyway");
}

#[tokio::test]
async fn test_analysis_failure_reports_events() {
    let llm = ScriptedLlm::new(vec![Err(LlmError::ApiError {
        status: 500,
        message: "overloaded".to_string(),
    })]);
    let list: ShoppingList = ["rice"].into_iter().collect();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let err = pipeline(llm.clone(), store())
        .run(&list, Region::Gauteng, Some(&tx))
        .await
        .unwrap_err();
    drop(tx);

    assert!(matches!(err, PipelineError::Analysis(_)));
    assert!(err.to_string().starts_with("Shopping list processing failed: "));
    assert_eq!(llm.user_messages().len(), 1);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(events.first(), Some(&PipelineEvent::StatusChanged(PipelineStatus::Searching)));
    assert!(events.contains(&PipelineEvent::SearchingItem {
        index: 1,
        total: 1,
        item: "rice".to_string(),
    }));
    assert!(events.contains(&PipelineEvent::StatusChanged(PipelineStatus::Failed)));
    assert!(matches!(events.last(), Some(PipelineEvent::Failed(_))));
}

#[tokio::test]
async fn test_empty_list_is_rejected_before_any_call() {
    let llm = ScriptedLlm::new(vec![]);
    let search = store();

    let err = pipeline(llm.clone(), search.clone())
        .run(&ShoppingList::new(), Region::Gauteng, None)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Please add items to your shopping list!");
    assert!(llm.user_messages().is_empty());
    assert!(search.queries.lock().unwrap().is_empty());
}
