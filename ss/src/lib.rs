//! SmartShopper - grocery price search and shopping plans
//!
//! A shopping list goes through three stages: a web search per item, an
//! Analyzer agent that compares the raw results, and a Recommender agent
//! that turns the analysis into a per-store shopping plan. All price
//! reasoning lives in the agent prompts; the program only moves text.
//!
//! # Modules
//!
//! - [`domain`] - Shopping list, regions and the report
//! - [`search`] - Web search backends (DuckDuckGo, Tavily, Brave, SerpAPI)
//! - [`llm`] - LLM client trait with OpenAI-compatible and Anthropic clients
//! - [`prompts`] - Agent instruction templates
//! - [`agents`] - Searcher, Analyzer and Recommender
//! - [`pipeline`] - The search, analyze, recommend run
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//! - [`tui`] - Interactive terminal UI

pub mod agents;
pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod search;
pub mod tui;

// Re-export commonly used types
pub use agents::{Agent, AgentRole, Agents, Capability};
pub use config::{Config, LlmConfig, SearchConfig, SearchMode, ShoppingConfig};
pub use domain::{LOYALTY_PROGRAMS, LoyaltyProgram, Region, ShoppingList, ShoppingReport};
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient, create_client};
pub use pipeline::{Pipeline, PipelineError, PipelineEvent, PipelineStatus};
pub use prompts::{PromptContext, PromptLoader};
pub use search::{SearchBackend, SearchError, SearchHit, create_backend};
