//! The three shopping agents
//!
//! An agent is a role tag, rendered instructions and an optional function
//! list. Every agent runs through the same [`Agent::run`] loop; the role
//! only decides which template and which functions it gets.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::llm::{
    CompletionRequest, CompletionResponse, ContentBlock, LlmClient, LlmError, Message, StopReason, ToolCall,
    ToolDefinition,
};
use crate::pipeline::PipelineError;
use crate::prompts::{PromptContext, PromptLoader};

/// Upper bound on model turns when an agent may call functions
pub const MAX_TURNS: usize = 4;

/// Default response budget per agent call
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Which stage an agent serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Searcher,
    Analyzer,
    Recommender,
}

impl AgentRole {
    pub const ALL: [AgentRole; 3] = [AgentRole::Searcher, AgentRole::Analyzer, AgentRole::Recommender];

    /// Display name shown in listings
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Searcher => "SA Price Searcher",
            Self::Analyzer => "SA Price Analyzer",
            Self::Recommender => "SA Shopping Advisor",
        }
    }

    /// Prompt template holding this role's instructions
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::Searcher => "searcher",
            Self::Analyzer => "analyzer",
            Self::Recommender => "recommender",
        }
    }

    /// Functions the role may call
    pub fn capabilities(&self) -> Vec<Capability> {
        match self {
            Self::Searcher => vec![Capability::SearchPrices],
            Self::Analyzer | Self::Recommender => vec![],
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.template_name())
    }
}

/// A function an agent can ask the program to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    SearchPrices,
}

impl Capability {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SearchPrices => "search_prices",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "search_prices" => Some(Self::SearchPrices),
            _ => None,
        }
    }

    /// Schema advertised to the model
    pub fn definition(&self) -> ToolDefinition {
        match self {
            Self::SearchPrices => ToolDefinition::new(
                self.name(),
                "Search the web for current retailer prices of one grocery item. \
                 Returns one record per result with store, product, URL and details.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "item": {
                            "type": "string",
                            "description": "Item name, e.g. \"2L full cream milk\""
                        }
                    },
                    "required": ["item"]
                }),
            ),
        }
    }
}

/// Runs function calls on behalf of an agent
#[async_trait]
pub trait FunctionHandler: Send + Sync {
    /// Execute one call; `Err` text is reported back to the model as a failed result
    async fn call(&self, capability: Capability, input: &serde_json::Value) -> Result<String, String>;
}

/// A prompt-configured agent
#[derive(Debug, Clone)]
pub struct Agent {
    pub role: AgentRole,
    pub name: String,
    pub instructions: String,
    pub functions: Vec<Capability>,
    pub max_tokens: u32,
}

impl Agent {
    pub fn new(role: AgentRole, instructions: impl Into<String>) -> Self {
        Self {
            role,
            name: role.display_name().to_string(),
            instructions: instructions.into(),
            functions: role.capabilities(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Render this role's instructions from the loader
    pub fn load(role: AgentRole, loader: &PromptLoader, context: &PromptContext) -> Result<Self, PipelineError> {
        debug!(%role, "Agent::load: called");
        let instructions = loader
            .render(role.template_name(), context)
            .map_err(|e| PipelineError::Prompt(e.to_string()))?;
        Ok(Self::new(role, instructions))
    }

    /// Run without functions and return the final assistant text
    pub async fn run(&self, llm: &dyn LlmClient, messages: Vec<Message>) -> Result<String, LlmError> {
        self.drive(llm, messages, None).await
    }

    /// Run with this agent's functions executed by `handler`
    pub async fn run_with_functions(
        &self,
        llm: &dyn LlmClient,
        messages: Vec<Message>,
        handler: &dyn FunctionHandler,
    ) -> Result<String, LlmError> {
        self.drive(llm, messages, Some(handler)).await
    }

    async fn drive(
        &self,
        llm: &dyn LlmClient,
        mut messages: Vec<Message>,
        handler: Option<&dyn FunctionHandler>,
    ) -> Result<String, LlmError> {
        debug!(agent = %self.name, tools = handler.is_some(), "Agent::drive: called");
        let tools: Vec<ToolDefinition> = match handler {
            Some(_) => self.functions.iter().map(Capability::definition).collect(),
            None => vec![],
        };

        for turn in 1..=MAX_TURNS {
            let request = CompletionRequest {
                system_prompt: self.instructions.clone(),
                messages: messages.clone(),
                tools: tools.clone(),
                max_tokens: self.max_tokens,
            };

            let response = llm.complete(request).await?;
            debug!(
                agent = %self.name,
                turn,
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "Agent::drive: response"
            );
            let handler = match handler {
                Some(h) if response.stop_reason == StopReason::ToolUse && !response.tool_calls.is_empty() => h,
                _ => {
                    if response.stop_reason == StopReason::MaxTokens {
                        warn!(agent = %self.name, "Agent::drive: response truncated at max tokens");
                    }
                    info!(agent = %self.name, turn, "Agent finished");
                    // Narration alongside tool calls is not an answer; only the closing turn counts
                    return Ok(response.content.unwrap_or_default());
                }
            };

            messages.push(assistant_message(&response));
            let mut results = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                results.push(self.execute(handler, call).await);
            }
            messages.push(Message::user_blocks(results));
        }

        warn!(agent = %self.name, max_turns = MAX_TURNS, "Max turns reached with functions still pending");
        Err(LlmError::InvalidResponse(format!(
            "{} produced no answer within {} turns",
            self.name, MAX_TURNS
        )))
    }

    async fn execute(&self, handler: &dyn FunctionHandler, call: &ToolCall) -> ContentBlock {
        debug!(agent = %self.name, function = %call.name, "Agent::execute: called");
        let capability = Capability::from_name(&call.name).filter(|c| self.functions.contains(c));
        match capability {
            Some(capability) => match handler.call(capability, &call.input).await {
                Ok(output) => ContentBlock::tool_result(&call.id, output, false),
                Err(message) => ContentBlock::tool_result(&call.id, message, true),
            },
            None => {
                warn!(agent = %self.name, function = %call.name, "Agent::execute: unknown function");
                ContentBlock::tool_result(&call.id, format!("Unknown function: {}", call.name), true)
            }
        }
    }
}

/// Echo the model's turn back into the history so tool results line up
fn assistant_message(response: &CompletionResponse) -> Message {
    let mut blocks = Vec::new();

    if let Some(text) = &response.content {
        blocks.push(ContentBlock::text(text));
    }

    for call in &response.tool_calls {
        blocks.push(ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.input.clone(),
        });
    }

    Message::assistant_blocks(blocks)
}

/// The Searcher, Analyzer and Recommender for one configuration
#[derive(Debug, Clone)]
pub struct Agents {
    pub searcher: Agent,
    pub analyzer: Agent,
    pub recommender: Agent,
}

impl Agents {
    pub fn load(loader: &PromptLoader, context: &PromptContext, max_tokens: u32) -> Result<Self, PipelineError> {
        debug!(max_tokens, "Agents::load: called");
        Ok(Self {
            searcher: Agent::load(AgentRole::Searcher, loader, context)?.with_max_tokens(max_tokens),
            analyzer: Agent::load(AgentRole::Analyzer, loader, context)?.with_max_tokens(max_tokens),
            recommender: Agent::load(AgentRole::Recommender, loader, context)?.with_max_tokens(max_tokens),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        [&self.searcher, &self.analyzer, &self.recommender].into_iter()
    }
}
