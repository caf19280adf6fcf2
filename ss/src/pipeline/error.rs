//! Pipeline failures

use thiserror::Error;

use crate::llm::LlmError;

/// Unrecovered failures of a pipeline run
///
/// Search failures never appear here; they are folded into the raw price text.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Please add items to your shopping list!")]
    EmptyList,

    #[error("Shopping list processing failed: {0}")]
    Analysis(#[source] LlmError),

    #[error("Shopping list processing failed: {0}")]
    Recommendation(#[source] LlmError),

    #[error("Shopping list processing failed: {0}")]
    Prompt(String),
}

impl PipelineError {
    /// Stage the failure happened in, for logs
    pub fn stage(&self) -> &'static str {
        match self {
            Self::EmptyList => "input",
            Self::Analysis(_) => "analysis",
            Self::Recommendation(_) => "recommendation",
            Self::Prompt(_) => "prompt",
        }
    }

    /// The model error behind an analysis or recommendation failure
    pub fn llm_error(&self) -> Option<&LlmError> {
        match self {
            Self::Analysis(e) | Self::Recommendation(e) => Some(e),
            _ => None,
        }
    }
}
