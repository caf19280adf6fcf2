//! Run status and the progress events published while a run is in flight

use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

/// Sender half handed to [`super::Pipeline::run`]
pub type EventSender = mpsc::UnboundedSender<PipelineEvent>;

/// Where a run currently is
///
/// `Idle -> Searching -> Analyzing -> Recommending -> Done`; any unrecovered
/// failure moves to `Failed`, which is terminal for that run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PipelineStatus {
    #[default]
    Idle,
    Searching,
    Analyzing,
    Recommending,
    Done,
    Failed,
}

impl PipelineStatus {
    /// Progress text shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Searching => "Searching for prices...",
            Self::Analyzing => "Analyzing prices...",
            Self::Recommending => "Creating shopping plan...",
            Self::Done => "Analysis complete!",
            Self::Failed => "Failed",
        }
    }

    /// A run is in flight
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Searching | Self::Analyzing | Self::Recommending)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Progress notifications from a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    StatusChanged(PipelineStatus),
    /// About to search item `index` (1-based) of `total`
    SearchingItem { index: usize, total: usize, item: String },
    Finished,
    Failed(String),
}

/// Send if a listener exists; a dropped receiver is not an error
pub(crate) fn emit(events: Option<&EventSender>, event: PipelineEvent) {
    if let Some(tx) = events
        && tx.send(event).is_err()
    {
        debug!("emit: receiver dropped");
    }
}
