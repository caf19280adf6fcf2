//! TUI application state
//!
//! Pure data structures for the TUI. No rendering logic here.

use std::time::Instant;

use rand::seq::IndexedRandom;
use tracing::debug;

use crate::domain::{Region, ShoppingList, ShoppingReport, loyalty_markdown};
use crate::pipeline::{PipelineEvent, PipelineStatus};

/// Words for the running status indicator
pub const STATUS_WORDS: &[&str] = &[
    "Haggling",
    "Bargaining",
    "Comparing",
    "Browsing",
    "Tallying",
    "Couponing",
    "Scouting",
    "Price-checking",
    "Queueing",
    "Window-shopping",
];

/// Shown when a run is requested on an empty list
pub const EMPTY_LIST_MESSAGE: &str = "Please add items to your shopping list!";

/// Result tabs in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultTab {
    #[default]
    Plan,
    Analysis,
    RawPrices,
    Loyalty,
}

impl ResultTab {
    pub const ALL: [ResultTab; 4] = [Self::Plan, Self::Analysis, Self::RawPrices, Self::Loyalty];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Plan => "Plan",
            Self::Analysis => "Analysis",
            Self::RawPrices => "Raw Prices",
            Self::Loyalty => "Loyalty",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Interaction mode (modal)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InteractionMode {
    /// List navigation
    #[default]
    Normal,
    /// Typing a new item (a/i key)
    AddItem(String),
    /// Help overlay
    Help,
}

impl InteractionMode {
    /// Get the input buffer if in an input mode
    pub fn input_buffer(&self) -> Option<&str> {
        match self {
            Self::AddItem(s) => Some(s),
            _ => None,
        }
    }

    /// Get mutable input buffer
    pub fn input_buffer_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::AddItem(s) => Some(s),
            _ => None,
        }
    }
}

/// One-line message in the footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Error(String),
    Info(String),
}

/// Selection state for the item list
#[derive(Debug, Default, Clone)]
pub struct SelectionState {
    pub selected_index: usize,
}

impl SelectionState {
    pub fn select_next(&mut self, max_items: usize) {
        if max_items > 0 && self.selected_index < max_items - 1 {
            self.selected_index += 1;
        }
    }

    pub fn select_prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    /// Ensure selection is within bounds
    pub fn clamp(&mut self, max_items: usize) {
        if max_items == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= max_items {
            self.selected_index = max_items - 1;
        }
    }
}

/// Search progress within the current run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchProgress {
    pub index: usize,
    pub total: usize,
    pub item: String,
}

/// Main TUI application state
#[derive(Debug)]
pub struct AppState {
    /// The list being edited; replaced wholesale on every edit
    pub list: ShoppingList,
    pub selection: SelectionState,
    /// Report header label
    pub region: Region,
    pub interaction_mode: InteractionMode,
    pub should_quit: bool,
    pub banner: Option<Banner>,

    // === Results ===
    pub report: Option<ShoppingReport>,
    pub result_tab: ResultTab,
    pub result_scroll: u16,

    // === Run state ===
    pub status: PipelineStatus,
    pub progress: Option<SearchProgress>,
    pub status_word: String,
    pub run_started: Option<Instant>,
    /// List snapshot waiting for the runner to start it
    pub pending_run: Option<ShoppingList>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Region::default())
    }
}

impl AppState {
    pub fn new(region: Region) -> Self {
        Self {
            list: ShoppingList::new(),
            selection: SelectionState::default(),
            region,
            interaction_mode: InteractionMode::default(),
            should_quit: false,
            banner: None,
            report: None,
            result_tab: ResultTab::default(),
            result_scroll: 0,
            status: PipelineStatus::Idle,
            progress: None,
            status_word: String::new(),
            run_started: None,
            pending_run: None,
        }
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.banner = Some(Banner::Error(msg.into()));
    }

    pub fn set_info(&mut self, msg: impl Into<String>) {
        self.banner = Some(Banner::Info(msg.into()));
    }

    pub fn clear_banner(&mut self) {
        self.banner = None;
    }

    // === List editing ===

    pub fn add_item(&mut self, item: &str) {
        debug!(%item, "AppState::add_item: called");
        let list = self.list.add(item);
        if list.len() > self.list.len() {
            self.selection.selected_index = list.len() - 1;
        }
        self.list = list;
    }

    pub fn remove_selected(&mut self) {
        debug!(index = self.selection.selected_index, "AppState::remove_selected: called");
        self.list = self.list.remove(self.selection.selected_index);
        self.selection.clamp(self.list.len());
    }

    pub fn clear_list(&mut self) {
        debug!("AppState::clear_list: called");
        self.list = self.list.clear();
        self.selection.clamp(0);
    }

    // === Region and tabs ===

    pub fn next_region(&mut self) {
        self.region = self.region.next();
    }

    pub fn prev_region(&mut self) {
        self.region = self.region.prev();
    }

    pub fn next_tab(&mut self) {
        self.result_tab = self.result_tab.next();
        self.result_scroll = 0;
    }

    pub fn prev_tab(&mut self) {
        self.result_tab = self.result_tab.prev();
        self.result_scroll = 0;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.result_scroll = self.result_scroll.saturating_add(lines);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.result_scroll = self.result_scroll.saturating_sub(lines);
    }

    // === Runs ===

    pub fn is_running(&self) -> bool {
        self.pending_run.is_some() || self.status.is_running()
    }

    /// Queue a run of the current list
    ///
    /// Refused while another run is in flight or when the list is empty.
    pub fn request_run(&mut self) {
        debug!(items = self.list.len(), status = ?self.status, "AppState::request_run: called");
        if self.is_running() {
            self.set_info("A run is already in progress");
            return;
        }
        if self.list.is_empty() {
            self.set_error(EMPTY_LIST_MESSAGE);
            return;
        }
        self.pending_run = Some(self.list.clone());
    }

    /// The runner picked up the pending run
    pub fn start_run(&mut self) {
        debug!("AppState::start_run: called");
        let mut rng = rand::rng();
        self.status_word = STATUS_WORDS.choose(&mut rng).unwrap_or(&"Haggling").to_string();
        self.status = PipelineStatus::Searching;
        self.progress = None;
        self.run_started = Some(Instant::now());
        self.clear_banner();
    }

    pub fn apply_event(&mut self, event: PipelineEvent) {
        debug!(?event, "AppState::apply_event: called");
        match event {
            PipelineEvent::StatusChanged(status) => self.status = status,
            PipelineEvent::SearchingItem { index, total, item } => {
                self.progress = Some(SearchProgress { index, total, item });
            }
            PipelineEvent::Finished | PipelineEvent::Failed(_) => {}
        }
    }

    /// Record the outcome of a run; the list is kept either way
    pub fn finish_run(&mut self, outcome: Result<ShoppingReport, String>) {
        self.progress = None;
        self.run_started = None;
        match outcome {
            Ok(report) => {
                debug!("AppState::finish_run: success");
                self.status = PipelineStatus::Done;
                self.report = Some(report);
                self.result_tab = ResultTab::Plan;
                self.result_scroll = 0;
            }
            Err(message) => {
                debug!(%message, "AppState::finish_run: failure");
                self.status = PipelineStatus::Failed;
                self.set_error(format!("An error occurred during processing: {}", message));
            }
        }
    }

    /// e.g. "Haggling… Searching 2/5: bread (4s)"
    pub fn status_line(&self) -> String {
        let elapsed = self
            .run_started
            .map(|t| format!(" ({}s)", t.elapsed().as_secs()))
            .unwrap_or_default();
        let stage = match (&self.status, &self.progress) {
            (PipelineStatus::Searching, Some(p)) => format!("Searching {}/{}: {}", p.index, p.total, p.item),
            (status, _) => status.label().to_string(),
        };
        format!("{}… {}{}", self.status_word, stage, elapsed)
    }

    /// Markdown for the selected results tab
    pub fn result_markdown(&self) -> String {
        match (self.result_tab, &self.report) {
            (ResultTab::Loyalty, _) => format!("## Loyalty Program Benefits\n\n{}", loyalty_markdown()),
            (_, None) => "No results yet. Add items and press Enter to find the best deals.".to_string(),
            (ResultTab::Plan, Some(report)) => format!(
                "# Shopping Analysis for {}\n\n## Recommended Shopping Plan\n\n\
                 > Prices shown include standard loyalty program discounts where applicable\n\n{}",
                report.region, report.plan
            ),
            (ResultTab::Analysis, Some(report)) => format!("## Price Analysis\n\n{}", report.analysis),
            (ResultTab::RawPrices, Some(report)) => format!("## Raw Price Data\n\n{}", report.raw_prices),
        }
    }
}
