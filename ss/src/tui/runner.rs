//! TUI Runner - main loop that owns the terminal and the pipeline task
//!
//! The TuiRunner is responsible for:
//! - Dispatching terminal events to App for handling
//! - Starting a queued run on a tokio task
//! - Feeding pipeline progress back into the state

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyEvent;
use eyre::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::Tui;
use super::app::App;
use super::events::{Event, EventHandler};
use super::views;
use crate::domain::{Region, ShoppingList, ShoppingReport};
use crate::pipeline::{Pipeline, PipelineError, PipelineEvent};

type RunHandle = JoinHandle<Result<ShoppingReport, PipelineError>>;

/// TUI Runner that manages the terminal and event loop
pub struct TuiRunner {
    app: App,
    terminal: Tui,
    event_handler: EventHandler,
    pipeline: Arc<Pipeline>,
    events_tx: mpsc::UnboundedSender<PipelineEvent>,
    events_rx: mpsc::UnboundedReceiver<PipelineEvent>,
    /// At most one run in flight
    run_handle: Option<RunHandle>,
}

impl TuiRunner {
    pub fn new(terminal: Tui, pipeline: Pipeline, region: Region) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            app: App::new(region),
            terminal,
            event_handler: EventHandler::new(Duration::from_millis(100)),
            pipeline: Arc::new(pipeline),
            events_tx,
            events_rx,
            run_handle: None,
        }
    }

    /// Run the TUI main loop
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.terminal.draw(|frame| views::render(self.app.state(), frame))?;

            match self.event_handler.next().await? {
                Event::Tick => self.handle_tick().await,
                Event::Key(key) => {
                    if self.handle_key(key) {
                        break;
                    }
                    // Start immediately rather than waiting for the next tick
                    self.start_pending_run();
                }
                Event::Resize(width, height) => debug!(width, height, "TuiRunner: resize"),
            }

            if self.app.state().should_quit {
                break;
            }
        }

        if let Some(handle) = self.run_handle.take() {
            info!("Abandoning in-flight run on exit");
            handle.abort();
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        self.app.handle_key(key)
    }

    async fn handle_tick(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.app.state_mut().apply_event(event);
        }

        self.start_pending_run();

        if self.run_handle.as_ref().is_some_and(|h| h.is_finished())
            && let Some(handle) = self.run_handle.take()
        {
            let outcome = match handle.await {
                Ok(Ok(report)) => Ok(report),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => {
                    warn!(error = %e, "Pipeline task did not complete");
                    Err(format!("pipeline task failed: {}", e))
                }
            };
            // Drain whatever the task sent before it finished
            while let Ok(event) = self.events_rx.try_recv() {
                self.app.state_mut().apply_event(event);
            }
            self.app.state_mut().finish_run(outcome);
        }
    }

    fn start_pending_run(&mut self) {
        if self.run_handle.is_some() {
            return;
        }
        let Some(list) = self.app.state_mut().pending_run.take() else {
            return;
        };
        let region = self.app.state().region;
        info!(items = list.len(), %region, "Starting shopping run");
        self.app.state_mut().start_run();
        self.run_handle = Some(spawn_run(self.pipeline.clone(), list, region, self.events_tx.clone()));
    }
}

fn spawn_run(
    pipeline: Arc<Pipeline>,
    list: ShoppingList,
    region: Region,
    tx: mpsc::UnboundedSender<PipelineEvent>,
) -> RunHandle {
    tokio::spawn(async move { pipeline.run(&list, region, Some(&tx)).await })
}
