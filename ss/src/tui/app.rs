//! TUI application - key handling
//!
//! The App struct owns the AppState and handles all keyboard events.
//! It does not do any rendering - that's delegated to the views module.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use super::state::{AppState, InteractionMode};
use crate::domain::Region;

/// Lines moved per PgUp/PgDn
const PAGE: u16 = 10;

/// TUI application
#[derive(Debug, Default)]
pub struct App {
    state: AppState,
}

impl App {
    pub fn new(region: Region) -> Self {
        Self {
            state: AppState::new(region),
        }
    }

    /// Get reference to state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get mutable reference to state
    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Handle a key event
    ///
    /// Returns true if the application should exit immediately.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key.code, mode = ?self.state.interaction_mode, "App::handle_key: called");
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        match &self.state.interaction_mode {
            InteractionMode::Normal => self.handle_normal_key(key),
            InteractionMode::AddItem(_) => self.handle_add_item_key(key),
            InteractionMode::Help => self.state.interaction_mode = InteractionMode::Normal,
        }
        false
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        // Banners last until the next keypress
        self.state.clear_banner();

        match key.code {
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Char('?') | KeyCode::F(1) => self.state.interaction_mode = InteractionMode::Help,

            // === List editing ===
            KeyCode::Char('a') | KeyCode::Char('i') => {
                self.state.interaction_mode = InteractionMode::AddItem(String::new());
            }
            KeyCode::Char('d') | KeyCode::Char('x') | KeyCode::Delete => self.state.remove_selected(),
            KeyCode::Char('C') => self.state.clear_list(),

            // === Navigation ===
            KeyCode::Down | KeyCode::Char('j') => {
                let max = self.state.list.len();
                self.state.selection.select_next(max);
            }
            KeyCode::Up | KeyCode::Char('k') => self.state.selection.select_prev(),

            // === Region ===
            KeyCode::Char('r') => self.state.next_region(),
            KeyCode::Char('R') => self.state.prev_region(),

            // === Run ===
            KeyCode::Enter | KeyCode::Char('g') => self.state.request_run(),

            // === Results ===
            KeyCode::Tab => self.state.next_tab(),
            KeyCode::BackTab => self.state.prev_tab(),
            KeyCode::PageDown => self.state.scroll_down(PAGE),
            KeyCode::PageUp => self.state.scroll_up(PAGE),
            KeyCode::Home => self.state.result_scroll = 0,

            _ => {}
        }
    }

    fn handle_add_item_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.interaction_mode = InteractionMode::Normal,
            KeyCode::Enter => {
                // Stay in input mode so several items can be typed in a row
                let item = self
                    .state
                    .interaction_mode
                    .input_buffer_mut()
                    .map(std::mem::take)
                    .unwrap_or_default();
                if item.trim().is_empty() {
                    self.state.interaction_mode = InteractionMode::Normal;
                } else {
                    self.state.add_item(&item);
                }
            }
            KeyCode::Backspace => {
                if let Some(buffer) = self.state.interaction_mode.input_buffer_mut() {
                    buffer.pop();
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(buffer) = self.state.interaction_mode.input_buffer_mut() {
                    buffer.push(c);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::state::{Banner, EMPTY_LIST_MESSAGE, ResultTab};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_ctrl_c_force_quits_from_any_mode() {
        let mut app = App::default();
        app.handle_key(key(KeyCode::Char('a')));
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn test_q_quits() {
        let mut app = App::default();
        assert!(!app.handle_key(key(KeyCode::Char('q'))));
        assert!(app.state().should_quit);
    }

    #[test]
    fn test_add_items_via_input_mode() {
        let mut app = App::default();
        app.handle_key(key(KeyCode::Char('a')));
        type_str(&mut app, "milkk");
        app.handle_key(key(KeyCode::Backspace));
        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "bread");
        app.handle_key(key(KeyCode::Enter));
        // Typing 'q' while adding is text, not quit
        type_str(&mut app, "quinoa");
        app.handle_key(key(KeyCode::Esc));

        assert_eq!(app.state().list.items(), &["milk", "bread"]);
        assert_eq!(app.state().interaction_mode, InteractionMode::Normal);
        assert!(!app.state().should_quit);
    }

    #[test]
    fn test_enter_on_blank_input_leaves_mode() {
        let mut app = App::default();
        app.handle_key(key(KeyCode::Char('i')));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state().interaction_mode, InteractionMode::Normal);
        assert!(app.state().list.is_empty());
    }

    #[test]
    fn test_select_and_remove() {
        let mut app = App::default();
        for item in ["milk", "bread", "eggs"] {
            app.state_mut().add_item(item);
        }
        app.handle_key(key(KeyCode::Char('k')));
        app.handle_key(key(KeyCode::Char('k')));
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(app.state().list.items(), &["milk", "eggs"]);

        app.handle_key(key(KeyCode::Char('C')));
        assert!(app.state().list.is_empty());
    }

    #[test]
    fn test_region_cycle() {
        let mut app = App::new(Region::Gauteng);
        app.handle_key(key(KeyCode::Char('r')));
        assert_eq!(app.state().region, Region::WesternCape);
        app.handle_key(key(KeyCode::Char('R')));
        app.handle_key(key(KeyCode::Char('R')));
        assert_eq!(app.state().region, Region::NorthernCape);
    }

    #[test]
    fn test_run_empty_list_shows_banner_until_next_key() {
        let mut app = App::default();
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            app.state().banner,
            Some(Banner::Error(EMPTY_LIST_MESSAGE.to_string()))
        );
        app.handle_key(key(KeyCode::Char('j')));
        assert!(app.state().banner.is_none());
    }

    #[test]
    fn test_run_queues_list_snapshot() {
        let mut app = App::default();
        app.state_mut().add_item("milk");
        app.handle_key(key(KeyCode::Char('g')));
        assert_eq!(app.state().pending_run.as_ref().map(|l| l.items().to_vec()), Some(vec!["milk".to_string()]));
    }

    #[test]
    fn test_tabs_and_help() {
        let mut app = App::default();
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.state().result_tab, ResultTab::Analysis);
        app.handle_key(key(KeyCode::BackTab));
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.state().result_tab, ResultTab::Loyalty);

        app.handle_key(key(KeyCode::Char('?')));
        assert_eq!(app.state().interaction_mode, InteractionMode::Help);
        app.handle_key(key(KeyCode::Char('q')));
        assert_eq!(app.state().interaction_mode, InteractionMode::Normal);
        assert!(!app.state().should_quit);
    }
}
