//! TUI views and rendering

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap};
use tracing::trace;

use super::state::{AppState, Banner, InteractionMode, ResultTab};
use crate::pipeline::PipelineStatus;

mod colors {
    use ratatui::style::Color;

    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255);
    pub const REGION: Color = Color::Rgb(255, 215, 0); // Gold
    pub const RUNNING: Color = Color::Rgb(0, 255, 127); // Spring green
    pub const DONE: Color = Color::Rgb(50, 205, 50); // Lime green
    pub const FAILED: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const INFO: Color = Color::Rgb(135, 206, 250); // Light sky blue
    pub const SELECTED_BG: Color = Color::Rgb(40, 40, 40);
    pub const DIM: Color = Color::DarkGray;
}

/// Main render function
pub fn render(state: &AppState, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(state, frame, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[1]);
    render_list(state, frame, panes[0]);
    render_results(state, frame, panes[1]);

    render_footer(state, frame, chunks[2]);

    if state.interaction_mode == InteractionMode::Help {
        render_help_overlay(frame, chunks[1]);
    }
}

fn status_color(status: PipelineStatus) -> Color {
    match status {
        PipelineStatus::Idle => colors::DIM,
        PipelineStatus::Done => colors::DONE,
        PipelineStatus::Failed => colors::FAILED,
        _ => colors::RUNNING,
    }
}

fn render_header(state: &AppState, frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "SmartShopper ",
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(state.region.name(), Style::default().fg(colors::REGION)),
        Span::raw(" │ "),
        Span::raw(format!("{} items", state.list.len())),
        Span::raw(" │ "),
        Span::styled(state.status.label(), Style::default().fg(status_color(state.status))),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Status "));

    frame.render_widget(header, area);
}

/// Shopping list with the add-item input line below it
fn render_list(state: &AppState, frame: &mut Frame, area: Rect) {
    let (list_area, input_area) = match state.interaction_mode.input_buffer() {
        Some(_) => {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(3)])
                .split(area);
            (split[0], Some(split[1]))
        }
        None => (area, None),
    };

    let items: Vec<ListItem> = if state.list.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "Press a to add an item",
            Style::default().fg(colors::DIM),
        )))]
    } else {
        state
            .list
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let line = Line::from(vec![
                    Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(colors::DIM)),
                    Span::raw(item.to_string()),
                ]);
                if i == state.selection.selected_index {
                    ListItem::new(line).style(Style::default().bg(colors::SELECTED_BG).add_modifier(Modifier::BOLD))
                } else {
                    ListItem::new(line)
                }
            })
            .collect()
    };

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Shopping List "));
    frame.render_widget(list, list_area);

    if let (Some(area), Some(buffer)) = (input_area, state.interaction_mode.input_buffer()) {
        let input = Paragraph::new(Line::from(vec![
            Span::styled("> ", Style::default().fg(colors::KEYBIND)),
            Span::raw(buffer),
            Span::styled("█", Style::default().fg(colors::DIM)),
        ]))
        .block(Block::default().borders(Borders::ALL).title(" Add item (Enter to add, Esc to finish) "));
        frame.render_widget(input, area);
    }
}

/// Result tabs plus the markdown body of the selected one
fn render_results(state: &AppState, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let titles: Vec<Line> = ResultTab::ALL.iter().map(|t| Line::from(t.title())).collect();
    let tabs = Tabs::new(titles)
        .select(state.result_tab.index())
        .block(Block::default().borders(Borders::ALL).title(" Results "))
        .highlight_style(Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, chunks[0]);

    let markdown = state.result_markdown();
    let body = Paragraph::new(tui_markdown::from_str(&markdown))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((state.result_scroll, 0));
    frame.render_widget(body, chunks[1]);
}

/// Banner first, then the running status line, then key hints
fn render_footer(state: &AppState, frame: &mut Frame, area: Rect) {
    let line = match &state.banner {
        Some(Banner::Error(msg)) => Line::from(Span::styled(msg.as_str(), Style::default().fg(colors::FAILED))),
        Some(Banner::Info(msg)) => Line::from(Span::styled(msg.as_str(), Style::default().fg(colors::INFO))),
        None if state.status.is_running() => Line::from(Span::styled(
            state.status_line(),
            Style::default().fg(colors::RUNNING),
        )),
        None => Line::from(vec![
            hint("a", "add"),
            hint("d", "remove"),
            hint("r", "region"),
            hint("Enter", "find deals"),
            hint("Tab", "results"),
            hint("?", "help"),
            hint("q", "quit"),
        ]),
    };

    let footer = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

fn hint(key: &'static str, desc: &'static str) -> Span<'static> {
    Span::styled(format!(" {}:{} ", key, desc), Style::default().fg(colors::DIM))
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    trace!("render_help_overlay: called");
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                .fg(colors::HEADER),
        )]),
        Line::from(""),
        Line::from(Span::styled("Shopping list", Style::default().add_modifier(Modifier::BOLD))),
        key_line("a / i", "Add items"),
        key_line("d / x", "Remove selected item"),
        key_line("C", "Clear the list"),
        key_line("j/k ↑/↓", "Move selection"),
        Line::from(""),
        Line::from(Span::styled("Deals", Style::default().add_modifier(Modifier::BOLD))),
        key_line("r / R", "Next / previous region"),
        key_line("Enter / g", "Find best deals"),
        key_line("Tab", "Next results tab"),
        key_line("PgDn/PgUp", "Scroll results"),
        Line::from(""),
        key_line("?", "Toggle help"),
        key_line("q", "Quit"),
        key_line("Ctrl+C", "Force quit"),
    ];

    let help = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title(" Help (? to close) "))
        .wrap(Wrap { trim: false });

    frame.render_widget(help, popup_area);
}

fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<12}", key), Style::default().fg(colors::KEYBIND)),
        Span::raw(desc),
    ])
}

/// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
