//! Render functions for the TUI.
//!
//! This module handles all rendering logic, dispatching to the appropriate
//! view based on application state.

use crate::app::{App, View};
use crate::keybindings::Action as KbAction;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Block, Paragraph, Wrap},
    Frame,
};

use super::{detail, filter_bar, help, list, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Main render dispatch function.
///
/// Routes to the appropriate view renderer based on the current location.
/// Handles terminal size validation before rendering.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    match app.view() {
        View::List => render_list_view(f, app),
        View::Detail => render_detail_view(f, app),
    }

    // Render help overlay on top of any view when active
    if app.show_help {
        help::render(f, app);
    }
}

/// Header, filters, character list, pagination and status bar.
fn render_list_view(f: &mut Frame, app: &App) {
    let pagination = app.pagination();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(if pagination.is_some() { 1 } else { 0 }),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    filter_bar::render(f, app, chunks[1]);
    list::render(f, app, chunks[2]);
    if let Some(pagination) = &pagination {
        list::render_pagination(f, app, pagination, chunks[3]);
    }
    status::render(f, app, chunks[4]);
}

fn render_detail_view(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    detail::render(f, app, chunks[0]);
    status::render(f, app, chunks[1]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let lines = vec![
        Line::styled("Resource Explorer", app.style("detail_heading")),
        Line::styled(
            "Discover characters from the Rick and Morty universe",
            app.style("character_meta"),
        ),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

// ============================================================================
// Shared panels
// ============================================================================

/// Error panel with the message and the retry key.
pub(super) fn render_error(f: &mut Frame, app: &App, area: Rect, block: Block, message: &str) {
    let retry = app
        .keybindings
        .key_label(KbAction::Retry)
        .unwrap_or_else(|| "r".to_string());
    let lines = vec![
        Line::from(""),
        Line::styled("Error", app.style("error_title")),
        Line::from(""),
        Line::styled(message.to_string(), app.style("error_body")),
        Line::from(""),
        Line::styled(format!("[{}] Try Again", retry), app.style("help_key")),
    ];
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

/// Centered placeholder text, e.g. for loading and empty states.
pub(super) fn render_message(
    f: &mut Frame,
    area: Rect,
    block: Block,
    lines: Vec<Line<'static>>,
) {
    let mut padded = vec![Line::from("")];
    padded.extend(lines);
    let paragraph = Paragraph::new(padded)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}
