//! Help overlay: every active binding, user overrides included, grouped by
//! the view it applies to.

use crate::app::App;
use crate::keybindings::Context;
use crate::util::display_width;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const SECTIONS: [Context; 4] = [
    Context::Global,
    Context::List,
    Context::Detail,
    Context::Search,
];

/// Key column never shrinks below this.
const MIN_KEY_COLUMN: usize = 8;

/// Render the help overlay on top of the current view.
pub fn render(f: &mut Frame, app: &App) {
    let overlay = centered_rect(80, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    let lines = help_lines(app);
    // Two border rows
    let visible = overlay.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(visible);
    let scroll = app.help_scroll_offset.min(max_scroll);

    let title = if max_scroll > 0 {
        format!(" Help {}/{}  j/k scroll, ? close ", scroll + 1, max_scroll + 1)
    } else {
        " Help  ? or Esc to close ".to_string()
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(title),
        )
        .style(app.style("detail_value"))
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));

    f.render_widget(Clear, overlay);
    f.render_widget(paragraph, overlay);
}

/// One heading per context followed by its bindings, keys left-aligned in a
/// column sized to the widest key.
fn help_lines(app: &App) -> Vec<Line<'static>> {
    let bindings = app.keybindings.all_bindings();
    let key_column = bindings
        .iter()
        .map(|(_, key, _)| display_width(key))
        .max()
        .unwrap_or(0)
        .max(MIN_KEY_COLUMN);

    let mut lines = Vec::new();
    for context in SECTIONS {
        let mut section = bindings.iter().filter(|(c, _, _)| *c == context).peekable();
        if section.peek().is_none() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::styled(context.title(), app.style("detail_heading")));
        for (_, key, description) in section {
            let pad = key_column.saturating_sub(display_width(key));
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(key.clone(), app.style("help_key")),
                Span::raw(" ".repeat(pad + 2)),
                Span::raw(*description),
            ]));
        }
    }
    lines
}

/// A rectangle covering the given percentages of `area`, centered in it.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
