use crate::app::{App, View};
use crate::keybindings::Action as KbAction;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Width of the background refresh indicator.
const INDICATOR_WIDTH: u16 = 12;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // Status bar needs at least 1 char width to be meaningful
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        Cow::Owned(hints(app))
    };

    let style = app.style("status_bar");
    if app.is_refreshing() && area.width > INDICATOR_WIDTH * 2 {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(INDICATOR_WIDTH)])
            .split(area);
        f.render_widget(Paragraph::new(text).style(style), chunks[0]);
        f.render_widget(
            Paragraph::new("Loading...").style(style.patch(app.style("loading"))),
            chunks[1],
        );
    } else {
        f.render_widget(Paragraph::new(text).style(style), area);
    }
}

/// Keybinding hints for the current mode, using the active bindings.
fn hints(app: &App) -> String {
    let key = |action: KbAction| app.keybindings.key_label(action).unwrap_or_default();

    if app.search_mode {
        return format!(
            "Type to search | {} cancel | {} apply",
            key(KbAction::ExitSearch),
            key(KbAction::CommitSearch)
        );
    }

    match app.view() {
        View::List => format!(
            "[{}]open [{}]search [{}]favorite [{}/{}]page [{}]theme [{}]help [{}]quit",
            key(KbAction::Select),
            key(KbAction::EnterSearch),
            key(KbAction::ToggleFavorite),
            key(KbAction::PrevPage),
            key(KbAction::NextPage),
            key(KbAction::CycleTheme),
            key(KbAction::ShowHelp),
            key(KbAction::Quit),
        ),
        View::Detail => format!(
            "[{}]back [{}]favorite [{}]open image [{}]theme [{}]help [{}]quit",
            key(KbAction::Back),
            key(KbAction::ToggleFavorite),
            key(KbAction::OpenImage),
            key(KbAction::CycleTheme),
            key(KbAction::ShowHelp),
            key(KbAction::Quit),
        ),
    }
}
