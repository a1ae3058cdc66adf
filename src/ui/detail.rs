use crate::api::Character;
use crate::app::{App, DetailState};
use crate::keybindings::Action as KbAction;
use crate::util::sanitize;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Render the character detail page
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 4 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let back = app
        .keybindings
        .key_label(KbAction::Back)
        .unwrap_or_else(|| "Esc".to_string());
    f.render_widget(
        Paragraph::new(Line::styled(
            format!("← Back to Characters ({})", back),
            app.style("help_key"),
        )),
        chunks[0],
    );

    let Some(detail) = app.detail.as_ref() else {
        return;
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border_focused"));

    if let Some(error) = detail.character.error() {
        super::render::render_error(f, app, chunks[1], block, &error.to_string());
        return;
    }

    match detail.character.data() {
        Some(character) => render_character(f, app, detail, character, block, chunks[1]),
        None => super::render::render_message(
            f,
            chunks[1],
            block,
            vec![Line::styled("Loading...", app.style("loading"))],
        ),
    }
}

fn render_character(
    f: &mut Frame,
    app: &App,
    detail: &DetailState,
    character: &Character,
    block: Block,
    area: Rect,
) {
    let heading = |text: &'static str| Line::styled(text, app.style("detail_heading"));
    let field = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("  {}: ", label), app.style("detail_label")),
            Span::styled(value, app.style("detail_value")),
        ])
    };

    let favorite_key = app
        .keybindings
        .key_label(KbAction::ToggleFavorite)
        .unwrap_or_default();
    let favorite = if detail.favorites.is_loading() {
        Span::styled("♡ Loading favorites...", app.style("loading"))
    } else if detail.favorites.is_favorite(character.id) {
        Span::styled(
            format!("♥ Favorited [{}]", favorite_key),
            app.style("favorite_marker"),
        )
    } else {
        Span::styled(
            format!("♡ Add to favorites [{}]", favorite_key),
            app.style("filter_value"),
        )
    };

    let palette = app.theme_variant.palette();
    let mut lines = vec![
        Line::from(vec![
            Span::styled(sanitize(&character.name).into_owned(), app.style("character_name")),
            Span::raw("   "),
            favorite,
        ]),
        Line::from(vec![
            Span::styled("● ", palette.status(character.status)),
            Span::styled(
                format!("{} - {}", character.status, sanitize(&character.species)),
                app.style("character_meta"),
            ),
        ]),
        Line::from(""),
        heading("Details"),
        field("Status", character.status.to_string()),
        field("Species", sanitize(&character.species).into_owned()),
    ];
    if let Some(kind) = &character.kind {
        lines.push(field("Type", sanitize(kind).into_owned()));
    }
    lines.push(field("Gender", character.gender.to_string()));

    lines.push(Line::from(""));
    lines.push(heading("Location"));
    lines.push(field("Origin", sanitize(&character.origin.name).into_owned()));
    lines.push(field(
        "Last known location",
        sanitize(&character.location.name).into_owned(),
    ));

    lines.push(Line::from(""));
    lines.push(heading("Episodes"));
    lines.push(Line::styled(
        format!("  {}", character.episode_summary()),
        app.style("detail_value"),
    ));

    if !character.image.is_empty() {
        let open_key = app
            .keybindings
            .key_label(KbAction::OpenImage)
            .unwrap_or_default();
        lines.push(Line::from(""));
        lines.push(field(
            "Image",
            format!("{} [{}]", sanitize(&character.image), open_key),
        ));
    }

    let paragraph = Paragraph::new(lines)
        .block(block.title(format!(" Character #{} ", character.id)))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
