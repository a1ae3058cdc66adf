use crate::app::App;
use crate::navigation::Pagination;
use crate::util::{sanitize, truncate_to_width};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Render the character list panel
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let filters = app.filters();
    let title = if filters.favorites_only {
        format!(" Favorites ({}) ", app.favorites.count())
    } else {
        match app.characters.data() {
            Some(page) => format!(" Characters ({}) ", page.info.count),
            None => " Characters ".to_string(),
        }
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border_focused"))
        .title(title);

    if let Some(error) = app.list_error() {
        super::render::render_error(f, app, area, block, &error.to_string());
        return;
    }

    if app.list_is_loading() {
        super::render::render_message(
            f,
            area,
            block,
            vec![Line::styled("Loading...", app.style("loading"))],
        );
        return;
    }

    let characters = app.visible_characters();
    if characters.is_empty() {
        let lines = if filters.favorites_only {
            vec![Line::styled("No favorite characters yet.", app.style("empty_state"))]
        } else {
            vec![
                Line::styled("No characters found", app.style("empty_state")),
                Line::styled(
                    "Try adjusting your search or filters",
                    app.style("character_meta"),
                ),
            ]
        };
        super::render::render_message(f, area, block, lines);
        return;
    }

    // Room for the marker column and borders
    let name_width = area.width.saturating_sub(6) as usize;
    let meta_width = area.width.saturating_sub(8) as usize;
    let palette = app.theme_variant.palette();

    let items: Vec<ListItem> = characters
        .iter()
        .map(|character| {
            let marker = if app.favorites.is_favorite(character.id) {
                Span::styled("♥ ", app.style("favorite_marker"))
            } else {
                Span::raw("  ")
            };
            let name = sanitize(&character.name);
            let first = Line::from(vec![
                marker,
                Span::styled(
                    truncate_to_width(&name, name_width).into_owned(),
                    app.style("character_name"),
                ),
            ]);

            let meta = format!(
                "{} - {} · Last known location: {}",
                character.status,
                sanitize(&character.species),
                sanitize(&character.location.name)
            );
            let second = Line::from(vec![
                Span::raw("  "),
                Span::styled("● ", palette.status(character.status)),
                Span::styled(
                    truncate_to_width(&meta, meta_width).into_owned(),
                    app.style("character_meta"),
                ),
            ]);

            ListItem::new(vec![first, second])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(app.style("character_selected"));

    let mut state = ListState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

/// Render the page selector: previous, a window of page numbers, next.
pub fn render_pagination(f: &mut Frame, app: &App, pagination: &Pagination, area: Rect) {
    if area.height < 1 {
        return;
    }

    let arrow = |label: &'static str, enabled: bool| {
        let style = if enabled {
            app.style("page_other")
        } else {
            app.style("page_disabled")
        };
        Span::styled(label, style)
    };

    let mut spans = vec![arrow("‹ Prev ", pagination.has_prev)];
    for &n in &pagination.window {
        let style = if n == pagination.page {
            app.style("page_current")
        } else {
            app.style("page_other")
        };
        spans.push(Span::styled(format!(" {} ", n), style));
    }
    spans.push(arrow(" Next ›", pagination.has_next));
    spans.push(Span::styled(
        format!("   Page {} of {}", pagination.page, pagination.pages),
        app.style("character_meta"),
    ));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
