//! Filter bar: search field, categorical filters, favorites toggle and sort.
//!
//! Every value shown here is read back from the location, so the bar always
//! matches the query string.

use crate::app::App;
use crate::keybindings::Action as KbAction;
use crate::navigation::{FilterKey, FilterParams};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Label shown for a filter with no value selected.
fn any_label(key: FilterKey) -> &'static str {
    match key {
        FilterKey::Status => "All Status",
        FilterKey::Species => "All Species",
        FilterKey::Gender => "All Genders",
        FilterKey::Favorites => "All",
    }
}

/// Render the filter bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let filters = app.filters();
    let key = |action: KbAction| app.keybindings.key_label(action).unwrap_or_default();

    let search = if app.search_mode {
        Span::styled(format!("{}_", app.search_input), app.style("search_input"))
    } else if let Some(name) = &filters.name {
        Span::styled(name.clone(), app.style("filter_active"))
    } else {
        Span::styled("Search characters by name...", app.style("filter_label"))
    };
    let mut first = vec![
        Span::styled(format!("[{}] ", key(KbAction::EnterSearch)), app.style("help_key")),
        search,
    ];
    if filters.has_active_filters() {
        first.push(Span::raw("   "));
        first.push(Span::styled(
            format!("[{}] Clear All Filters", key(KbAction::ClearFilters)),
            app.style("help_key"),
        ));
    }

    let mut second = Vec::new();
    for (filter, action) in [
        (FilterKey::Status, KbAction::CycleStatus),
        (FilterKey::Species, KbAction::CycleSpecies),
        (FilterKey::Gender, KbAction::CycleGender),
    ] {
        second.extend(select_spans(app, &filters, filter, &key(action)));
        second.push(Span::raw("  "));
    }

    let favorites_style = style_if(app, filters.favorites_only);
    second.push(Span::styled(
        format!("[{}] ", key(KbAction::ToggleFavoritesOnly)),
        app.style("help_key"),
    ));
    second.push(Span::styled(
        format!("♥ Show Favorites ({})", app.favorites.count()),
        favorites_style,
    ));
    second.push(Span::raw("  "));
    second.push(Span::styled(
        format!("[{}] ", key(KbAction::ToggleSort)),
        app.style("help_key"),
    ));
    second.push(Span::styled(
        format!("Sort: {}", filters.sort.label()),
        app.style("filter_value"),
    ));

    let paragraph = Paragraph::new(vec![Line::from(first), Line::from(second)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.style("panel_border"))
            .title(" Filters "),
    );
    f.render_widget(paragraph, area);
}

fn select_spans(
    app: &App,
    filters: &FilterParams,
    key: FilterKey,
    key_label: &str,
) -> [Span<'static>; 2] {
    let value = filters.value(key);
    let (text, active) = if value.is_empty() {
        (any_label(key).to_string(), false)
    } else {
        (value.to_string(), true)
    };
    [
        Span::styled(format!("[{}] ", key_label), app.style("help_key")),
        Span::styled(text, style_if(app, active)),
    ]
}

fn style_if(app: &App, active: bool) -> Style {
    if active {
        app.style("filter_active")
    } else {
        app.style("filter_value")
    }
}
