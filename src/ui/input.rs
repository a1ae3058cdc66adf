//! Input handling for the TUI.
//!
//! This module processes keyboard input and dispatches to the appropriate
//! handler based on current view and mode.

use crate::app::{App, AppEvent, View};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crate::navigation::{
    clear_all, cycle_filter, set_filter, set_page, toggle_sort, FilterKey, Location,
};
use crate::util::{validate_url_for_open, MAX_SEARCH_QUERY_LENGTH};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{
    apply_search, go_back, navigate, schedule_search, spawn_character_fetch,
    spawn_characters_fetch, spawn_favorites_fetch, update_query,
};
use super::Action;

/// Main input dispatch function.
///
/// Routes input to the appropriate handler based on current mode and view.
pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Help overlay captures all keys when visible
    if app.show_help {
        return Ok(handle_help_input(app, code));
    }

    if app.search_mode {
        return handle_search_input(app, code, modifiers, event_tx).await;
    }

    match app.view() {
        View::List => handle_list_input(app, code, modifiers, event_tx).await,
        View::Detail => handle_detail_input(app, code, modifiers, event_tx).await,
    }
}

/// Handle input while the help overlay is visible.
///
/// Captures all keys: j/k/Up/Down scroll, Esc/q/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

/// Actions available in both views.
///
/// Returns `None` when `action` was not one of them.
async fn handle_common_action(
    app: &mut App,
    action: KbAction,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Option<Action>> {
    match action {
        KbAction::Quit => return Ok(Some(Action::Quit)),
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
        KbAction::CycleTheme => {
            let name = app.toggle_dark_mode().await?;
            app.set_status(format!("Theme: {}", name));
        }
        KbAction::ToggleFavorite => {
            if let Some((instance, pending)) = app.toggle_favorite().await? {
                spawn_favorites_fetch(app, instance, pending, event_tx);
            }
        }
        _ => return Ok(None),
    }
    Ok(Some(Action::Continue))
}

/// Handle input in the character list.
async fn handle_list_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let Some(action) = app
        .keybindings
        .action_for_key(code, modifiers, KbContext::List)
    else {
        return Ok(Action::Continue);
    };
    if let Some(result) = handle_common_action(app, action, event_tx).await? {
        return Ok(result);
    }

    match action {
        KbAction::NavDown => app.nav_down(),
        KbAction::NavUp => app.nav_up(),
        KbAction::Select => {
            if let Some(id) = app.selected_character().map(|c| c.id) {
                navigate(app, Location::Detail(id), event_tx).await;
            }
        }
        KbAction::Back => {
            if app.navigator.can_go_back() {
                go_back(app, event_tx).await;
            }
        }
        KbAction::EnterSearch => app.enter_search(),
        KbAction::CycleStatus => {
            update_query(app, |p| cycle_filter(p, FilterKey::Status), event_tx).await;
        }
        KbAction::CycleSpecies => {
            update_query(app, |p| cycle_filter(p, FilterKey::Species), event_tx).await;
        }
        KbAction::CycleGender => {
            update_query(app, |p| cycle_filter(p, FilterKey::Gender), event_tx).await;
        }
        KbAction::ToggleFavoritesOnly => {
            let value = if app.filters().favorites_only { "" } else { "true" };
            update_query(app, |p| set_filter(p, FilterKey::Favorites, value), event_tx).await;
        }
        KbAction::ToggleSort => update_query(app, toggle_sort, event_tx).await,
        KbAction::ClearFilters => {
            if app.filters().has_active_filters() {
                update_query(app, |_| clear_all(), event_tx).await;
            }
        }
        KbAction::NextPage => {
            if let Some(pagination) = app.pagination().filter(|p| p.has_next) {
                let page = pagination.page.saturating_add(1);
                update_query(app, |p| set_page(p, page), event_tx).await;
            }
        }
        KbAction::PrevPage => {
            if let Some(pagination) = app.pagination().filter(|p| p.has_prev) {
                let page = pagination.page.saturating_sub(1);
                update_query(app, |p| set_page(p, page), event_tx).await;
            }
        }
        KbAction::Retry => {
            if app.characters.error().is_some() {
                if let Some(ticket) = app.retry_list() {
                    spawn_characters_fetch(app, ticket, event_tx);
                }
            }
            if let Some((instance, pending)) = app.retry_favorites() {
                spawn_favorites_fetch(app, instance, pending, event_tx);
            }
        }
        _ => {}
    }
    Ok(Action::Continue)
}

/// Handle input on a character's detail page.
async fn handle_detail_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let Some(action) = app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Detail)
    else {
        return Ok(Action::Continue);
    };
    if let Some(result) = handle_common_action(app, action, event_tx).await? {
        return Ok(result);
    }

    match action {
        KbAction::Back => go_back(app, event_tx).await,
        KbAction::Retry => {
            let failed = app
                .detail
                .as_ref()
                .is_some_and(|d| d.character.error().is_some());
            if failed {
                if let Some(ticket) = app.retry_detail() {
                    spawn_character_fetch(app, ticket, event_tx);
                }
            }
            if let Some((instance, pending)) = app.retry_favorites() {
                spawn_favorites_fetch(app, instance, pending, event_tx);
            }
        }
        KbAction::OpenImage => {
            let image = app
                .detail
                .as_ref()
                .and_then(|d| d.character.data())
                .map(|c| c.image.clone());
            match image {
                Some(url) if !url.is_empty() => {
                    // Validate before open::that(); the URL comes from the API
                    match validate_url_for_open(&url) {
                        Err(e) => app.set_status(e.to_string()),
                        Ok(url) => {
                            if let Err(e) = open::that(url.as_str()) {
                                app.set_status(format!("Failed to open browser: {}", e));
                            } else {
                                app.set_status("Opening image...");
                            }
                        }
                    }
                }
                _ => app.set_status("No image for this character"),
            }
        }
        _ => {}
    }
    Ok(Action::Continue)
}

/// Handle input while typing a search.
///
/// Text edits restart the debounce; Enter applies immediately and leaves
/// search mode.
async fn handle_search_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Search)
    {
        Some(KbAction::ExitSearch) => {
            app.exit_search();
            return Ok(Action::Continue);
        }
        Some(KbAction::CommitSearch) => {
            app.search_debounce.cancel();
            let text = app.search_input.clone();
            apply_search(app, &text, event_tx).await;
            app.search_mode = false;
            return Ok(Action::Continue);
        }
        Some(KbAction::Quit) if modifiers.contains(KeyModifiers::CONTROL) => {
            return Ok(Action::Quit);
        }
        _ => {}
    }

    match code {
        KeyCode::Backspace => {
            if app.search_input.pop().is_some() {
                schedule_search(app, event_tx);
            }
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            // Prevent input beyond max search length
            if app.search_input.len() >= MAX_SEARCH_QUERY_LENGTH {
                app.set_status(format!(
                    "Search query at max length ({} chars)",
                    MAX_SEARCH_QUERY_LENGTH
                ));
                return Ok(Action::Continue);
            }
            app.search_input.push(c);
            schedule_search(app, event_tx);
        }
        _ => {}
    }
    Ok(Action::Continue)
}
