//! Application event handling.
//!
//! Processes results of background fetches, favorites change notifications
//! and settled search input.

use crate::app::{App, AppEvent};
use tokio::sync::mpsc;

use super::helpers::{apply_search, spawn_favorites_fetch};

/// Handle application events from background tasks.
pub(super) async fn handle_app_event(
    app: &mut App,
    event: AppEvent,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match event {
        AppEvent::CharactersLoaded { generation, result } => {
            app.finish_characters(generation, result);
        }
        AppEvent::CharacterLoaded {
            id,
            generation,
            result,
        } => {
            app.finish_character(id, generation, result);
        }
        AppEvent::FavoritesLoaded { instance, outcome } => {
            if let Some(pending) = app.finish_favorites(instance, outcome) {
                spawn_favorites_fetch(app, instance, pending, event_tx);
            }
        }
        AppEvent::FavoritesChanged => {
            for (instance, pending) in app.sync_favorites().await {
                spawn_favorites_fetch(app, instance, pending, event_tx);
            }
        }
        AppEvent::SearchSettled(text) => {
            // Esc cancels the debounce, but a value already in the channel
            // can still arrive after it.
            if app.search_mode {
                apply_search(app, &text, event_tx).await;
            }
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}
