//! Helper functions for UI operations.
//!
//! Background fetches, location changes and the search debounce live here so
//! that input and event handlers share one way of doing each.

use crate::api::CharacterQuery;
use crate::app::{App, AppEvent, FetchTicket, View};
use crate::favorites::{FavoritesEvent, PendingFetch};
use crate::navigation::{Location, SearchParams};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Wraps a future to catch panics and convert them to errors.
///
/// A panicking background task would otherwise vanish without the UI ever
/// hearing about it; callers turn the message into `AppEvent::TaskPanicked`.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}

/// Spawn `future` and deliver its event, or a `TaskPanicked` if it panics.
pub(super) fn spawn_task<F>(event_tx: &mpsc::Sender<AppEvent>, task: &'static str, future: F)
where
    F: Future<Output = AppEvent> + Send + 'static,
{
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let event = match catch_task_panic(future).await {
            Ok(event) => event,
            Err(error) => {
                tracing::error!(task, error = %error, "Background task panicked");
                AppEvent::TaskPanicked { task, error }
            }
        };
        if tx.send(event).await.is_err() {
            tracing::debug!(task, "Event receiver dropped");
        }
    });
}

// ============================================================================
// Fetches
// ============================================================================

pub(super) fn spawn_characters_fetch(
    app: &App,
    ticket: FetchTicket<CharacterQuery>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let queries = app.queries.clone();
    let api = app.api.clone();
    tracing::debug!(generation = ticket.generation, query = ?ticket.key, "Fetching characters");
    spawn_task(event_tx, "characters", async move {
        let result = queries.fetch_characters(&api, ticket.key).await;
        AppEvent::CharactersLoaded {
            generation: ticket.generation,
            result,
        }
    });
}

pub(super) fn spawn_character_fetch(
    app: &App,
    ticket: FetchTicket<i64>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let queries = app.queries.clone();
    let api = app.api.clone();
    let id = ticket.key;
    spawn_task(event_tx, "character", async move {
        let result = queries.fetch_character(&api, id).await;
        AppEvent::CharacterLoaded {
            id,
            generation: ticket.generation,
            result,
        }
    });
}

pub(super) fn spawn_favorites_fetch(
    app: &App,
    instance: u64,
    pending: PendingFetch,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let api = app.api.clone();
    tracing::debug!(instance, count = pending.ids.len(), "Fetching favorite characters");
    spawn_task(event_tx, "favorites", async move {
        let outcome = pending.run(&api).await;
        AppEvent::FavoritesLoaded { instance, outcome }
    });
}

/// Forward change notifications from the favorites hub to the event loop.
///
/// A lagged receiver still means "something changed", so it is forwarded too.
pub(super) fn spawn_favorites_listener(
    mut rx: broadcast::Receiver<FavoritesEvent>,
    event_tx: &mpsc::Sender<AppEvent>,
) -> JoinHandle<()> {
    let tx = event_tx.clone();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    if tx.send(AppEvent::FavoritesChanged).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

// ============================================================================
// Location
// ============================================================================

/// Bring view state in line with the current location and start whatever
/// requests it needs.
pub(super) async fn sync_location(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    match app.navigator.current().clone() {
        Location::List(_) => {
            app.close_detail();
            if let Some(ticket) = app.prepare_list_query() {
                spawn_characters_fetch(app, ticket, event_tx);
            }
            if !app.search_mode {
                app.search_input = app.filters().name.unwrap_or_default();
            }
        }
        Location::Detail(id) => {
            if app.search_mode {
                app.exit_search();
            }
            if let Some(pending) = app.open_detail(id).await {
                if let Some(detail) = &app.detail {
                    let instance = detail.favorites.instance();
                    spawn_favorites_fetch(app, instance, pending, event_tx);
                }
            }
            if let Some(ticket) = app.prepare_detail_query() {
                spawn_character_fetch(app, ticket, event_tx);
            }
        }
    }
    app.needs_redraw = true;
}

pub(super) async fn navigate(
    app: &mut App,
    location: Location,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    app.navigator.push(location);
    sync_location(app, event_tx).await;
}

/// Navigate to the list with a query string derived from the current one.
pub(super) async fn update_query<F>(app: &mut App, update: F, event_tx: &mpsc::Sender<AppEvent>)
where
    F: FnOnce(&SearchParams) -> SearchParams,
{
    let next = update(&app.list_params());
    navigate(app, Location::List(next), event_tx).await;
}

/// Return to the previous location, or to the list when there is none.
pub(super) async fn go_back(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if !app.navigator.back() {
        app.navigator.replace(Location::default());
    }
    sync_location(app, event_tx).await;
}

// ============================================================================
// Search
// ============================================================================

/// (Re)start the search debounce for the current input.
pub(super) fn schedule_search(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let tx = event_tx.clone();
    let text = app.search_input.clone();
    app.search_debounce.schedule(async move {
        let _ = tx.send(AppEvent::SearchSettled(text)).await;
    });
}

/// Apply search text to the location unless it is already applied.
pub(super) async fn apply_search(app: &mut App, text: &str, event_tx: &mpsc::Sender<AppEvent>) {
    if app.view() != View::List {
        return;
    }
    let current = app.filters().name.unwrap_or_default();
    if current == text.trim() {
        return;
    }
    let text = text.to_string();
    update_query(app, |p| crate::navigation::set_search(p, &text), event_tx).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::config::Config;
    use crate::preferences::PreferenceManager;
    use crate::storage::Database;
    use std::time::Duration;

    async fn test_app() -> App {
        let storage = Database::open(":memory:").await.unwrap();
        let api = ApiClient::new(reqwest::Client::new(), "http://127.0.0.1:9").unwrap();
        let config = Config::default();
        let prefs = PreferenceManager::from_config(&config);
        App::new(storage, api, &config, prefs, Location::default())
    }

    #[tokio::test]
    async fn test_catch_task_panic_reports_message() {
        let ok = catch_task_panic(async { 7 }).await;
        assert_eq!(ok, Ok(7));

        let err = catch_task_panic(async {
            panic!("boom");
        })
        .await;
        assert_eq!(err, Err::<(), _>("boom".to_string()));
    }

    #[tokio::test]
    async fn test_spawned_panic_becomes_event() {
        let (tx, mut rx) = mpsc::channel(4);
        spawn_task(&tx, "probe", async {
            panic!("task failed");
        });
        match rx.recv().await {
            Some(AppEvent::TaskPanicked { task, error }) => {
                assert_eq!(task, "probe");
                assert_eq!(error, "task failed");
            }
            _ => panic!("expected TaskPanicked"),
        }
    }

    #[tokio::test]
    async fn test_rapid_typing_settles_once() {
        let mut app = test_app().await;
        let (tx, mut rx) = mpsc::channel(8);
        tokio::time::pause();

        for c in "rick ".chars() {
            app.search_input.push(c);
            schedule_search(&mut app, &tx);
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;
        match rx.recv().await {
            Some(AppEvent::SearchSettled(text)) => assert_eq!(text, "rick "),
            _ => panic!("expected SearchSettled"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_exit_search_cancels_pending() {
        let mut app = test_app().await;
        let (tx, mut rx) = mpsc::channel(8);
        tokio::time::pause();

        app.enter_search();
        app.search_input.push('m');
        schedule_search(&mut app, &tx);
        app.exit_search();

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_apply_search_updates_location() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(8);
        app.navigator
            .replace(Location::List(SearchParams::parse("status=Alive&page=3")));

        apply_search(&mut app, "  morty ", &tx).await;
        assert_eq!(
            app.navigator.current().to_string(),
            "/?status=Alive&name=morty"
        );

        // Applying the same text again does not add a history entry
        apply_search(&mut app, "morty", &tx).await;
        assert!(app.navigator.back());
        assert_eq!(
            app.navigator.current().to_string(),
            "/?status=Alive&page=3"
        );
    }

    #[tokio::test]
    async fn test_go_back_without_history_lands_on_list() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(8);
        app.navigator.replace(Location::Detail(4));

        go_back(&mut app, &tx).await;
        assert_eq!(app.view(), View::List);
        assert!(app.detail.is_none());
    }
}
