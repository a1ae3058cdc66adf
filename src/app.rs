use crate::api::{ApiClient, Character, CharacterQuery, CharactersPage};
use crate::config::Config;
use crate::favorites::{FavoritesError, FavoritesHub, FavoritesStore, FetchOutcome, PendingFetch};
use crate::keybindings::KeybindingRegistry;
use crate::navigation::{FilterParams, Location, Navigator, Pagination, SearchParams};
use crate::preferences::PreferenceManager;
use crate::query::{Lookup, Queries, QueryCache, QueryError, QueryState};
use crate::storage::Database;
use crate::theme::{StyleMap, ThemeVariant};
use crate::util::Debouncer;
use anyhow::Result;
use ratatui::style::Style;
use std::borrow::Cow;
use std::hash::Hash;
use tokio::time::Instant;

/// Seconds a status message stays visible.
const STATUS_TTL_SECS: u64 = 3;

// ============================================================================
// Views and events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Detail,
}

/// A request the app wants made, tagged so the answer can be matched up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket<K> {
    pub generation: u64,
    pub key: K,
}

/// Events from background tasks
pub enum AppEvent {
    CharactersLoaded {
        generation: u64,
        result: Result<CharactersPage, QueryError>,
    },
    CharacterLoaded {
        id: i64,
        generation: u64,
        result: Result<Character, QueryError>,
    },
    /// A favorites batch fetch for the store with this instance ID finished.
    FavoritesLoaded {
        instance: u64,
        outcome: FetchOutcome,
    },
    /// Some store changed the persisted favorites.
    FavoritesChanged,
    /// Search input has been quiet for the debounce delay.
    SearchSettled(String),
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

/// State of the open detail page.
///
/// Owns its own favorites store, so the page stays consistent with the list
/// only through storage and change notifications.
pub struct DetailState {
    pub id: i64,
    pub character: QueryState<Character>,
    generation: u64,
    pub favorites: FavoritesStore,
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub storage: Database,
    pub api: ApiClient,
    pub queries: Queries,
    pub prefs: PreferenceManager,

    // Theme
    pub theme_variant: ThemeVariant,
    pub theme: StyleMap,

    pub keybindings: KeybindingRegistry,

    /// Current location; the list filters live in its query string.
    pub navigator: Navigator,

    // List
    pub characters: QueryState<CharactersPage>,
    characters_key: Option<CharacterQuery>,
    characters_generation: u64,
    pub selected: usize,

    // Favorites
    pub favorites_hub: FavoritesHub,
    /// Store backing the list view and the filter bar counter.
    pub favorites: FavoritesStore,

    pub detail: Option<DetailState>,

    // Search
    pub search_mode: bool,
    pub search_input: String,
    pub search_debounce: Debouncer,

    pub status_message: Option<(Cow<'static, str>, Instant)>,

    /// Dirty flag to skip unnecessary frame renders
    pub needs_redraw: bool,

    pub show_help: bool,
    pub help_scroll_offset: usize,
}

impl App {
    pub fn new(
        storage: Database,
        api: ApiClient,
        config: &Config,
        prefs: PreferenceManager,
        start: Location,
    ) -> Self {
        let mut keybindings = KeybindingRegistry::new();
        for warning in keybindings.apply_overrides(&prefs.keybinding_overrides()) {
            tracing::warn!(%warning, "Keybinding override ignored");
        }

        let theme_variant = ThemeVariant::from_dark_mode(prefs.dark_mode());
        let favorites_hub = FavoritesHub::new(storage.clone(), api.clone());
        let favorites = favorites_hub.store();
        let search_input = match &start {
            Location::List(params) => params.get("name").unwrap_or_default().to_string(),
            Location::Detail(_) => String::new(),
        };

        Self {
            storage,
            api,
            queries: Queries::new(config.query_policy()),
            prefs,
            theme_variant,
            theme: StyleMap::from_palette(&theme_variant.palette()),
            keybindings,
            navigator: Navigator::new(start),
            characters: QueryState::default(),
            characters_key: None,
            characters_generation: 0,
            selected: 0,
            favorites_hub,
            favorites,
            detail: None,
            search_mode: false,
            search_input,
            search_debounce: Debouncer::new(config.search_debounce()),
            status_message: None,
            needs_redraw: true,
            show_help: false,
            help_scroll_offset: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Theme
    // ------------------------------------------------------------------------

    /// Resolve a semantic role name to its `Style`.
    pub fn style(&self, role: &str) -> Style {
        self.theme.resolve(role)
    }

    pub fn set_theme(&mut self, variant: ThemeVariant) {
        self.theme_variant = variant;
        self.theme = StyleMap::from_palette(&variant.palette());
        self.needs_redraw = true;
    }

    /// Flip dark mode and persist the choice. Returns the new theme name.
    pub async fn toggle_dark_mode(&mut self) -> Result<&'static str> {
        let next = self.theme_variant.next();
        self.prefs.set_dark_mode(&self.storage, next.is_dark()).await?;
        self.set_theme(next);
        Ok(next.name())
    }

    // ------------------------------------------------------------------------
    // Location
    // ------------------------------------------------------------------------

    pub fn view(&self) -> View {
        match self.navigator.current() {
            Location::List(_) => View::List,
            Location::Detail(_) => View::Detail,
        }
    }

    /// Query string of the list location, empty on the detail page.
    pub fn list_params(&self) -> SearchParams {
        self.navigator
            .current()
            .params()
            .cloned()
            .unwrap_or_default()
    }

    pub fn filters(&self) -> FilterParams {
        match self.navigator.current().params() {
            Some(params) => FilterParams::from_query(params),
            None => FilterParams::default(),
        }
    }

    // ------------------------------------------------------------------------
    // List
    // ------------------------------------------------------------------------

    /// Characters shown in the list, in display order.
    ///
    /// The favorites view shows the favorites store's records instead of the
    /// list page.
    pub fn visible_characters(&self) -> Vec<&Character> {
        let filters = self.filters();
        let source: &[Character] = if filters.favorites_only {
            self.favorites.favorite_characters()
        } else {
            self.characters
                .data()
                .map(|page| page.results.as_slice())
                .unwrap_or_default()
        };
        filters.sorted(source)
    }

    pub fn selected_character(&self) -> Option<&Character> {
        self.visible_characters().get(self.selected).copied()
    }

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn nav_down(&mut self) {
        let len = self.visible_characters().len();
        if len > 0 {
            self.selected = self.selected.saturating_add(1).min(len - 1);
        }
    }

    pub fn clamp_selection(&mut self) {
        let len = self.visible_characters().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Pagination control, when one should be shown.
    pub fn pagination(&self) -> Option<Pagination> {
        let filters = self.filters();
        let page = self.characters.data()?;
        let pagination = Pagination::new(filters.page, &page.info);
        pagination
            .is_visible(filters.favorites_only)
            .then_some(pagination)
    }

    /// Error to show in place of the list.
    pub fn list_error(&self) -> Option<&QueryError> {
        self.characters.error().or_else(|| {
            if self.filters().favorites_only {
                self.favorites.error()
            } else {
                None
            }
        })
    }

    /// Nothing to show yet.
    pub fn list_is_loading(&self) -> bool {
        (self.filters().favorites_only && self.favorites.is_loading())
            || self.characters.is_loading()
    }

    /// A refresh is running behind data that is already on screen.
    pub fn is_refreshing(&self) -> bool {
        let list = self.characters.is_fetching() && !self.characters.is_loading();
        let detail = self
            .detail
            .as_ref()
            .is_some_and(|d| d.character.is_fetching() && !d.character.is_loading());
        list || detail || (self.favorites.is_fetching() && !self.favorites.is_loading())
    }

    /// Bring the list query in line with the current filters.
    ///
    /// Fresh cache hits are shown without a request. Stale hits are shown
    /// and refreshed. On a key change the previous page stays up as a
    /// placeholder until the new one arrives. A failed query is not retried
    /// here; see [`retry_list`](Self::retry_list).
    pub fn prepare_list_query(&mut self) -> Option<FetchTicket<CharacterQuery>> {
        let key = self.filters().character_query();
        let key_changed = self.characters_key.as_ref() != Some(&key);
        if key_changed {
            self.characters_key = Some(key.clone());
            self.selected = 0;
        }

        match plan_query(&self.queries.characters, &key, key_changed, &mut self.characters) {
            Plan::Ready => {
                self.characters_generation += 1;
                self.clamp_selection();
                None
            }
            Plan::Idle => None,
            Plan::Fetch => {
                self.characters_generation += 1;
                Some(FetchTicket {
                    generation: self.characters_generation,
                    key,
                })
            }
        }
    }

    /// Issue the current list request again.
    pub fn retry_list(&mut self) -> Option<FetchTicket<CharacterQuery>> {
        let key = self.characters_key.clone()?;
        self.characters.begin();
        self.characters_generation += 1;
        Some(FetchTicket {
            generation: self.characters_generation,
            key,
        })
    }

    /// Apply a list result. Returns false for a superseded request.
    pub fn finish_characters(
        &mut self,
        generation: u64,
        result: Result<CharactersPage, QueryError>,
    ) -> bool {
        if generation != self.characters_generation {
            tracing::trace!(generation, current = self.characters_generation, "Dropping superseded list result");
            return false;
        }
        match result {
            Ok(page) => {
                tracing::debug!(count = page.results.len(), pages = page.info.pages, "Characters loaded");
                self.characters.succeed(page);
                self.clamp_selection();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load characters");
                self.characters.fail(e);
            }
        }
        true
    }

    // ------------------------------------------------------------------------
    // Detail
    // ------------------------------------------------------------------------

    /// Set up the detail page for `id`, creating its favorites store.
    ///
    /// Returns the store's initial fetch. Reopening the current page keeps
    /// its state.
    pub async fn open_detail(&mut self, id: i64) -> Option<PendingFetch> {
        if self.detail.as_ref().is_some_and(|d| d.id == id) {
            return None;
        }
        let mut favorites = self.favorites_hub.store();
        let pending = favorites.start().await;
        self.detail = Some(DetailState {
            id,
            character: QueryState::default(),
            generation: 0,
            favorites,
        });
        pending
    }

    pub fn close_detail(&mut self) {
        if let Some(detail) = self.detail.take() {
            tracing::debug!(id = detail.id, "Closed detail page");
        }
    }

    /// Bring the detail query in line with the open page.
    pub fn prepare_detail_query(&mut self) -> Option<FetchTicket<i64>> {
        let detail = self.detail.as_mut()?;
        let id = detail.id;
        // A fresh DetailState has never been asked for anything.
        let key_changed = detail.generation == 0;
        match plan_query(&self.queries.character, &id, key_changed, &mut detail.character) {
            Plan::Ready => {
                detail.generation += 1;
                None
            }
            Plan::Idle => None,
            Plan::Fetch => {
                detail.generation += 1;
                Some(FetchTicket {
                    generation: detail.generation,
                    key: id,
                })
            }
        }
    }

    pub fn retry_detail(&mut self) -> Option<FetchTicket<i64>> {
        let detail = self.detail.as_mut()?;
        detail.character.begin();
        detail.generation += 1;
        Some(FetchTicket {
            generation: detail.generation,
            key: detail.id,
        })
    }

    pub fn finish_character(
        &mut self,
        id: i64,
        generation: u64,
        result: Result<Character, QueryError>,
    ) -> bool {
        let Some(detail) = self.detail.as_mut().filter(|d| d.id == id) else {
            tracing::trace!(id, "Dropping result for a closed detail page");
            return false;
        };
        if generation != detail.generation {
            return false;
        }
        match result {
            Ok(character) => detail.character.succeed(character),
            Err(e) => {
                tracing::warn!(id, error = %e, "Failed to load character");
                detail.character.fail(e);
            }
        }
        true
    }

    // ------------------------------------------------------------------------
    // Favorites
    // ------------------------------------------------------------------------

    /// The store behind the current view.
    pub fn active_favorites(&self) -> &FavoritesStore {
        match &self.detail {
            Some(detail) if self.view() == View::Detail => &detail.favorites,
            _ => &self.favorites,
        }
    }

    fn store_mut(&mut self, instance: u64) -> Option<&mut FavoritesStore> {
        if self.favorites.instance() == instance {
            return Some(&mut self.favorites);
        }
        self.detail
            .as_mut()
            .map(|d| &mut d.favorites)
            .filter(|store| store.instance() == instance)
    }

    /// Toggle the favorite under the cursor (list) or on the open page.
    ///
    /// Returns the store instance and the refetch it asked for.
    pub async fn toggle_favorite(
        &mut self,
    ) -> Result<Option<(u64, PendingFetch)>, FavoritesError> {
        let target = match self.view() {
            View::List => self.selected_character().map(|c| (c.id, c.name.clone())),
            View::Detail => self.detail.as_ref().map(|d| {
                let name = d
                    .character
                    .data()
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| format!("#{}", d.id));
                (d.id, name)
            }),
        };
        let Some((id, name)) = target else {
            return Ok(None);
        };

        let in_detail = self.view() == View::Detail;
        let store = match self.detail.as_mut() {
            Some(detail) if in_detail => &mut detail.favorites,
            _ => &mut self.favorites,
        };
        if store.is_loading() {
            self.set_status("Favorites are still loading");
            return Ok(None);
        }

        let was_favorite = store.is_favorite(id);
        let instance = store.instance();
        let pending = store.toggle(id).await?;
        self.set_status(if was_favorite {
            format!("Removed {} from favorites", name)
        } else {
            format!("Added {} to favorites", name)
        });
        self.clamp_selection();
        Ok(pending.map(|p| (instance, p)))
    }

    /// Apply a favorites fetch. Outcomes for stores that are gone are dropped.
    pub fn finish_favorites(&mut self, instance: u64, outcome: FetchOutcome) -> Option<PendingFetch> {
        let store = self.store_mut(instance)?;
        let follow_up = store.finish_fetch(outcome);
        self.clamp_selection();
        follow_up
    }

    /// Let every live store pick up changes made by the others.
    pub async fn sync_favorites(&mut self) -> Vec<(u64, PendingFetch)> {
        let mut fetches = Vec::new();
        if let Some(p) = self.favorites.sync().await {
            fetches.push((self.favorites.instance(), p));
        }
        if let Some(detail) = self.detail.as_mut() {
            if let Some(p) = detail.favorites.sync().await {
                fetches.push((detail.favorites.instance(), p));
            }
        }
        self.clamp_selection();
        fetches
    }

    /// Retry a failed favorites fetch on the active store.
    pub fn retry_favorites(&mut self) -> Option<(u64, PendingFetch)> {
        let in_detail = self.view() == View::Detail;
        let store = match self.detail.as_mut() {
            Some(detail) if in_detail => &mut detail.favorites,
            _ => &mut self.favorites,
        };
        store.error()?;
        let instance = store.instance();
        store.refetch().map(|p| (instance, p))
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    pub fn enter_search(&mut self) {
        self.search_mode = true;
        self.search_input = self.filters().name.unwrap_or_default();
    }

    /// Leave search mode without applying pending input.
    pub fn exit_search(&mut self) {
        self.search_debounce.cancel();
        self.search_mode = false;
        self.search_input = self.filters().name.unwrap_or_default();
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear the status message if expired. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

// ============================================================================
// Query planning
// ============================================================================

enum Plan {
    /// Fresh data is on screen; no request needed.
    Ready,
    /// A request is already running, or the last one failed.
    Idle,
    Fetch,
}

fn plan_query<K, V>(
    cache: &QueryCache<K, V>,
    key: &K,
    key_changed: bool,
    state: &mut QueryState<V>,
) -> Plan
where
    K: Hash + Eq + Clone + std::fmt::Debug + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    match cache.lookup(key) {
        Lookup::Fresh(value) => {
            state.succeed(value);
            Plan::Ready
        }
        Lookup::Stale(value) => {
            if !key_changed && state.is_fetching() {
                return Plan::Idle;
            }
            state.show(value);
            state.begin();
            Plan::Fetch
        }
        Lookup::Missing => {
            if key_changed {
                state.begin_key_change();
                return Plan::Fetch;
            }
            if state.is_fetching() || state.error().is_some() {
                return Plan::Idle;
            }
            state.begin();
            Plan::Fetch
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, NamedRef, PageInfo};
    use crate::navigation::{set_filter, FilterKey};
    use crate::storage::FAVORITES_KEY;
    use pretty_assertions::assert_eq;
    use tokio::time::{self, Duration};

    async fn test_app() -> App {
        test_app_at(Location::default()).await
    }

    async fn test_app_at(start: Location) -> App {
        let storage = Database::open(":memory:").await.unwrap();
        let api = ApiClient::new(reqwest::Client::new(), "http://127.0.0.1:9").unwrap();
        let config = Config::default();
        let prefs = PreferenceManager::from_config(&config);
        App::new(storage, api, &config, prefs, start)
    }

    fn character(id: i64) -> Character {
        Character {
            id,
            name: format!("Character {id}"),
            status: crate::api::CharacterStatus::Alive,
            species: "Human".into(),
            kind: None,
            gender: crate::api::Gender::Male,
            origin: NamedRef::default(),
            location: NamedRef::default(),
            image: String::new(),
            episode: Vec::new(),
            url: String::new(),
            created: String::new(),
        }
    }

    fn page(ids: &[i64], pages: u32) -> CharactersPage {
        CharactersPage {
            info: PageInfo {
                count: ids.len() as u32,
                pages,
                next: (pages > 1).then(|| "next".to_string()),
                prev: None,
            },
            results: ids.iter().copied().map(character).collect(),
        }
    }

    fn http_500() -> QueryError {
        ApiError::HttpStatus {
            resource: "characters",
            status: 500,
        }
        .into()
    }

    #[tokio::test]
    async fn test_first_list_query_fetches_default_page() {
        let mut app = test_app().await;
        let ticket = app.prepare_list_query().unwrap();
        assert_eq!(ticket.key, CharacterQuery::default());
        assert!(app.list_is_loading());

        // Nothing changed: no duplicate request
        assert!(app.prepare_list_query().is_none());
    }

    #[tokio::test]
    async fn test_superseded_result_is_dropped() {
        let mut app = test_app().await;
        let first = app.prepare_list_query().unwrap();
        app.navigator.push(Location::List(SearchParams::parse("status=Dead")));
        let second = app.prepare_list_query().unwrap();

        assert!(!app.finish_characters(first.generation, Ok(page(&[1], 1))));
        assert!(app.characters.data().is_none());
        assert!(app.finish_characters(second.generation, Ok(page(&[2], 1))));
        assert_eq!(app.visible_characters()[0].id, 2);
    }

    #[tokio::test]
    async fn test_key_change_keeps_placeholder() {
        let mut app = test_app().await;
        let ticket = app.prepare_list_query().unwrap();
        app.finish_characters(ticket.generation, Ok(page(&[1, 2], 3)));

        app.navigator.push(Location::List(SearchParams::parse("page=2")));
        assert!(app.prepare_list_query().is_some());
        assert!(app.characters.is_placeholder());
        assert!(!app.list_is_loading());
        assert_eq!(app.visible_characters().len(), 2);
    }

    #[tokio::test]
    async fn test_error_waits_for_retry() {
        let mut app = test_app().await;
        let ticket = app.prepare_list_query().unwrap();
        app.finish_characters(ticket.generation, Err(http_500()));
        assert!(app.list_error().is_some());

        assert!(app.prepare_list_query().is_none());
        let retry = app.retry_list().unwrap();
        assert_eq!(retry.key, ticket.key);
        assert!(app.list_error().is_none());
    }

    #[tokio::test]
    async fn test_sort_reverses_visible_order() {
        let mut app = test_app().await;
        let ticket = app.prepare_list_query().unwrap();
        app.finish_characters(ticket.generation, Ok(page(&[1, 2, 3], 1)));
        app.navigator.push(Location::List(SearchParams::parse("sort=desc")));

        // Sort is applied locally, so the request key is unchanged
        let refresh = app.prepare_list_query();
        assert!(refresh.is_none_or(|t| t.key == CharacterQuery::default()));
        let ids: Vec<i64> = app.visible_characters().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_favorites_view_ignores_status_filter() {
        let mut app = test_app_at(Location::List(SearchParams::parse("favorites=true"))).await;
        let before = app.prepare_list_query().unwrap();
        assert_eq!(before.key, CharacterQuery::default());

        let next = set_filter(&app.list_params(), FilterKey::Status, "Alive");
        assert_eq!(next.get("favorites"), Some("true"));
        app.navigator.push(Location::List(next));
        // Same request key, so no new request
        assert!(app.prepare_list_query().is_none());
        assert!(app.visible_characters().is_empty());
        assert!(app.pagination().is_none());
    }

    #[tokio::test]
    async fn test_huge_page_in_location_keeps_pagination_sane() {
        let mut app = test_app().await;
        let ticket = app.prepare_list_query().unwrap();
        app.finish_characters(ticket.generation, Ok(page(&[1, 2], 42)));

        app.navigator
            .push(Location::List(SearchParams::parse("page=4294967295")));
        assert!(app.prepare_list_query().is_some());

        let pagination = app.pagination().unwrap();
        assert_eq!(pagination.page, u32::MAX);
        assert!(pagination.window.is_empty());
    }

    #[tokio::test]
    async fn test_pagination_hidden_for_single_page() {
        let mut app = test_app().await;
        let ticket = app.prepare_list_query().unwrap();
        app.finish_characters(ticket.generation, Ok(page(&[1], 1)));
        assert!(app.pagination().is_none());
    }

    #[tokio::test]
    async fn test_navigation_clamps_to_visible() {
        let mut app = test_app().await;
        let ticket = app.prepare_list_query().unwrap();
        app.finish_characters(ticket.generation, Ok(page(&[1, 2], 1)));
        app.nav_down();
        app.nav_down();
        assert_eq!(app.selected, 1);
        app.nav_up();
        app.nav_up();
        assert_eq!(app.selected, 0);
    }

    #[tokio::test]
    async fn test_toggle_favorite_from_list_persists() {
        let mut app = test_app().await;
        app.favorites.initialize().await;
        let ticket = app.prepare_list_query().unwrap();
        app.finish_characters(ticket.generation, Ok(page(&[7], 1)));

        let (instance, pending) = app.toggle_favorite().await.unwrap().unwrap();
        assert_eq!(instance, app.favorites.instance());
        assert_eq!(pending.ids, vec![7]);
        assert!(app.favorites.is_favorite(7));
        assert_eq!(
            app.storage.get_item(FAVORITES_KEY).await.unwrap(),
            Some("[7]".to_string())
        );

        app.finish_favorites(
            instance,
            FetchOutcome {
                generation: pending.generation,
                result: Ok(vec![character(7)]),
            },
        );
        assert_eq!(app.favorites.favorite_characters().len(), 1);
    }

    #[tokio::test]
    async fn test_detail_store_syncs_with_list_store() {
        let mut app = test_app_at(Location::Detail(3)).await;
        app.favorites.initialize().await;
        assert!(app.open_detail(3).await.is_none());
        assert_eq!(app.prepare_detail_query().map(|t| t.key), Some(3));

        app.toggle_favorite().await.unwrap();
        assert!(app.detail.as_ref().unwrap().favorites.is_favorite(3));
        assert!(!app.favorites.is_favorite(3));

        let fetches = app.sync_favorites().await;
        assert!(app.favorites.is_favorite(3));
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].0, app.favorites.instance());
    }

    #[tokio::test]
    async fn test_outcome_for_closed_store_is_dropped() {
        let mut app = test_app_at(Location::Detail(5)).await;
        app.open_detail(5).await;
        let instance = app.detail.as_ref().unwrap().favorites.instance();
        app.close_detail();

        let follow_up = app.finish_favorites(
            instance,
            FetchOutcome {
                generation: 1,
                result: Ok(vec![character(5)]),
            },
        );
        assert!(follow_up.is_none());
        assert!(!app.finish_character(5, 1, Ok(character(5))));
    }

    #[tokio::test]
    async fn test_search_mode_round_trip() {
        let mut app = test_app_at(Location::List(SearchParams::parse("name=rick"))).await;
        assert_eq!(app.search_input, "rick");
        app.enter_search();
        app.search_input.push_str("y");
        app.exit_search();
        assert!(!app.search_mode);
        assert_eq!(app.search_input, "rick");
    }

    #[tokio::test]
    async fn test_status_expires_after_3_seconds() {
        let mut app = test_app().await;
        time::pause();
        app.set_status("Test message");

        time::advance(Duration::from_secs(2)).await;
        assert!(!app.clear_expired_status());
        assert!(app.status_message.is_some());

        time::advance(Duration::from_secs(2)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_dark_mode_toggle_persists() {
        let mut app = test_app().await;
        assert_eq!(app.theme_variant, ThemeVariant::Dark);
        assert_eq!(app.toggle_dark_mode().await.unwrap(), "Light");
        assert_eq!(
            app.storage.get_item(crate::storage::DARK_MODE_KEY).await.unwrap(),
            Some("false".to_string())
        );
    }
}
