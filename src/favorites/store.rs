use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::TryRecvError};

use super::bus::{FavoritesBus, FavoritesEvent};
use crate::api::{ApiClient, ApiError, Character};
use crate::query::QueryError;
use crate::storage::{Database, FAVORITES_KEY};

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("Failed to save favorites: {0}")]
    Storage(String),
    #[error("Failed to encode favorites: {0}")]
    Encode(#[from] serde_json::Error),
}

// ============================================================================
// Fetch handoff
// ============================================================================

/// A batch fetch the store wants performed.
///
/// The store never awaits the network itself; whoever owns it runs the
/// fetch (inline or on a task) and hands the outcome back through
/// [`FavoritesStore::finish_fetch`].
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub generation: u64,
    pub ids: Vec<i64>,
}

impl PendingFetch {
    pub async fn run(self, api: &ApiClient) -> FetchOutcome {
        let result = api.get_characters_by_ids(&self.ids).await;
        FetchOutcome {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub result: Result<Vec<Character>, ApiError>,
}

// ============================================================================
// Hub
// ============================================================================

/// Owns what every favorites store shares: storage, the API client and the
/// change channel. Create one per process and hand out stores from it.
#[derive(Clone)]
pub struct FavoritesHub {
    storage: Database,
    api: ApiClient,
    bus: FavoritesBus,
    next_instance: Arc<AtomicU64>,
}

impl FavoritesHub {
    pub fn new(storage: Database, api: ApiClient) -> Self {
        Self {
            storage,
            api,
            bus: FavoritesBus::default(),
            next_instance: Arc::new(AtomicU64::new(1)),
        }
    }

    /// A new, uninitialized store. Call [`FavoritesStore::start`] or
    /// [`FavoritesStore::initialize`] before reading from it.
    pub fn store(&self) -> FavoritesStore {
        FavoritesStore {
            instance: self.next_instance.fetch_add(1, Ordering::Relaxed),
            storage: self.storage.clone(),
            api: self.api.clone(),
            bus: self.bus.clone(),
            rx: self.bus.subscribe(),
            ids: Vec::new(),
            characters: Vec::new(),
            initialized: false,
            is_loading: false,
            is_fetching: false,
            error: None,
            generation: 0,
            fetched_ids: Vec::new(),
        }
    }

    /// Receive every change notification, whichever store made it.
    pub fn subscribe(&self) -> broadcast::Receiver<FavoritesEvent> {
        self.bus.subscribe()
    }
}

// ============================================================================
// Store
// ============================================================================

/// One view's handle on the favorites set.
///
/// Holds the persisted IDs plus the character records fetched for them.
/// Several stores may be alive at once; each re-reads storage when another
/// one announces a change.
pub struct FavoritesStore {
    instance: u64,
    storage: Database,
    api: ApiClient,
    bus: FavoritesBus,
    rx: broadcast::Receiver<FavoritesEvent>,
    ids: Vec<i64>,
    characters: Vec<Character>,
    /// Set once the initial batch fetch finished, successfully or not.
    /// Refetches triggered by mutations wait for it.
    initialized: bool,
    is_loading: bool,
    is_fetching: bool,
    error: Option<QueryError>,
    generation: u64,
    /// IDs of the most recently started fetch.
    fetched_ids: Vec<i64>,
}

impl FavoritesStore {
    pub fn instance(&self) -> u64 {
        self.instance
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_favorite(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    /// Character records for the current set, as last fetched.
    pub fn favorite_characters(&self) -> &[Character] {
        &self.characters
    }

    /// True until the initial fetch completes.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Read the persisted set and return the initial batch fetch, if any.
    ///
    /// An empty set completes initialization immediately.
    pub async fn start(&mut self) -> Option<PendingFetch> {
        self.ids = self.read_persisted().await;
        self.is_loading = true;
        let pending = self.begin_fetch();
        if pending.is_none() {
            self.initialized = true;
            self.is_loading = false;
        }
        pending
    }

    /// Apply a fetch result.
    ///
    /// Results from a superseded generation are dropped. When the initial
    /// fetch completes and the set changed meanwhile, the follow-up fetch is
    /// returned.
    pub fn finish_fetch(&mut self, outcome: FetchOutcome) -> Option<PendingFetch> {
        if outcome.generation != self.generation {
            tracing::trace!(
                instance = self.instance,
                generation = outcome.generation,
                current = self.generation,
                "Dropping superseded favorites fetch"
            );
            return None;
        }

        self.is_fetching = false;
        match outcome.result {
            Ok(characters) => {
                self.characters = characters;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(instance = self.instance, error = %e, "Failed to fetch favorite characters");
                self.error = Some(e.into());
            }
        }

        if !self.initialized {
            self.initialized = true;
            self.is_loading = false;
            if self.ids != self.fetched_ids {
                return self.begin_fetch();
            }
        }
        None
    }

    /// Refetch records for the current set. Does nothing before the initial
    /// fetch completed.
    pub fn refetch(&mut self) -> Option<PendingFetch> {
        if !self.initialized {
            return None;
        }
        self.begin_fetch()
    }

    /// Run `pending` and any follow-up fetches to completion.
    pub async fn drive(&mut self, mut pending: Option<PendingFetch>) {
        while let Some(fetch) = pending.take() {
            let outcome = fetch.run(&self.api).await;
            pending = self.finish_fetch(outcome);
        }
    }

    /// [`start`](Self::start) and wait for the initial fetch.
    pub async fn initialize(&mut self) {
        let pending = self.start().await;
        self.drive(pending).await;
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Add `id` to the set. Adding an existing favorite is a no-op.
    ///
    /// Mutations start from the persisted set, so a change another store
    /// made since the last sync is never overwritten.
    pub async fn add(&mut self, id: i64) -> Result<Option<PendingFetch>, FavoritesError> {
        let mut next = self.read_persisted().await;
        if next.contains(&id) {
            return Ok(self.adopt(next));
        }
        next.push(id);
        self.commit(next).await
    }

    /// Remove every occurrence of `id`.
    pub async fn remove(&mut self, id: i64) -> Result<Option<PendingFetch>, FavoritesError> {
        let persisted = self.read_persisted().await;
        if !persisted.contains(&id) {
            return Ok(self.adopt(persisted));
        }
        let next: Vec<i64> = persisted.into_iter().filter(|x| *x != id).collect();
        self.characters.retain(|c| c.id != id);
        self.commit(next).await
    }

    pub async fn toggle(&mut self, id: i64) -> Result<Option<PendingFetch>, FavoritesError> {
        if self.read_persisted().await.contains(&id) {
            self.remove(id).await
        } else {
            self.add(id).await
        }
    }

    /// Handle notifications from other stores.
    ///
    /// Re-reads storage when another store changed it (or when notifications
    /// were dropped) and returns the refetch if the set differs.
    pub async fn sync(&mut self) -> Option<PendingFetch> {
        let mut dirty = false;
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.origin != self.instance => dirty = true,
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(instance = self.instance, skipped, "Favorites notifications lagged");
                    dirty = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if !dirty {
            return None;
        }
        self.reload().await
    }

    /// Re-read the persisted set.
    pub async fn reload(&mut self) -> Option<PendingFetch> {
        let ids = self.read_persisted().await;
        self.adopt(ids)
    }

    /// Take `ids` as the current set, refetching when it differs.
    fn adopt(&mut self, ids: Vec<i64>) -> Option<PendingFetch> {
        if ids == self.ids {
            return None;
        }
        tracing::debug!(instance = self.instance, count = ids.len(), "Favorites changed in storage");
        self.characters.retain(|c| ids.contains(&c.id));
        self.ids = ids;
        self.refetch()
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn begin_fetch(&mut self) -> Option<PendingFetch> {
        self.generation += 1;
        self.fetched_ids = self.ids.clone();
        if self.ids.is_empty() {
            self.characters.clear();
            self.is_fetching = false;
            self.error = None;
            return None;
        }
        self.is_fetching = true;
        Some(PendingFetch {
            generation: self.generation,
            ids: self.ids.clone(),
        })
    }

    async fn commit(&mut self, next: Vec<i64>) -> Result<Option<PendingFetch>, FavoritesError> {
        let encoded = serde_json::to_string(&next)?;
        self.storage
            .set_item(FAVORITES_KEY, &encoded)
            .await
            .map_err(|e| FavoritesError::Storage(format!("{e:#}")))?;
        self.ids = next;
        self.bus.publish(FavoritesEvent {
            origin: self.instance,
        });
        tracing::debug!(instance = self.instance, count = self.ids.len(), "Favorites saved");
        Ok(self.refetch())
    }

    /// Persisted IDs, deduplicated in order. Unreadable or malformed data
    /// is logged and treated as an empty set.
    async fn read_persisted(&self) -> Vec<i64> {
        let raw = match self.storage.get_item(FAVORITES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read favorites from storage");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<i64>>(&raw) {
            Ok(ids) => {
                let mut unique = Vec::with_capacity(ids.len());
                for id in ids {
                    if !unique.contains(&id) {
                        unique.push(id);
                    }
                }
                unique
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed favorites in storage, starting empty");
                Vec::new()
            }
        }
    }
}
