//! Request caching over the API client.
//!
//! One [`QueryCache`] per logical operation. Values are fresh for the stale
//! time, then served while a background refresh runs. Concurrent requests
//! for the same key share one network call, and failures get one retry.

mod cache;
mod state;

pub use cache::{Lookup, QueryCache, QueryError, QueryPolicy};
pub use state::QueryState;

use crate::api::{ApiClient, Character, CharacterQuery, CharactersPage};

/// The caches used by the UI, one per API operation.
#[derive(Clone)]
pub struct Queries {
    pub characters: QueryCache<CharacterQuery, CharactersPage>,
    pub character: QueryCache<i64, Character>,
}

impl Queries {
    pub fn new(policy: QueryPolicy) -> Self {
        Self {
            characters: QueryCache::new("characters", policy),
            character: QueryCache::new("character", policy),
        }
    }

    /// Fetch a list page through the characters cache.
    pub async fn fetch_characters(
        &self,
        api: &ApiClient,
        query: CharacterQuery,
    ) -> Result<CharactersPage, QueryError> {
        let api = api.clone();
        let params = query.clone();
        self.characters
            .fetch(query, move || {
                let api = api.clone();
                let params = params.clone();
                async move { api.list_characters(&params).await }
            })
            .await
    }

    /// Fetch one character through the character cache.
    pub async fn fetch_character(&self, api: &ApiClient, id: i64) -> Result<Character, QueryError> {
        let api = api.clone();
        self.character
            .fetch(id, move || {
                let api = api.clone();
                async move { api.get_character(id).await }
            })
            .await
    }
}
