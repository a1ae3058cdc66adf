//! Remote character API: wire types and the HTTP client.

mod client;
mod types;

pub use client::{build_http_client, ApiClient, ApiError, DEFAULT_BASE_URL};
pub use types::{
    Character, CharacterBatch, CharacterQuery, CharacterStatus, CharactersPage, Gender, NamedRef,
    PageInfo,
};
