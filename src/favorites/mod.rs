//! Favorite characters persisted in local storage.
//!
//! A [`FavoritesHub`] hands out [`FavoritesStore`]s. Each store keeps the
//! ID set plus the character records fetched for it, and stores stay
//! consistent by re-reading storage whenever another one announces a change
//! on the hub's [`FavoritesBus`].

mod bus;
mod store;

pub use bus::{FavoritesBus, FavoritesEvent};
pub use store::{FavoritesError, FavoritesHub, FavoritesStore, FetchOutcome, PendingFetch};
