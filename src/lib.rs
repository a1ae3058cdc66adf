//! Terminal explorer for the Rick and Morty character API.
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! drive them directly.

pub mod api;
pub mod app;
pub mod config;
pub mod favorites;
pub mod keybindings;
pub mod navigation;
pub mod preferences;
pub mod query;
pub mod storage;
pub mod theme;
pub mod ui;
pub mod util;
