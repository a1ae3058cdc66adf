//! Terminal User Interface module.
//!
//! This module provides the TUI for the character explorer, including:
//! - Main event loop (`run`)
//! - Input handling for the list, detail page and search mode
//! - Rendering for the list, filter bar and detail views
//! - Background task event processing
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `helpers` - Fetch spawning, navigation and search debounce
//! - `render` - View rendering dispatch
//! - `list` - Character list and pagination widgets
//! - `filter_bar` - Search field and filter controls
//! - `detail` - Character detail page
//! - `status` - Status bar widget
//! - `help` - Keybinding help overlay

mod detail;
mod events;
mod filter_bar;
mod help;
mod helpers;
mod input;
mod list;
mod loop_runner;
mod render;
mod status;

// Re-export the public API
pub use loop_runner::{run, Action};
