//! Small helpers shared across the crate.
//!
//! - **Debounce**: cancellable delayed tasks for search input
//! - **Text**: Unicode-aware width and truncation, escape stripping
//! - **URL validation**: checks before opening API-provided URLs

mod debounce;
mod text;
mod url_validator;

pub use debounce::Debouncer;
pub use text::{display_width, sanitize, truncate_to_width};
pub use url_validator::{validate_url_for_open, UrlValidationError};

/// Longest search text accepted from the keyboard.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
