//! Location-driven filter state.
//!
//! The current [`Location`]'s query string is the only place filter values
//! live. Views derive [`FilterParams`] from it and change filters by
//! building a new query string and navigating to it.

mod filters;
mod location;
mod pagination;
mod search_params;

pub use filters::{
    clear_all, cycle_filter, set_filter, set_page, set_search, toggle_sort, FilterKey,
    FilterParams, SortDirection, GENDER_OPTIONS, SPECIES_OPTIONS, STATUS_OPTIONS,
};
pub use location::{Location, LocationError, Navigator};
pub use pagination::Pagination;
pub use search_params::SearchParams;
