use super::search_params::SearchParams;
use crate::api::{Character, CharacterQuery};

pub const STATUS_OPTIONS: &[&str] = &["", "Alive", "Dead", "unknown"];
pub const GENDER_OPTIONS: &[&str] = &["", "Female", "Male", "Genderless", "unknown"];
pub const SPECIES_OPTIONS: &[&str] = &[
    "",
    "Human",
    "Alien",
    "Humanoid",
    "Robot",
    "Animal",
    "Mythological",
    "Disease",
    "Unknown",
];

// ============================================================================
// Sort
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything but `desc` reads as ascending.
    pub fn parse(value: &str) -> Self {
        if value == "desc" {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortDirection::Asc => "Ascending ↑",
            SortDirection::Desc => "Descending ↓",
        }
    }
}

// ============================================================================
// Filter keys
// ============================================================================

/// Categorical filters. Changing one resets the search text and page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Status,
    Species,
    Gender,
    Favorites,
}

impl FilterKey {
    pub fn param(&self) -> &'static str {
        match self {
            FilterKey::Status => "status",
            FilterKey::Species => "species",
            FilterKey::Gender => "gender",
            FilterKey::Favorites => "favorites",
        }
    }

    /// Selectable values, the empty string meaning "any".
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            FilterKey::Status => STATUS_OPTIONS,
            FilterKey::Species => SPECIES_OPTIONS,
            FilterKey::Gender => GENDER_OPTIONS,
            FilterKey::Favorites => &["", "true"],
        }
    }
}

// ============================================================================
// FilterParams
// ============================================================================

/// Filter state read from the current location's query string.
///
/// Never stored; derive it again whenever the location changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParams {
    pub page: u32,
    pub name: Option<String>,
    pub status: Option<String>,
    pub species: Option<String>,
    pub gender: Option<String>,
    pub favorites_only: bool,
    pub sort: SortDirection,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::from_query(&SearchParams::new())
    }
}

fn non_empty(params: &SearchParams, key: &str) -> Option<String> {
    params
        .get(key)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl FilterParams {
    pub fn from_query(params: &SearchParams) -> Self {
        let page = params
            .get("page")
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        Self {
            page,
            name: non_empty(params, "name"),
            status: non_empty(params, "status"),
            species: non_empty(params, "species"),
            gender: non_empty(params, "gender"),
            favorites_only: params.get("favorites") == Some("true"),
            sort: params
                .get("sort")
                .map(SortDirection::parse)
                .unwrap_or_default(),
        }
    }

    /// The list request for this state.
    ///
    /// The favorites view always asks for page 1 without filters; it
    /// filters nothing server-side.
    pub fn character_query(&self) -> CharacterQuery {
        if self.favorites_only {
            return CharacterQuery::default();
        }
        CharacterQuery {
            page: self.page,
            name: self.name.clone(),
            status: self.status.clone(),
            species: self.species.clone(),
            gender: self.gender.clone(),
        }
        .normalized()
    }

    pub fn value(&self, key: FilterKey) -> &str {
        match key {
            FilterKey::Status => self.status.as_deref().unwrap_or(""),
            FilterKey::Species => self.species.as_deref().unwrap_or(""),
            FilterKey::Gender => self.gender.as_deref().unwrap_or(""),
            FilterKey::Favorites => {
                if self.favorites_only {
                    "true"
                } else {
                    ""
                }
            }
        }
    }

    pub fn has_active_filters(&self) -> bool {
        self.name.is_some()
            || self.status.is_some()
            || self.species.is_some()
            || self.gender.is_some()
            || self.favorites_only
    }

    /// Order `characters` by ID in the selected direction.
    pub fn sorted<'a>(&self, characters: &'a [Character]) -> Vec<&'a Character> {
        let mut sorted: Vec<&Character> = characters.iter().collect();
        match self.sort {
            SortDirection::Asc => sorted.sort_by_key(|c| c.id),
            SortDirection::Desc => sorted.sort_by_key(|c| std::cmp::Reverse(c.id)),
        }
        sorted
    }
}

// ============================================================================
// Query string updates
// ============================================================================

/// Set (or clear, when `value` is empty) a categorical filter. Resets the
/// search text and page.
pub fn set_filter(current: &SearchParams, key: FilterKey, value: &str) -> SearchParams {
    let mut next = current.clone();
    if value.is_empty() {
        next.delete(key.param());
    } else {
        next.set(key.param(), value);
    }
    next.delete("name");
    next.delete("page");
    next
}

/// Advance a categorical filter to its next option, wrapping to "any".
pub fn cycle_filter(current: &SearchParams, key: FilterKey) -> SearchParams {
    let options = key.options();
    let filters = FilterParams::from_query(current);
    let value = filters.value(key);
    let index = options.iter().position(|o| *o == value).unwrap_or(0);
    let next = options[(index + 1) % options.len()];
    set_filter(current, key, next)
}

/// Apply free-text search. The text is trimmed; empty text clears it.
/// Resets the page.
pub fn set_search(current: &SearchParams, text: &str) -> SearchParams {
    let mut next = current.clone();
    let text = text.trim();
    if text.is_empty() {
        next.delete("name");
    } else {
        next.set("name", text);
    }
    next.delete("page");
    next
}

/// Change only the page.
pub fn set_page(current: &SearchParams, page: u32) -> SearchParams {
    let mut next = current.clone();
    next.set("page", page.max(1).to_string());
    next
}

/// Flip the sort direction. Resets the page, keeps the search text.
pub fn toggle_sort(current: &SearchParams) -> SearchParams {
    let sort = FilterParams::from_query(current).sort.toggled();
    let mut next = current.clone();
    next.set("sort", sort.as_str());
    next.delete("page");
    next
}

pub fn clear_all() -> SearchParams {
    SearchParams::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn q(s: &str) -> SearchParams {
        SearchParams::parse(s)
    }

    #[test]
    fn test_defaults() {
        let f = FilterParams::default();
        assert_eq!(f.page, 1);
        assert_eq!(f.sort, SortDirection::Asc);
        assert!(!f.favorites_only);
        assert!(!f.has_active_filters());
    }

    #[test]
    fn test_invalid_page_falls_back_to_one() {
        for raw in ["page=0", "page=-3", "page=abc", "page="] {
            assert_eq!(FilterParams::from_query(&q(raw)).page, 1, "{raw}");
        }
        assert_eq!(FilterParams::from_query(&q("page=7")).page, 7);
    }

    #[test]
    fn test_favorites_only_requires_true() {
        assert!(FilterParams::from_query(&q("favorites=true")).favorites_only);
        assert!(!FilterParams::from_query(&q("favorites=1")).favorites_only);
    }

    #[test]
    fn test_favorites_only_query_ignores_filters() {
        let f = FilterParams::from_query(&q("favorites=true&status=Dead&name=rick&page=4"));
        assert_eq!(f.character_query(), CharacterQuery::default());
    }

    #[test]
    fn test_set_filter_resets_name_and_page() {
        let next = set_filter(&q("name=rick&page=3&gender=Male"), FilterKey::Status, "Alive");
        assert_eq!(next.to_string(), "gender=Male&status=Alive");
    }

    #[test]
    fn test_set_filter_empty_deletes_key() {
        let next = set_filter(&q("status=Alive&species=Human"), FilterKey::Status, "");
        assert_eq!(next.to_string(), "species=Human");
    }

    #[test]
    fn test_set_search_trims_and_resets_page() {
        let next = set_search(&q("status=Dead&page=2"), "  morty ");
        assert_eq!(next.to_string(), "status=Dead&name=morty");

        let cleared = set_search(&next, "   ");
        assert_eq!(cleared.to_string(), "status=Dead");
    }

    #[test]
    fn test_set_page_keeps_other_filters() {
        let next = set_page(&q("name=rick&status=Alive&page=1"), 3);
        assert_eq!(next.to_string(), "name=rick&status=Alive&page=3");
    }

    #[test]
    fn test_toggle_sort_keeps_name_drops_page() {
        let next = toggle_sort(&q("name=rick&page=2"));
        assert_eq!(next.to_string(), "name=rick&sort=desc");
        let back = toggle_sort(&next);
        assert_eq!(back.to_string(), "name=rick&sort=asc");
    }

    #[test]
    fn test_cycle_filter_wraps() {
        let mut params = q("");
        let mut seen = Vec::new();
        for _ in 0..STATUS_OPTIONS.len() {
            params = cycle_filter(&params, FilterKey::Status);
            seen.push(FilterParams::from_query(&params).value(FilterKey::Status).to_string());
        }
        assert_eq!(seen, vec!["Alive", "Dead", "unknown", ""]);
    }

    #[test]
    fn test_cycle_favorites_toggles() {
        let on = cycle_filter(&q("name=x"), FilterKey::Favorites);
        assert_eq!(on.to_string(), "favorites=true");
        let off = cycle_filter(&on, FilterKey::Favorites);
        assert!(off.is_empty());
    }

    #[test]
    fn test_clear_all() {
        assert!(clear_all().is_empty());
    }
}
