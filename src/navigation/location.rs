use std::fmt;
use thiserror::Error;

use super::search_params::SearchParams;

/// Oldest entries are dropped beyond this depth.
const MAX_HISTORY: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("Unknown location: {0}")]
    UnknownPath(String),
    #[error("Invalid character id: {0}")]
    InvalidId(String),
}

/// Where the user is: the filterable list or one character's page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// `/` plus the query string holding all filter state.
    List(SearchParams),
    /// `/characters/{id}`
    Detail(i64),
}

impl Default for Location {
    fn default() -> Self {
        Location::List(SearchParams::new())
    }
}

impl Location {
    /// Parse `/`, `/?status=Alive&page=2` or `/characters/42`.
    pub fn parse(raw: &str) -> Result<Self, LocationError> {
        let raw = raw.trim();
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, query),
            None => (raw, ""),
        };
        let path = path.trim_end_matches('/');

        if path.is_empty() {
            return Ok(Location::List(SearchParams::parse(query)));
        }

        match path.strip_prefix("/characters/") {
            Some(id) => id
                .parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .map(Location::Detail)
                .ok_or_else(|| LocationError::InvalidId(id.to_string())),
            None => Err(LocationError::UnknownPath(raw.to_string())),
        }
    }

    pub fn params(&self) -> Option<&SearchParams> {
        match self {
            Location::List(params) => Some(params),
            Location::Detail(_) => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::List(params) if params.is_empty() => f.write_str("/"),
            Location::List(params) => write!(f, "/?{}", params),
            Location::Detail(id) => write!(f, "/characters/{}", id),
        }
    }
}

/// Current location plus a back stack.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    current: Location,
    history: Vec<Location>,
}

impl Navigator {
    pub fn new(start: Location) -> Self {
        Self {
            current: start,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> &Location {
        &self.current
    }

    /// Navigate to `location`, remembering the current one.
    /// Pushing the current location again is a no-op.
    pub fn push(&mut self, location: Location) {
        if location == self.current {
            return;
        }
        tracing::debug!(from = %self.current, to = %location, "Navigate");
        let previous = std::mem::replace(&mut self.current, location);
        self.history.push(previous);
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
    }

    /// Navigate without adding a history entry.
    pub fn replace(&mut self, location: Location) {
        self.current = location;
    }

    /// Return to the previous location. False when there is none.
    pub fn back(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                tracing::debug!(from = %self.current, to = %previous, "Navigate back");
                self.current = previous;
                true
            }
            None => false,
        }
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }
}
