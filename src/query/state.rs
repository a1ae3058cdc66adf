use super::cache::QueryError;

/// Observable state of one query as the UI sees it.
///
/// * loading: fetching with nothing to show yet
/// * fetching: a request is running, possibly behind placeholder or stale data
/// * error: the last attempt failed; re-invoking the query retries it
#[derive(Debug, Clone)]
pub struct QueryState<V> {
    data: Option<V>,
    error: Option<QueryError>,
    is_fetching: bool,
    is_placeholder: bool,
}

impl<V> Default for QueryState<V> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_fetching: false,
            is_placeholder: false,
        }
    }
}

impl<V> QueryState<V> {
    pub fn data(&self) -> Option<&V> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    /// No data yet and a request is running.
    pub fn is_loading(&self) -> bool {
        self.is_fetching && self.data.is_none()
    }

    /// The visible data belongs to a previous key and is shown until the
    /// current key resolves.
    pub fn is_placeholder(&self) -> bool {
        self.is_placeholder
    }

    /// A request for a new key is starting. Existing data stays visible
    /// as a placeholder.
    pub fn begin_key_change(&mut self) {
        self.is_placeholder = self.data.is_some();
        self.begin();
    }

    /// A request for the current key is starting.
    pub fn begin(&mut self) {
        self.is_fetching = true;
        self.error = None;
    }

    /// Show cached data for the current key without ending any fetch.
    pub fn show(&mut self, value: V) {
        self.data = Some(value);
        self.is_placeholder = false;
        self.error = None;
    }

    pub fn succeed(&mut self, value: V) {
        self.show(value);
        self.is_fetching = false;
    }

    pub fn fail(&mut self, error: QueryError) {
        self.error = Some(error);
        self.is_fetching = false;
    }
}
