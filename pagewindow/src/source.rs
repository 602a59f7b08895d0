use crate::{LoadResult, LoadSignal, PageRef, PagingError};

/// Supplies key navigation and page content.
///
/// Every method may block; the pager only calls them from its work execution context and never
/// while holding its state lock. Returning `None` from a key resolver marks the window boundary
/// and turns into an `Empty` outcome, not an error.
pub trait PagingSource<K, T>: Send + Sync {
    /// Resolves the key of the first page, optionally from a caller-provided hint.
    fn initial_key(&self, hint: Option<&K>) -> Option<K>;

    fn next_key(&self, current: &K) -> Option<K>;

    fn previous_key(&self, current: &K) -> Option<K>;

    /// Loads the items of `key`. Failures are surfaced to the caller and never retried.
    fn load(&self, key: &K) -> LoadResult<Vec<T>>;

    /// Called after a page joined the window (outside the pager's lock).
    ///
    /// The handle is live, so the source may e.g. seed a background refresh through it. Not
    /// required for correctness.
    fn on_page_attached(&self, _page: &PageRef<K, T>) {}

    /// Called after a page left the window. The handle is already detached.
    fn on_page_detached(&self, _page: &PageRef<K, T>) {}
}

/// Per-call progress listener, driven on the event execution context.
///
/// The sequence is always `on_started`, one of `on_succeeded` / `on_nothing_to_load` /
/// `on_failed`, then `on_completed`. Implemented for any `Fn(&LoadSignal) + Send + Sync`.
pub trait LoadListener: Send + Sync {
    fn on_started(&self) {}
    fn on_succeeded(&self) {}
    fn on_nothing_to_load(&self) {}
    fn on_failed(&self, _cause: &PagingError) {}
    fn on_completed(&self) {}
}

impl<F> LoadListener for F
where
    F: Fn(&LoadSignal) + Send + Sync,
{
    fn on_started(&self) {
        self(&LoadSignal::Started)
    }

    fn on_succeeded(&self) {
        self(&LoadSignal::Succeeded)
    }

    fn on_nothing_to_load(&self) {
        self(&LoadSignal::NothingToLoad)
    }

    fn on_failed(&self, cause: &PagingError) {
        self(&LoadSignal::Failed(cause.clone()))
    }

    fn on_completed(&self) {
        self(&LoadSignal::Completed)
    }
}

impl LoadSignal {
    pub(crate) fn deliver(&self, listener: &dyn LoadListener) {
        match self {
            Self::Started => listener.on_started(),
            Self::Succeeded => listener.on_succeeded(),
            Self::NothingToLoad => listener.on_nothing_to_load(),
            Self::Failed(cause) => listener.on_failed(cause),
            Self::Completed => listener.on_completed(),
        }
    }
}
