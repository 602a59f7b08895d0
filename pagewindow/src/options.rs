use core::cmp::Ordering;
use std::sync::Arc;

use crate::key::natural_order;
use crate::{Executor, Inline, KeyOrder};

/// Configuration for [`crate::Pager`].
///
/// This type is cheap to clone: the comparator and executors are stored in `Arc`s.
pub struct PagerOptions<K> {
    /// Total order over page keys. Pages are kept sorted by it and it decides key equality.
    pub compare: KeyOrder<K>,

    /// Where loads run (source calls and page-set commits). Defaults to [`Inline`].
    pub work_executor: Arc<dyn Executor>,

    /// Where observers and per-call listeners are notified. Defaults to [`Inline`].
    ///
    /// Deliveries are strictly ordered whatever executor is used, but a single-threaded one
    /// (e.g. [`crate::SerialQueue`]) keeps observers on one thread.
    pub event_executor: Arc<dyn Executor>,
}

impl<K> Clone for PagerOptions<K> {
    fn clone(&self) -> Self {
        Self {
            compare: Arc::clone(&self.compare),
            work_executor: Arc::clone(&self.work_executor),
            event_executor: Arc::clone(&self.event_executor),
        }
    }
}

impl<K: Ord + 'static> PagerOptions<K> {
    /// Creates options ordering keys by their `Ord` implementation.
    pub fn new() -> Self {
        Self::new_with_compare(natural_order::<K>())
    }
}

impl<K: Ord + 'static> Default for PagerOptions<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> PagerOptions<K> {
    /// Creates options with a custom key comparator.
    pub fn new_with_compare(compare: KeyOrder<K>) -> Self {
        Self {
            compare,
            work_executor: Arc::new(Inline),
            event_executor: Arc::new(Inline),
        }
    }

    pub fn with_compare(
        mut self,
        compare: impl Fn(&K, &K) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.compare = Arc::new(compare);
        self
    }

    pub fn with_work_executor(mut self, executor: impl Executor + 'static) -> Self {
        self.work_executor = Arc::new(executor);
        self
    }

    pub fn with_event_executor(mut self, executor: impl Executor + 'static) -> Self {
        self.event_executor = Arc::new(executor);
        self
    }

    /// Shares already constructed executors (e.g. between several pagers).
    pub fn with_executors(
        mut self,
        work_executor: Arc<dyn Executor>,
        event_executor: Arc<dyn Executor>,
    ) -> Self {
        self.work_executor = work_executor;
        self.event_executor = event_executor;
        self
    }
}

impl<K> core::fmt::Debug for PagerOptions<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PagerOptions").finish_non_exhaustive()
    }
}
