use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::dispatch::Dispatcher;
use crate::page::{Page, PageEvents, PageLink, PageOp};
use crate::task::{KeyGate, TaskCompleter};
use crate::{
    ChangeEvent, Executor, LoadListener, LoadResult, LoadSignal, LoadTask, PageItem, PageKey,
    PageRef, PageSet, PagerOptions, PagingError, PagingObserver, PagingSource, Subscription,
    WindowState,
};

struct State<K, T> {
    pages: PageSet<K, T>,
    initialized: bool,
}

#[derive(Clone, Copy, Debug)]
enum Edge {
    Next,
    Before,
}

struct Core<K, T> {
    this: Weak<Core<K, T>>,
    source: Arc<dyn PagingSource<K, T>>,
    state: Mutex<State<K, T>>,
    gate: KeyGate<K>,
    dispatcher: Arc<Dispatcher<T>>,
    work: Arc<dyn Executor>,
    next_page_id: AtomicU64,
}

/// An incremental, bidirectional windowed-pagination engine.
///
/// Maintains a key-sorted set of pages loaded from a [`PagingSource`] and exposes them as one
/// flattened sequence with stable global indices. Every mutation (page added, refreshed or
/// removed, item-level op through a [`PageRef`]) is committed atomically together with its
/// globally indexed [`ChangeEvent`]s, which observers receive in commit order on the event
/// execution context.
///
/// Loads run on the work executor and return a [`LoadTask`]. `Pager` is a cheap handle; clones
/// share the same engine.
pub struct Pager<K, T> {
    core: Arc<Core<K, T>>,
}

impl<K, T> Clone for Pager<K, T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<K: PageKey, T: PageItem> Pager<K, T> {
    pub fn new(source: impl PagingSource<K, T> + 'static, options: PagerOptions<K>) -> Self {
        Self::from_arc(Arc::new(source), options)
    }

    /// Creates a pager over a shared source.
    pub fn from_arc(source: Arc<dyn PagingSource<K, T>>, options: PagerOptions<K>) -> Self {
        pdebug!(options = ?options, "Pager::new");
        let core = Arc::new_cyclic(|this| Core {
            this: this.clone(),
            source,
            state: Mutex::new(State {
                pages: PageSet::new(Arc::clone(&options.compare)),
                initialized: false,
            }),
            gate: KeyGate::new(options.compare),
            dispatcher: Dispatcher::new(options.event_executor),
            work: options.work_executor,
            next_page_id: AtomicU64::new(1),
        });
        Self { core }
    }

    /// Registers an observer. Events committed from now on are delivered to it; events
    /// committed earlier but still queued for the event executor are not.
    ///
    /// Observers run on the event executor and may call back into the pager, but must not
    /// block on a [`LoadTask`] started from inside the callback.
    pub fn observe(&self, observer: impl PagingObserver<T> + 'static) -> Subscription {
        let subscription = {
            let _state = self.core.state.lock();
            self.core
                .dispatcher
                .subscribe_after_outbox(Arc::new(observer))
        };
        self.core.dispatcher.flush();
        subscription
    }

    /// Registers an observer built from a snapshot of the flattened view.
    ///
    /// `make` runs under the pager's lock (it must not call back into the pager) and the
    /// observer receives exactly the events committed after the snapshot, so applying them to
    /// the snapshot reproduces the view whatever the event executor.
    pub fn observe_from_snapshot<O>(&self, make: impl FnOnce(Vec<T>) -> O) -> Subscription
    where
        O: PagingObserver<T> + 'static,
    {
        let subscription = {
            let state = self.core.state.lock();
            let observer = make(state.pages.items().cloned().collect());
            self.core
                .dispatcher
                .subscribe_after_outbox(Arc::new(observer))
        };
        self.core.dispatcher.flush();
        subscription
    }

    pub fn observer_count(&self) -> usize {
        self.core.dispatcher.observers().len()
    }

    /// Clears any existing window, resolves the initial key from `hint` and loads it.
    ///
    /// On success observers get [`ChangeEvent::Initialized`] followed by the inserted range of
    /// the first page. No initial key yields `Empty`.
    pub fn initialize(&self, hint: Option<K>, listener: Option<Arc<dyn LoadListener>>) -> LoadTask {
        pdebug!("Pager::initialize");
        self.core
            .run(listener, move |core, task| core.initialize(hint.as_ref(), task))
    }

    /// Loads `key`: adds a new page, or refreshes the existing one with a prefix-aligned diff.
    pub fn load(&self, key: K, listener: Option<Arc<dyn LoadListener>>) -> LoadTask {
        pdebug!("Pager::load");
        self.core
            .run(listener, move |core, task| core.fetch_and_commit(key, task, false))
    }

    /// Extends the window after its last page. `Empty` at the boundary; fails with
    /// [`PagingError::NotInitialized`] before the first successful `initialize`.
    pub fn load_next(&self, listener: Option<Arc<dyn LoadListener>>) -> LoadTask {
        pdebug!("Pager::load_next");
        self.core
            .run(listener, |core, task| core.load_adjacent(Edge::Next, task))
    }

    /// Extends the window before its first page. Same outcomes as [`Pager::load_next`].
    pub fn load_before(&self, listener: Option<Arc<dyn LoadListener>>) -> LoadTask {
        pdebug!("Pager::load_before");
        self.core
            .run(listener, |core, task| core.load_adjacent(Edge::Before, task))
    }

    /// Removes every page and resets the pager to its uninitialized state.
    ///
    /// If initialized, observers first get [`ChangeEvent::ClearedSoon`] with the full content,
    /// then one removal per page.
    pub fn clear(&self) {
        self.core.clear();
    }

    /// Removes the page for `key`, if any. Its handles become detached.
    pub fn delete_page(&self, key: &K) -> bool {
        let removed = self.core.commit(|state, events| state.pages.remove(key, events));
        if let Some(page) = &removed {
            self.core.source.on_page_detached(page);
        }
        self.core.dispatcher.flush();
        removed.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.core.state.lock().initialized
    }

    /// Number of items in the flattened view.
    pub fn count(&self) -> usize {
        self.core.state.lock().pages.count()
    }

    pub fn page_count(&self) -> usize {
        self.core.state.lock().pages.len()
    }

    pub fn item_at(&self, index: usize) -> Option<T> {
        self.core.state.lock().pages.item_at(index).cloned()
    }

    /// A snapshot of the flattened view.
    pub fn items(&self) -> Vec<T> {
        self.core.state.lock().pages.items().cloned().collect()
    }

    /// Loaded keys, in order.
    pub fn keys(&self) -> Vec<K> {
        self.core.state.lock().pages.keys().cloned().collect()
    }

    pub fn page(&self, key: &K) -> Option<PageRef<K, T>> {
        self.core.state.lock().pages.get(key).map(Page::handle)
    }

    pub fn first_page(&self) -> Option<PageRef<K, T>> {
        self.core.state.lock().pages.first().map(Page::handle)
    }

    pub fn last_page(&self) -> Option<PageRef<K, T>> {
        self.core.state.lock().pages.last().map(Page::handle)
    }

    /// Runs `f` with shared access to the page set.
    ///
    /// The pager is locked meanwhile: `f` must not call back into it.
    pub fn with_pages<R>(&self, f: impl FnOnce(&PageSet<K, T>) -> R) -> R {
        f(&self.core.state.lock().pages)
    }

    pub fn window_state(&self) -> WindowState<K> {
        let state = self.core.state.lock();
        WindowState {
            initialized: state.initialized,
            keys: state.pages.keys().cloned().collect(),
            page_lens: state.pages.iter().map(Page::len).collect(),
        }
    }
}

impl<K: PageKey, T: PageItem + PartialEq> Pager<K, T> {
    /// Finds the page holding `item` (linear over pages).
    pub fn find_page_containing(&self, item: &T) -> Option<PageRef<K, T>> {
        self.core
            .state
            .lock()
            .pages
            .find_page_containing(item)
            .map(Page::handle)
    }

    /// Moves `item` to global index `to` inside its own page, reported as one
    /// [`ChangeEvent::ItemMoved`].
    ///
    /// Fails with `NotFound` if no page holds the item and `OutOfRange` if `to` falls outside
    /// that page.
    pub fn move_item(&self, item: &T, to: usize) -> Result<(), PagingError> {
        self.core
            .commit(|state, events| state.pages.move_to_global(item, to, events))?;
        self.core.dispatcher.flush();
        Ok(())
    }
}

impl<K: core::fmt::Debug, T> core::fmt::Debug for Pager<K, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.core.state.lock();
        f.debug_struct("Pager")
            .field("initialized", &state.initialized)
            .field("pages", &state.pages)
            .finish_non_exhaustive()
    }
}

impl<K: PageKey, T: PageItem> Core<K, T> {
    /// Runs `op` on the work executor, driving `listener` and resolving the returned task
    /// through the event context.
    fn run(
        self: &Arc<Self>,
        listener: Option<Arc<dyn LoadListener>>,
        op: impl FnOnce(&Arc<Self>, &TaskCompleter) -> LoadResult<()> + Send + 'static,
    ) -> LoadTask {
        let (task, completer) = LoadTask::pending();
        let core = Arc::clone(self);
        self.work.execute(Box::new(move || {
            if let Some(listener) = &listener {
                core.dispatcher.enqueue_signal(listener, LoadSignal::Started);
                core.dispatcher.flush();
            }
            let result = if completer.is_cancelled() {
                LoadResult::Empty
            } else {
                op(&core, &completer)
            };
            if let Some(listener) = &listener {
                core.dispatcher
                    .enqueue_signal(listener, LoadSignal::outcome_of(&result));
                core.dispatcher.enqueue_signal(listener, LoadSignal::Completed);
            }
            core.dispatcher.enqueue_resolve(completer, result);
            core.dispatcher.flush();
        }));
        task
    }

    /// Applies `f` under the state lock and enqueues the events it produced, in order.
    fn commit<R>(&self, f: impl FnOnce(&mut State<K, T>, &mut Vec<ChangeEvent<T>>) -> R) -> R {
        let mut state = self.state.lock();
        let mut events = Vec::new();
        let out = f(&mut state, &mut events);
        ptrace!(
            events = events.len(),
            pages = state.pages.len(),
            count = state.pages.count(),
            "commit"
        );
        self.dispatcher.enqueue_events(events);
        out
    }

    fn initialize(&self, hint: Option<&K>, task: &TaskCompleter) -> LoadResult<()> {
        self.clear();
        match self.source.initial_key(hint) {
            Some(key) => self.fetch_and_commit(key, task, true),
            None => LoadResult::Empty,
        }
    }

    fn load_adjacent(&self, edge: Edge, task: &TaskCompleter) -> LoadResult<()> {
        let anchor = {
            let state = self.state.lock();
            if !state.initialized {
                return LoadResult::Error(PagingError::NotInitialized);
            }
            let page = match edge {
                Edge::Next => state.pages.last(),
                Edge::Before => state.pages.first(),
            };
            page.map(|page| page.key().clone())
        };
        let Some(anchor) = anchor else {
            return LoadResult::Empty;
        };
        let key = match edge {
            Edge::Next => self.source.next_key(&anchor),
            Edge::Before => self.source.previous_key(&anchor),
        };
        match key {
            Some(key) => self.fetch_and_commit(key, task, false),
            None => {
                pdebug!(edge = ?edge, "window boundary reached");
                LoadResult::Empty
            }
        }
    }

    /// Loads `key` from the source and commits the result unless the task was cancelled.
    ///
    /// Loads of equal keys are serialized; the refresh diff is computed against the page as it
    /// is at commit time.
    fn fetch_and_commit(
        &self,
        key: K,
        task: &TaskCompleter,
        initializing: bool,
    ) -> LoadResult<()> {
        let pass = self.gate.enter(&key);
        let items = match self.source.load(&key) {
            LoadResult::Success(items) => items,
            LoadResult::Empty => return LoadResult::Empty,
            LoadResult::Error(err) => {
                pwarn!(error = %err, "PagingSource::load failed");
                return LoadResult::Error(err);
            }
        };

        let committed = self.commit(|state, events| {
            if task.is_cancelled() {
                pdebug!("load cancelled before commit");
                return LoadResult::Empty;
            }
            if initializing {
                state.initialized = true;
                events.push(ChangeEvent::Initialized);
            }
            if state.pages.contains_key(&key) {
                match state.pages.replace_items(&key, items, events) {
                    Ok(()) => LoadResult::Success(None),
                    Err(err) => LoadResult::Error(err),
                }
            } else {
                let page = self.new_page(key, items);
                match state.pages.add(page, events) {
                    Ok(handle) => LoadResult::Success(Some(handle)),
                    Err(err) => LoadResult::Error(err),
                }
            }
        });
        drop(pass);

        if let LoadResult::Success(Some(page)) = &committed {
            self.source.on_page_attached(page);
        }
        committed.outcome()
    }

    fn new_page(&self, key: K, items: Vec<T>) -> Page<K, T> {
        let id = self.next_page_id.fetch_add(1, Ordering::Relaxed);
        let listener: Weak<dyn PageEvents<K, T>> = self.this.clone();
        let link = PageLink::new(key, id, Some(listener));
        Page::new(items, Arc::new(link))
    }

    fn clear(&self) {
        pdebug!("Pager::clear");
        let removed = self.commit(|state, events| {
            if state.initialized {
                events.push(ChangeEvent::ClearedSoon {
                    snapshot: state.pages.items().cloned().collect(),
                });
            }
            state.initialized = false;
            state.pages.clear(events)
        });
        for page in &removed {
            self.source.on_page_detached(page);
        }
        self.dispatcher.flush();
    }
}

impl<K: PageKey, T: PageItem> PageEvents<K, T> for Core<K, T> {
    fn page_op(&self, link: &Arc<PageLink<K, T>>, op: PageOp<'_, T>) -> Result<(), PagingError> {
        self.commit(|state, events| state.pages.apply(link, op, events))?;
        self.dispatcher.flush();
        Ok(())
    }

    fn page_items(&self, link: &Arc<PageLink<K, T>>) -> Result<Vec<T>, PagingError> {
        self.state.lock().pages.items_of(link)
    }

    fn delete_page(&self, link: &Arc<PageLink<K, T>>) -> Result<(), PagingError> {
        let removed = self.commit(|state, events| state.pages.remove_link(link, events))?;
        self.source.on_page_detached(&removed);
        self.dispatcher.flush();
        Ok(())
    }

    fn refresh_page(&self, key: K, listener: Option<Arc<dyn LoadListener>>) -> LoadTask {
        match self.this.upgrade() {
            Some(core) => core.run(listener, move |core, task| {
                core.fetch_and_commit(key, task, false)
            }),
            None => LoadTask::finished(LoadResult::Error(PagingError::Detached)),
        }
    }
}
