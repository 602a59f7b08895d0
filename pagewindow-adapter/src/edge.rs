use std::sync::Arc;

use pagewindow::{LoadListener, LoadResult, LoadTask, PageItem, PageKey, Pager};

/// A half-open range `[start, end)` of global indices currently shown by the list.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "VisibleRange start ({start}) > end ({end})");
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

/// One end of the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Towards earlier keys (`load_before`).
    Backward,
    /// Towards later keys (`load_next`).
    Forward,
}

/// Loading state of one end of the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeState {
    #[default]
    Idle,
    Loading,
    /// The last load reported the window boundary. Sticky until [`EdgeLoader::reset`].
    Exhausted,
    /// The last load failed. Sticky until [`EdgeLoader::retry`] or [`EdgeLoader::reset`].
    Failed,
}

/// Loads started by one [`EdgeLoader::on_visible_range`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdgeRequest {
    pub backward: bool,
    pub forward: bool,
}

impl EdgeRequest {
    pub fn is_none(&self) -> bool {
        !self.backward && !self.forward
    }
}

#[derive(Debug, Default)]
struct Edge {
    state: EdgeState,
    task: Option<LoadTask>,
}

impl Edge {
    /// Settles a finished task into the edge state.
    fn poll(&mut self) {
        let Some(task) = &self.task else {
            return;
        };
        let Some(result) = task.try_result() else {
            return;
        };
        self.state = match result {
            LoadResult::Success(()) => EdgeState::Idle,
            LoadResult::Empty if task.is_cancelled() => EdgeState::Idle,
            LoadResult::Empty => EdgeState::Exhausted,
            LoadResult::Error(_) => EdgeState::Failed,
        };
        self.task = None;
    }
}

/// Extends a pager's window when the visible range approaches one of its ends.
///
/// A load is requested towards the end when the last visible item is within `prefetch` items
/// of the last loaded one, and towards the start when the first visible item is within
/// `prefetch` items of index 0. At most one load per direction is in flight.
///
/// The loader does not hold any UI objects. Adapters drive it by calling
/// [`EdgeLoader::on_visible_range`] whenever the visible range changes (and, when loads run on
/// a background executor, again once they resolve).
pub struct EdgeLoader<K, T> {
    pager: Pager<K, T>,
    prefetch: usize,
    listener: Option<Arc<dyn LoadListener>>,
    backward: Edge,
    forward: Edge,
}

impl<K: PageKey, T: PageItem> EdgeLoader<K, T> {
    pub fn new(pager: Pager<K, T>) -> Self {
        Self {
            pager,
            prefetch: 0,
            listener: None,
            backward: Edge::default(),
            forward: Edge::default(),
        }
    }

    /// Triggers loads `prefetch` items before the window ends become visible.
    pub fn with_prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// Passes `listener` to every load the loader starts.
    pub fn with_listener(mut self, listener: Arc<dyn LoadListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn pager(&self) -> &Pager<K, T> {
        &self.pager
    }

    pub fn prefetch(&self) -> usize {
        self.prefetch
    }

    pub fn state(&mut self, direction: Direction) -> EdgeState {
        let edge = self.edge_mut(direction);
        edge.poll();
        edge.state
    }

    pub fn is_loading(&mut self) -> bool {
        self.state(Direction::Backward) == EdgeState::Loading
            || self.state(Direction::Forward) == EdgeState::Loading
    }

    /// Reacts to a new visible range, starting the loads it calls for.
    ///
    /// Nothing is requested before the pager is initialized.
    pub fn on_visible_range(&mut self, range: VisibleRange) -> EdgeRequest {
        let mut request = EdgeRequest::default();
        if !self.pager.is_initialized() {
            return request;
        }
        let count = self.pager.count();
        if range.start <= self.prefetch {
            request.backward = self.request(Direction::Backward);
        }
        if range.end.saturating_add(self.prefetch) >= count {
            request.forward = self.request(Direction::Forward);
        }
        request
    }

    /// Starts a load in `direction` if that end is idle. Returns whether a load was started.
    pub fn request(&mut self, direction: Direction) -> bool {
        let listener = self.listener.clone();
        let pager = self.pager.clone();
        let edge = self.edge_mut(direction);
        edge.poll();
        if edge.state != EdgeState::Idle {
            return false;
        }
        adebug!(direction = ?direction, "EdgeLoader: requesting load");
        let task = match direction {
            Direction::Backward => pager.load_before(listener),
            Direction::Forward => pager.load_next(listener),
        };
        edge.state = EdgeState::Loading;
        edge.task = Some(task);
        edge.poll();
        true
    }

    /// Clears a `Failed` end and requests again.
    pub fn retry(&mut self, direction: Direction) -> bool {
        let edge = self.edge_mut(direction);
        edge.poll();
        if edge.state == EdgeState::Failed {
            edge.state = EdgeState::Idle;
        }
        self.request(direction)
    }

    /// Forgets sticky states and cancels in-flight loads, e.g. after re-initializing the pager.
    pub fn reset(&mut self) {
        for edge in [&mut self.backward, &mut self.forward] {
            if let Some(task) = edge.task.take() {
                task.cancel();
            }
            edge.state = EdgeState::Idle;
        }
    }

    fn edge_mut(&mut self, direction: Direction) -> &mut Edge {
        match direction {
            Direction::Backward => &mut self.backward,
            Direction::Forward => &mut self.forward,
        }
    }
}

impl<K, T> core::fmt::Debug for EdgeLoader<K, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EdgeLoader")
            .field("prefetch", &self.prefetch)
            .field("backward", &self.backward.state)
            .field("forward", &self.forward.state)
            .finish_non_exhaustive()
    }
}
