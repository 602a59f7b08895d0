use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

/// A structural change of the flattened view, in global indices.
///
/// Indices are valid against the view an observer holds after applying every previously
/// delivered event, so a consumer can reconcile a local copy incrementally (see
/// [`ChangeEvent::apply_to`]).
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangeEvent<T> {
    /// The first page has been committed.
    Initialized,
    ItemsInserted { at: usize, items: Vec<T> },
    ItemsRemoved { at: usize, items: Vec<T> },
    ItemChanged { at: usize, old: T, new: T },
    /// Position-for-position replacement of `old.len() == new.len()` items.
    ItemsRangeChanged { at: usize, old: Vec<T>, new: Vec<T> },
    /// `item` left `from` and now sits at `to`.
    ItemMoved { from: usize, to: usize, item: T },
    /// The whole view is about to be removed; `snapshot` is its content before removal.
    /// Removal events for every page follow.
    ClearedSoon { snapshot: Vec<T> },
}

impl<T> ChangeEvent<T> {
    /// Net change of the item count caused by this event.
    pub fn count_delta(&self) -> isize {
        match self {
            Self::ItemsInserted { items, .. } => items.len() as isize,
            Self::ItemsRemoved { items, .. } => -(items.len() as isize),
            _ => 0,
        }
    }

    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Initialized | Self::ClearedSoon { .. })
    }
}

impl<T: Clone> ChangeEvent<T> {
    /// Applies this event to a consumer-side copy of the flattened view.
    ///
    /// Panics if the indices do not fit `view`, i.e. if the copy went out of sync.
    pub fn apply_to(&self, view: &mut Vec<T>) {
        match self {
            Self::Initialized | Self::ClearedSoon { .. } => {}
            Self::ItemsInserted { at, items } => {
                view.splice(*at..*at, items.iter().cloned());
            }
            Self::ItemsRemoved { at, items } => {
                view.drain(*at..*at + items.len());
            }
            Self::ItemChanged { at, new, .. } => {
                view[*at] = new.clone();
            }
            Self::ItemsRangeChanged { at, new, .. } => {
                view[*at..*at + new.len()].clone_from_slice(new);
            }
            Self::ItemMoved { from, to, .. } => {
                let item = view.remove(*from);
                view.insert(*to, item);
            }
        }
    }
}

/// Receives change events on the pager's event execution context.
///
/// Implemented for any `Fn(&ChangeEvent<T>) + Send + Sync`.
pub trait PagingObserver<T>: Send + Sync {
    fn on_event(&self, event: &ChangeEvent<T>);
}

impl<T, F> PagingObserver<T> for F
where
    F: Fn(&ChangeEvent<T>) + Send + Sync,
{
    fn on_event(&self, event: &ChangeEvent<T>) {
        self(event)
    }
}

trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: u64);
}

struct Entry<T> {
    id: u64,
    /// Pending observers skip deliveries until their arm marker is drained.
    armed: bool,
    observer: Arc<dyn PagingObserver<T>>,
}

pub(crate) struct Observers<T> {
    next_id: AtomicU64,
    list: RwLock<Vec<Entry<T>>>,
}

impl<T: 'static> Observers<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            list: RwLock::new(Vec::new()),
        })
    }

    /// Registers an observer that stays silent until [`Observers::arm`] is called for it.
    pub(crate) fn subscribe_pending(
        self: &Arc<Self>,
        observer: Arc<dyn PagingObserver<T>>,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.list.write().push(Entry {
            id,
            armed: false,
            observer,
        });
        let registry: Weak<dyn Unsubscribe> = Arc::downgrade(self) as Weak<dyn Unsubscribe>;
        Subscription {
            id,
            registry: Some(registry),
        }
    }

    pub(crate) fn arm(&self, id: u64) {
        if let Some(entry) = self.list.write().iter_mut().find(|entry| entry.id == id) {
            entry.armed = true;
        }
    }

    /// Delivers `event` to a snapshot of the current observers, in subscription order.
    ///
    /// The list lock is not held while observers run, so they may (un)subscribe re-entrantly.
    pub(crate) fn notify(&self, event: &ChangeEvent<T>) {
        let observers: Vec<Arc<dyn PagingObserver<T>>> = self
            .list
            .read()
            .iter()
            .filter(|entry| entry.armed)
            .map(|entry| Arc::clone(&entry.observer))
            .collect();
        for observer in observers {
            observer.on_event(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.list.read().len()
    }
}

impl<T: 'static> Unsubscribe for Observers<T> {
    fn unsubscribe(&self, id: u64) {
        self.list.write().retain(|entry| entry.id != id);
    }
}

/// A registered observer. Dropping (or [`Subscription::cancel`]ling) it unregisters the
/// observer; use [`Subscription::detach`] to keep it registered for the pager's lifetime.
#[must_use = "dropping a Subscription unregisters the observer"]
pub struct Subscription {
    id: u64,
    registry: Option<Weak<dyn Unsubscribe>>,
}

impl Subscription {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(mut self) {
        self.unregister();
    }

    pub fn detach(mut self) {
        self.registry = None;
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .as_ref()
            .is_some_and(|registry| registry.strong_count() > 0)
    }

    fn unregister(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.unsubscribe(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
