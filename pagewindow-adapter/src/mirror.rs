use std::sync::Arc;

use parking_lot::Mutex;
use pagewindow::{ChangeEvent, PageItem, PageKey, Pager, Subscription};

#[derive(Debug)]
struct Mirror<T> {
    items: Vec<T>,
    revision: u64,
}

/// A consumer-side copy of a pager's flattened view, kept in sync through change events.
///
/// Seeded from an atomic snapshot, so it matches the pager once every committed event has been
/// delivered, whatever event executor the pager uses. Dropping the list unsubscribes it.
pub struct MirrorList<T> {
    shared: Arc<Mutex<Mirror<T>>>,
    subscription: Subscription,
}

impl<T: PageItem> MirrorList<T> {
    pub fn attach<K: PageKey>(pager: &Pager<K, T>) -> Self {
        let shared = Arc::new(Mutex::new(Mirror {
            items: Vec::new(),
            revision: 0,
        }));
        let sink = Arc::clone(&shared);
        let subscription = pager.observe_from_snapshot(move |snapshot| {
            sink.lock().items = snapshot;
            move |event: &ChangeEvent<T>| {
                let mut mirror = sink.lock();
                event.apply_to(&mut mirror.items);
                mirror.revision += 1;
            }
        });
        Self {
            shared,
            subscription,
        }
    }

    pub fn len(&self) -> usize {
        self.shared.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.shared.lock().items.get(index).cloned()
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.shared.lock().items.clone()
    }

    /// Runs `f` over the current copy without cloning it.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.shared.lock().items)
    }

    /// Number of events applied so far; changes whenever the copy does.
    pub fn revision(&self) -> u64 {
        self.shared.lock().revision
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_active()
    }
}

impl<T> core::fmt::Debug for MirrorList<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mirror = self.shared.lock();
        f.debug_struct("MirrorList")
            .field("len", &mirror.items.len())
            .field("revision", &mirror.revision)
            .finish()
    }
}
