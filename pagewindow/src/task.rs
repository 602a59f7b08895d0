use core::cmp::Ordering as KeyOrdering;
use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::{KeyOrder, LoadResult};

struct TaskShared {
    cancelled: AtomicBool,
    result: Mutex<Option<LoadResult<()>>>,
    done: Condvar,
}

impl TaskShared {
    fn resolve(&self, result: LoadResult<()>) {
        let mut slot = self.result.lock();
        if slot.is_none() {
            *slot = Some(result);
        }
        drop(slot);
        self.done.notify_all();
    }
}

/// A handle to an in-flight orchestration call.
///
/// The task resolves once the call's outcome, and every change event it committed, has been
/// delivered on the event execution context. Do not block on a task from inside that context.
#[derive(Clone)]
pub struct LoadTask {
    shared: Arc<TaskShared>,
}

impl LoadTask {
    pub(crate) fn pending() -> (Self, TaskCompleter) {
        let shared = Arc::new(TaskShared {
            cancelled: AtomicBool::new(false),
            result: Mutex::new(None),
            done: Condvar::new(),
        });
        let completer = TaskCompleter {
            shared: Some(Arc::clone(&shared)),
        };
        (Self { shared }, completer)
    }

    pub(crate) fn finished(result: LoadResult<()>) -> Self {
        let (task, completer) = Self::pending();
        completer.complete(result);
        task
    }

    /// Requests cancellation.
    ///
    /// A load that has not been committed yet is discarded (the source call itself may still
    /// run to completion) and the task resolves as `Empty`. No effect on a committed load.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.shared.result.lock().is_some()
    }

    pub fn try_result(&self) -> Option<LoadResult<()>> {
        self.shared.result.lock().clone()
    }

    /// Blocks until the task resolves.
    pub fn wait(&self) -> LoadResult<()> {
        let mut slot = self.shared.result.lock();
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            self.shared.done.wait(&mut slot);
        }
    }

    /// Blocks until the task resolves or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<LoadResult<()>> {
        let mut slot = self.shared.result.lock();
        if slot.is_none() {
            let _ = self
                .shared
                .done
                .wait_while_for(&mut slot, |slot| slot.is_none(), timeout);
        }
        slot.clone()
    }
}

impl core::fmt::Debug for LoadTask {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoadTask")
            .field("cancelled", &self.is_cancelled())
            .field("result", &*self.shared.result.lock())
            .finish()
    }
}

/// The producer side of a [`LoadTask`].
///
/// Dropping it unresolved (e.g. a panicking source) resolves the task as `Empty` so waiters
/// never hang.
pub(crate) struct TaskCompleter {
    shared: Option<Arc<TaskShared>>,
}

impl TaskCompleter {
    pub(crate) fn is_cancelled(&self) -> bool {
        self.shared
            .as_ref()
            .is_some_and(|shared| shared.cancelled.load(Ordering::Acquire))
    }

    pub(crate) fn complete(mut self, result: LoadResult<()>) {
        if let Some(shared) = self.shared.take() {
            shared.resolve(result);
        }
    }
}

impl Drop for TaskCompleter {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            pwarn!("LoadTask dropped without an outcome");
            shared.resolve(LoadResult::Empty);
        }
    }
}

/// Serializes work on equal keys (per the injected comparator) while letting different keys
/// proceed in parallel.
pub(crate) struct KeyGate<K> {
    order: KeyOrder<K>,
    busy: Mutex<Vec<K>>,
    released: Condvar,
}

impl<K: Clone> KeyGate<K> {
    pub(crate) fn new(order: KeyOrder<K>) -> Self {
        Self {
            order,
            busy: Mutex::new(Vec::new()),
            released: Condvar::new(),
        }
    }

    /// Blocks while another pass for an equal key is alive.
    pub(crate) fn enter(&self, key: &K) -> KeyPass<'_, K> {
        let mut busy = self.busy.lock();
        while busy
            .iter()
            .any(|other| (self.order)(other, key) == KeyOrdering::Equal)
        {
            self.released.wait(&mut busy);
        }
        busy.push(key.clone());
        KeyPass {
            gate: self,
            key: key.clone(),
        }
    }
}

pub(crate) struct KeyPass<'a, K> {
    gate: &'a KeyGate<K>,
    key: K,
}

impl<K> Drop for KeyPass<'_, K> {
    fn drop(&mut self) {
        let mut busy = self.gate.busy.lock();
        if let Some(pos) = busy
            .iter()
            .position(|other| (self.gate.order)(other, &self.key) == KeyOrdering::Equal)
        {
            busy.swap_remove(pos);
        }
        drop(busy);
        self.gate.released.notify_all();
    }
}
