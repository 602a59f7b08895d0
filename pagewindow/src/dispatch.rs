use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use crate::events::Observers;
use crate::task::TaskCompleter;
use crate::{
    ChangeEvent, Executor, LoadListener, LoadResult, LoadSignal, PagingObserver, Subscription,
};

enum Delivery<T> {
    Change(ChangeEvent<T>),
    Signal(Arc<dyn LoadListener>, LoadSignal),
    Resolve(TaskCompleter, LoadResult<()>),
    Arm(u64),
}

/// FIFO hand-off from the work context to the event context.
///
/// Commits enqueue while holding the pager's state lock, so the outbox order is the commit
/// order. Draining happens on the event executor under a re-entrant turn lock: one drainer at a
/// time delivers in FIFO order. An inline observer that mutates the pager re-enters `drain` on
/// the same thread; the nested call returns at once and the outer loop delivers the new entries
/// after the current event has reached every observer.
pub(crate) struct Dispatcher<T> {
    observers: Arc<Observers<T>>,
    outbox: Mutex<VecDeque<Delivery<T>>>,
    turn: ReentrantMutex<Cell<bool>>,
    executor: Arc<dyn Executor>,
}

impl<T: Send + Sync + 'static> Dispatcher<T> {
    pub(crate) fn new(executor: Arc<dyn Executor>) -> Arc<Self> {
        Arc::new(Self {
            observers: Observers::new(),
            outbox: Mutex::new(VecDeque::new()),
            turn: ReentrantMutex::new(Cell::new(false)),
            executor,
        })
    }

    pub(crate) fn observers(&self) -> &Arc<Observers<T>> {
        &self.observers
    }

    pub(crate) fn enqueue_events(&self, events: Vec<ChangeEvent<T>>) {
        if events.is_empty() {
            return;
        }
        self.outbox
            .lock()
            .extend(events.into_iter().map(Delivery::Change));
    }

    pub(crate) fn enqueue_signal(&self, listener: &Arc<dyn LoadListener>, signal: LoadSignal) {
        self.outbox
            .lock()
            .push_back(Delivery::Signal(Arc::clone(listener), signal));
    }

    pub(crate) fn enqueue_resolve(&self, completer: TaskCompleter, result: LoadResult<()>) {
        self.outbox
            .lock()
            .push_back(Delivery::Resolve(completer, result));
    }

    /// Registers `observer` silent until every delivery enqueued before this call is out.
    ///
    /// Callers hold the pager's state lock so no commit slips between the snapshot they took
    /// and the arm marker.
    pub(crate) fn subscribe_after_outbox(
        &self,
        observer: Arc<dyn PagingObserver<T>>,
    ) -> Subscription {
        let subscription = self.observers.subscribe_pending(observer);
        self.outbox
            .lock()
            .push_back(Delivery::Arm(subscription.id()));
        subscription
    }

    /// Schedules a drain of everything enqueued so far on the event executor.
    pub(crate) fn flush(self: &Arc<Self>) {
        if self.outbox.lock().is_empty() {
            return;
        }
        let this = Arc::clone(self);
        self.executor.execute(Box::new(move || this.drain()));
    }

    fn drain(&self) {
        let turn = self.turn.lock();
        if turn.get() {
            return;
        }
        let _draining = Draining::enter(&turn);
        while let Some(delivery) = self.pop() {
            match delivery {
                Delivery::Change(event) => self.observers.notify(&event),
                Delivery::Signal(listener, signal) => signal.deliver(listener.as_ref()),
                Delivery::Resolve(completer, result) => completer.complete(result),
                Delivery::Arm(id) => self.observers.arm(id),
            }
        }
    }

    fn pop(&self) -> Option<Delivery<T>> {
        self.outbox.lock().pop_front()
    }
}

/// Marks the turn holder as draining until dropped.
struct Draining<'a>(&'a Cell<bool>);

impl<'a> Draining<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for Draining<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
