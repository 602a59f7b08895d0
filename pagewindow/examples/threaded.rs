// Example: loads on worker threads, events on a single serial thread.
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use pagewindow::{
    ChangeEvent, LoadListener, LoadResult, LoadSignal, Pager, PagerOptions, PagingSource,
    SerialQueue, ThreadPerTask,
};

struct SlowNumbers;

impl PagingSource<i64, i64> for SlowNumbers {
    fn initial_key(&self, hint: Option<&i64>) -> Option<i64> {
        Some(hint.copied().unwrap_or(0))
    }

    fn next_key(&self, current: &i64) -> Option<i64> {
        (*current < 20).then(|| current + 1)
    }

    fn previous_key(&self, current: &i64) -> Option<i64> {
        (*current > -20).then(|| current - 1)
    }

    fn load(&self, key: &i64) -> LoadResult<Vec<i64>> {
        // Simulate I/O.
        thread::sleep(Duration::from_millis(10));
        LoadResult::Success((key * 100..key * 100 + 25).collect())
    }
}

fn main() {
    let options = PagerOptions::new()
        .with_work_executor(ThreadPerTask::new("feed-loader"))
        .with_event_executor(SerialQueue::new("feed-events"));
    let pager = Pager::new(SlowNumbers, options);

    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    pager
        .observe(move |event: &ChangeEvent<i64>| {
            counter.fetch_add(1, Ordering::Relaxed);
            if let ChangeEvent::ItemsInserted { at, items } = event {
                println!(
                    "[{}] inserted {} at {at}",
                    thread::current().name().unwrap_or("?"),
                    items.len()
                );
            }
        })
        .detach();

    let listener: Arc<dyn LoadListener> =
        Arc::new(|signal: &LoadSignal| println!("initialize: {signal:?}"));
    pager.initialize(None, Some(listener)).wait();

    let tasks: Vec<_> = (0..5)
        .flat_map(|_| [pager.load_next(None), pager.load_before(None)])
        .collect();
    let slow = pager.load(-19, None);
    slow.cancel();
    for task in &tasks {
        task.wait();
    }
    println!("cancelled load -> {:?}", slow.wait());

    let state = pager.window_state();
    println!(
        "keys={:?}..{:?} pages={} count={} events={}",
        state.first_key(),
        state.last_key(),
        state.keys.len(),
        state.count(),
        delivered.load(Ordering::Relaxed)
    );
}
