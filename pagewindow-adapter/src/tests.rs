use crate::*;

use std::collections::VecDeque;
use std::sync::Arc;

use pagewindow::{
    ChangeEvent, Executor, Job, LoadResult, LoadTask, Pager, PagerOptions, PagingSource,
    SerialQueue, ThreadPerTask,
};
use parking_lot::Mutex;

#[derive(Debug, thiserror::Error)]
#[error("offline")]
struct Offline;

/// Keys `0..=last`; page `k` holds `k * 10 .. k * 10 + 10`.
struct Numbers {
    last: u32,
    failing: Mutex<Option<u32>>,
}

impl Numbers {
    fn new(last: u32) -> Arc<Self> {
        Arc::new(Self {
            last,
            failing: Mutex::new(None),
        })
    }
}

impl PagingSource<u32, u32> for Numbers {
    fn initial_key(&self, hint: Option<&u32>) -> Option<u32> {
        Some(hint.copied().unwrap_or(0).min(self.last))
    }

    fn next_key(&self, current: &u32) -> Option<u32> {
        (*current < self.last).then(|| current + 1)
    }

    fn previous_key(&self, current: &u32) -> Option<u32> {
        current.checked_sub(1)
    }

    fn load(&self, key: &u32) -> LoadResult<Vec<u32>> {
        if *self.failing.lock() == Some(*key) {
            return LoadResult::failed(Offline);
        }
        LoadResult::Success((key * 10..key * 10 + 10).collect())
    }
}

/// Queues jobs until the test runs them.
#[derive(Clone, Default)]
struct Manual(Arc<Mutex<VecDeque<Job>>>);

impl Manual {
    fn run_all(&self) {
        loop {
            let Some(job) = self.0.lock().pop_front() else {
                break;
            };
            job();
        }
    }
}

impl Executor for Manual {
    fn execute(&self, job: Job) {
        self.0.lock().push_back(job);
    }
}

fn initialized(source: &Arc<Numbers>, hint: u32) -> Pager<u32, u32> {
    let pager = Pager::from_arc(source.clone(), PagerOptions::new());
    assert!(pager.initialize(Some(hint), None).wait().is_success());
    pager
}

#[test]
fn edge_loader_extends_forward_until_exhausted() {
    let source = Numbers::new(3);
    let pager = initialized(&source, 0);
    let mut loader = EdgeLoader::new(pager.clone());

    let request = loader.on_visible_range(VisibleRange::new(0, 5));
    assert_eq!(
        request,
        EdgeRequest {
            backward: true,
            forward: false
        }
    );
    assert_eq!(loader.state(Direction::Backward), EdgeState::Exhausted);
    assert_eq!(pager.count(), 10);

    let mut loads = 0;
    loop {
        let count = pager.count();
        let request = loader.on_visible_range(VisibleRange::new(count - 5, count));
        if !request.forward {
            break;
        }
        loads += 1;
    }
    // Three successful extensions, then one that hits the boundary.
    assert_eq!(loads, 4);
    assert_eq!(pager.keys(), [0, 1, 2, 3]);
    assert_eq!(loader.state(Direction::Forward), EdgeState::Exhausted);
    assert!(loader.on_visible_range(VisibleRange::new(0, 40)).is_none());
}

#[test]
fn edge_loader_honors_prefetch_distance() {
    let source = Numbers::new(9);
    let pager = initialized(&source, 4);
    let mut loader = EdgeLoader::new(pager.clone()).with_prefetch(3);

    assert!(loader.on_visible_range(VisibleRange::new(4, 6)).is_none());
    let request = loader.on_visible_range(VisibleRange::new(2, 7));
    assert!(request.backward && request.forward);
    assert_eq!(pager.keys(), [3, 4, 5]);
    assert_eq!(loader.prefetch(), 3);
}

#[test]
fn edge_loader_waits_for_initialization() {
    let source = Numbers::new(3);
    let pager = Pager::from_arc(source.clone(), PagerOptions::new());
    let mut loader = EdgeLoader::new(pager.clone());

    assert!(loader.on_visible_range(VisibleRange::default()).is_none());
    assert_eq!(loader.state(Direction::Forward), EdgeState::Idle);
    assert_eq!(pager.count(), 0);
}

#[test]
fn failed_edge_is_sticky_until_retry() {
    let source = Numbers::new(3);
    let pager = initialized(&source, 0);
    let signals = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&signals);
    let mut loader = EdgeLoader::new(pager.clone()).with_listener(Arc::new(
        move |signal: &pagewindow::LoadSignal| {
            if matches!(signal, pagewindow::LoadSignal::Failed(_)) {
                *counter.lock() += 1;
            }
        },
    ));

    *source.failing.lock() = Some(1);
    assert!(loader.request(Direction::Forward));
    assert_eq!(loader.state(Direction::Forward), EdgeState::Failed);
    assert!(!loader.on_visible_range(VisibleRange::new(5, 10)).forward);
    assert_eq!(*signals.lock(), 1);

    *source.failing.lock() = None;
    assert!(loader.retry(Direction::Forward));
    assert_eq!(loader.state(Direction::Forward), EdgeState::Idle);
    assert_eq!(pager.count(), 20);
}

#[test]
fn edge_loader_keeps_one_load_per_direction_in_flight() {
    let source = Numbers::new(5);
    let work = Manual::default();
    let options = PagerOptions::new().with_work_executor(work.clone());
    let pager = Pager::from_arc(source.clone(), options);
    let init = pager.initialize(None, None);
    work.run_all();
    assert!(init.wait().is_success());

    let mut loader = EdgeLoader::new(pager.clone());
    assert!(loader.on_visible_range(VisibleRange::new(5, 10)).forward);
    assert!(loader.is_loading());
    assert!(!loader.on_visible_range(VisibleRange::new(5, 10)).forward);
    assert!(!loader.request(Direction::Forward));

    work.run_all();
    assert_eq!(loader.state(Direction::Forward), EdgeState::Idle);
    assert_eq!(pager.count(), 20);
    assert!(loader.on_visible_range(VisibleRange::new(15, 20)).forward);
    work.run_all();
    assert_eq!(pager.keys(), [0, 1, 2]);
}

#[test]
fn reset_cancels_pending_loads_and_clears_sticky_states() {
    let source = Numbers::new(1);
    let work = Manual::default();
    let options = PagerOptions::new().with_work_executor(work.clone());
    let pager = Pager::from_arc(source.clone(), options);
    pager.initialize(Some(1), None);
    work.run_all();

    let mut loader = EdgeLoader::new(pager.clone());
    loader.request(Direction::Forward);
    work.run_all();
    assert_eq!(loader.state(Direction::Forward), EdgeState::Exhausted);

    assert!(loader.request(Direction::Backward));
    loader.reset();
    work.run_all();
    assert_eq!(loader.state(Direction::Backward), EdgeState::Idle);
    assert_eq!(loader.state(Direction::Forward), EdgeState::Idle);
    assert_eq!(pager.keys(), [1]);
}

#[test]
fn anchor_holds_position_across_prepend() {
    let source = Numbers::new(9);
    let pager = initialized(&source, 5);
    let log: Arc<Mutex<Vec<ChangeEvent<u32>>>> = Arc::default();
    let sink = Arc::clone(&log);
    let _sub = pager.observe(move |event: &ChangeEvent<u32>| sink.lock().push(event.clone()));

    let mut anchor = IndexAnchor::first_visible(VisibleRange::new(4, 9), 7).expect("non-empty");
    let anchored = pager.item_at(anchor.index);

    assert!(pager.load_before(None).wait().is_success());
    assert!(anchor.follow_all(log.lock().iter()));
    assert_eq!(anchor.index, 14);
    assert_eq!(anchor.offset_in_viewport, 7);
    assert_eq!(pager.item_at(anchor.index), anchored);
}

#[test]
fn anchor_follows_moves_and_reports_removal() {
    let mut anchor = IndexAnchor::new(5, 0);
    assert!(IndexAnchor::first_visible(VisibleRange::new(3, 3), 0).is_none());

    assert!(anchor.follow(&ChangeEvent::<u32>::ItemMoved {
        from: 1,
        to: 8,
        item: 0
    }));
    assert_eq!(anchor.index, 4);
    assert!(anchor.follow(&ChangeEvent::<u32>::ItemMoved {
        from: 4,
        to: 0,
        item: 0
    }));
    assert_eq!(anchor.index, 0);
    assert!(anchor.follow(&ChangeEvent::ItemsInserted {
        at: 0,
        items: vec![1u32, 2]
    }));
    assert_eq!(anchor.index, 2);
    assert!(anchor.follow(&ChangeEvent::ItemsRemoved {
        at: 3,
        items: vec![9u32]
    }));
    assert_eq!(anchor.index, 2);

    assert!(!anchor.follow(&ChangeEvent::ItemsRemoved {
        at: 1,
        items: vec![1u32, 2, 3]
    }));
    assert!(anchor.is_lost());
    assert_eq!(anchor.index, 1);
}

#[test]
fn mirror_list_tracks_a_threaded_pager() {
    let source = Numbers::new(30);
    let options = PagerOptions::new()
        .with_work_executor(ThreadPerTask::default())
        .with_event_executor(SerialQueue::default());
    let pager = Pager::from_arc(source.clone(), options);
    assert!(pager.initialize(Some(15), None).wait().is_success());

    let early: Vec<LoadTask> = (0..4)
        .flat_map(|_| [pager.load_next(None), pager.load_before(None)])
        .collect();
    let mirror = MirrorList::attach(&pager);
    let late: Vec<LoadTask> = (0..4)
        .flat_map(|_| [pager.load_next(None), pager.load_before(None)])
        .collect();
    for task in early.iter().chain(&late) {
        task.wait();
    }
    if let Some(page) = pager.first_page() {
        page.remove_at(0).expect("attached");
    }

    // Resolves only after every earlier delivery.
    pager.load_next(None).wait();
    assert_eq!(mirror.snapshot(), pager.items());
    assert_eq!(mirror.len(), pager.count());
    assert!(mirror.revision() > 0);
    assert_eq!(mirror.get(0), pager.item_at(0));
    assert!(mirror.with_items(|items| items.windows(2).all(|w| w[0] < w[1])));
}

#[test]
fn mirror_list_detaches_with_its_pager() {
    let source = Numbers::new(3);
    let pager = initialized(&source, 0);
    let mirror = MirrorList::attach(&pager);
    assert_eq!(mirror.snapshot(), (0..10).collect::<Vec<_>>());
    assert_eq!(mirror.revision(), 0);
    assert!(mirror.is_attached());

    pager.clear();
    assert!(mirror.is_empty());
    drop(pager);
    assert!(!mirror.is_attached());
}
