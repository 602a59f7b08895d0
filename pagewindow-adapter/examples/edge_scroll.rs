use pagewindow::{ChangeEvent, LoadResult, Pager, PagerOptions, PagingSource};
use pagewindow_adapter::{Direction, EdgeLoader, IndexAnchor, MirrorList, VisibleRange};
use parking_lot::Mutex;
use std::sync::Arc;

struct Timeline;

impl PagingSource<u32, String> for Timeline {
    fn initial_key(&self, hint: Option<&u32>) -> Option<u32> {
        hint.copied().or(Some(10))
    }

    fn next_key(&self, current: &u32) -> Option<u32> {
        (*current < 12).then(|| current + 1)
    }

    fn previous_key(&self, current: &u32) -> Option<u32> {
        current.checked_sub(1)
    }

    fn load(&self, key: &u32) -> LoadResult<Vec<String>> {
        LoadResult::Success((0..20).map(|i| format!("message {key}.{i}")).collect())
    }
}

fn main() {
    // Example: a chat timeline scrolled by a simulated viewport of 8 rows.
    //
    // The adapter flow is typically:
    // 1) report the visible range to the edge loader on every scroll
    // 2) before a backward load, anchor the first visible row
    // 3) feed the change events to the anchor and scroll to its new index
    let pager = Pager::new(Timeline, PagerOptions::new());
    pager.initialize(None, None).wait();

    let mirror = MirrorList::attach(&pager);
    let events: Arc<Mutex<Vec<ChangeEvent<String>>>> = Arc::default();
    let sink = Arc::clone(&events);
    let _sub = pager.observe(move |event: &ChangeEvent<String>| sink.lock().push(event.clone()));

    let mut loader = EdgeLoader::new(pager.clone()).with_prefetch(4);
    let mut top = 6usize;
    for _ in 0..6 {
        let visible = VisibleRange::new(top, top + 8);
        let mut anchor = IndexAnchor::first_visible(visible, 0).expect("viewport is not empty");
        events.lock().clear();

        let request = loader.on_visible_range(visible);
        anchor.follow_all(events.lock().iter());
        println!(
            "visible={visible:?} request={request:?} anchor moved {} -> {} ({:?})",
            visible.start,
            anchor.index,
            mirror.get(anchor.index)
        );

        // Keep the same message at the top, then scroll up a bit more.
        top = anchor.index.saturating_sub(5);
    }

    println!(
        "backward={:?} forward={:?} rows={} keys={:?}",
        loader.state(Direction::Backward),
        loader.state(Direction::Forward),
        mirror.len(),
        pager.keys()
    );
}
