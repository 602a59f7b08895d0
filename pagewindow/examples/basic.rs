// Example: initialize, extend both ways, edit a page and watch the change events.
use pagewindow::{ChangeEvent, LoadResult, Pager, PagerOptions, PagingSource};

/// Pages of a numbered feed: page `k` holds items `k * 5 .. k * 5 + 5`, for `k` in `0..=9`.
struct Feed;

impl PagingSource<u32, String> for Feed {
    fn initial_key(&self, hint: Option<&u32>) -> Option<u32> {
        Some(hint.copied().unwrap_or(0).min(9))
    }

    fn next_key(&self, current: &u32) -> Option<u32> {
        (*current < 9).then(|| current + 1)
    }

    fn previous_key(&self, current: &u32) -> Option<u32> {
        current.checked_sub(1)
    }

    fn load(&self, key: &u32) -> LoadResult<Vec<String>> {
        LoadResult::Success((key * 5..key * 5 + 5).map(|i| format!("post #{i}")).collect())
    }
}

fn main() {
    let pager = Pager::new(Feed, PagerOptions::new());
    let sub = pager.observe(|event: &ChangeEvent<String>| match event {
        ChangeEvent::ItemsInserted { at, items } => println!("inserted {} at {at}", items.len()),
        ChangeEvent::ItemsRemoved { at, items } => println!("removed {} at {at}", items.len()),
        other => println!("{other:?}"),
    });

    println!("initialize -> {:?}", pager.initialize(Some(4), None).wait());
    println!("load_next -> {:?}", pager.load_next(None).wait());
    println!("load_before -> {:?}", pager.load_before(None).wait());
    println!("keys={:?} count={}", pager.keys(), pager.count());

    let page = pager.page(&4).expect("page 4 is loaded");
    page.move_item(0, 4).expect("both indices are inside the page");
    page.append("a local draft".to_string())
        .expect("page is attached");
    println!("item_at(9)={:?}", pager.item_at(9));

    page.request_deletion().expect("page is attached");
    println!("after deletion: attached={} keys={:?}", page.is_attached(), pager.keys());

    pager.clear();
    sub.cancel();
}
