use crate::ChangeEvent;
use crate::page::PageDelta;

/// Translates page-relative deltas into globally indexed [`ChangeEvent`]s.
///
/// `page_start` is the prefix size of the page (items in all pages before it) and `page_len`
/// its length once the delta has been applied, both read from the committed state at event
/// time. The emitter enforces the delta contract:
/// - Ranges that do not fit the page are dropped (and debug-asserted).
/// - Zero-length ranges are not emitted.
pub(crate) struct EventEmitter<'a, T> {
    page_start: usize,
    page_len: usize,
    out: &'a mut Vec<ChangeEvent<T>>,
}

impl<'a, T> EventEmitter<'a, T> {
    pub(crate) fn new(
        page_start: usize,
        page_len: usize,
        out: &'a mut Vec<ChangeEvent<T>>,
    ) -> Self {
        Self {
            page_start,
            page_len,
            out,
        }
    }

    pub(crate) fn emit(&mut self, delta: PageDelta<T>) {
        match delta {
            PageDelta::Inserted { at, items } => self.inserted(at, items),
            PageDelta::Removed { at, items } => self.removed(at, items),
            PageDelta::Changed { at, old, new } => {
                if self.check(at < self.page_len, at, "changed") {
                    self.out.push(ChangeEvent::ItemChanged {
                        at: self.page_start + at,
                        old,
                        new,
                    });
                }
            }
            PageDelta::Moved { from, to, item } => {
                let fits = from < self.page_len && to < self.page_len;
                if self.check(fits, from.max(to), "moved") {
                    self.out.push(ChangeEvent::ItemMoved {
                        from: self.page_start + from,
                        to: self.page_start + to,
                        item,
                    });
                }
            }
            PageDelta::Replaced { old, new } => self.replaced(old, new),
        }
    }

    fn inserted(&mut self, at: usize, items: Vec<T>) {
        if items.is_empty() {
            return;
        }
        if self.check(at + items.len() <= self.page_len, at, "inserted") {
            self.out.push(ChangeEvent::ItemsInserted {
                at: self.page_start + at,
                items,
            });
        }
    }

    fn removed(&mut self, at: usize, items: Vec<T>) {
        if items.is_empty() {
            return;
        }
        if self.check(at <= self.page_len, at, "removed") {
            self.out.push(ChangeEvent::ItemsRemoved {
                at: self.page_start + at,
                items,
            });
        }
    }

    /// Prefix-aligned diff: positions shared by both contents are reported as one range change,
    /// the surplus as a trailing removal or insertion.
    ///
    /// No element identity matching is attempted, so a reload that shifts items reports them as
    /// changed in place. Page-level ops remain the precise-delta path.
    fn replaced(&mut self, mut old: Vec<T>, mut new: Vec<T>) {
        let shared = old.len().min(new.len());
        let old_tail = old.split_off(shared);
        let new_tail = new.split_off(shared);
        if shared > 0 {
            self.out.push(ChangeEvent::ItemsRangeChanged {
                at: self.page_start,
                old,
                new,
            });
        }
        self.removed(shared, old_tail);
        self.inserted(shared, new_tail);
    }

    fn check(&self, fits: bool, index: usize, kind: &'static str) -> bool {
        if !fits {
            pwarn!(
                index,
                page_len = self.page_len,
                kind,
                "EventEmitter: delta outside page bounds"
            );
            debug_assert!(
                fits,
                "EventEmitter: {kind} delta outside page bounds (i={index}, len={})",
                self.page_len
            );
        }
        fits
    }
}
