#[cfg(test)]
use core::cmp::Ordering;
use std::sync::Arc;

use crate::clustered::ClusteredIndex;
use crate::emitter::EventEmitter;
use crate::page::{Page, PageDelta, PageLink, PageOp, Slot};
use crate::{ChangeEvent, KeyOrder, PageRef, PagingError};

/// The key-sorted collection of pages and its flattened view.
///
/// Keys are unique and strictly increasing under the injected comparator. The flattened view is
/// `items(page_1) ++ items(page_2) ++ ...`; the global index of local item `l` of page `j` is
/// `prefix_size(j) + l`, and this holds after every committed mutation.
///
/// Consumers only get shared access (see [`crate::Pager::with_pages`]); every mutation goes
/// through the pager so that it is paired with its change events.
pub struct PageSet<K, T> {
    order: KeyOrder<K>,
    pages: Vec<Page<K, T>>,
    index: ClusteredIndex,
}

impl<K, T> PageSet<K, T> {
    pub(crate) fn new(order: KeyOrder<K>) -> Self {
        Self {
            order,
            pages: Vec::new(),
            index: ClusteredIndex::new(),
        }
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Number of items in the flattened view.
    pub fn count(&self) -> usize {
        self.index.len()
    }

    fn position(&self, key: &K) -> Result<usize, usize> {
        self.pages
            .binary_search_by(|page| (self.order)(page.key(), key))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.position(key).is_ok()
    }

    pub fn get(&self, key: &K) -> Option<&Page<K, T>> {
        self.position(key).ok().map(|pos| &self.pages[pos])
    }

    pub fn first(&self) -> Option<&Page<K, T>> {
        self.pages.first()
    }

    pub fn last(&self) -> Option<&Page<K, T>> {
        self.pages.last()
    }

    /// Pages in key order.
    pub fn iter(&self) -> core::slice::Iter<'_, Page<K, T>> {
        self.pages.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.pages.iter().map(Page::key)
    }

    /// Number of items in all pages ordered strictly before `key`'s page.
    pub fn prefix_size(&self, key: &K) -> Option<usize> {
        self.position(key).ok().map(|pos| self.index.start_of(pos))
    }

    /// Maps a global index to its page and local index.
    pub fn locate(&self, index: usize) -> Option<(&Page<K, T>, usize)> {
        let (pos, local) = self.index.locate(index)?;
        Some((&self.pages[pos], local))
    }

    pub fn item_at(&self, index: usize) -> Option<&T> {
        let (page, local) = self.locate(index)?;
        page.items().get(local)
    }

    /// The flattened view.
    pub fn items(&self) -> impl Iterator<Item = &T> + '_ {
        self.pages.iter().flat_map(|page| page.items().iter())
    }

    /// Finds the page holding `item`.
    ///
    /// Linear over pages and their items; intended for item-driven interactions, not hot paths.
    pub fn find_page_containing(&self, item: &T) -> Option<&Page<K, T>>
    where
        T: PartialEq,
    {
        self.pages.iter().find(|page| page.items().contains(item))
    }

    fn position_of_link(&self, link: &Arc<PageLink<K, T>>) -> Result<usize, PagingError> {
        let pos = self
            .position(link.key())
            .map_err(|_| PagingError::Detached)?;
        if Arc::ptr_eq(self.pages[pos].link(), link) {
            Ok(pos)
        } else {
            Err(PagingError::Detached)
        }
    }
}

impl<K: Clone, T: Clone> PageSet<K, T> {
    /// Inserts a new page at its key position and reports its full range as inserted.
    pub(crate) fn add(
        &mut self,
        page: Page<K, T>,
        out: &mut Vec<ChangeEvent<T>>,
    ) -> Result<PageRef<K, T>, PagingError> {
        let pos = match self.position(page.key()) {
            Ok(_) => return Err(PagingError::DuplicateKey),
            Err(pos) => pos,
        };
        let len = page.len();
        let items = page.items().to_vec();
        let handle = page.handle();
        self.pages.insert(pos, page);
        self.index.insert_segment(pos, len);

        let start = self.index.start_of(pos);
        EventEmitter::new(start, len, out).emit(PageDelta::Inserted { at: 0, items });
        Ok(handle)
    }

    /// Removes the page at `pos`, detaching it; the removal range is computed before the page
    /// leaves the index.
    fn remove_at(&mut self, pos: usize, out: &mut Vec<ChangeEvent<T>>) -> PageRef<K, T> {
        let start = self.index.start_of(pos);
        let page = self.pages.remove(pos);
        self.index.remove_segment(pos);

        let handle = page.handle();
        page.link().detach();
        EventEmitter::new(start, 0, out).emit(PageDelta::Removed {
            at: 0,
            items: page.into_items(),
        });
        handle
    }

    pub(crate) fn remove(
        &mut self,
        key: &K,
        out: &mut Vec<ChangeEvent<T>>,
    ) -> Option<PageRef<K, T>> {
        let pos = self.position(key).ok()?;
        Some(self.remove_at(pos, out))
    }

    pub(crate) fn remove_link(
        &mut self,
        link: &Arc<PageLink<K, T>>,
        out: &mut Vec<ChangeEvent<T>>,
    ) -> Result<PageRef<K, T>, PagingError> {
        let pos = self.position_of_link(link)?;
        Ok(self.remove_at(pos, out))
    }

    /// Removes every page, last to first, one removal event per page, each computed against
    /// the state left by the previous removal.
    pub(crate) fn clear(&mut self, out: &mut Vec<ChangeEvent<T>>) -> Vec<PageRef<K, T>> {
        let mut removed = Vec::with_capacity(self.pages.len());
        while !self.pages.is_empty() {
            removed.push(self.remove_at(self.pages.len() - 1, out));
        }
        debug_assert_eq!(self.index.segments(), 0);
        self.index.clear();
        removed
    }

    fn apply_at(
        &mut self,
        pos: usize,
        op: PageOp<'_, T>,
        out: &mut Vec<ChangeEvent<T>>,
    ) -> Result<(), PagingError> {
        let start = self.index.start_of(pos);
        let delta = self.pages[pos].apply(op)?;
        let len = self.pages[pos].len();
        self.index.resize_segment(pos, len);
        EventEmitter::new(start, len, out).emit(delta);
        Ok(())
    }

    /// Applies a local op to the page behind `link`.
    pub(crate) fn apply(
        &mut self,
        link: &Arc<PageLink<K, T>>,
        op: PageOp<'_, T>,
        out: &mut Vec<ChangeEvent<T>>,
    ) -> Result<(), PagingError> {
        let pos = self.position_of_link(link)?;
        self.apply_at(pos, op, out)
    }

    /// Replaces the content of an existing page (a refresh).
    pub(crate) fn replace_items(
        &mut self,
        key: &K,
        items: Vec<T>,
        out: &mut Vec<ChangeEvent<T>>,
    ) -> Result<(), PagingError> {
        let pos = self.position(key).map_err(|_| PagingError::NotFound)?;
        self.apply_at(pos, PageOp::SetItems(items), out)
    }

    pub(crate) fn items_of(&self, link: &Arc<PageLink<K, T>>) -> Result<Vec<T>, PagingError> {
        let pos = self.position_of_link(link)?;
        Ok(self.pages[pos].items().to_vec())
    }

    /// Moves `item` to global index `to`, which must fall inside the page holding the item.
    pub(crate) fn move_to_global(
        &mut self,
        item: &T,
        to: usize,
        out: &mut Vec<ChangeEvent<T>>,
    ) -> Result<(), PagingError>
    where
        T: PartialEq,
    {
        let pos = self
            .pages
            .iter()
            .position(|page| page.items().contains(item))
            .ok_or(PagingError::NotFound)?;
        let start = self.index.start_of(pos);
        let len = self.pages[pos].len();
        let local = to
            .checked_sub(start)
            .filter(|local| *local < len)
            .ok_or(PagingError::OutOfRange {
                index: to,
                len: self.count(),
            })?;
        let matches = |x: &T| x == item;
        self.apply_at(
            pos,
            PageOp::Move {
                from: Slot::Matching(&matches),
                to: local,
            },
            out,
        )
    }

    /// Asserts the structural invariants: strictly increasing keys and an index that matches
    /// the page lengths.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        for pair in self.pages.windows(2) {
            assert_eq!(
                (self.order)(pair[0].key(), pair[1].key()),
                Ordering::Less,
                "page keys must be strictly increasing"
            );
        }
        assert_eq!(self.index.segments(), self.pages.len());
        let mut start = 0usize;
        for (pos, page) in self.pages.iter().enumerate() {
            assert_eq!(self.index.start_of(pos), start);
            for local in 0..page.len() {
                let (found, at) = self.locate(start + local).expect("index in range");
                assert!(Arc::ptr_eq(found.link(), page.link()));
                assert_eq!(at, local);
            }
            start += page.len();
        }
        assert_eq!(self.count(), start);
        assert!(self.locate(start).is_none());
    }
}

impl<K: core::fmt::Debug, T> core::fmt::Debug for PageSet<K, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PageSet")
            .field("pages", &self.pages)
            .field("count", &self.index.len())
            .finish_non_exhaustive()
    }
}
