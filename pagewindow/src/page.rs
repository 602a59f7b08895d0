use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::{LoadListener, LoadResult, LoadTask, PagingError};

/// The owner-side capability a page reports to.
///
/// Implemented by the pager core. A page only ever holds it weakly, through [`PageLink`].
pub(crate) trait PageEvents<K, T>: Send + Sync {
    fn page_op(&self, link: &Arc<PageLink<K, T>>, op: PageOp<'_, T>) -> Result<(), PagingError>;
    fn page_items(&self, link: &Arc<PageLink<K, T>>) -> Result<Vec<T>, PagingError>;
    fn delete_page(&self, link: &Arc<PageLink<K, T>>) -> Result<(), PagingError>;
    fn refresh_page(&self, key: K, listener: Option<Arc<dyn LoadListener>>) -> LoadTask;
}

/// Identity of one page instance plus its (clearable) listener back-reference.
///
/// A new link is created for every page, so a handle to a deleted page never resolves to a
/// later page that reuses the key.
pub(crate) struct PageLink<K, T> {
    key: K,
    id: u64,
    listener: Mutex<Option<Weak<dyn PageEvents<K, T>>>>,
}

impl<K, T> PageLink<K, T> {
    pub(crate) fn new(key: K, id: u64, listener: Option<Weak<dyn PageEvents<K, T>>>) -> Self {
        Self {
            key,
            id,
            listener: Mutex::new(listener),
        }
    }

    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    pub(crate) fn detach(&self) {
        self.listener.lock().take();
    }

    fn listener(&self) -> Result<Arc<dyn PageEvents<K, T>>, PagingError> {
        self.listener
            .lock()
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(PagingError::Detached)
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .is_some_and(|listener| listener.strong_count() > 0)
    }
}

/// Addresses one item of a page, by position or by identity.
pub(crate) enum Slot<'a, T> {
    At(usize),
    Matching(&'a (dyn Fn(&T) -> bool + 'a)),
}

/// A local page mutation request.
pub(crate) enum PageOp<'a, T> {
    SetItems(Vec<T>),
    /// `at: None` appends.
    Insert { at: Option<usize>, item: T },
    Remove(Slot<'a, T>),
    Replace { slot: Slot<'a, T>, item: T },
    Move { from: Slot<'a, T>, to: usize },
}

/// A local structural change, in page-relative indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PageDelta<T> {
    Inserted { at: usize, items: Vec<T> },
    Removed { at: usize, items: Vec<T> },
    Changed { at: usize, old: T, new: T },
    Moved { from: usize, to: usize, item: T },
    /// Whole-content replacement; translated with the prefix-aligned diff.
    Replaced { old: Vec<T>, new: Vec<T> },
}

/// An ordered container of items for one key, owned by its [`crate::PageSet`].
pub struct Page<K, T> {
    items: Vec<T>,
    link: Arc<PageLink<K, T>>,
}

impl<K: Clone, T> Page<K, T> {
    pub(crate) fn new(items: Vec<T>, link: Arc<PageLink<K, T>>) -> Self {
        Self { items, link }
    }

    /// Returns a handle that can mutate this page while it stays attached.
    pub fn handle(&self) -> PageRef<K, T> {
        PageRef {
            link: Arc::clone(&self.link),
        }
    }
}

impl<K, T> Page<K, T> {
    pub fn key(&self) -> &K {
        self.link.key()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn link(&self) -> &Arc<PageLink<K, T>> {
        &self.link
    }

    pub(crate) fn into_items(self) -> Vec<T> {
        self.items
    }

    fn resolve(&self, slot: &Slot<'_, T>) -> Result<usize, PagingError> {
        match slot {
            Slot::At(index) if *index < self.items.len() => Ok(*index),
            Slot::At(index) => Err(PagingError::OutOfRange {
                index: *index,
                len: self.items.len(),
            }),
            Slot::Matching(pred) => self
                .items
                .iter()
                .position(|item| pred(item))
                .ok_or(PagingError::NotFound),
        }
    }
}

impl<K, T: Clone> Page<K, T> {
    /// Applies `op` and returns the single delta it produced.
    ///
    /// Validation happens before any change, so a failed op leaves the page untouched.
    pub(crate) fn apply(&mut self, op: PageOp<'_, T>) -> Result<PageDelta<T>, PagingError> {
        let len = self.items.len();
        match op {
            PageOp::SetItems(items) => {
                let new = items.clone();
                let old = core::mem::replace(&mut self.items, items);
                Ok(PageDelta::Replaced { old, new })
            }
            PageOp::Insert { at, item } => {
                let at = at.unwrap_or(len);
                if at > len {
                    return Err(PagingError::OutOfRange { index: at, len });
                }
                self.items.insert(at, item.clone());
                Ok(PageDelta::Inserted {
                    at,
                    items: vec![item],
                })
            }
            PageOp::Remove(slot) => {
                let at = self.resolve(&slot)?;
                let removed = self.items.remove(at);
                Ok(PageDelta::Removed {
                    at,
                    items: vec![removed],
                })
            }
            PageOp::Replace { slot, item } => {
                let at = self.resolve(&slot)?;
                let old = core::mem::replace(&mut self.items[at], item.clone());
                Ok(PageDelta::Changed { at, old, new: item })
            }
            PageOp::Move { from, to } => {
                let from = self.resolve(&from)?;
                if to >= len {
                    return Err(PagingError::OutOfRange { index: to, len });
                }
                let item = self.items.remove(from);
                self.items.insert(to, item.clone());
                Ok(PageDelta::Moved { from, to, item })
            }
        }
    }
}

impl<K: core::fmt::Debug, T> core::fmt::Debug for Page<K, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Page")
            .field("key", self.link.key())
            .field("len", &self.items.len())
            .finish_non_exhaustive()
    }
}

/// A handle to a page living inside a [`crate::Pager`].
///
/// Every mutation updates the page and reports exactly one globally indexed change to the
/// pager's observers. Once the page is removed (explicit deletion, `clear`, or the pager being
/// dropped) all calls fail with [`PagingError::Detached`].
pub struct PageRef<K, T> {
    link: Arc<PageLink<K, T>>,
}

impl<K, T> Clone for PageRef<K, T> {
    fn clone(&self) -> Self {
        Self {
            link: Arc::clone(&self.link),
        }
    }
}

impl<K, T> PageRef<K, T> {
    pub fn key(&self) -> &K {
        &self.link.key
    }

    pub fn is_attached(&self) -> bool {
        self.link.is_attached()
    }

    /// Returns `true` if both handles point to the same page instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.link, &other.link)
    }

    fn op(&self, op: PageOp<'_, T>) -> Result<(), PagingError> {
        self.link.listener()?.page_op(&self.link, op)
    }

    /// A snapshot of the page content.
    pub fn items(&self) -> Result<Vec<T>, PagingError> {
        self.link.listener()?.page_items(&self.link)
    }

    pub fn len(&self) -> Result<usize, PagingError> {
        self.items().map(|items| items.len())
    }

    pub fn set_items(&self, items: Vec<T>) -> Result<(), PagingError> {
        self.op(PageOp::SetItems(items))
    }

    pub fn insert(&self, index: usize, item: T) -> Result<(), PagingError> {
        self.op(PageOp::Insert {
            at: Some(index),
            item,
        })
    }

    pub fn append(&self, item: T) -> Result<(), PagingError> {
        self.op(PageOp::Insert { at: None, item })
    }

    pub fn remove_at(&self, index: usize) -> Result<(), PagingError> {
        self.op(PageOp::Remove(Slot::At(index)))
    }

    pub fn replace_at(&self, index: usize, item: T) -> Result<(), PagingError> {
        self.op(PageOp::Replace {
            slot: Slot::At(index),
            item,
        })
    }

    /// Moves an item within the page; reported as a single move, never as remove + insert.
    ///
    /// `to` is the final position of the item (`to < len`).
    pub fn move_item(&self, from: usize, to: usize) -> Result<(), PagingError> {
        self.op(PageOp::Move {
            from: Slot::At(from),
            to,
        })
    }

    /// Asks the pager to reload this page's key.
    ///
    /// A detached page yields an already finished task resolving to `Error(Detached)`.
    pub fn request_refresh(&self, listener: Option<Arc<dyn LoadListener>>) -> LoadTask
    where
        K: Clone,
    {
        match self.link.listener() {
            Ok(owner) => owner.refresh_page(self.link.key.clone(), listener),
            Err(err) => LoadTask::finished(LoadResult::Error(err)),
        }
    }

    /// Removes this page from its page set. The handle is detached afterwards.
    pub fn request_deletion(&self) -> Result<(), PagingError> {
        self.link.listener()?.delete_page(&self.link)
    }
}

impl<K, T: PartialEq> PageRef<K, T> {
    pub fn remove(&self, item: &T) -> Result<(), PagingError> {
        let matches = |x: &T| x == item;
        self.op(PageOp::Remove(Slot::Matching(&matches)))
    }

    pub fn replace(&self, old: &T, new: T) -> Result<(), PagingError> {
        let matches = |x: &T| x == old;
        self.op(PageOp::Replace {
            slot: Slot::Matching(&matches),
            item: new,
        })
    }

    pub fn move_matching(&self, item: &T, to: usize) -> Result<(), PagingError> {
        let matches = |x: &T| x == item;
        self.op(PageOp::Move {
            from: Slot::Matching(&matches),
            to,
        })
    }
}

impl<K: core::fmt::Debug, T> core::fmt::Debug for PageRef<K, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PageRef")
            .field("key", &self.link.key)
            .field("id", &self.link.id)
            .field("attached", &self.link.is_attached())
            .finish()
    }
}
