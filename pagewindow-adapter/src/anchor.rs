use core::fmt;

use pagewindow::ChangeEvent;

use crate::VisibleRange;

/// Follows one item of the flattened view across change events, by global index.
///
/// Typical use cases:
/// - chat/timeline "load older" (`load_before` prepends pages) without content jumping
/// - keeping a selection on the same row while pages above it are refreshed or deleted
///
/// Feed every delivered [`ChangeEvent`] to [`IndexAnchor::follow`], then restore the viewport
/// at `index`, shifted by `offset_in_viewport`.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexAnchor {
    pub index: usize,
    /// The distance from the anchored item's start to the viewport's scroll offset, in the
    /// adapter's own units. Carried unchanged.
    pub offset_in_viewport: u64,
    lost: bool,
}

impl fmt::Debug for IndexAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexAnchor")
            .field("index", &self.index)
            .field("offset_in_viewport", &self.offset_in_viewport)
            .field("lost", &self.lost)
            .finish()
    }
}

impl IndexAnchor {
    pub fn new(index: usize, offset_in_viewport: u64) -> Self {
        Self {
            index,
            offset_in_viewport,
            lost: false,
        }
    }

    /// Anchors the first visible item. Returns `None` for an empty range.
    pub fn first_visible(range: VisibleRange, offset_in_viewport: u64) -> Option<Self> {
        if range.is_empty() {
            return None;
        }
        Some(Self::new(range.start, offset_in_viewport))
    }

    /// Returns `true` once the anchored item has been removed.
    ///
    /// A lost anchor keeps following the position the item used to occupy.
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Updates `index` so that it keeps designating the same item after `event`.
    ///
    /// Returns `false` if the anchored item is (or already was) removed.
    pub fn follow<T>(&mut self, event: &ChangeEvent<T>) -> bool {
        match event {
            ChangeEvent::ItemsInserted { at, items } => {
                if *at <= self.index {
                    self.index += items.len();
                }
            }
            ChangeEvent::ItemsRemoved { at, items } => {
                let end = at + items.len();
                if self.index >= end {
                    self.index -= items.len();
                } else if self.index >= *at {
                    self.index = *at;
                    self.lost = true;
                }
            }
            ChangeEvent::ItemMoved { from, to, .. } => {
                if self.index == *from {
                    self.index = *to;
                } else {
                    if *from < self.index {
                        self.index -= 1;
                    }
                    if *to <= self.index {
                        self.index += 1;
                    }
                }
            }
            ChangeEvent::Initialized
            | ChangeEvent::ItemChanged { .. }
            | ChangeEvent::ItemsRangeChanged { .. }
            | ChangeEvent::ClearedSoon { .. } => {}
        }
        !self.lost
    }

    /// [`IndexAnchor::follow`] over a batch of events, in order.
    pub fn follow_all<'a, T: 'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a ChangeEvent<T>>,
    ) -> bool {
        for event in events {
            self.follow(event);
        }
        !self.lost
    }
}
