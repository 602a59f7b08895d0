use crate::fenwick::Fenwick;

/// Global ↔ (segment, local) index translation for an ordered concatenation of segments.
///
/// Holds only segment lengths; the segments themselves live in the page set, which keeps this
/// index in lockstep with every committed mutation. Lookups are `O(log segments)`.
#[derive(Clone, Debug, Default)]
pub(crate) struct ClusteredIndex {
    counts: Vec<usize>,
    sums: Fenwick,
}

impl ClusteredIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn segments(&self) -> usize {
        self.counts.len()
    }

    /// Total number of items across all segments.
    pub(crate) fn len(&self) -> usize {
        self.sums.total()
    }

    /// Number of items in all segments strictly before `segment`.
    pub(crate) fn start_of(&self, segment: usize) -> usize {
        debug_assert!(segment <= self.segments(), "segment {segment} out of bounds");
        self.sums.prefix_sum(segment)
    }

    /// Maps a global index to `(segment, local index)`.
    pub(crate) fn locate(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.len() {
            return None;
        }
        let segment = self.sums.slots_within(index);
        let local = index - self.start_of(segment);
        debug_assert!(local < self.counts[segment]);
        Some((segment, local))
    }

    pub(crate) fn insert_segment(&mut self, segment: usize, len: usize) {
        debug_assert!(segment <= self.segments());
        if segment == self.segments() {
            self.counts.push(len);
            self.sums.push(len);
            return;
        }
        self.counts.insert(segment, len);
        self.sums = Fenwick::from_counts(&self.counts);
    }

    pub(crate) fn remove_segment(&mut self, segment: usize) {
        debug_assert!(segment < self.segments());
        self.counts.remove(segment);
        if segment == self.counts.len() {
            self.sums.truncate(segment);
        } else {
            self.sums = Fenwick::from_counts(&self.counts);
        }
    }

    pub(crate) fn resize_segment(&mut self, segment: usize, len: usize) {
        let prev = core::mem::replace(&mut self.counts[segment], len);
        self.sums.add(segment, len as isize - prev as isize);
    }

    pub(crate) fn clear(&mut self) {
        self.counts.clear();
        self.sums = Fenwick::default();
    }
}
