use core::cmp;

/// Prefix sums over per-page item counts.
///
/// Slot `i` holds the item count of the `i`-th page in key order. Appends and trailing
/// truncation are incremental; inserting or removing a slot in the middle is done by the caller
/// through [`Fenwick::from_counts`].
#[derive(Clone, Debug)]
pub(crate) struct Fenwick {
    tree: Vec<usize>, // 1-indexed
    total: usize,
    max_bit: usize,
}

impl Default for Fenwick {
    fn default() -> Self {
        Self::from_counts(&[])
    }
}

impl Fenwick {
    pub(crate) fn from_counts(counts: &[usize]) -> Self {
        let n = counts.len();
        let mut tree = vec![0usize; n + 1];
        let mut total = 0usize;
        for i in 1..=n {
            total += counts[i - 1];
            tree[i] += counts[i - 1];
            let j = i + lsb(i);
            if j <= n {
                tree[j] += tree[i];
            }
        }
        Self {
            tree,
            total,
            max_bit: highest_power_of_two_leq(n),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tree.len().saturating_sub(1)
    }

    pub(crate) fn total(&self) -> usize {
        self.total
    }

    /// Appends a slot holding `count`.
    ///
    /// `tree[i]` covers the `lsb(i)` slots ending at `i`, so the new node is seeded from the
    /// existing prefix sums before the append.
    pub(crate) fn push(&mut self, count: usize) {
        let new_len = self.len() + 1;
        let covered_from = new_len - lsb(new_len);
        let before = self.prefix_sum(new_len - 1) - self.prefix_sum(covered_from);
        self.tree.push(before + count);
        self.total += count;
        self.max_bit = highest_power_of_two_leq(new_len);
    }

    pub(crate) fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len() {
            return;
        }
        self.total = self.prefix_sum(new_len);
        self.tree.truncate(new_len + 1);
        self.max_bit = highest_power_of_two_leq(new_len);
    }

    pub(crate) fn add(&mut self, slot: usize, delta: isize) {
        let n = self.len();
        if slot >= n || delta == 0 {
            return;
        }
        self.total = apply_delta(self.total, delta);
        let mut i = slot + 1;
        while i <= n {
            debug_assert!(
                delta >= 0 || self.tree[i] >= delta.unsigned_abs(),
                "Fenwick underflow (idx={i}, cur={}, delta={delta})",
                self.tree[i]
            );
            self.tree[i] = apply_delta(self.tree[i], delta);
            i += lsb(i);
        }
    }

    /// Sum of the first `count` slots.
    pub(crate) fn prefix_sum(&self, count: usize) -> usize {
        let mut i = cmp::min(count, self.len());
        let mut sum = 0usize;
        while i > 0 {
            sum += self.tree[i];
            i &= i - 1;
        }
        sum
    }

    /// Returns the largest number of leading slots whose sum is `<= target`.
    ///
    /// For `target < total()` this is the slot holding the `target`-th item: empty slots in
    /// front of it are skipped because their prefix sum equals the next one's.
    pub(crate) fn slots_within(&self, mut target: usize) -> usize {
        let n = self.len();
        let mut idx = 0usize;
        let mut bit = self.max_bit;
        while bit != 0 {
            let next = idx + bit;
            if next <= n && self.tree[next] <= target {
                target -= self.tree[next];
                idx = next;
            }
            bit >>= 1;
        }
        idx
    }
}

fn apply_delta(value: usize, delta: isize) -> usize {
    if delta >= 0 {
        value.saturating_add(delta as usize)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

fn lsb(i: usize) -> usize {
    i & i.wrapping_neg()
}

fn highest_power_of_two_leq(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let mut p = 1usize;
    while p <= n / 2 {
        p <<= 1;
    }
    p
}
