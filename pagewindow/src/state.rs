/// A lightweight, serializable snapshot of the loaded window.
///
/// Useful to persist where a list was and re-`initialize` from `keys.first()` later; it does not
/// carry item content.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowState<K> {
    pub initialized: bool,
    /// Loaded keys, in order.
    pub keys: Vec<K>,
    /// Item count of each page, parallel to `keys`.
    pub page_lens: Vec<usize>,
}

impl<K> WindowState<K> {
    /// Total number of items in the window.
    pub fn count(&self) -> usize {
        self.page_lens.iter().sum()
    }

    pub fn first_key(&self) -> Option<&K> {
        self.keys.first()
    }

    pub fn last_key(&self) -> Option<&K> {
        self.keys.last()
    }
}
