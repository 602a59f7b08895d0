use core::cmp::Ordering;
use std::sync::Arc;

/// Bounds required from a page key.
#[doc(hidden)]
pub trait PageKey: Clone + Send + Sync + 'static {}
impl<K: Clone + Send + Sync + 'static> PageKey for K {}

/// Bounds required from a page item.
#[doc(hidden)]
pub trait PageItem: Clone + Send + Sync + 'static {}
impl<T: Clone + Send + Sync + 'static> PageItem for T {}

/// The injected total order over page keys.
pub type KeyOrder<K> = Arc<dyn Fn(&K, &K) -> Ordering + Send + Sync>;

pub(crate) fn natural_order<K: Ord + 'static>() -> KeyOrder<K> {
    Arc::new(|a: &K, b: &K| a.cmp(b))
}
