use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised by the paging engine.
///
/// Every failure is local to the operation that raised it: already committed pages stay valid
/// and the window remains queryable and extendable afterwards.
#[derive(Error, Debug, Clone)]
pub enum PagingError {
    /// The paging source failed to produce a page. Never retried by the engine.
    #[error("paging source failed to load: {0}")]
    SourceLoadFailure(Arc<dyn StdError + Send + Sync>),

    /// A window extension (`load_next`/`load_before`) was requested before the first successful
    /// `initialize`.
    #[error("pager is not initialized")]
    NotInitialized,

    /// A page with the same key is already present.
    #[error("a page with this key already exists")]
    DuplicateKey,

    /// A local index is outside the page bounds.
    #[error("index {index} is out of range for a page of {len} items")]
    OutOfRange { index: usize, len: usize },

    /// An item looked up by identity is not part of the page.
    #[error("item not found")]
    NotFound,

    /// The page was removed from its page set (or its pager was dropped).
    #[error("page is detached")]
    Detached,
}

impl PagingError {
    /// Wraps an arbitrary source error.
    pub fn source_failure(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::SourceLoadFailure(Arc::new(err))
    }
}
