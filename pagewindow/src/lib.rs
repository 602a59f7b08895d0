//! An incremental, bidirectional windowed-pagination engine.
//!
//! For list-binding utilities (edge-triggered loading, index anchoring, mirrored views), see the
//! `pagewindow-adapter` crate.
//!
//! A [`Pager`] keeps a key-sorted set of pages, loaded on demand from a [`PagingSource`], and
//! exposes them as one flattened sequence with stable global indices. The window grows at
//! either end ([`Pager::load_next`], [`Pager::load_before`]), pages can be refreshed or edited
//! item by item through a [`PageRef`], and every committed change is reported to observers as a
//! globally indexed [`ChangeEvent`], in commit order.
//!
//! It is UI-agnostic. A list layer is expected to:
//! - implement [`PagingSource`] (key navigation + page loading)
//! - subscribe an observer and apply the events to its own view
//! - trigger window extension when the viewport approaches an edge
//!
//! Loads run on a configurable work [`Executor`]; notifications are delivered on a
//! configurable event executor. Both default to [`Inline`].
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod clustered;
mod dispatch;
mod emitter;
mod error;
mod events;
mod executor;
mod fenwick;
mod key;
mod options;
mod page;
mod page_set;
mod pager;
mod source;
mod state;
mod task;
mod types;


pub use error::PagingError;
pub use events::{ChangeEvent, PagingObserver, Subscription};
pub use executor::{Executor, Inline, Job, SerialQueue, ThreadPerTask};
pub use key::KeyOrder;
pub use options::PagerOptions;
pub use page::{Page, PageRef};
pub use page_set::PageSet;
pub use pager::Pager;
pub use source::{LoadListener, PagingSource};
pub use state::WindowState;
pub use task::LoadTask;
pub use types::{LoadResult, LoadSignal};

#[doc(hidden)]
pub use key::{PageItem, PageKey};
