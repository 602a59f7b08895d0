//! Adapter utilities for the `pagewindow` crate.
//!
//! The `pagewindow` crate is UI-agnostic and focuses on the paging engine. This crate provides
//! small, framework-neutral helpers commonly needed when binding a pager to a list view:
//!
//! - Edge-triggered window extension driven by the visible range ([`EdgeLoader`])
//! - Index anchoring across change events, e.g. to keep the viewport still while older pages
//!   are prepended ([`IndexAnchor`])
//! - A consumer-side copy of the flattened view kept in sync by events ([`MirrorList`])
//!
//! This crate is intentionally framework-agnostic (no widget toolkit bindings).
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod anchor;
mod edge;
mod mirror;

#[cfg(test)]
mod tests;

pub use anchor::IndexAnchor;
pub use edge::{Direction, EdgeLoader, EdgeRequest, EdgeState, VisibleRange};
pub use mirror::MirrorList;
