// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Contract violations such as stale [`ViewId`](crate::view::ViewId)s panic,
//! matching the store's handle validation. The conditions below are the ones
//! callers are expected to check and recover from.

use alloc::string::String;

/// Recoverable failures reported by the view manager and its collaborators.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// The query has no implementation and deliberately reports so instead of
    /// guessing a result.
    #[error("operation not implemented")]
    NotImplemented,
    /// The given sibling is not a child of the given parent.
    #[error("view is not a child of the given parent")]
    NotAChild,
    /// `end_update_batch` was called without a matching begin.
    #[error("update batch ended more times than it was begun")]
    BatchUnderflow,
    /// The listener was never registered (or was already removed).
    #[error("composite listener is not registered")]
    ListenerNotFound,
    /// A refresh was requested while another refresh was painting.
    #[error("recursive painting not permitted")]
    ReentrantRefresh,
    /// A drawing surface could not be allocated.
    #[error("failed to allocate a {width}x{height} drawing surface")]
    SurfaceAllocation {
        /// Requested width in device pixels.
        width: u32,
        /// Requested height in device pixels.
        height: u32,
    },
}

/// Failure reported by a [`CompositeListener`](crate::backend::CompositeListener).
///
/// Listener failures are logged and never stop the remaining listeners from
/// being notified.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("composite listener failed: {0}")]
pub struct ListenerError(pub String);
