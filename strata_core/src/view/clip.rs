// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip descriptors for clipping views.

use kurbo::Rect;

/// Marks a view as a clipping container.
///
/// A view carrying a descriptor clips its descendants to `rect`, given in
/// the view's own coordinate space. Clipping views act purely as containers:
/// the display list brackets their subtree with clip markers instead of
/// emitting a paint entry for them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipDescriptor {
    /// Clip rectangle in the view's local coordinates.
    pub rect: Rect,
}

impl ClipDescriptor {
    /// Creates a descriptor clipping to `rect`.
    #[must_use]
    pub const fn new(rect: Rect) -> Self {
        Self { rect }
    }
}
