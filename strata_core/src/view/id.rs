// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View identity.

use core::fmt;

/// Sentinel slot index meaning "no view" in link fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a view in a [`ViewStore`](super::ViewStore).
///
/// Pairs a slot index with a generation counter, so a handle kept after its
/// view was destroyed is detected instead of silently addressing whichever
/// view reused the slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl ViewId {
    /// Rebuilds a handle from its parts, for decoding recorded traces.
    ///
    /// A forged handle is only ever accepted by the manager if a live view
    /// has exactly that slot and generation.
    #[inline]
    #[must_use]
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self {
            idx: index,
            generation,
        }
    }

    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewId({}@gen{})", self.idx, self.generation)
    }
}

/// Whether a view is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// The view paints and receives updates.
    #[default]
    Show,
    /// The view emits no paint entry and update requests against it are
    /// ignored. Its children are still walked.
    Hide,
}
