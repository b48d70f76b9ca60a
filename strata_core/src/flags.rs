// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flags recognized on update and refresh requests.

use bitflags::bitflags;

bitflags! {
    /// Modifiers for [`ViewManager::update_view_rect`](crate::ViewManager::update_view_rect)
    /// and the refresh entry points.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RefreshFlags: u32 {
        /// Paint through an offscreen surface and blit the result.
        const DOUBLE_BUFFER = 1 << 0;
        /// Composite synchronously instead of waiting for the timer.
        const IMMEDIATE     = 1 << 1;
        /// Skip the rate-limit check that may composite an overdue frame.
        const NO_SYNC       = 1 << 2;
    }
}
