// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! While refresh is suspended by an update batch, invalidated rectangles are
//! accumulated into the [`Region`](crate::region::Region) of the nearest
//! widget-backed view, and that view is marked on [`PENDING_REGION`] in the
//! store's [`understory_dirty`] tracker. Ending the batch drains the channel
//! and replays each pending region through its widget, so the flush touches
//! only views that actually collected damage instead of walking the whole
//! tree.
//!
//! The channel is local-only: no dependency edges are registered, so marking
//! a view never marks its ancestors or descendants.

use understory_dirty::Channel;

/// A widget-backed view holds a non-empty dirty region awaiting replay.
pub const PENDING_REGION: Channel = Channel::new(0);
