// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained-mode view compositing.
//!
//! `strata_core` keeps a tree of rectangular views, turns damage requests
//! into platform invalidations, and repaints damaged areas back to front
//! through a rendering context supplied by the platform. It is `no_std`
//! compatible (with `alloc`); everything platform specific sits behind the
//! traits in [`backend`].
//!
//! # Architecture
//!
//! ```text
//!   update_view*() ──► UpdateScheduler ──► NativeWidget::invalidate_rect
//!                          │ (frame timer / overdue)
//!                          ▼
//!                     composite() ──► NativeWidget::update
//!                                          │
//!   platform paint event ◄─────────────────┘
//!          │
//!          ▼
//!   refresh_rect() / refresh_region()
//!          │
//!          ├──► DisplayList::build (front to back)
//!          ▼
//!   replay back to front ──► ViewDelegate::paint
//! ```
//!
//! **[`view`]**: struct-of-arrays view tree with generational handles.
//!
//! **[`manager`]**: the [`ViewManager`], owner of the tree and the platform
//! collaborators. Tree mutations invalidate what they affect.
//!
//! **[`scheduler`]**: deferred and batched updates paced by a frame timer.
//!
//! **[`display_list`]**: the paint order for one damage rectangle, with
//! occlusion culling and clip brackets.
//!
//! **[`surface`]**: the offscreen surface shared between managers for double
//! buffering.
//!
//! **[`event`]**: window event dispatch and input routing.
//!
//! **[`dirty`]**: damage accumulation while refresh is disabled, via
//! `understory_dirty`.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) and the events emitted by
//! the update and refresh paths.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies and
//!   [`SystemClock`](time::SystemClock).
//! - `trace` (disabled by default): Enables `Tracer` method bodies.
//! - `single-buffer` (disabled by default): Never paint through the offscreen
//!   surface, even when transparent views are present.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod backend;
mod compositor;
pub mod dirty;
pub mod display_list;
pub mod error;
pub mod event;
pub mod flags;
pub mod manager;
pub mod region;
pub mod scheduler;
pub mod surface;
pub mod time;
pub mod trace;
pub mod units;
pub mod view;

#[cfg(test)]
mod testing;

pub use error::{ListenerError, ViewError};
pub use event::{EventKind, EventStatus, InputClass, ViewEvent};
pub use flags::RefreshFlags;
pub use manager::{Backends, ManagerConfig, ViewManager};
pub use region::Region;
pub use scheduler::DEFAULT_FRAME_RATE;
pub use surface::OffscreenCache;
pub use view::{ClipDescriptor, ViewId, ViewInit, Visibility};
