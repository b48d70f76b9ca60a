// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View tree data model.
//!
//! A *view* is a rectangular node in the compositing tree. Each view has:
//!
//! - An identity ([`ViewId`]): a generational handle that becomes stale when
//!   the view is destroyed.
//! - Topology: parent, first-child, and sibling links. Child lists are kept
//!   front to back, so the first child is painted last.
//! - **Geometry** in app units: a position in the parent's space, a size and
//!   a signed z-index.
//! - **Appearance**: [`Visibility`], opacity, a content-transparency flag, a
//!   floating flag and an optional [`ClipDescriptor`].
//! - An optional [`NativeWidget`](crate::backend::NativeWidget) plus the
//!   device-pixel damage [`Region`](crate::region::Region) accumulated for it
//!   while refresh is disabled.
//!
//! A view whose widget carries native data is a compositing boundary: the
//! platform repaints what lies beneath it through that widget.
//!
//! Views are stored in struct-of-arrays layout with index-based handles.

mod clip;
mod id;
mod store;
mod traverse;

pub use clip::ClipDescriptor;
pub use id::{INVALID, ViewId, Visibility};
pub use store::{ViewInit, ViewStore};
pub use traverse::{Children, Descendants};
