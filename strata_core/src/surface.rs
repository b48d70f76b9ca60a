// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared offscreen drawing surface.
//!
//! Double-buffered refreshes paint into one offscreen surface that only ever
//! grows. Every manager holding a clone of the same [`OffscreenCache`]
//! reuses it, and the last handle to be released destroys it.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use kurbo::{Rect, Size};

use crate::backend::{ClipCombine, Color, DeviceContext, RenderingContext, SurfaceId};
use crate::units::UnitScale;

#[derive(Debug, Default)]
struct Inner {
    surface: Option<SurfaceId>,
    /// Device-pixel bounds of `surface`, zero when there is none.
    bounds: Rect,
}

/// A reference-counted handle to the shared offscreen surface.
///
/// Cloning shares the surface.
#[derive(Clone, Default)]
pub struct OffscreenCache(Rc<RefCell<Inner>>);

impl fmt::Debug for OffscreenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("OffscreenCache")
            .field("surface", &inner.surface)
            .field("bounds", &inner.bounds)
            .field("handles", &Rc::strong_count(&self.0))
            .finish()
    }
}

impl OffscreenCache {
    /// Creates a cache holding no surface yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current surface, if one has been allocated.
    #[must_use]
    pub fn surface(&self) -> Option<SurfaceId> {
        self.0.borrow().surface
    }

    /// Returns the device-pixel bounds of the current surface.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.0.borrow().bounds
    }

    /// Selects a surface at least as large as `bounds` (device pixels) into
    /// `cx`, reallocating it if it is too small.
    ///
    /// A reused surface gets its clip reset to its full area and the fill
    /// color set to white. Returns `None` if allocation fails; the caller
    /// then paints directly to its target.
    pub fn acquire(
        &self,
        cx: &mut dyn RenderingContext,
        bounds: Rect,
        scale: UnitScale,
    ) -> Option<SurfaceId> {
        let mut inner = self.0.borrow_mut();
        if let Some(surface) = inner.surface {
            if inner.bounds.width() >= bounds.width() && inner.bounds.height() >= bounds.height() {
                cx.select_offscreen_drawing_surface(surface);
                cx.set_clip_rect(
                    inner.bounds.scale_from_origin(scale.dev_to_app()),
                    ClipCombine::Replace,
                );
                cx.set_color(Color::WHITE);
                return Some(surface);
            }
        }

        let grown = Rect::from_origin_size(
            bounds.origin(),
            Size::new(
                inner.bounds.width().max(bounds.width()),
                inner.bounds.height().max(bounds.height()),
            ),
        );
        if let Some(old) = inner.surface.take() {
            cx.destroy_drawing_surface(old);
        }
        match cx.create_drawing_surface(grown) {
            Ok(surface) => {
                cx.select_offscreen_drawing_surface(surface);
                inner.surface = Some(surface);
                inner.bounds = grown;
                Some(surface)
            }
            Err(err) => {
                log::warn!("painting without offscreen surface: {err}");
                inner.bounds = Rect::ZERO;
                None
            }
        }
    }

    /// Drops this handle. If it was the last one, the surface is destroyed
    /// through a detached context from `device`.
    pub fn release(self, device: &mut dyn DeviceContext) {
        if Rc::strong_count(&self.0) > 1 {
            return;
        }
        let Some(surface) = self.0.borrow_mut().surface.take() else {
            return;
        };
        match device.create_detached_context() {
            Some(mut cx) => cx.destroy_drawing_surface(surface),
            None => log::warn!("leaking {surface:?}: no context to destroy it"),
        }
    }
}
