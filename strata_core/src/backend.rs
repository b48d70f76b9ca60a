// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator contracts for platform integrations.
//!
//! The view manager decides *what* to repaint and *in what order*; everything
//! that touches pixels or the windowing system is behind a trait here:
//!
//! - [`DeviceContext`]: unit conversion and rendering-context creation.
//! - [`RenderingContext`]: clip state, translation, offscreen surfaces and
//!   blits.
//! - [`NativeWidget`]: a platform window that a view may own.
//! - [`FrameTimer`]: the periodic timer driving deferred composites. The
//!   platform event loop calls
//!   [`ViewManager::on_timer_tick`](crate::ViewManager::on_timer_tick) each
//!   time it fires; ticks never preempt in-progress work.
//! - [`ViewDelegate`]: the view content, which paints and handles events.
//! - [`ViewObserver`]: the surrounding layout system.
//! - [`CompositeListener`]: observers of refresh passes.
//!
//! All calls are synchronous and happen on the thread that owns the manager.

use alloc::boxed::Box;
use core::fmt;

use kurbo::{Point, Rect, Vec2};

use crate::error::{ListenerError, ViewError};
use crate::event::{EventStatus, ViewEvent};
use crate::flags::RefreshFlags;
use crate::region::Region;
use crate::time::Duration;
use crate::view::ViewId;

/// Opaque handle to a drawing surface owned by a [`RenderingContext`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// How a new clip combines with the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClipCombine {
    /// Replace the current clip.
    Replace,
    /// Intersect with the current clip.
    Intersect,
    /// Union with the current clip.
    Union,
}

/// Which clip applies when copying offscreen bits to the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CopyBitsPolicy {
    /// Clip the copy by the clip region of the offscreen source.
    UseSourceClipRegion,
    /// Clip the copy by the clip region of the destination.
    UseTargetClipRegion,
}

/// How a view's paint call relates to the clip already in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaintMode {
    /// Paint the view's own content only; the compositor owns clipping and
    /// child ordering.
    JustPaint,
    /// The caller already set the clip; paint without clipping again.
    ClipSet,
}

/// An opaque RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// A drawing target with a clip stack.
///
/// Rectangles passed in are in app units relative to the current
/// translation, except where noted as device pixels.
pub trait RenderingContext {
    /// Saves the clip and translation state.
    fn push_state(&mut self);

    /// Restores the last saved state. Returns `true` if the restored clip is
    /// empty.
    fn pop_state(&mut self) -> bool;

    /// Combines `rect` into the clip. Returns `true` if the clip is now
    /// empty.
    fn set_clip_rect(&mut self, rect: Rect, combine: ClipCombine) -> bool;

    /// Combines a device-pixel `region` into the clip. Returns `true` if the
    /// clip is now empty.
    fn set_clip_region(&mut self, region: &Region, combine: ClipCombine) -> bool;

    /// Offsets subsequent drawing.
    fn translate(&mut self, offset: Vec2);

    /// Allocates an offscreen surface covering device-pixel `bounds`.
    fn create_drawing_surface(&mut self, bounds: Rect) -> Result<SurfaceId, ViewError>;

    /// Releases a surface returned by
    /// [`create_drawing_surface`](Self::create_drawing_surface).
    fn destroy_drawing_surface(&mut self, surface: SurfaceId);

    /// Redirects drawing into `surface`.
    fn select_offscreen_drawing_surface(&mut self, surface: SurfaceId);

    /// Copies `surface` onto the real target. `origin` is the source origin
    /// and `dest` the device-pixel destination rectangle.
    fn copy_offscreen_bits(
        &mut self,
        surface: SurfaceId,
        origin: Point,
        dest: Rect,
        policy: CopyBitsPolicy,
    );

    /// Sets the solid color used by fills.
    fn set_color(&mut self, color: Color);
}

/// A platform window associated with a view.
pub trait NativeWidget {
    /// Returns the client area in device pixels.
    fn client_bounds(&self) -> Rect;

    /// Marks a device-pixel rectangle as needing repaint. When `immediate`
    /// is `false` the platform may coalesce the damage until
    /// [`update`](Self::update).
    fn invalidate_rect(&mut self, rect: Rect, immediate: bool);

    /// Marks a device-pixel region as needing repaint.
    fn invalidate_region(&mut self, region: &Region, immediate: bool);

    /// Returns `true` for real platform windows, `false` for lightweight
    /// proxies. Only widgets with native data act as compositing boundaries
    /// in the display list.
    fn has_native_data(&self) -> bool {
        true
    }

    /// Flushes pending invalidations, typically by delivering paint events.
    fn update(&mut self);
}

/// Device-level services: unit conversion and context creation.
pub trait DeviceContext {
    /// Returns the app-unit to device-pixel scale factor.
    fn app_units_to_dev_units(&self) -> f64;

    /// Creates a rendering context that draws into `widget`.
    ///
    /// Returning `None` is normal before the platform is fully initialized;
    /// the refresh that asked for it becomes a no-op.
    fn create_rendering_context(
        &mut self,
        widget: &dyn NativeWidget,
    ) -> Option<Box<dyn RenderingContext>>;

    /// Creates a rendering context not bound to any widget, used to release
    /// shared offscreen surfaces and by
    /// [`ViewManager::display`](crate::ViewManager::display).
    fn create_detached_context(&mut self) -> Option<Box<dyn RenderingContext>>;
}

/// A periodic timer whose ticks are delivered through the event loop.
pub trait FrameTimer {
    /// Starts (or restarts) firing every `interval`.
    fn start(&mut self, interval: Duration);

    /// Stops firing. Cancelling an idle timer is harmless.
    fn cancel(&mut self);
}

/// The content behind views.
pub trait ViewDelegate {
    /// Paints `view`. `dirty` is the damaged part of the view in its own
    /// coordinates; the context is already translated to the view's origin.
    fn paint(
        &mut self,
        view: ViewId,
        cx: &mut dyn RenderingContext,
        dirty: Rect,
        mode: PaintMode,
    );

    /// Handles an input event whose point has been translated into `view`'s
    /// coordinate space.
    fn handle_event(&mut self, view: ViewId, event: &ViewEvent) -> EventStatus {
        _ = (view, event);
        EventStatus::Ignore
    }

    /// Called when `view` is destroyed during teardown.
    fn view_destroyed(&mut self, view: ViewId) {
        _ = view;
    }
}

/// The layout system that owns the views' content.
pub trait ViewObserver {
    /// The root view was resized to `width` x `height` app units.
    fn resize_reflow(&mut self, root: ViewId, width: f64, height: f64);
}

/// Observes refresh passes.
///
/// Every method defaults to doing nothing; override the ones of interest.
/// Listeners take `&self` and are shared through `Rc`; use interior
/// mutability for state.
pub trait CompositeListener {
    /// Called before a region refresh paints.
    fn will_refresh_region(
        &self,
        view: ViewId,
        cx: &mut dyn RenderingContext,
        region: &Region,
        flags: RefreshFlags,
    ) -> Result<(), ListenerError> {
        _ = (view, cx, region, flags);
        Ok(())
    }

    /// Called after a region refresh painted.
    fn did_refresh_region(
        &self,
        view: ViewId,
        cx: &mut dyn RenderingContext,
        region: &Region,
        flags: RefreshFlags,
    ) -> Result<(), ListenerError> {
        _ = (view, cx, region, flags);
        Ok(())
    }

    /// Called before a rectangle refresh paints.
    fn will_refresh_rect(
        &self,
        view: ViewId,
        cx: &mut dyn RenderingContext,
        rect: Rect,
        flags: RefreshFlags,
    ) -> Result<(), ListenerError> {
        _ = (view, cx, rect, flags);
        Ok(())
    }

    /// Called after a rectangle refresh painted.
    fn did_refresh_rect(
        &self,
        view: ViewId,
        cx: &mut dyn RenderingContext,
        rect: Rect,
        flags: RefreshFlags,
    ) -> Result<(), ListenerError> {
        _ = (view, cx, rect, flags);
        Ok(())
    }
}
