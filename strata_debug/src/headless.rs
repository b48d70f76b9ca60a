// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backends for running a [`ViewManager`] without a windowing system.
//!
//! Every collaborator logs what it is asked to do through the `log` facade.
//! A [`HeadlessWindow`] collects invalidations and, when the manager flushes
//! it, moves them into a [`PaintQueue`] that the host drains into paint
//! events, standing in for the platform's paint delivery.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kurbo::{Point, Rect, Vec2};
use strata_core::backend::{
    ClipCombine, Color, CopyBitsPolicy, DeviceContext, FrameTimer, NativeWidget, PaintMode,
    RenderingContext, SurfaceId, ViewDelegate,
};
use strata_core::time::{Duration, SystemClock};
use strata_core::{Backends, EventStatus, Region, ViewError, ViewEvent, ViewId};

/// Returns logging backends with a [`SystemClock`].
#[must_use]
pub fn backends(scale: f64) -> Backends {
    Backends {
        device: Box::new(HeadlessDevice::new(scale)),
        timer: Box::new(LoggingTimer::default()),
        clock: Box::new(SystemClock::new()),
        delegate: Box::new(LoggingDelegate),
    }
}

// ---------------------------------------------------------------------------
// Device and contexts
// ---------------------------------------------------------------------------

/// A device with a fixed scale whose contexts only log.
#[derive(Debug)]
pub struct HeadlessDevice {
    scale: f64,
    next_surface: Rc<Cell<u32>>,
}

impl HeadlessDevice {
    /// Creates a device converting app units to device pixels by `scale`.
    #[must_use]
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            next_surface: Rc::new(Cell::new(1)),
        }
    }
}

impl DeviceContext for HeadlessDevice {
    fn app_units_to_dev_units(&self) -> f64 {
        self.scale
    }

    fn create_rendering_context(
        &mut self,
        widget: &dyn NativeWidget,
    ) -> Option<Box<dyn RenderingContext>> {
        log::debug!("context for window {:?}", widget.client_bounds());
        Some(Box::new(LoggingContext::new(self.next_surface.clone())))
    }

    fn create_detached_context(&mut self) -> Option<Box<dyn RenderingContext>> {
        log::debug!("detached context");
        Some(Box::new(LoggingContext::new(self.next_surface.clone())))
    }
}

/// A rendering context that logs every call at `trace` level.
#[derive(Debug)]
pub struct LoggingContext {
    depth: usize,
    next_surface: Rc<Cell<u32>>,
}

impl LoggingContext {
    fn new(next_surface: Rc<Cell<u32>>) -> Self {
        Self {
            depth: 0,
            next_surface,
        }
    }
}

impl RenderingContext for LoggingContext {
    fn push_state(&mut self) {
        self.depth += 1;
        log::trace!("push state -> {}", self.depth);
    }

    fn pop_state(&mut self) -> bool {
        self.depth = self.depth.saturating_sub(1);
        log::trace!("pop state -> {}", self.depth);
        false
    }

    fn set_clip_rect(&mut self, rect: Rect, combine: ClipCombine) -> bool {
        log::trace!("clip {combine:?} {rect:?}");
        false
    }

    fn set_clip_region(&mut self, region: &Region, combine: ClipCombine) -> bool {
        log::trace!("clip {combine:?} region of {} rects", region.rects().len());
        false
    }

    fn translate(&mut self, offset: Vec2) {
        log::trace!("translate {offset:?}");
    }

    fn create_drawing_surface(&mut self, bounds: Rect) -> Result<SurfaceId, ViewError> {
        let id = self.next_surface.get();
        self.next_surface.set(id + 1);
        log::debug!("surface {id} allocated for {bounds:?}");
        Ok(SurfaceId(id))
    }

    fn destroy_drawing_surface(&mut self, surface: SurfaceId) {
        log::debug!("{surface:?} destroyed");
    }

    fn select_offscreen_drawing_surface(&mut self, surface: SurfaceId) {
        log::trace!("drawing into {surface:?}");
    }

    fn copy_offscreen_bits(
        &mut self,
        surface: SurfaceId,
        origin: Point,
        dest: Rect,
        policy: CopyBitsPolicy,
    ) {
        log::debug!("blit {surface:?} from {origin:?} to {dest:?} ({policy:?})");
    }

    fn set_color(&mut self, color: Color) {
        log::trace!("color {color:?}");
    }
}

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// Device-pixel damage waiting to be painted, shared between a
/// [`HeadlessWindow`] and its host.
#[derive(Clone, Debug, Default)]
pub struct PaintQueue(Rc<RefCell<Region>>);

impl PaintQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything queued.
    #[must_use]
    pub fn take(&self) -> Region {
        core::mem::take(&mut *self.0.borrow_mut())
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// A window without pixels.
#[derive(Debug)]
pub struct HeadlessWindow {
    name: String,
    bounds: Rect,
    invalid: Region,
    queue: PaintQueue,
}

impl HeadlessWindow {
    /// Creates a window named `name` with device-pixel client `bounds`,
    /// flushing its invalidations into `queue`.
    #[must_use]
    pub fn new(name: impl Into<String>, bounds: Rect, queue: PaintQueue) -> Self {
        Self {
            name: name.into(),
            bounds,
            invalid: Region::new(),
            queue,
        }
    }
}

impl NativeWidget for HeadlessWindow {
    fn client_bounds(&self) -> Rect {
        self.bounds
    }

    fn invalidate_rect(&mut self, rect: Rect, immediate: bool) {
        log::debug!("{}: invalidate {rect:?} immediate={immediate}", self.name);
        self.invalid.union_rect(rect);
    }

    fn invalidate_region(&mut self, region: &Region, immediate: bool) {
        log::debug!(
            "{}: invalidate {} rects immediate={immediate}",
            self.name,
            region.rects().len()
        );
        self.invalid.union(region);
    }

    fn update(&mut self) {
        if self.invalid.is_empty() {
            return;
        }
        log::info!(
            "{}: flushing {} damage rects, bounds {:?}",
            self.name,
            self.invalid.rects().len(),
            self.invalid.bounds()
        );
        self.queue.0.borrow_mut().union(&self.invalid);
        self.invalid.clear();
    }
}

// ---------------------------------------------------------------------------
// Timer and content
// ---------------------------------------------------------------------------

/// A frame timer that records its interval; the host fires it.
#[derive(Debug, Default)]
pub struct LoggingTimer {
    interval: Option<Duration>,
}

impl LoggingTimer {
    /// Returns the interval while running.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }
}

impl FrameTimer for LoggingTimer {
    fn start(&mut self, interval: Duration) {
        log::debug!("frame timer every {}ms", interval.as_millis());
        self.interval = Some(interval);
    }

    fn cancel(&mut self) {
        if self.interval.take().is_some() {
            log::debug!("frame timer cancelled");
        }
    }
}

/// View content that logs paints and consumes input.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingDelegate;

impl ViewDelegate for LoggingDelegate {
    fn paint(
        &mut self,
        view: ViewId,
        cx: &mut dyn RenderingContext,
        dirty: Rect,
        mode: PaintMode,
    ) {
        cx.set_color(Color::WHITE);
        log::info!("paint {view:?} dirty {dirty:?} ({mode:?})");
    }

    fn handle_event(&mut self, view: ViewId, event: &ViewEvent) -> EventStatus {
        log::info!("{:?} event for {view:?} at {:?}", event.kind, event.point);
        EventStatus::ConsumeDoDefault
    }

    fn view_destroyed(&mut self, view: ViewId) {
        log::debug!("{view:?} destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{ManagerConfig, OffscreenCache, RefreshFlags, ViewInit, ViewManager};

    #[test]
    fn window_flushes_into_queue() {
        let queue = PaintQueue::new();
        let mut window = HeadlessWindow::new("main", Rect::new(0.0, 0.0, 100.0, 100.0), queue.clone());
        window.invalidate_rect(Rect::new(0.0, 0.0, 10.0, 10.0), false);
        assert!(queue.is_empty(), "damage is held until update");

        window.update();
        let damage = queue.take();
        assert_eq!(damage.bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(queue.is_empty(), "take drains the queue");
    }

    #[test]
    fn immediate_update_reaches_queue() {
        let queue = PaintQueue::new();
        let window = Rect::new(0.0, 0.0, 200.0, 100.0);
        let mut vm = ViewManager::new(ManagerConfig::default(), backends(1.0), OffscreenCache::new());
        let root = vm.create_view(
            ViewInit::new(window).with_widget(Box::new(HeadlessWindow::new("main", window, queue.clone()))),
        );
        vm.set_root_view(root);

        vm.update_view_rect(root, Rect::new(5.0, 5.0, 25.0, 15.0), RefreshFlags::IMMEDIATE);
        assert_eq!(vm.pending_updates(), 0);
        assert_eq!(queue.take().bounds(), Rect::new(5.0, 5.0, 25.0, 15.0));
    }

    #[test]
    fn surfaces_get_distinct_ids() {
        let mut device = HeadlessDevice::new(1.0);
        let mut a = device.create_detached_context().unwrap();
        let mut b = device.create_detached_context().unwrap();
        let first = a.create_drawing_surface(Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        let second = b.create_drawing_surface(Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert_ne!(first, second);
    }
}
