// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording test doubles for every collaborator trait.
//!
//! All doubles write into one shared [`Log`], so a test can assert on the
//! interleaving of widget, context, timer and delegate calls.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::{Point, Rect, Vec2};

use crate::backend::{
    ClipCombine, Color, CompositeListener, CopyBitsPolicy, DeviceContext, FrameTimer,
    NativeWidget, PaintMode, RenderingContext, SurfaceId, ViewDelegate, ViewObserver,
};
use crate::error::{ListenerError, ViewError};
use crate::event::{EventStatus, ViewEvent};
use crate::flags::RefreshFlags;
use crate::manager::{Backends, ManagerConfig, ViewManager};
use crate::region::Region;
use crate::surface::OffscreenCache;
use crate::time::{Clock, Duration, HostTime};
use crate::view::{ViewId, ViewInit};

/// One recorded collaborator call.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
    PushState,
    PopState,
    ClipRect(Rect, ClipCombine),
    ClipRegion(Vec<Rect>, ClipCombine),
    Translate(Vec2),
    CreateSurface(Rect),
    DestroySurface(SurfaceId),
    SelectSurface(SurfaceId),
    CopyBits(SurfaceId, Point, Rect, CopyBitsPolicy),
    SetColor(Color),
    CreateContext,
    CreateDetached,
    Invalidate(u32, Rect),
    InvalidateRegion(u32, Vec<Rect>),
    WidgetUpdate(u32),
    TimerStart(Duration),
    TimerCancel,
    Paint(ViewId, Rect, PaintMode),
    Event(ViewId, Point, Point),
    Destroyed(ViewId),
    Reflow(ViewId, f64, f64),
    Will(u32, RefreshFlags),
    Did(u32, RefreshFlags),
}

#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) ops: Vec<Op>,
    pub(crate) now: HostTime,
    pub(crate) scale: f64,
    pub(crate) fail_surfaces: bool,
    pub(crate) no_contexts: bool,
    pub(crate) event_status: EventStatus,
    next_surface: u32,
}

pub(crate) type Log = Rc<RefCell<Shared>>;

pub(crate) fn new_log(scale: f64) -> Log {
    Rc::new(RefCell::new(Shared {
        ops: Vec::new(),
        now: HostTime(0),
        scale,
        fail_surfaces: false,
        no_contexts: false,
        event_status: EventStatus::ConsumeDoDefault,
        next_surface: 1,
    }))
}

fn record(log: &Log, op: Op) {
    log.borrow_mut().ops.push(op);
}

// ---------------------------------------------------------------------------
// Rendering

#[derive(Debug)]
pub(crate) struct RecordingContext {
    log: Log,
}

impl RecordingContext {
    pub(crate) fn new(log: Log) -> Self {
        Self { log }
    }
}

impl RenderingContext for RecordingContext {
    fn push_state(&mut self) {
        record(&self.log, Op::PushState);
    }

    fn pop_state(&mut self) -> bool {
        record(&self.log, Op::PopState);
        false
    }

    fn set_clip_rect(&mut self, rect: Rect, combine: ClipCombine) -> bool {
        record(&self.log, Op::ClipRect(rect, combine));
        false
    }

    fn set_clip_region(&mut self, region: &Region, combine: ClipCombine) -> bool {
        record(&self.log, Op::ClipRegion(region.rects().to_vec(), combine));
        false
    }

    fn translate(&mut self, offset: Vec2) {
        record(&self.log, Op::Translate(offset));
    }

    fn create_drawing_surface(&mut self, bounds: Rect) -> Result<SurfaceId, ViewError> {
        record(&self.log, Op::CreateSurface(bounds));
        let mut shared = self.log.borrow_mut();
        if shared.fail_surfaces {
            return Err(ViewError::SurfaceAllocation {
                width: 0,
                height: 0,
            });
        }
        let id = SurfaceId(shared.next_surface);
        shared.next_surface += 1;
        Ok(id)
    }

    fn destroy_drawing_surface(&mut self, surface: SurfaceId) {
        record(&self.log, Op::DestroySurface(surface));
    }

    fn select_offscreen_drawing_surface(&mut self, surface: SurfaceId) {
        record(&self.log, Op::SelectSurface(surface));
    }

    fn copy_offscreen_bits(
        &mut self,
        surface: SurfaceId,
        origin: Point,
        dest: Rect,
        policy: CopyBitsPolicy,
    ) {
        record(&self.log, Op::CopyBits(surface, origin, dest, policy));
    }

    fn set_color(&mut self, color: Color) {
        record(&self.log, Op::SetColor(color));
    }
}

#[derive(Debug)]
pub(crate) struct TestDevice {
    log: Log,
}

impl DeviceContext for TestDevice {
    fn app_units_to_dev_units(&self) -> f64 {
        self.log.borrow().scale
    }

    fn create_rendering_context(
        &mut self,
        _widget: &dyn NativeWidget,
    ) -> Option<Box<dyn RenderingContext>> {
        if self.log.borrow().no_contexts {
            return None;
        }
        record(&self.log, Op::CreateContext);
        Some(Box::new(RecordingContext::new(self.log.clone())))
    }

    fn create_detached_context(&mut self) -> Option<Box<dyn RenderingContext>> {
        if self.log.borrow().no_contexts {
            return None;
        }
        record(&self.log, Op::CreateDetached);
        Some(Box::new(RecordingContext::new(self.log.clone())))
    }
}

// ---------------------------------------------------------------------------
// Widgets

#[derive(Debug)]
pub(crate) struct TestWidget {
    bounds: Rect,
    native: bool,
    tag: u32,
    log: Option<Log>,
}

impl TestWidget {
    /// An unlogged platform window.
    pub(crate) fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            native: true,
            tag: 0,
            log: None,
        }
    }

    /// An unlogged widget without native data.
    pub(crate) fn proxy(bounds: Rect) -> Self {
        Self {
            native: false,
            ..Self::new(bounds)
        }
    }

    /// A platform window that records its calls under `tag`.
    pub(crate) fn logged(log: &Log, tag: u32, bounds: Rect) -> Self {
        Self {
            tag,
            log: Some(log.clone()),
            ..Self::new(bounds)
        }
    }

    fn record(&self, op: Op) {
        if let Some(log) = &self.log {
            record(log, op);
        }
    }
}

impl NativeWidget for TestWidget {
    fn client_bounds(&self) -> Rect {
        self.bounds
    }

    fn invalidate_rect(&mut self, rect: Rect, _immediate: bool) {
        self.record(Op::Invalidate(self.tag, rect));
    }

    fn invalidate_region(&mut self, region: &Region, _immediate: bool) {
        self.record(Op::InvalidateRegion(self.tag, region.rects().to_vec()));
    }

    fn has_native_data(&self) -> bool {
        self.native
    }

    fn update(&mut self) {
        self.record(Op::WidgetUpdate(self.tag));
    }
}

// ---------------------------------------------------------------------------
// Timing

#[derive(Debug)]
pub(crate) struct TestTimer {
    log: Log,
}

impl FrameTimer for TestTimer {
    fn start(&mut self, interval: Duration) {
        record(&self.log, Op::TimerStart(interval));
    }

    fn cancel(&mut self) {
        record(&self.log, Op::TimerCancel);
    }
}

#[derive(Debug)]
pub(crate) struct ManualClock {
    log: Log,
}

impl Clock for ManualClock {
    fn now(&self) -> HostTime {
        self.log.borrow().now
    }
}

// ---------------------------------------------------------------------------
// Content

#[derive(Debug)]
pub(crate) struct TestDelegate {
    log: Log,
}

impl ViewDelegate for TestDelegate {
    fn paint(
        &mut self,
        view: ViewId,
        _cx: &mut dyn RenderingContext,
        dirty: Rect,
        mode: PaintMode,
    ) {
        record(&self.log, Op::Paint(view, dirty, mode));
    }

    fn handle_event(&mut self, view: ViewId, event: &ViewEvent) -> EventStatus {
        record(&self.log, Op::Event(view, event.point, event.ref_point));
        self.log.borrow().event_status
    }

    fn view_destroyed(&mut self, view: ViewId) {
        record(&self.log, Op::Destroyed(view));
    }
}

#[derive(Debug)]
pub(crate) struct TestObserver {
    pub(crate) log: Log,
}

impl ViewObserver for TestObserver {
    fn resize_reflow(&mut self, root: ViewId, width: f64, height: f64) {
        record(&self.log, Op::Reflow(root, width, height));
    }
}

#[derive(Debug)]
pub(crate) struct TestListener {
    pub(crate) log: Log,
    pub(crate) tag: u32,
    pub(crate) fail: bool,
}

impl TestListener {
    fn outcome(&self) -> Result<(), ListenerError> {
        if self.fail {
            Err(ListenerError(String::from("listener refused")))
        } else {
            Ok(())
        }
    }
}

impl CompositeListener for TestListener {
    fn will_refresh_region(
        &self,
        _view: ViewId,
        _cx: &mut dyn RenderingContext,
        _region: &Region,
        flags: RefreshFlags,
    ) -> Result<(), ListenerError> {
        record(&self.log, Op::Will(self.tag, flags));
        self.outcome()
    }

    fn did_refresh_region(
        &self,
        _view: ViewId,
        _cx: &mut dyn RenderingContext,
        _region: &Region,
        flags: RefreshFlags,
    ) -> Result<(), ListenerError> {
        record(&self.log, Op::Did(self.tag, flags));
        self.outcome()
    }

    fn will_refresh_rect(
        &self,
        _view: ViewId,
        _cx: &mut dyn RenderingContext,
        _rect: Rect,
        flags: RefreshFlags,
    ) -> Result<(), ListenerError> {
        record(&self.log, Op::Will(self.tag, flags));
        self.outcome()
    }

    fn did_refresh_rect(
        &self,
        _view: ViewId,
        _cx: &mut dyn RenderingContext,
        _rect: Rect,
        flags: RefreshFlags,
    ) -> Result<(), ListenerError> {
        record(&self.log, Op::Did(self.tag, flags));
        self.outcome()
    }
}

// ---------------------------------------------------------------------------
// Harness

/// Tag of the root window's widget.
pub(crate) const ROOT_WIDGET: u32 = 1;

pub(crate) const WINDOW: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

pub(crate) struct Harness {
    pub(crate) vm: ViewManager,
    pub(crate) log: Log,
}

impl Harness {
    /// A manager at 1 device pixel per app unit and 25 frames per second.
    pub(crate) fn new() -> Self {
        Self::with_scale(1.0, OffscreenCache::new())
    }

    pub(crate) fn with_scale(scale: f64, offscreen: OffscreenCache) -> Self {
        let log = new_log(scale);
        let backends = Backends {
            device: Box::new(TestDevice { log: log.clone() }),
            timer: Box::new(TestTimer { log: log.clone() }),
            clock: Box::new(ManualClock { log: log.clone() }),
            delegate: Box::new(TestDelegate { log: log.clone() }),
        };
        let vm = ViewManager::new(ManagerConfig::default(), backends, offscreen);
        Self { vm, log }
    }

    /// Installs an 800x600 root view owning a logged window.
    pub(crate) fn with_root(&mut self) -> ViewId {
        let widget = TestWidget::logged(&self.log, ROOT_WIDGET, WINDOW);
        let root = self
            .vm
            .create_view(ViewInit::new(WINDOW).with_widget(Box::new(widget)));
        self.vm.set_root_view(root);
        self.clear();
        root
    }

    /// Creates a view and appends it behind `parent`'s existing children.
    pub(crate) fn add(&mut self, parent: ViewId, init: ViewInit) -> ViewId {
        let id = self.vm.create_view(init);
        let last = self.vm.views().children(parent).last();
        let inserted = match last {
            Some(last) => self.vm.insert_child(parent, id, Some(last), false),
            None => self.vm.insert_child(parent, id, None, true),
        };
        inserted.unwrap_or_else(|e| panic!("insert failed: {e}"));
        id
    }

    pub(crate) fn ops(&self) -> Vec<Op> {
        self.log.borrow().ops.clone()
    }

    pub(crate) fn clear(&self) {
        self.log.borrow_mut().ops.clear();
    }

    pub(crate) fn advance_ms(&self, ms: u64) {
        let mut shared = self.log.borrow_mut();
        shared.now = shared.now + Duration::from_millis(ms);
    }

    pub(crate) fn set_fail_surfaces(&self, fail: bool) {
        self.log.borrow_mut().fail_surfaces = fail;
    }

    pub(crate) fn set_no_contexts(&self, none: bool) {
        self.log.borrow_mut().no_contexts = none;
    }

    /// Views painted so far, in paint order.
    pub(crate) fn painted(&self) -> Vec<ViewId> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Paint(view, ..) => Some(view),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn invalidations(&self) -> Vec<Rect> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Invalidate(_, rect) => Some(rect),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.ops().iter().filter(|op| pred(op)).count()
    }

    pub(crate) fn listener(&self, tag: u32, fail: bool) -> Rc<dyn CompositeListener> {
        Rc::new(TestListener {
            log: self.log.clone(),
            tag,
            fail,
        })
    }
}

impl core::fmt::Debug for Harness {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Harness").finish_non_exhaustive()
    }
}
