// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update scheduling.
//!
//! Update requests invalidate native widgets right away but composite
//! lazily. The first pending request after a flush starts the periodic frame
//! timer; each tick (or an overdue request) flushes everything pending with
//! a single widget update, after which the timer pauses until the next
//! request.
//!
//! While refresh is disabled, usually inside an update batch, requests are
//! folded into per-widget dirty regions instead and replayed when refresh is
//! re-enabled.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::mem;

use kurbo::Rect;

use crate::backend::FrameTimer;
use crate::flags::RefreshFlags;
use crate::manager::ViewManager;
use crate::region::is_empty_rect;
use crate::time::{Clock, Duration, HostTime};
use crate::trace::{BatchEvent, UpdateEvent, UpdateOutcome};
use crate::view::{ViewId, Visibility};

/// Frame rate used when none is configured.
pub const DEFAULT_FRAME_RATE: u32 = 25;

/// Timer and counters behind the update pipeline.
pub(crate) struct UpdateScheduler {
    timer: Box<dyn FrameTimer>,
    clock: Box<dyn Clock>,
    /// Rate the timer currently runs at; zero while paused.
    frame_rate: u32,
    /// Configured rate, restored when the timer restarts.
    true_frame_rate: u32,
    pub(crate) update_count: u32,
    pub(crate) batch_depth: u32,
    pub(crate) refresh_enabled: bool,
    last_refresh: HostTime,
}

impl core::fmt::Debug for UpdateScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UpdateScheduler")
            .field("frame_rate", &self.frame_rate)
            .field("true_frame_rate", &self.true_frame_rate)
            .field("update_count", &self.update_count)
            .field("batch_depth", &self.batch_depth)
            .field("refresh_enabled", &self.refresh_enabled)
            .field("last_refresh", &self.last_refresh)
            .finish_non_exhaustive()
    }
}

impl UpdateScheduler {
    pub(crate) fn new(timer: Box<dyn FrameTimer>, clock: Box<dyn Clock>, frame_rate: u32) -> Self {
        let last_refresh = clock.now();
        let mut scheduler = Self {
            timer,
            clock,
            frame_rate: 0,
            true_frame_rate: 0,
            update_count: 0,
            batch_depth: 0,
            refresh_enabled: true,
            last_refresh,
        };
        scheduler.set_frame_rate(frame_rate);
        scheduler
    }

    pub(crate) fn frame_rate(&self) -> u32 {
        self.true_frame_rate
    }

    pub(crate) fn set_frame_rate(&mut self, rate: u32) {
        if rate == self.frame_rate {
            self.true_frame_rate = rate;
            return;
        }
        if self.frame_rate > 0 {
            self.timer.cancel();
        }
        self.frame_rate = rate;
        self.true_frame_rate = rate;
        if rate > 0 {
            self.timer.start(Duration::from_millis(1000 / u64::from(rate)));
        }
    }

    /// Stops the timer, keeping the configured rate for [`restart`](Self::restart).
    pub(crate) fn pause(&mut self) {
        let rate = self.true_frame_rate;
        self.set_frame_rate(0);
        self.true_frame_rate = rate;
    }

    pub(crate) fn restart(&mut self) {
        self.set_frame_rate(self.true_frame_rate);
    }

    pub(crate) fn now(&self) -> HostTime {
        self.clock.now()
    }

    pub(crate) fn stamp(&mut self) {
        self.last_refresh = self.clock.now();
    }

    /// Returns whether more than one frame interval passed since the last
    /// refresh.
    pub(crate) fn is_overdue(&self) -> bool {
        if self.true_frame_rate == 0 {
            return false;
        }
        let elapsed = self.clock.now() - self.last_refresh;
        elapsed.as_millis() > 1000 / u64::from(self.true_frame_rate)
    }

    pub(crate) fn cancel(&mut self) {
        self.timer.cancel();
    }
}

impl ViewManager {
    /// Requests a repaint of `rect`, given in `view`'s space.
    ///
    /// Requests with no area are ignored. While refresh is disabled the
    /// damage is only recorded; otherwise the nearest widget is invalidated
    /// and compositing happens on the next timer tick, immediately with
    /// [`RefreshFlags::IMMEDIATE`], or right away when a frame is overdue
    /// unless [`RefreshFlags::NO_SYNC`] is given.
    pub fn update_view_rect(&mut self, view: ViewId, rect: Rect, flags: RefreshFlags) {
        self.store.validate(view);
        if is_empty_rect(rect) {
            return;
        }

        if !self.scheduler.refresh_enabled {
            if let Some((widget_view, dev)) = self.view_to_widget(view, rect) {
                self.store.accumulate_damage(widget_view, dev);
            }
            self.scheduler.update_count += 1;
            self.trace_update(view, rect, flags, UpdateOutcome::Accumulated);
            return;
        }

        if self.store.visibility[view.idx as usize] == Visibility::Hide {
            self.trace_update(view, rect, flags, UpdateOutcome::Ignored);
            return;
        }
        let Some((widget_view, dev)) = self.view_to_widget(view, rect) else {
            self.trace_update(view, rect, flags, UpdateOutcome::Ignored);
            return;
        };

        if self.scheduler.update_count == 0 {
            self.scheduler.restart();
        }
        self.scheduler.update_count += 1;
        if let Some(widget) = self.store.widget_mut(widget_view) {
            widget.invalidate_rect(dev, false);
        }

        let composite = flags.contains(RefreshFlags::IMMEDIATE)
            || (!flags.contains(RefreshFlags::NO_SYNC) && self.scheduler.is_overdue());
        if composite {
            self.composite();
            self.trace_update(view, rect, flags, UpdateOutcome::Composited);
        } else {
            self.trace_update(view, rect, flags, UpdateOutcome::Deferred);
        }
    }

    /// Requests a repaint of the whole of `view`.
    pub fn update_view(&mut self, view: ViewId, flags: RefreshFlags) {
        let rect = self.store.local_rect(view);
        self.update_view_rect(view, rect, flags);
    }

    /// Requests a repaint of every view in the tree.
    pub fn update_all_views(&mut self, flags: RefreshFlags) {
        let Some(root) = self.root else {
            return;
        };
        let views: Vec<ViewId> = self.store.descendants(root).collect();
        for view in views {
            self.update_view(view, flags);
        }
    }

    /// Suspends refresh until the matching [`end_update_batch`](Self::end_update_batch).
    ///
    /// Batches nest; only the outermost one toggles refresh.
    pub fn begin_update_batch(&mut self) {
        if self.scheduler.batch_depth == 0 {
            self.disable_refresh();
        }
        self.scheduler.batch_depth += 1;
        self.trace_batch(0);
    }

    /// Closes an update batch, re-enabling refresh when the outermost batch
    /// ends.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::BatchUnderflow`](crate::ViewError::BatchUnderflow)
    /// if no batch is open. The depth stays at zero.
    pub fn end_update_batch(&mut self) -> Result<(), crate::ViewError> {
        let Some(depth) = self.scheduler.batch_depth.checked_sub(1) else {
            log::warn!("end_update_batch without matching begin");
            return Err(crate::ViewError::BatchUnderflow);
        };
        self.scheduler.batch_depth = depth;
        let replayed = if depth == 0 { self.enable_refresh() } else { 0 };
        self.trace_batch(replayed);
        Ok(())
    }

    /// Stops compositing and starts accumulating damage. Ignored inside a
    /// batch.
    pub fn disable_refresh(&mut self) {
        if self.scheduler.batch_depth > 0 {
            return;
        }
        self.scheduler.refresh_enabled = false;
    }

    /// Resumes compositing, replaying accumulated damage. Ignored inside a
    /// batch.
    ///
    /// Returns the number of widgets whose damage was replayed.
    pub fn enable_refresh(&mut self) -> u32 {
        if self.scheduler.batch_depth > 0 {
            return 0;
        }
        self.scheduler.refresh_enabled = true;

        let mut replayed = 0;
        if self.scheduler.update_count > 0 {
            replayed = self.process_pending_updates();
            self.scheduler.restart();
        }
        if self.scheduler.is_overdue() {
            self.composite();
        }
        replayed
    }

    /// Changes the frame rate. Zero stops the timer; compositing then only
    /// happens on immediate requests.
    pub fn set_frame_rate(&mut self, rate: u32) {
        self.scheduler.set_frame_rate(rate);
    }

    /// Returns the configured frame rate.
    #[must_use]
    pub fn frame_rate(&self) -> u32 {
        self.scheduler.frame_rate()
    }

    /// Handles a tick of the frame timer.
    pub fn on_timer_tick(&mut self) {
        self.composite();
    }

    /// Returns the number of updates since the last composite.
    #[must_use]
    pub fn pending_updates(&self) -> u32 {
        self.scheduler.update_count
    }

    /// Returns the update batch nesting depth.
    #[must_use]
    pub fn batch_depth(&self) -> u32 {
        self.scheduler.batch_depth
    }

    /// Returns whether refresh is enabled.
    #[must_use]
    pub fn is_refresh_enabled(&self) -> bool {
        self.scheduler.refresh_enabled
    }

    /// Maps `rect` from `view`'s space to device pixels in the nearest
    /// widget's space, clipped to that widget view.
    fn view_to_widget(&self, view: ViewId, rect: Rect) -> Option<(ViewId, Rect)> {
        let widget_view = self.store.widget_view(view)?;
        let offset = self.store.offset_to_ancestor(view, widget_view);
        let clipped = (rect + offset).intersect(self.store.local_rect(widget_view));
        Some((widget_view, self.scale().to_dev_round_out(clipped)))
    }

    /// Hands every accumulated dirty region to its widget.
    fn process_pending_updates(&mut self) -> u32 {
        let mut replayed = 0;
        for idx in self.store.drain_pending_regions() {
            let i = idx as usize;
            let region = mem::take(&mut self.store.dirty_region[i]);
            if region.is_empty() {
                continue;
            }
            if let Some(widget) = self.store.widget[i].as_deref_mut() {
                widget.invalidate_region(&region, false);
                replayed += 1;
            }
        }
        log::debug!("replayed damage for {replayed} widgets");
        replayed
    }

    fn trace_update(&mut self, view: ViewId, rect: Rect, flags: RefreshFlags, outcome: UpdateOutcome) {
        let pending = self.scheduler.update_count;
        self.tracer.update(&UpdateEvent {
            view,
            rect,
            flags,
            outcome,
            pending,
        });
    }

    fn trace_batch(&mut self, replayed: u32) {
        let event = BatchEvent {
            depth: self.scheduler.batch_depth,
            refresh_enabled: self.scheduler.refresh_enabled,
            replayed,
        };
        self.tracer.batch(&event);
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec;

    use super::*;
    use crate::testing::{Harness, Op, ROOT_WIDGET, TestWidget};
    use crate::view::ViewInit;

    const FRAME: Duration = Duration(40_000_000);

    #[test]
    fn timer_starts_at_default_rate() {
        let h = Harness::new();
        assert_eq!(h.vm.frame_rate(), DEFAULT_FRAME_RATE);
        assert_eq!(h.ops(), [Op::TimerStart(FRAME)]);
    }

    #[test]
    fn zero_area_update_is_a_no_op() {
        let mut h = Harness::new();
        let root = h.with_root();
        h.vm
            .update_view_rect(root, Rect::new(10.0, 10.0, 10.0, 50.0), RefreshFlags::empty());
        h.vm.begin_update_batch();
        h.vm
            .update_view_rect(root, Rect::new(10.0, 10.0, 50.0, 10.0), RefreshFlags::empty());
        assert_eq!(h.vm.pending_updates(), 0);
        assert!(h.ops().is_empty());
    }

    #[test]
    fn deferred_update_composites_on_tick() {
        let mut h = Harness::new();
        let root = h.with_root();

        h.vm
            .update_view_rect(root, Rect::new(0.0, 0.0, 10.0, 10.0), RefreshFlags::empty());
        h.vm
            .update_view_rect(root, Rect::new(20.0, 0.0, 30.0, 10.0), RefreshFlags::empty());
        assert_eq!(h.vm.pending_updates(), 2);
        assert_eq!(h.count(|op| matches!(op, Op::WidgetUpdate(_))), 0);

        h.vm.on_timer_tick();
        assert_eq!(h.vm.pending_updates(), 0);
        assert_eq!(
            h.ops(),
            [
                Op::Invalidate(ROOT_WIDGET, Rect::new(0.0, 0.0, 10.0, 10.0)),
                Op::Invalidate(ROOT_WIDGET, Rect::new(20.0, 0.0, 30.0, 10.0)),
                Op::WidgetUpdate(ROOT_WIDGET),
                Op::TimerCancel,
            ]
        );

        // Composite is idempotent with nothing pending.
        h.clear();
        h.vm.composite();
        h.vm.on_timer_tick();
        assert!(h.ops().is_empty());
    }

    #[test]
    fn first_update_after_flush_restarts_timer() {
        let mut h = Harness::new();
        let root = h.with_root();
        h.vm
            .update_view_rect(root, Rect::new(0.0, 0.0, 10.0, 10.0), RefreshFlags::IMMEDIATE);
        h.clear();

        h.vm
            .update_view_rect(root, Rect::new(0.0, 0.0, 10.0, 10.0), RefreshFlags::empty());
        h.vm
            .update_view_rect(root, Rect::new(0.0, 0.0, 20.0, 20.0), RefreshFlags::empty());
        assert_eq!(h.count(|op| *op == Op::TimerStart(FRAME)), 1);
    }

    #[test]
    fn immediate_update_composites_now() {
        let mut h = Harness::new();
        let root = h.with_root();
        h.vm
            .update_view_rect(root, Rect::new(0.0, 0.0, 10.0, 10.0), RefreshFlags::IMMEDIATE);
        assert_eq!(h.vm.pending_updates(), 0);
        assert!(h.ops().contains(&Op::WidgetUpdate(ROOT_WIDGET)));
    }

    #[test]
    fn overdue_update_composites_unless_no_sync() {
        let mut h = Harness::new();
        let root = h.with_root();
        h.advance_ms(41);

        h.vm
            .update_view_rect(root, Rect::new(0.0, 0.0, 10.0, 10.0), RefreshFlags::NO_SYNC);
        assert_eq!(h.vm.pending_updates(), 1);

        h.vm
            .update_view_rect(root, Rect::new(0.0, 0.0, 10.0, 10.0), RefreshFlags::empty());
        assert_eq!(h.vm.pending_updates(), 0);
        assert_eq!(h.count(|op| matches!(op, Op::WidgetUpdate(_))), 1);
    }

    #[test]
    fn exactly_one_interval_is_not_overdue() {
        let mut h = Harness::new();
        let root = h.with_root();
        h.advance_ms(40);
        h.vm
            .update_view_rect(root, Rect::new(0.0, 0.0, 10.0, 10.0), RefreshFlags::empty());
        assert_eq!(h.vm.pending_updates(), 1);
    }

    #[test]
    fn zero_frame_rate_never_auto_composites() {
        let mut h = Harness::new();
        let root = h.with_root();
        h.vm.set_frame_rate(0);
        assert_eq!(h.ops(), [Op::TimerCancel]);
        h.advance_ms(10_000);
        h.vm
            .update_view_rect(root, Rect::new(0.0, 0.0, 10.0, 10.0), RefreshFlags::empty());
        assert_eq!(h.vm.pending_updates(), 1);
        assert_eq!(h.count(|op| matches!(op, Op::TimerStart(_))), 0);
    }

    #[test]
    fn frame_rate_change_restarts_timer() {
        let mut h = Harness::new();
        h.clear();
        h.vm.set_frame_rate(50);
        assert_eq!(
            h.ops(),
            [Op::TimerCancel, Op::TimerStart(Duration::from_millis(20))]
        );
        h.clear();
        h.vm.set_frame_rate(50);
        assert!(h.ops().is_empty());
    }

    #[test]
    fn hidden_and_orphan_views_are_ignored() {
        let mut h = Harness::new();
        let root = h.with_root();
        let hidden = h.add(
            root,
            ViewInit::new(Rect::new(0.0, 0.0, 10.0, 10.0)).with_visibility(Visibility::Hide),
        );
        let orphan = h.vm.create_view(ViewInit::new(Rect::new(0.0, 0.0, 10.0, 10.0)));
        h.clear();

        h.vm.update_view(hidden, RefreshFlags::empty());
        h.vm.update_view(orphan, RefreshFlags::empty());
        assert_eq!(h.vm.pending_updates(), 0);
        assert!(h.ops().is_empty());
    }

    #[test]
    fn damage_maps_to_widget_pixels() {
        let mut h = Harness::with_scale(0.5, crate::surface::OffscreenCache::new());
        let root = h.with_root();
        let panel = h.add(root, ViewInit::new(Rect::new(100.0, 100.0, 300.0, 300.0)));
        let leaf = h.add(panel, ViewInit::new(Rect::new(10.0, 10.0, 30.0, 30.0)));
        h.clear();

        h.vm.update_view_rect(leaf, Rect::new(1.0, 1.0, 4.0, 4.0), RefreshFlags::empty());
        // (111, 111, 114, 114) at half scale, rounded out.
        assert_eq!(h.invalidations(), [Rect::new(55.0, 55.0, 57.0, 57.0)]);

        // Damage past the widget view's edge is clipped.
        h.clear();
        h.vm
            .update_view_rect(root, Rect::new(700.0, 500.0, 900.0, 700.0), RefreshFlags::empty());
        assert_eq!(h.invalidations(), [Rect::new(350.0, 250.0, 400.0, 300.0)]);
    }

    #[test]
    fn batch_accumulates_and_replays() {
        let mut h = Harness::new();
        let root = h.with_root();
        let bounds = Rect::new(0.0, 0.0, 200.0, 200.0);
        let popup = h.vm.create_view(
            ViewInit::new(Rect::new(300.0, 300.0, 500.0, 500.0))
                .with_widget(Box::new(TestWidget::logged(&h.log, 7, bounds))),
        );
        h.vm.insert_child(root, popup, None, true).unwrap();
        h.vm.composite();
        h.clear();

        h.vm.begin_update_batch();
        h.vm.begin_update_batch();
        assert!(!h.vm.is_refresh_enabled());
        h.vm.update_view_rect(root, Rect::new(0.0, 0.0, 10.0, 10.0), RefreshFlags::IMMEDIATE);
        h.vm.update_view_rect(root, Rect::new(5.0, 5.0, 8.0, 8.0), RefreshFlags::empty());
        h.vm.update_view_rect(popup, Rect::new(0.0, 0.0, 20.0, 20.0), RefreshFlags::empty());
        assert_eq!(h.vm.pending_updates(), 3);
        assert!(h.ops().is_empty());

        h.vm.end_update_batch().unwrap();
        assert!(!h.vm.is_refresh_enabled());
        assert!(h.ops().is_empty());

        h.vm.end_update_batch().unwrap();
        assert!(h.vm.is_refresh_enabled());
        assert_eq!(h.vm.batch_depth(), 0);
        let mut replays: Vec<_> = h
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::InvalidateRegion(tag, rects) => Some((tag, rects)),
                _ => None,
            })
            .collect();
        replays.sort_by_key(|(tag, _)| *tag);
        assert_eq!(
            replays,
            [
                (ROOT_WIDGET, vec![Rect::new(0.0, 0.0, 10.0, 10.0)]),
                (7, vec![Rect::new(0.0, 0.0, 20.0, 20.0)]),
            ]
        );
        assert!(h.vm.views().dirty_region(root).is_empty());
        assert!(h.vm.views().dirty_region(popup).is_empty());
    }

    #[test]
    fn batch_underflow_is_reported_and_clamped() {
        let mut h = Harness::new();
        assert_eq!(h.vm.end_update_batch(), Err(crate::ViewError::BatchUnderflow));
        assert_eq!(h.vm.batch_depth(), 0);
        assert!(h.vm.is_refresh_enabled());

        h.vm.begin_update_batch();
        h.vm.end_update_batch().unwrap();
        assert_eq!(h.vm.end_update_batch(), Err(crate::ViewError::BatchUnderflow));
    }

    #[test]
    fn refresh_toggles_are_ignored_inside_batches() {
        let mut h = Harness::new();
        h.vm.begin_update_batch();
        h.vm.enable_refresh();
        assert!(!h.vm.is_refresh_enabled());
        h.vm.end_update_batch().unwrap();

        h.vm.disable_refresh();
        assert!(!h.vm.is_refresh_enabled());
        h.vm.enable_refresh();
        assert!(h.vm.is_refresh_enabled());
    }

    #[test]
    fn overdue_batch_end_composites() {
        let mut h = Harness::new();
        let root = h.with_root();
        h.vm.begin_update_batch();
        h.vm.update_view(root, RefreshFlags::empty());
        h.advance_ms(100);
        h.vm.end_update_batch().unwrap();
        assert_eq!(h.vm.pending_updates(), 0);
        assert!(h.ops().contains(&Op::WidgetUpdate(ROOT_WIDGET)));
    }

    #[test]
    fn update_all_views_touches_every_view() {
        let mut h = Harness::new();
        let root = h.with_root();
        let a = h.add(root, ViewInit::new(Rect::new(0.0, 0.0, 10.0, 10.0)));
        h.add(a, ViewInit::new(Rect::new(1.0, 1.0, 2.0, 2.0)));
        h.vm.composite();
        h.clear();
        h.vm.update_all_views(RefreshFlags::NO_SYNC);
        assert_eq!(h.vm.pending_updates(), 3);
    }
}
