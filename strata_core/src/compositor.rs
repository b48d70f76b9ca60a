// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Refresh passes.
//!
//! A refresh paints the damaged part of one view. It builds a display list
//! for the damage, then replays it back to front into a rendering context,
//! optionally through the shared offscreen surface.

use alloc::boxed::Box;
use alloc::rc::Rc;

use kurbo::{Point, Rect, Vec2};

use crate::backend::{
    ClipCombine, CompositeListener, CopyBitsPolicy, PaintMode, RenderingContext, SurfaceId,
};
use crate::display_list::DisplayItemKind;
use crate::error::{ListenerError, ViewError};
use crate::flags::RefreshFlags;
use crate::manager::ViewManager;
use crate::region::Region;
use crate::trace::{
    CompositeEvent, DisplayListEvent, RefreshBeginEvent, RefreshEndEvent, RefreshKind,
};
use crate::view::ViewId;

impl ViewManager {
    /// Flushes pending updates: the root widget repaints what was
    /// invalidated, and the timer pauses until the next request.
    pub fn composite(&mut self) {
        let flushed = self.scheduler.update_count;
        if flushed == 0 {
            return;
        }
        if let Some(widget) = self.root.and_then(|root| self.store.widget_mut(root)) {
            widget.update();
        }
        self.scheduler.update_count = 0;
        self.scheduler.pause();
        log::debug!("composited {flushed} pending updates");
        let timestamp = self.scheduler.now();
        self.tracer.composite(&CompositeEvent { flushed, timestamp });
    }

    /// Registers a listener for refresh passes.
    pub fn add_composite_listener(&mut self, listener: Rc<dyn CompositeListener>) {
        self.listeners.push(listener);
    }

    /// Unregisters a listener previously passed to
    /// [`add_composite_listener`](Self::add_composite_listener).
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::ListenerNotFound`] if it is not registered.
    pub fn remove_composite_listener(
        &mut self,
        listener: &Rc<dyn CompositeListener>,
    ) -> Result<(), ViewError> {
        let pos = self
            .listeners
            .iter()
            .position(|l| Rc::ptr_eq(l, listener))
            .ok_or(ViewError::ListenerNotFound)?;
        self.listeners.remove(pos);
        Ok(())
    }

    /// Paints `rect` (in `view`'s space) of `view`.
    ///
    /// Without `cx`, a context is created for the nearest widget; if none
    /// can be created nothing is painted. Does nothing while refresh is
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::ReentrantRefresh`] if called while another
    /// refresh is painting.
    pub fn refresh_rect(
        &mut self,
        view: ViewId,
        cx: Option<&mut dyn RenderingContext>,
        rect: Rect,
        flags: RefreshFlags,
    ) -> Result<(), ViewError> {
        self.store.validate(view);
        if !self.scheduler.refresh_enabled {
            return Ok(());
        }
        self.begin_painting()?;
        let flags = self.effective_flags(flags);
        self.with_context(view, cx, |vm, cx| {
            vm.trace_refresh_begin(view, RefreshKind::Rect, flags);
            vm.notify_listeners(|l| l.will_refresh_rect(view, cx, rect, flags));

            let offscreen = vm.acquire_offscreen(view, cx, flags);
            cx.set_clip_rect(rect, ClipCombine::Replace);
            vm.render_views(view, cx, rect);
            vm.copy_offscreen(cx, offscreen);

            vm.finish_refresh(view, RefreshKind::Rect, offscreen.is_some());
            vm.notify_listeners(|l| l.did_refresh_rect(view, cx, rect, flags));
        });
        self.painting = false;
        Ok(())
    }

    /// Paints the part of `view` covered by `region` (device pixels), then
    /// removes the painted area from `region`.
    ///
    /// Without a region the whole view is painted.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::ReentrantRefresh`] if called while another
    /// refresh is painting.
    pub fn refresh_region(
        &mut self,
        view: ViewId,
        cx: Option<&mut dyn RenderingContext>,
        mut region: Option<&mut Region>,
        flags: RefreshFlags,
    ) -> Result<(), ViewError> {
        self.store.validate(view);
        if !self.scheduler.refresh_enabled {
            return Ok(());
        }
        self.begin_painting()?;
        let flags = self.effective_flags(flags);
        let empty = Region::new();
        self.with_context(view, cx, |vm, cx| {
            vm.trace_refresh_begin(view, RefreshKind::Region, flags);
            let damage = region.as_deref().unwrap_or(&empty);
            vm.notify_listeners(|l| l.will_refresh_region(view, cx, damage, flags));

            let offscreen = vm.acquire_offscreen(view, cx, flags);
            if let Some(damage) = region.as_deref() {
                cx.set_clip_region(damage, ClipCombine::Union);
            }
            let trect = vm.store.local_rect(view);
            cx.set_clip_rect(trect, ClipCombine::Intersect);
            vm.render_views(view, cx, trect);
            vm.copy_offscreen(cx, offscreen);

            if let Some(damage) = region.as_deref_mut() {
                if !damage.is_empty() {
                    damage.subtract_rect(vm.scale().to_dev_round_in(trect));
                }
            }

            vm.finish_refresh(view, RefreshKind::Region, offscreen.is_some());
            let damage = region.as_deref().unwrap_or(&empty);
            vm.notify_listeners(|l| l.did_refresh_region(view, cx, damage, flags));
        });
        self.painting = false;
        Ok(())
    }

    /// Paints `view` alone into a fresh context clipped to its bounds,
    /// without a display list.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::ReentrantRefresh`] if called while a refresh is
    /// painting.
    pub fn display(&mut self, view: ViewId) -> Result<(), ViewError> {
        self.store.validate(view);
        if !self.scheduler.refresh_enabled {
            return Ok(());
        }
        self.begin_painting()?;
        if let Some(mut cx) = self.device.create_detached_context() {
            let rect = self.store.local_rect(view);
            cx.set_clip_rect(rect, ClipCombine::Replace);
            self.delegate.paint(view, cx.as_mut(), rect, PaintMode::ClipSet);
        }
        self.painting = false;
        Ok(())
    }

    /// Creates a context drawing into `view`'s nearest widget, translated by
    /// the positions of the views between the two.
    pub(crate) fn create_rendering_context(
        &mut self,
        view: ViewId,
    ) -> Option<Box<dyn RenderingContext>> {
        let widget_view = self.store.widget_view(view)?;
        let offset = match self.store.parent(view) {
            Some(parent) if widget_view != view => {
                self.store.offset_to_ancestor(parent, widget_view)
            }
            _ => Vec2::ZERO,
        };
        let widget = self.store.widget[widget_view.idx as usize].as_deref()?;
        let mut cx = self.device.create_rendering_context(widget)?;
        cx.translate(offset);
        Some(cx)
    }

    /// Paints the display list for `rect` of `view` into `cx`.
    fn render_views(&mut self, view: ViewId, cx: &mut dyn RenderingContext, rect: Rect) {
        if self.store.floating[view.idx as usize] {
            self.delegate.paint(view, cx, rect, PaintMode::ClipSet);
            return;
        }

        let top = self.root.unwrap_or(view);
        self.display_list.build(&self.store, top, view, rect);
        self.tracer.display_list(&DisplayListEvent {
            target: view,
            damage: rect,
            len: self.display_list.len(),
            paints: self.display_list.paint_count(),
            clips: self.display_list.clip_count(),
            truncated: self.display_list.is_truncated(),
        });

        let mut depth = 0_usize;
        for item in self.display_list.paint_order() {
            match item.kind {
                DisplayItemKind::PushClip => {
                    cx.push_state();
                    cx.set_clip_rect(item.rect, ClipCombine::Intersect);
                    depth += 1;
                }
                DisplayItemKind::PopClip => {
                    // A truncated list can lose the push of its last clip.
                    if depth == 0 {
                        continue;
                    }
                    cx.pop_state();
                    depth -= 1;
                }
                DisplayItemKind::Paint => {
                    let origin = item.rect.origin().to_vec2();
                    cx.push_state();
                    cx.translate(origin);
                    let dirty = rect.intersect(item.rect) - origin;
                    self.delegate.paint(item.view, cx, dirty, PaintMode::JustPaint);
                    cx.pop_state();
                }
            }
        }
    }

    fn begin_painting(&mut self) -> Result<(), ViewError> {
        debug_assert!(!self.painting, "recursive painting not permitted");
        if self.painting {
            return Err(ViewError::ReentrantRefresh);
        }
        self.painting = true;
        Ok(())
    }

    fn effective_flags(&self, mut flags: RefreshFlags) -> RefreshFlags {
        if self.transparent_count > 0 {
            flags |= RefreshFlags::DOUBLE_BUFFER;
        }
        if cfg!(feature = "single-buffer") {
            flags.remove(RefreshFlags::DOUBLE_BUFFER);
        }
        flags
    }

    /// Runs `f` with the caller's context or one created for `view`.
    fn with_context(
        &mut self,
        view: ViewId,
        cx: Option<&mut dyn RenderingContext>,
        f: impl FnOnce(&mut Self, &mut dyn RenderingContext),
    ) {
        match cx {
            Some(cx) => f(self, cx),
            None => match self.create_rendering_context(view) {
                Some(mut owned) => f(self, owned.as_mut()),
                None => log::debug!("no rendering context for {view:?}, skipping refresh"),
            },
        }
    }

    /// Selects the offscreen surface when double buffering, returning it with
    /// the device-pixel area to copy back.
    fn acquire_offscreen(
        &self,
        view: ViewId,
        cx: &mut dyn RenderingContext,
        flags: RefreshFlags,
    ) -> Option<(SurfaceId, Rect)> {
        if !flags.contains(RefreshFlags::DOUBLE_BUFFER) {
            return None;
        }
        let widget_view = self.store.widget_view(view)?;
        let bounds = self.store.widget(widget_view)?.client_bounds();
        let area = bounds.size().to_rect();
        let surface = self.offscreen.as_ref()?.acquire(cx, area, self.scale())?;
        Some((surface, area))
    }

    fn copy_offscreen(&self, cx: &mut dyn RenderingContext, offscreen: Option<(SurfaceId, Rect)>) {
        if let Some((surface, area)) = offscreen {
            cx.copy_offscreen_bits(surface, Point::ZERO, area, CopyBitsPolicy::UseSourceClipRegion);
        }
    }

    fn finish_refresh(&mut self, view: ViewId, kind: RefreshKind, double_buffered: bool) {
        self.scheduler.stamp();
        self.painting = false;
        let timestamp = self.scheduler.now();
        self.tracer.refresh_end(&RefreshEndEvent {
            view,
            kind,
            double_buffered,
            timestamp,
        });
    }

    fn trace_refresh_begin(&mut self, view: ViewId, kind: RefreshKind, flags: RefreshFlags) {
        let timestamp = self.scheduler.now();
        self.tracer.refresh_begin(&RefreshBeginEvent {
            view,
            kind,
            flags,
            timestamp,
        });
    }

    /// Calls every listener in registration order, logging failures.
    fn notify_listeners(
        &self,
        mut call: impl FnMut(&dyn CompositeListener) -> Result<(), ListenerError>,
    ) {
        for listener in &self.listeners {
            if let Err(err) = call(listener.as_ref()) {
                log::warn!("{err}");
            }
        }
    }
}
