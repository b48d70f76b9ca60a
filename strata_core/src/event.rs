// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform event routing.
//!
//! Window events arrive in device pixels. Resize, paint and destroy events
//! are handled by the manager itself; input events are routed to a grabbing
//! view, the view they originated in, or the root, with their point mapped
//! into the receiving view's app-unit space.

use kurbo::{Point, Rect, Vec2};

use crate::backend::RenderingContext;
use crate::flags::RefreshFlags;
use crate::manager::ViewManager;
use crate::units::UnitScale;
use crate::view::ViewId;

/// Broad class of an input event, used to pick a grabber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputClass {
    /// Pointer events, delivered to the mouse grabber when one is set.
    Mouse,
    /// Keyboard events, delivered to the key grabber when one is set.
    Key,
    /// Anything else.
    Other,
}

/// What happened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EventKind {
    /// The window was resized to the given device-pixel dimensions.
    Resize {
        /// New width in device pixels.
        width: f64,
        /// New height in device pixels.
        height: f64,
    },
    /// Part of the window needs repainting.
    Paint {
        /// Damaged area in device pixels, relative to the event's view.
        rect: Rect,
    },
    /// The window is going away.
    Destroy,
    /// Input to be routed to view content.
    Input(InputClass),
}

/// An event delivered to the view manager.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewEvent {
    /// What happened.
    pub kind: EventKind,
    /// The view whose window produced the event.
    pub view: Option<ViewId>,
    /// Event location. Device pixels on arrival; app units in the receiving
    /// view's space once routed.
    pub point: Point,
    /// The original device-pixel location, preserved during routing.
    pub ref_point: Point,
}

impl ViewEvent {
    /// Creates an event at a device-pixel `point`.
    #[must_use]
    pub const fn new(kind: EventKind, view: Option<ViewId>, point: Point) -> Self {
        Self {
            kind,
            view,
            point,
            ref_point: point,
        }
    }
}

/// Result of event dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EventStatus {
    /// Nobody handled the event.
    #[default]
    Ignore,
    /// Handled; the platform should not run its default action.
    ConsumeNoDefault,
    /// Handled; the platform may still run its default action.
    ConsumeDoDefault,
}

impl ViewManager {
    /// Dispatches a window event.
    ///
    /// `cx` is the platform's rendering context for paint events, if it has
    /// one; otherwise a context is created for the painted view.
    pub fn dispatch_event(
        &mut self,
        event: &ViewEvent,
        cx: Option<&mut dyn RenderingContext>,
    ) -> EventStatus {
        let scale = self.scale();
        match event.kind {
            EventKind::Resize { width, height } => {
                if event.view.is_none() || event.view != self.root {
                    return EventStatus::Ignore;
                }
                let width = scale.length_to_app(width);
                let height = scale.length_to_app(height);
                self.set_window_dimensions(width, height);
                EventStatus::ConsumeNoDefault
            }
            EventKind::Paint { rect } => {
                if let Some(view) = event.view {
                    let damage = scale.to_app_round_out(rect);
                    if self.store.local_rect(view).area() > 0.0 {
                        if let Err(err) =
                            self.refresh_rect(view, cx, damage, RefreshFlags::DOUBLE_BUFFER)
                        {
                            log::warn!("paint event for {view:?} failed: {err}");
                        }
                    }
                }
                EventStatus::ConsumeNoDefault
            }
            EventKind::Destroy => EventStatus::ConsumeNoDefault,
            EventKind::Input(class) => self.route_input(event, class, scale),
        }
    }

    fn route_input(&mut self, event: &ViewEvent, class: InputClass, scale: UnitScale) -> EventStatus {
        let grabber = match class {
            InputClass::Mouse => self.mouse_grabber,
            InputClass::Key => self.key_grabber,
            InputClass::Other => None,
        };
        let Some(target) = grabber.or(event.view).or(self.root) else {
            return EventStatus::Ignore;
        };

        let offset = match event.view {
            Some(base) if base != target => {
                self.store.absolute_offset(base) - self.store.absolute_offset(target)
            }
            _ => Vec2::ZERO,
        };
        let routed = ViewEvent {
            point: scale.point_to_app(event.point) + offset,
            ref_point: event.point,
            ..*event
        };
        log::trace!("routing {class:?} event to {target:?} at {:?}", routed.point);
        self.delegate.handle_event(target, &routed)
    }

    /// Sends all mouse events to `view`, or releases the grab with `None`.
    pub fn grab_mouse_events(&mut self, view: Option<ViewId>) {
        if let Some(view) = view {
            self.store.validate(view);
        }
        self.mouse_grabber = view;
    }

    /// Sends all key events to `view`, or releases the grab with `None`.
    pub fn grab_key_events(&mut self, view: Option<ViewId>) {
        if let Some(view) = view {
            self.store.validate(view);
        }
        self.key_grabber = view;
    }

    /// Returns the view grabbing mouse events.
    #[must_use]
    pub fn mouse_grabber(&self) -> Option<ViewId> {
        self.mouse_grabber
    }

    /// Returns the view grabbing key events.
    #[must_use]
    pub fn key_grabber(&self) -> Option<ViewId> {
        self.key_grabber
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PaintMode;
    use crate::surface::OffscreenCache;
    use crate::testing::{Harness, Op, TestObserver};
    use crate::view::ViewInit;
    use alloc::boxed::Box;
    use alloc::vec::Vec;

    fn input(class: InputClass, view: Option<ViewId>, point: Point) -> ViewEvent {
        ViewEvent::new(EventKind::Input(class), view, point)
    }

    #[test]
    fn input_goes_to_originating_view() {
        let mut h = Harness::new();
        let root = h.with_root();
        let child = h.add(root, ViewInit::new(Rect::new(10.0, 10.0, 60.0, 60.0)));
        h.clear();

        let status = h
            .vm
            .dispatch_event(&input(InputClass::Mouse, Some(child), Point::new(3.0, 4.0)), None);
        assert_eq!(status, EventStatus::ConsumeDoDefault);
        assert_eq!(
            h.ops(),
            [Op::Event(child, Point::new(3.0, 4.0), Point::new(3.0, 4.0))]
        );
    }

    #[test]
    fn grabber_receives_point_in_its_space() {
        let mut h = Harness::new();
        let root = h.with_root();
        let a = h.add(root, ViewInit::new(Rect::new(100.0, 100.0, 200.0, 200.0)));
        let b = h.add(root, ViewInit::new(Rect::new(10.0, 20.0, 50.0, 50.0)));
        h.vm.grab_mouse_events(Some(b));
        assert_eq!(h.vm.mouse_grabber(), Some(b));
        h.clear();

        h.vm
            .dispatch_event(&input(InputClass::Mouse, Some(a), Point::new(5.0, 5.0)), None);
        // (5, 5) in `a` is (105, 105) in the root, which is (95, 85) in `b`.
        assert_eq!(
            h.ops(),
            [Op::Event(b, Point::new(95.0, 85.0), Point::new(5.0, 5.0))]
        );

        // The mouse grab does not capture keys.
        h.clear();
        h.vm
            .dispatch_event(&input(InputClass::Key, Some(a), Point::ZERO), None);
        assert_eq!(h.ops(), [Op::Event(a, Point::ZERO, Point::ZERO)]);
    }

    #[test]
    fn key_grab_and_release() {
        let mut h = Harness::new();
        let root = h.with_root();
        let field = h.add(root, ViewInit::new(Rect::new(0.0, 0.0, 10.0, 10.0)));
        h.vm.grab_key_events(Some(field));
        h.vm.dispatch_event(&input(InputClass::Key, None, Point::ZERO), None);
        h.vm.grab_key_events(None);
        h.vm.dispatch_event(&input(InputClass::Key, None, Point::ZERO), None);
        let targets: Vec<_> = h
            .ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Event(view, ..) => Some(view),
                _ => None,
            })
            .collect();
        assert_eq!(targets, [field, root]);
    }

    #[test]
    fn input_point_is_scaled_to_app_units() {
        let mut h = Harness::with_scale(0.5, OffscreenCache::new());
        let root = h.with_root();
        h.vm
            .dispatch_event(&input(InputClass::Other, Some(root), Point::new(3.0, 8.0)), None);
        assert_eq!(
            h.ops(),
            [Op::Event(root, Point::new(6.0, 16.0), Point::new(3.0, 8.0))]
        );
    }

    #[test]
    fn input_without_any_view_is_ignored() {
        let mut h = Harness::new();
        h.clear();
        let status = h
            .vm
            .dispatch_event(&input(InputClass::Mouse, None, Point::ZERO), None);
        assert_eq!(status, EventStatus::Ignore);
        assert!(h.ops().is_empty());
    }

    #[test]
    fn resize_of_root_reflows() {
        let mut h = Harness::with_scale(2.0, OffscreenCache::new());
        let root = h.with_root();
        h.vm.set_view_observer(Some(Box::new(TestObserver { log: h.log.clone() })));

        let resize = ViewEvent::new(
            EventKind::Resize {
                width: 1024.0,
                height: 768.0,
            },
            Some(root),
            Point::ZERO,
        );
        assert_eq!(h.vm.dispatch_event(&resize, None), EventStatus::ConsumeNoDefault);
        assert_eq!(
            h.vm.window_dimensions(),
            Some(kurbo::Size::new(512.0, 384.0))
        );
        assert!(h.ops().contains(&Op::Reflow(root, 512.0, 384.0)));
    }

    #[test]
    fn resize_of_other_views_is_ignored() {
        let mut h = Harness::new();
        let root = h.with_root();
        let child = h.add(root, ViewInit::new(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let resize = ViewEvent::new(
            EventKind::Resize {
                width: 5.0,
                height: 5.0,
            },
            Some(child),
            Point::ZERO,
        );
        assert_eq!(h.vm.dispatch_event(&resize, None), EventStatus::Ignore);
        assert_eq!(h.vm.window_dimensions(), Some(kurbo::Size::new(800.0, 600.0)));
        assert!(h.ops().iter().all(|op| !matches!(op, Op::Reflow(..))));
    }

    #[test]
    fn paint_event_refreshes_damage() {
        let mut h = Harness::new();
        let root = h.with_root();
        let paint = ViewEvent::new(
            EventKind::Paint {
                rect: Rect::new(0.0, 0.0, 100.0, 50.0),
            },
            Some(root),
            Point::ZERO,
        );
        assert_eq!(h.vm.dispatch_event(&paint, None), EventStatus::ConsumeNoDefault);
        assert!(
            h.ops()
                .contains(&Op::Paint(root, Rect::new(0.0, 0.0, 100.0, 50.0), PaintMode::JustPaint))
        );
    }

    #[test]
    fn paint_event_for_empty_view_does_nothing() {
        let mut h = Harness::new();
        let root = h.with_root();
        let empty = h.add(root, ViewInit::new(Rect::new(5.0, 5.0, 5.0, 5.0)));
        let paint = ViewEvent::new(
            EventKind::Paint {
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            },
            Some(empty),
            Point::ZERO,
        );
        h.clear();
        assert_eq!(h.vm.dispatch_event(&paint, None), EventStatus::ConsumeNoDefault);
        assert!(h.painted().is_empty());
    }

    #[test]
    fn destroy_is_consumed() {
        let mut h = Harness::new();
        let root = h.with_root();
        let destroy = ViewEvent::new(EventKind::Destroy, Some(root), Point::ZERO);
        assert_eq!(h.vm.dispatch_event(&destroy, None), EventStatus::ConsumeNoDefault);
        assert!(h.ops().is_empty());
    }
}
