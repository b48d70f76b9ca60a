// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The view manager: tree mutation and invalidation policy.
//!
//! Every structural or visual change goes through [`ViewManager`] so that the
//! damage it causes is reported and the transparency count stays exact.
//! Mutation-driven invalidation always uses [`RefreshFlags::NO_SYNC`]: it
//! never composites on its own, leaving that to the frame timer.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect, Size, Vec2};

use crate::backend::{CompositeListener, DeviceContext, FrameTimer, ViewDelegate, ViewObserver};
use crate::display_list::DisplayList;
use crate::error::ViewError;
use crate::flags::RefreshFlags;
use crate::scheduler::{DEFAULT_FRAME_RATE, UpdateScheduler};
use crate::surface::OffscreenCache;
use crate::time::Clock;
use crate::trace::{TraceSink, Tracer};
use crate::units::UnitScale;
use crate::view::{ClipDescriptor, ViewId, ViewInit, ViewStore, Visibility};

/// Construction-time settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Frames per second of the composite timer. Zero disables timed
    /// compositing.
    pub frame_rate: u32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

/// The collaborators a manager cannot work without.
pub struct Backends {
    /// Unit conversion and rendering-context creation.
    pub device: Box<dyn DeviceContext>,
    /// The periodic composite timer.
    pub timer: Box<dyn FrameTimer>,
    /// Monotonic time for rate limiting.
    pub clock: Box<dyn Clock>,
    /// View content.
    pub delegate: Box<dyn ViewDelegate>,
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}

/// Owns a view tree and turns changes to it into repaints.
///
/// ```rust,ignore
/// let mut vm = ViewManager::new(ManagerConfig::default(), backends, OffscreenCache::new());
/// let root = vm.create_view(ViewInit::new(window).with_widget(widget));
/// vm.set_root_view(root);
/// let child = vm.create_view(ViewInit::new(Rect::new(10.0, 10.0, 110.0, 60.0)));
/// vm.insert_child_at_z(root, child, 0);
/// ```
pub struct ViewManager {
    pub(crate) store: ViewStore,
    pub(crate) root: Option<ViewId>,
    pub(crate) device: Box<dyn DeviceContext>,
    pub(crate) delegate: Box<dyn ViewDelegate>,
    pub(crate) observer: Option<Box<dyn ViewObserver>>,
    pub(crate) listeners: Vec<Rc<dyn CompositeListener>>,
    pub(crate) scheduler: UpdateScheduler,
    pub(crate) offscreen: Option<OffscreenCache>,
    pub(crate) display_list: DisplayList,
    pub(crate) transparent_count: u32,
    pub(crate) painting: bool,
    pub(crate) mouse_grabber: Option<ViewId>,
    pub(crate) key_grabber: Option<ViewId>,
    pub(crate) tracer: Tracer,
    detached: bool,
}

impl fmt::Debug for ViewManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewManager")
            .field("root", &self.root)
            .field("views", &self.store.live_count())
            .field("scheduler", &self.scheduler)
            .field("transparent_count", &self.transparent_count)
            .field("listeners", &self.listeners.len())
            .field("painting", &self.painting)
            .finish_non_exhaustive()
    }
}

impl ViewManager {
    /// Creates a manager with an empty tree and starts the composite timer.
    ///
    /// Pass clones of one `offscreen` cache to managers that should share a
    /// back buffer.
    #[must_use]
    pub fn new(config: ManagerConfig, backends: Backends, offscreen: OffscreenCache) -> Self {
        let Backends {
            device,
            timer,
            clock,
            delegate,
        } = backends;
        Self {
            store: ViewStore::new(),
            root: None,
            device,
            delegate,
            observer: None,
            listeners: Vec::new(),
            scheduler: UpdateScheduler::new(timer, clock, config.frame_rate),
            offscreen: Some(offscreen),
            display_list: DisplayList::new(),
            transparent_count: 0,
            painting: false,
            mouse_grabber: None,
            key_grabber: None,
            tracer: Tracer::none(),
            detached: false,
        }
    }

    /// Installs a trace sink, returning the previous one.
    ///
    /// Sinks are only called when the `trace` feature is enabled.
    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) -> Option<Box<dyn TraceSink>> {
        self.tracer.set_sink(sink)
    }

    /// Installs the layout observer notified of window resizes.
    pub fn set_view_observer(&mut self, observer: Option<Box<dyn ViewObserver>>) {
        self.observer = observer;
    }

    pub(crate) fn scale(&self) -> UnitScale {
        UnitScale::new(self.device.app_units_to_dev_units())
    }

    // -- Queries --

    /// Returns the view tree.
    #[must_use]
    pub fn views(&self) -> &ViewStore {
        &self.store
    }

    /// Returns the display list built by the most recent refresh.
    #[must_use]
    pub fn display_list(&self) -> &DisplayList {
        &self.display_list
    }

    /// Returns the root view.
    #[must_use]
    pub fn root_view(&self) -> Option<ViewId> {
        self.root
    }

    /// Returns the root view's size in app units.
    #[must_use]
    pub fn window_dimensions(&self) -> Option<Size> {
        self.root.map(|root| self.store.size(root))
    }

    /// Returns the number of attached views that are transparent or
    /// translucent. Refreshes are double buffered while it is nonzero.
    #[must_use]
    pub fn transparent_count(&self) -> u32 {
        self.transparent_count
    }

    /// Returns whether `view` is the root or one of its descendants.
    #[must_use]
    pub fn is_attached(&self, view: ViewId) -> bool {
        self.root
            .is_some_and(|root| self.store.is_ancestor_or_self(root, view))
    }

    /// Would report whether any part of `view` is visible on screen.
    ///
    /// # Errors
    ///
    /// Always returns [`ViewError::NotImplemented`].
    pub fn is_view_shown(&self, view: ViewId) -> Result<bool, ViewError> {
        self.store.validate(view);
        Err(ViewError::NotImplemented)
    }

    /// Would return `view`'s clip rectangle in root coordinates.
    ///
    /// # Errors
    ///
    /// Always returns [`ViewError::NotImplemented`].
    pub fn view_clip_absolute(&self, view: ViewId) -> Result<Rect, ViewError> {
        self.store.validate(view);
        Err(ViewError::NotImplemented)
    }

    // -- Tree construction --

    /// Creates a detached view.
    pub fn create_view(&mut self, init: ViewInit) -> ViewId {
        self.store.create_view(init)
    }

    /// Makes `view` the root of the tree.
    ///
    /// The transparency count is recomputed for the new tree.
    pub fn set_root_view(&mut self, view: ViewId) {
        self.store.validate(view);
        self.root = Some(view);
        self.transparent_count = self.subtree_transparency(view);
    }

    /// Sets the root view's size and tells the observer to lay out again.
    pub fn set_window_dimensions(&mut self, width: f64, height: f64) {
        let Some(root) = self.root else {
            return;
        };
        self.resize_view(root, width, height);
        if let Some(observer) = &mut self.observer {
            observer.resize_reflow(root, width, height);
        }
    }

    /// Inserts `child` into `parent` next to `sibling`: directly above it
    /// (painted over it) when `above`, otherwise directly below it.
    ///
    /// Without a sibling the child goes to the front when `above`, else to
    /// the back.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::NotAChild`] if `sibling` is not a child of
    /// `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `child` already has a parent.
    pub fn insert_child(
        &mut self,
        parent: ViewId,
        child: ViewId,
        sibling: Option<ViewId>,
        above: bool,
    ) -> Result<(), ViewError> {
        self.store.validate(parent);
        self.store.validate(child);
        let prev = match sibling {
            Some(sibling) => {
                if self.store.parent(sibling) != Some(parent) {
                    return Err(ViewError::NotAChild);
                }
                if above {
                    self.store.prev_sibling(sibling)
                } else {
                    Some(sibling)
                }
            }
            None if above => None,
            None => self.store.children(parent).last(),
        };
        self.store.insert_after(parent, child, prev);
        self.finish_insert(parent, child);
        Ok(())
    }

    /// Inserts `child` into `parent` ordered by z-index: in front of every
    /// sibling with a lower or equal z-index.
    ///
    /// # Panics
    ///
    /// Panics if `child` already has a parent.
    pub fn insert_child_at_z(&mut self, parent: ViewId, child: ViewId, z_index: i32) {
        self.store.validate(child);
        let prev = self
            .store
            .children(parent)
            .take_while(|&kid| self.store.z_index[kid.idx as usize] > z_index)
            .last();
        self.store.set_z_index(child, z_index);
        self.store.insert_after(parent, child, prev);
        self.finish_insert(parent, child);
    }

    fn finish_insert(&mut self, parent: ViewId, child: ViewId) {
        if self.is_attached(child) {
            self.transparent_count += self.subtree_transparency(child);
        }
        if self.store.floating[parent.idx as usize] {
            self.store.set_floating(child, true);
        }
        if self.store.visibility[child.idx as usize] != Visibility::Hide {
            self.update_view(child, RefreshFlags::NO_SYNC);
        }
    }

    /// Removes `child` from `parent`, invalidating the area it covered.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::NotAChild`] if `child` is not a child of
    /// `parent`.
    pub fn remove_child(&mut self, parent: ViewId, child: ViewId) -> Result<(), ViewError> {
        self.store.validate(parent);
        if self.store.parent(child) != Some(parent) {
            return Err(ViewError::NotAChild);
        }
        self.update_view(child, RefreshFlags::NO_SYNC);
        self.detach_subtree(child);
        Ok(())
    }

    /// Destroys `view` and all of its descendants, removing it from its
    /// parent first.
    ///
    /// The delegate is told about each destroyed view, children before
    /// parents. Destroying the root leaves the manager without one.
    pub fn destroy_view(&mut self, view: ViewId) {
        if let Some(parent) = self.store.parent(view) {
            self.update_view(view, RefreshFlags::NO_SYNC);
            self.detach_subtree(view);
            log::trace!("destroying {view:?} from {parent:?}");
        }
        if self.root == Some(view) {
            self.root = None;
            self.transparent_count = 0;
        }
        self.destroy_subtree(view);
    }

    fn destroy_subtree(&mut self, view: ViewId) {
        let mut doomed: Vec<ViewId> = self.store.descendants(view).collect();
        // Pre-order reversed puts every child before its parent.
        doomed.reverse();
        for id in doomed {
            if self.mouse_grabber == Some(id) {
                self.mouse_grabber = None;
            }
            if self.key_grabber == Some(id) {
                self.key_grabber = None;
            }
            self.store.destroy_view(id);
            self.delegate.view_destroyed(id);
        }
    }

    /// Unlinks `child` from its parent, keeping the transparency count.
    fn detach_subtree(&mut self, child: ViewId) {
        if self.is_attached(child) {
            self.transparent_count -= self.subtree_transparency(child);
        }
        self.store.unlink(child);
    }

    // -- Geometry --

    /// Moves `view` by a delta in its parent's space.
    pub fn move_view_by(&mut self, view: ViewId, delta: Vec2) {
        let position = self.store.position(view) + delta;
        self.move_view_to(view, position);
    }

    /// Moves `view` to `position` in its parent's space, invalidating the old
    /// and new areas. Moving the root invalidates nothing.
    pub fn move_view_to(&mut self, view: ViewId, position: Point) {
        let old = self.store.bounds(view);
        if old.origin() == position {
            return;
        }
        self.store.set_position(view, position);
        if self.store.visibility[view.idx as usize] == Visibility::Hide {
            return;
        }
        if let Some(parent) = self.store.parent(view) {
            let new = self.store.bounds(view);
            self.update_view_rect(parent, old, RefreshFlags::NO_SYNC);
            self.update_view_rect(parent, new, RefreshFlags::NO_SYNC);
        }
    }

    /// Resizes `view`, invalidating the union of its old and new extents.
    pub fn resize_view(&mut self, view: ViewId, width: f64, height: f64) {
        let old = self.store.size(view);
        let size = Size::new(width, height);
        if old == size {
            return;
        }
        self.store.set_size(view, size);
        let extent = Size::new(old.width.max(width), old.height.max(height));
        match self.store.parent(view) {
            Some(parent) => {
                let origin = self.store.position(view);
                self.update_view_rect(
                    parent,
                    Rect::from_origin_size(origin, extent),
                    RefreshFlags::NO_SYNC,
                );
            }
            None => self.update_view_rect(view, extent.to_rect(), RefreshFlags::NO_SYNC),
        }
    }

    /// Sets or clears `view`'s clip.
    ///
    /// Replacing one clip with another invalidates the union of the two clip
    /// rectangles. Adding or removing a clip invalidates the whole view.
    pub fn set_view_clip(&mut self, view: ViewId, clip: Option<ClipDescriptor>) {
        let old = self.store.clip(view);
        if old == clip {
            return;
        }
        self.store.set_clip(view, clip);
        match (old, clip) {
            (Some(old), Some(new)) => {
                self.update_view_rect(view, old.rect.union(new.rect), RefreshFlags::NO_SYNC);
            }
            _ => self.update_view(view, RefreshFlags::NO_SYNC),
        }
    }

    /// Shows or hides `view`.
    pub fn set_view_visibility(&mut self, view: ViewId, visibility: Visibility) {
        if self.store.visibility(view) == visibility {
            return;
        }
        self.store.set_visibility(view, visibility);
        match visibility {
            Visibility::Hide => {
                if let Some(parent) = self.store.parent(view) {
                    let bounds = self.store.bounds(view);
                    self.update_view_rect(parent, bounds, RefreshFlags::NO_SYNC);
                }
            }
            Visibility::Show => self.update_view(view, RefreshFlags::NO_SYNC),
        }
    }

    // -- Stacking --

    /// Changes `view`'s z-index, moving it to the matching position among
    /// its siblings.
    pub fn set_view_z_index(&mut self, view: ViewId, z_index: i32) {
        if self.store.z_index(view) == z_index {
            return;
        }
        match self.store.parent(view) {
            Some(parent) => {
                self.detach_subtree(view);
                self.insert_child_at_z(parent, view, z_index);
            }
            None => self.store.set_z_index(view, z_index),
        }
    }

    /// Restacks `view` directly above its sibling `other`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::NotAChild`] if the two views are not siblings.
    pub fn move_view_above(&mut self, view: ViewId, other: ViewId) -> Result<(), ViewError> {
        let parent = self.common_parent(view, other)?;
        if self.store.next_sibling(view) != Some(other) {
            self.detach_subtree(view);
            self.insert_child(parent, view, Some(other), true)?;
        }
        Ok(())
    }

    /// Restacks `view` directly below its sibling `other`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::NotAChild`] if the two views are not siblings.
    pub fn move_view_below(&mut self, view: ViewId, other: ViewId) -> Result<(), ViewError> {
        let parent = self.common_parent(view, other)?;
        if self.store.next_sibling(other) != Some(view) {
            self.detach_subtree(view);
            self.insert_child(parent, view, Some(other), false)?;
        }
        Ok(())
    }

    fn common_parent(&self, view: ViewId, other: ViewId) -> Result<ViewId, ViewError> {
        match self.store.parent(view) {
            Some(parent) if view != other && self.store.parent(other) == Some(parent) => Ok(parent),
            _ => Err(ViewError::NotAChild),
        }
    }

    // -- Appearance --

    /// Sets `view`'s opacity.
    pub fn set_view_opacity(&mut self, view: ViewId, opacity: f32) {
        if self.store.opacity(view) == opacity {
            return;
        }
        self.restyle(view, |store| store.set_opacity(view, opacity));
    }

    /// Declares whether `view`'s content has transparent areas.
    pub fn set_view_content_transparency(&mut self, view: ViewId, transparent: bool) {
        if self.store.is_transparent(view) == transparent {
            return;
        }
        self.restyle(view, |store| store.set_transparent(view, transparent));
    }

    /// Marks `view` as floating: refreshes targeting it paint it directly
    /// instead of through a display list.
    pub fn set_view_floating(&mut self, view: ViewId, floating: bool) {
        self.store.set_floating(view, floating);
    }

    fn restyle(&mut self, view: ViewId, apply: impl FnOnce(&mut ViewStore)) {
        let attached = self.is_attached(view);
        if attached && self.store.has_transparency(view) {
            self.transparent_count -= 1;
        }
        apply(&mut self.store);
        if attached && self.store.has_transparency(view) {
            self.transparent_count += 1;
        }
        self.update_view(view, RefreshFlags::NO_SYNC);
    }

    fn subtree_transparency(&self, view: ViewId) -> u32 {
        self.store
            .descendants(view)
            .fold(0, |n, id| n + u32::from(self.store.has_transparency_at(id.idx)))
    }

    // -- Teardown --

    /// Releases everything the manager holds: cancels the timer, destroys
    /// the view tree, drops the listeners and gives up the offscreen surface.
    ///
    /// Calling it again does nothing. Dropping a manager does not detach it.
    pub fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        self.scheduler.cancel();
        if let Some(root) = self.root.take() {
            self.destroy_subtree(root);
        }
        self.transparent_count = 0;
        self.listeners.clear();
        if let Some(offscreen) = self.offscreen.take() {
            offscreen.release(self.device.as_mut());
        }
        log::debug!("view manager detached");
    }

    /// Returns whether [`detach`](Self::detach) ran.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.detached
    }
}
