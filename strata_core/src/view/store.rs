// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays view storage with allocation, topology, and property access.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect, Size, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker};

use super::clip::ClipDescriptor;
use super::id::{INVALID, ViewId, Visibility};
use super::traverse::{Children, Descendants};
use crate::backend::NativeWidget;
use crate::dirty;
use crate::region::Region;

/// Initial attributes for a new view.
///
/// ```rust,ignore
/// let init = ViewInit::new(Rect::new(0.0, 0.0, 800.0, 600.0))
///     .with_z_index(1)
///     .with_opacity(0.5);
/// ```
pub struct ViewInit {
    /// Position in the parent's space (origin) and dimensions (size).
    pub bounds: Rect,
    /// Stacking order among siblings.
    pub z_index: i32,
    /// Initial visibility.
    pub visibility: Visibility,
    /// Opacity in `0.0..=1.0`.
    pub opacity: f32,
    /// Whether the content has transparent areas.
    pub transparent: bool,
    /// Whether the view paints outside the display list.
    pub floating: bool,
    /// Clip descriptor, making the view a clipping container.
    pub clip: Option<ClipDescriptor>,
    /// Native window owned by the view.
    pub widget: Option<Box<dyn NativeWidget>>,
}

impl ViewInit {
    /// Starts from an opaque, visible, non-clipping view at `bounds`.
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            z_index: 0,
            visibility: Visibility::Show,
            opacity: 1.0,
            transparent: false,
            floating: false,
            clip: None,
            widget: None,
        }
    }

    /// Sets the z-index.
    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Sets the visibility.
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Sets the opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Marks the content as transparent.
    #[must_use]
    pub fn with_transparency(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Marks the view as floating.
    #[must_use]
    pub fn with_floating(mut self, floating: bool) -> Self {
        self.floating = floating;
        self
    }

    /// Makes the view a clipping container.
    #[must_use]
    pub fn with_clip(mut self, clip: ClipDescriptor) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Attaches a native widget.
    #[must_use]
    pub fn with_widget(mut self, widget: Box<dyn NativeWidget>) -> Self {
        self.widget = Some(widget);
        self
    }
}

impl fmt::Debug for ViewInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewInit")
            .field("bounds", &self.bounds)
            .field("z_index", &self.z_index)
            .field("visibility", &self.visibility)
            .field("opacity", &self.opacity)
            .field("transparent", &self.transparent)
            .field("floating", &self.floating)
            .field("clip", &self.clip)
            .field("widget", &self.widget.is_some())
            .finish()
    }
}

/// Struct-of-arrays storage for all views.
///
/// Views are addressed by [`ViewId`] handles. Each view occupies a slot in
/// parallel arrays; destroyed views are recycled through a free list and
/// generation counters reject stale handles.
///
/// Child lists run front to back: the first child paints last.
///
/// The store is read-only outside the crate. All mutation goes through
/// [`ViewManager`](crate::ViewManager), which keeps invalidation and
/// transparency accounting in step with the tree.
pub struct ViewStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Geometry --
    pub(crate) position: Vec<Point>,
    pub(crate) size: Vec<Size>,
    pub(crate) z_index: Vec<i32>,

    // -- Appearance --
    pub(crate) visibility: Vec<Visibility>,
    pub(crate) opacity: Vec<f32>,
    pub(crate) transparent: Vec<bool>,
    pub(crate) floating: Vec<bool>,
    pub(crate) clip: Vec<Option<ClipDescriptor>>,

    // -- Native windows and their pending damage --
    pub(crate) widget: Vec<Option<Box<dyn NativeWidget>>>,
    pub(crate) dirty_region: Vec<Region>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ViewStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewStore")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("parent", &self.parent)
            .field("position", &self.position)
            .field("size", &self.size)
            .field("z_index", &self.z_index)
            .finish_non_exhaustive()
    }
}

impl ViewStore {
    /// Creates an empty view store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            position: Vec::new(),
            size: Vec::new(),
            z_index: Vec::new(),
            visibility: Vec::new(),
            opacity: Vec::new(),
            transparent: Vec::new(),
            floating: Vec::new(),
            clip: Vec::new(),
            widget: Vec::new(),
            dirty_region: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    // -- Allocation --

    /// Creates a detached view and returns its handle.
    pub(crate) fn create_view(&mut self, init: ViewInit) -> ViewId {
        let ViewInit {
            bounds,
            z_index,
            visibility,
            opacity,
            transparent,
            floating,
            clip,
            widget,
        } = init;

        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.position[i] = bounds.origin();
            self.size[i] = bounds.size();
            self.z_index[i] = z_index;
            self.visibility[i] = visibility;
            self.opacity[i] = opacity;
            self.transparent[i] = transparent;
            self.floating[i] = floating;
            self.clip[i] = clip;
            self.widget[i] = widget;
            self.dirty_region[i].clear();
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.position.push(bounds.origin());
            self.size.push(bounds.size());
            self.z_index.push(z_index);
            self.visibility.push(visibility);
            self.opacity.push(opacity);
            self.transparent.push(transparent);
            self.floating.push(floating);
            self.clip.push(clip);
            self.widget.push(widget);
            self.dirty_region.push(Region::new());
            self.generation.push(0);
            idx
        };

        self.id_at(idx)
    }

    /// Destroys a detached, childless view and frees its slot.
    ///
    /// Returns the widget the view owned, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the view still has children.
    pub(crate) fn destroy_view(&mut self, id: ViewId) -> Option<Box<dyn NativeWidget>> {
        self.validate(id);
        let i = id.idx as usize;
        assert!(
            self.first_child[i] == INVALID,
            "cannot destroy view with children"
        );
        if self.parent[i] != INVALID {
            self.unlink_idx(id.idx);
        }

        self.dirty.remove_key(id.idx);
        self.dirty_region[i].clear();
        self.generation[i] += 1;
        self.free_list.push(id.idx);
        self.widget[i].take()
    }

    /// Returns whether the given handle refers to a live view.
    #[must_use]
    pub fn is_alive(&self, id: ViewId) -> bool {
        id.idx < self.len && self.generation[id.idx as usize] == id.generation
    }

    /// Returns the number of live views.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology --

    /// Links `child` into `parent`'s child list directly after `prev`, or at
    /// the front when `prev` is `None`.
    ///
    /// # Panics
    ///
    /// Panics if a handle is stale, `child` already has a parent, or `prev`
    /// is not a child of `parent`.
    pub(crate) fn insert_after(&mut self, parent: ViewId, child: ViewId, prev: Option<ViewId>) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );

        let next = match prev {
            Some(prev) => {
                self.validate(prev);
                assert!(
                    self.parent[prev.idx as usize] == p,
                    "insertion point is not a child of the parent"
                );
                let next = self.next_sibling[prev.idx as usize];
                self.next_sibling[prev.idx as usize] = c;
                next
            }
            None => {
                let next = self.first_child[p as usize];
                self.first_child[p as usize] = c;
                next
            }
        };

        if next != INVALID {
            self.prev_sibling[next as usize] = c;
        }
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = prev.map_or(INVALID, |v| v.idx);
        self.next_sibling[c as usize] = next;
    }

    /// Removes `child` from its parent's child list.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the view has no parent.
    pub(crate) fn unlink(&mut self, child: ViewId) {
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] != INVALID,
            "view has no parent"
        );
        self.unlink_idx(child.idx);
    }

    /// Returns the parent of a view, if any.
    #[must_use]
    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.validate(id);
        self.link(self.parent[id.idx as usize])
    }

    /// Returns the front-most child of a view.
    #[must_use]
    pub fn first_child(&self, id: ViewId) -> Option<ViewId> {
        self.validate(id);
        self.link(self.first_child[id.idx as usize])
    }

    /// Returns the sibling painted directly beneath `id`.
    #[must_use]
    pub fn next_sibling(&self, id: ViewId) -> Option<ViewId> {
        self.validate(id);
        self.link(self.next_sibling[id.idx as usize])
    }

    /// Returns the sibling painted directly above `id`.
    #[must_use]
    pub fn prev_sibling(&self, id: ViewId) -> Option<ViewId> {
        self.validate(id);
        self.link(self.prev_sibling[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a view, front to back.
    #[must_use]
    pub fn children(&self, id: ViewId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns a pre-order iterator over `id` and its descendants.
    #[must_use]
    pub fn descendants(&self, id: ViewId) -> Descendants<'_> {
        self.validate(id);
        Descendants::new(self, id.idx)
    }

    /// Returns whether `ancestor` is `id` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: ViewId, id: ViewId) -> bool {
        self.validate(ancestor);
        self.validate(id);
        let mut cur = id.idx;
        while cur != INVALID {
            if cur == ancestor.idx {
                return true;
            }
            cur = self.parent[cur as usize];
        }
        false
    }

    // -- Property getters --

    /// Returns the view's position in its parent's space.
    #[must_use]
    pub fn position(&self, id: ViewId) -> Point {
        self.validate(id);
        self.position[id.idx as usize]
    }

    /// Returns the view's dimensions.
    #[must_use]
    pub fn size(&self, id: ViewId) -> Size {
        self.validate(id);
        self.size[id.idx as usize]
    }

    /// Returns the view's rectangle in its parent's space.
    #[must_use]
    pub fn bounds(&self, id: ViewId) -> Rect {
        self.validate(id);
        let i = id.idx as usize;
        Rect::from_origin_size(self.position[i], self.size[i])
    }

    /// Returns the view's rectangle in its own space (origin at zero).
    #[must_use]
    pub fn local_rect(&self, id: ViewId) -> Rect {
        self.validate(id);
        self.size[id.idx as usize].to_rect()
    }

    /// Returns the view's z-index.
    #[must_use]
    pub fn z_index(&self, id: ViewId) -> i32 {
        self.validate(id);
        self.z_index[id.idx as usize]
    }

    /// Returns the view's visibility.
    #[must_use]
    pub fn visibility(&self, id: ViewId) -> Visibility {
        self.validate(id);
        self.visibility[id.idx as usize]
    }

    /// Returns the view's opacity.
    #[must_use]
    pub fn opacity(&self, id: ViewId) -> f32 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Returns whether the view's content has transparent areas.
    #[must_use]
    pub fn is_transparent(&self, id: ViewId) -> bool {
        self.validate(id);
        self.transparent[id.idx as usize]
    }

    /// Returns whether the view is floating.
    #[must_use]
    pub fn is_floating(&self, id: ViewId) -> bool {
        self.validate(id);
        self.floating[id.idx as usize]
    }

    /// Returns the view's clip descriptor.
    #[must_use]
    pub fn clip(&self, id: ViewId) -> Option<ClipDescriptor> {
        self.validate(id);
        self.clip[id.idx as usize]
    }

    /// Returns whether the view owns a native widget.
    #[must_use]
    pub fn has_widget(&self, id: ViewId) -> bool {
        self.validate(id);
        self.widget[id.idx as usize].is_some()
    }

    /// Returns the view's native widget.
    #[must_use]
    pub fn widget(&self, id: ViewId) -> Option<&dyn NativeWidget> {
        self.validate(id);
        self.widget[id.idx as usize].as_deref()
    }

    /// Returns the damage accumulated for the view's widget while refresh
    /// was disabled, in device pixels.
    #[must_use]
    pub fn dirty_region(&self, id: ViewId) -> &Region {
        self.validate(id);
        &self.dirty_region[id.idx as usize]
    }

    /// Returns whether the view contributes to the transparency count.
    #[must_use]
    pub fn has_transparency(&self, id: ViewId) -> bool {
        self.validate(id);
        self.has_transparency_at(id.idx)
    }

    // -- Derived geometry --

    /// Returns the nearest view (starting with `id` itself) owning a widget.
    #[must_use]
    pub fn widget_view(&self, id: ViewId) -> Option<ViewId> {
        self.validate(id);
        let mut cur = id.idx;
        while cur != INVALID {
            if self.widget[cur as usize].is_some() {
                return Some(self.id_at(cur));
            }
            cur = self.parent[cur as usize];
        }
        None
    }

    /// Returns the offset from `ancestor`'s space to `id`'s space: the sum of
    /// positions of `id` and every view between it and `ancestor`.
    ///
    /// # Panics
    ///
    /// Panics if `ancestor` is not `id` or one of its ancestors.
    #[must_use]
    pub fn offset_to_ancestor(&self, id: ViewId, ancestor: ViewId) -> Vec2 {
        self.validate(id);
        self.validate(ancestor);
        let mut offset = Vec2::ZERO;
        let mut cur = id.idx;
        while cur != ancestor.idx {
            assert!(cur != INVALID, "view is not a descendant of the ancestor");
            offset += self.position[cur as usize].to_vec2();
            cur = self.parent[cur as usize];
        }
        offset
    }

    /// Returns the sum of positions of `id` and all of its ancestors.
    #[must_use]
    pub fn absolute_offset(&self, id: ViewId) -> Vec2 {
        self.validate(id);
        let mut offset = Vec2::ZERO;
        let mut cur = id.idx;
        while cur != INVALID {
            offset += self.position[cur as usize].to_vec2();
            cur = self.parent[cur as usize];
        }
        offset
    }

    // -- Mutation (manager only) --

    pub(crate) fn set_position(&mut self, id: ViewId, position: Point) {
        self.validate(id);
        self.position[id.idx as usize] = position;
    }

    pub(crate) fn set_size(&mut self, id: ViewId, size: Size) {
        self.validate(id);
        self.size[id.idx as usize] = size;
    }

    pub(crate) fn set_z_index(&mut self, id: ViewId, z_index: i32) {
        self.validate(id);
        self.z_index[id.idx as usize] = z_index;
    }

    pub(crate) fn set_visibility(&mut self, id: ViewId, visibility: Visibility) {
        self.validate(id);
        self.visibility[id.idx as usize] = visibility;
    }

    pub(crate) fn set_opacity(&mut self, id: ViewId, opacity: f32) {
        self.validate(id);
        self.opacity[id.idx as usize] = opacity;
    }

    pub(crate) fn set_transparent(&mut self, id: ViewId, transparent: bool) {
        self.validate(id);
        self.transparent[id.idx as usize] = transparent;
    }

    pub(crate) fn set_floating(&mut self, id: ViewId, floating: bool) {
        self.validate(id);
        self.floating[id.idx as usize] = floating;
    }

    pub(crate) fn set_clip(&mut self, id: ViewId, clip: Option<ClipDescriptor>) {
        self.validate(id);
        self.clip[id.idx as usize] = clip;
    }

    pub(crate) fn widget_mut(&mut self, id: ViewId) -> Option<&mut (dyn NativeWidget + 'static)> {
        self.validate(id);
        self.widget[id.idx as usize].as_deref_mut()
    }

    /// Unions a device-pixel rectangle into the dirty region of a
    /// widget-backed view and marks it pending.
    pub(crate) fn accumulate_damage(&mut self, widget_view: ViewId, rect: Rect) {
        self.validate(widget_view);
        self.dirty_region[widget_view.idx as usize].union_rect(rect);
        self.dirty.mark(widget_view.idx, dirty::PENDING_REGION);
    }

    /// Drains the views holding pending damage, in deterministic order.
    pub(crate) fn drain_pending_regions(&mut self) -> Vec<u32> {
        self.dirty
            .drain(dirty::PENDING_REGION)
            .deterministic()
            .run()
            .collect()
    }

    // -- Raw-index accessors --

    /// Returns the live handle for raw slot `idx`.
    pub(crate) fn id_at(&self, idx: u32) -> ViewId {
        ViewId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns whether the widget at raw slot `idx` is a real platform window.
    pub(crate) fn has_native_widget_at(&self, idx: u32) -> bool {
        self.widget[idx as usize]
            .as_ref()
            .is_some_and(|w| w.has_native_data())
    }

    pub(crate) fn has_transparency_at(&self, idx: u32) -> bool {
        let i = idx as usize;
        self.transparent[i] || self.opacity[i] != 1.0
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: ViewId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale ViewId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn link(&self, idx: u32) -> Option<ViewId> {
        (idx != INVALID).then(|| self.id_at(idx))
    }

    fn unlink_idx(&mut self, idx: u32) {
        let i = idx as usize;
        let p = self.parent[i];
        let prev = self.prev_sibling[i];
        let next = self.next_sibling[i];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.next_sibling[i] = INVALID;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn view(store: &mut ViewStore) -> ViewId {
        store.create_view(ViewInit::new(Rect::new(0.0, 0.0, 10.0, 10.0)))
    }

    #[test]
    fn create_and_destroy() {
        let mut store = ViewStore::new();
        let id = view(&mut store);
        assert!(store.is_alive(id));
        assert_eq!(store.live_count(), 1);
        store.destroy_view(id);
        assert!(!store.is_alive(id));
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = ViewStore::new();
        let id1 = view(&mut store);
        store.destroy_view(id1);
        let id2 = view(&mut store);
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);

        // A freed slot matches no handle until it is reused.
        store.destroy_view(id2);
        assert!(!store.is_alive(id1));
        assert!(!store.is_alive(id2));
        assert!(!store.is_alive(ViewId::from_raw(id2.idx + 1, 0)));
    }

    #[test]
    fn insert_after_orders_children() {
        let mut store = ViewStore::new();
        let parent = view(&mut store);
        let a = view(&mut store);
        let b = view(&mut store);
        let c = view(&mut store);

        store.insert_after(parent, a, None);
        store.insert_after(parent, c, Some(a));
        store.insert_after(parent, b, Some(a));

        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);
        assert_eq!(store.prev_sibling(c), Some(b));
        assert_eq!(store.next_sibling(a), Some(b));
        assert_eq!(store.first_child(parent), Some(a));
    }

    #[test]
    fn insert_at_front_shifts_siblings() {
        let mut store = ViewStore::new();
        let parent = view(&mut store);
        let a = view(&mut store);
        let b = view(&mut store);

        store.insert_after(parent, a, None);
        store.insert_after(parent, b, None);

        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![b, a]);
        assert_eq!(store.prev_sibling(a), Some(b));
    }

    #[test]
    fn unlink_repairs_links() {
        let mut store = ViewStore::new();
        let parent = view(&mut store);
        let a = view(&mut store);
        let b = view(&mut store);
        let c = view(&mut store);
        store.insert_after(parent, a, None);
        store.insert_after(parent, b, Some(a));
        store.insert_after(parent, c, Some(b));

        store.unlink(b);
        assert_eq!(store.parent(b), None);
        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![a, c]);

        store.unlink(a);
        assert_eq!(store.first_child(parent), Some(c));
        assert_eq!(store.prev_sibling(c), None);
    }

    #[test]
    fn descendants_visit_subtree_in_preorder() {
        let mut store = ViewStore::new();
        let root = view(&mut store);
        let a = view(&mut store);
        let a1 = view(&mut store);
        let b = view(&mut store);
        let outside = view(&mut store);
        store.insert_after(root, a, None);
        store.insert_after(root, b, Some(a));
        store.insert_after(a, a1, None);
        store.insert_after(b, outside, None);

        let all: Vec<_> = store.descendants(root).collect();
        assert_eq!(all, vec![root, a, a1, b, outside]);

        let sub: Vec<_> = store.descendants(a).collect();
        assert_eq!(sub, vec![a, a1]);
    }

    #[test]
    fn offsets_sum_positions() {
        let mut store = ViewStore::new();
        let root = store.create_view(ViewInit::new(Rect::new(5.0, 5.0, 105.0, 105.0)));
        let mid = store.create_view(ViewInit::new(Rect::new(10.0, 20.0, 60.0, 70.0)));
        let leaf = store.create_view(ViewInit::new(Rect::new(1.0, 2.0, 11.0, 12.0)));
        store.insert_after(root, mid, None);
        store.insert_after(mid, leaf, None);

        assert_eq!(store.offset_to_ancestor(leaf, root), Vec2::new(11.0, 22.0));
        assert_eq!(store.offset_to_ancestor(leaf, leaf), Vec2::ZERO);
        assert_eq!(store.absolute_offset(leaf), Vec2::new(16.0, 27.0));
        assert!(store.is_ancestor_or_self(root, leaf));
        assert!(!store.is_ancestor_or_self(leaf, root));
    }

    #[test]
    fn pending_regions_drain_once() {
        let mut store = ViewStore::new();
        let a = view(&mut store);
        let b = view(&mut store);
        store.accumulate_damage(b, Rect::new(0.0, 0.0, 4.0, 4.0));
        store.accumulate_damage(a, Rect::new(1.0, 1.0, 2.0, 2.0));
        store.accumulate_damage(b, Rect::new(2.0, 2.0, 6.0, 6.0));

        let mut pending = store.drain_pending_regions();
        pending.sort_unstable();
        assert_eq!(pending, vec![a.idx, b.idx]);
        assert!(store.drain_pending_regions().is_empty());
        assert!(!store.dirty_region(b).is_empty());
    }

    #[test]
    fn transparency_counts_opacity_and_flag() {
        let mut store = ViewStore::new();
        let opaque = view(&mut store);
        let faded = store.create_view(ViewInit::new(Rect::ZERO).with_opacity(0.5));
        let holey = store.create_view(ViewInit::new(Rect::ZERO).with_transparency(true));
        assert!(!store.has_transparency(opaque));
        assert!(store.has_transparency(faded));
        assert!(store.has_transparency(holey));
    }

    #[test]
    #[should_panic(expected = "cannot destroy view with children")]
    fn destroy_with_children_panics() {
        let mut store = ViewStore::new();
        let parent = view(&mut store);
        let child = view(&mut store);
        store.insert_after(parent, child, None);
        store.destroy_view(parent);
    }

    #[test]
    #[should_panic(expected = "child already has a parent")]
    fn double_insert_panics() {
        let mut store = ViewStore::new();
        let p1 = view(&mut store);
        let p2 = view(&mut store);
        let child = view(&mut store);
        store.insert_after(p1, child, None);
        store.insert_after(p2, child, None);
    }

    #[test]
    #[should_panic(expected = "stale ViewId")]
    fn destroyed_handle_panics_on_bounds() {
        let mut store = ViewStore::new();
        let id = view(&mut store);
        store.destroy_view(id);
        let _ = store.bounds(id);
    }

    #[test]
    #[should_panic(expected = "stale ViewId")]
    fn destroyed_handle_panics_on_parent() {
        let mut store = ViewStore::new();
        let id = view(&mut store);
        store.destroy_view(id);
        let _ = store.parent(id);
    }
}
