// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display list construction.
//!
//! A [`DisplayList`] is the linear paint order for one damage rectangle. It
//! is collected front to back by walking the view tree and consumed back to
//! front by iterating it in reverse:
//!
//! - [`DisplayItemKind::Paint`] paints one view.
//! - [`DisplayItemKind::PopClip`] is emitted *before* a clipping view's
//!   children and [`DisplayItemKind::PushClip`] *after* them, so the reverse
//!   walk meets the push first and the pop once the subtree is done.
//!
//! # Walk rules
//!
//! Every view's rectangle is placed in a traversal space whose origin is the
//! walk's top view. The top is its own reference frame: its position is not
//! applied. Output rectangles are then shifted into the target view's space.
//!
//! For each view:
//!
//! 1. A view whose widget carries native data is an opaque boundary unless it
//!    lies on the path from the target up to the top. Boundaries contribute
//!    their own paint entry only; the platform repaints what is below them.
//! 2. A clipping view that is walked through brackets its children with clip
//!    markers and paints nothing itself. If its clip misses the damage the
//!    whole subtree is skipped.
//! 3. Children with `z_index >= 0` are visited first, in list order. Then the
//!    view's own paint entry (skipped when hidden, fully transparent, or
//!    outside the damage). Then the children with negative z-index.
//! 4. Emitting a view that is not transparent, has opacity exactly `1.0`, and
//!    whose intersection with the damage equals the damage stops the walk.
//!    The stop does not escape an enclosing clipping view, whose push marker
//!    is still emitted.
//!
//! The buffer is length-tracked: rebuilding overwrites entries in place and
//! keeps the capacity, and only the first [`len`](DisplayList::len) entries
//! are ever observed. A failed allocation truncates the list and ends the
//! walk.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Vec2};

use crate::region::{is_empty_rect, overlaps};
use crate::view::{INVALID, ViewId, ViewStore, Visibility};

/// What a display list entry does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayItemKind {
    /// Paint the view, translated to the entry's rectangle.
    Paint,
    /// Save the clip state and intersect the clip with the entry's rectangle.
    PushClip,
    /// Restore the clip state saved by the matching push.
    PopClip,
}

/// One display list entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayItem {
    /// What to do.
    pub kind: DisplayItemKind,
    /// The view the entry belongs to.
    pub view: ViewId,
    /// The view's rectangle (paint) or clip rectangle (markers), in the
    /// target view's space.
    pub rect: Rect,
}

/// A reusable, length-tracked display list.
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    items: Vec<DisplayItem>,
    len: usize,
    truncated: bool,
    path: Vec<u32>,
}

struct Walk<'a> {
    store: &'a ViewStore,
    top: u32,
    origin: Vec2,
    damage: Rect,
}

impl DisplayList {
    /// Creates an empty display list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            len: 0,
            truncated: false,
            path: Vec::new(),
        }
    }

    /// Rebuilds the list for `damage`, given in `target`'s space, walking
    /// from `top`.
    ///
    /// `top` is normally the root view. If `target` is not inside `top`'s
    /// tree the walk starts at `target` instead. Returns the new length.
    pub fn build(&mut self, store: &ViewStore, top: ViewId, target: ViewId, damage: Rect) -> usize {
        self.len = 0;
        self.truncated = false;

        let top = if store.is_ancestor_or_self(top, target) {
            top
        } else {
            target
        };
        // Offset of the target from the top, excluding the top's own
        // position since the walk does not apply it.
        let origin = store.offset_to_ancestor(target, top);

        self.path.clear();
        let mut cur = target.idx;
        loop {
            self.path.push(cur);
            if cur == top.idx {
                break;
            }
            cur = store.parent[cur as usize];
        }

        let walk = Walk {
            store,
            top: top.idx,
            origin,
            damage,
        };
        self.visit(&walk, top.idx, Vec2::ZERO);
        self.len
    }

    /// Returns the live entries in collection (front-to-back) order.
    #[must_use]
    pub fn items(&self) -> &[DisplayItem] {
        &self.items[..self.len]
    }

    /// Returns the live entries in paint (back-to-front) order.
    pub fn paint_order(&self) -> impl DoubleEndedIterator<Item = &DisplayItem> {
        self.items().iter().rev()
    }

    /// Returns the number of live entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list has no live entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of entries the buffer holds without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Returns whether the last build ran out of memory.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Forgets all entries, keeping the buffer.
    pub fn clear(&mut self) {
        self.len = 0;
        self.truncated = false;
    }

    /// Returns the number of paint entries.
    #[must_use]
    pub fn paint_count(&self) -> usize {
        self.count(DisplayItemKind::Paint)
    }

    /// Returns the number of clip push markers.
    #[must_use]
    pub fn clip_count(&self) -> usize {
        self.count(DisplayItemKind::PushClip)
    }

    fn count(&self, kind: DisplayItemKind) -> usize {
        self.items().iter().filter(|item| item.kind == kind).count()
    }

    /// Appends an entry. Returns `false` if it could not be stored.
    fn push(&mut self, kind: DisplayItemKind, view: ViewId, rect: Rect) -> bool {
        if self.truncated {
            return false;
        }
        let item = DisplayItem { kind, view, rect };
        if self.len < self.items.len() {
            self.items[self.len] = item;
        } else {
            if self.items.try_reserve(1).is_err() {
                log::warn!("display list truncated at {} entries", self.len);
                self.truncated = true;
                return false;
            }
            self.items.push(item);
        }
        self.len += 1;
        true
    }

    /// Visits `idx` whose parent sits at `parent_origin` in traversal space.
    /// Returns `true` to stop the walk.
    fn visit(&mut self, walk: &Walk<'_>, idx: u32, parent_origin: Vec2) -> bool {
        let store = walk.store;
        let i = idx as usize;
        let view = store.id_at(idx);

        let position = if idx == walk.top {
            Point::ZERO
        } else {
            store.position[i]
        };
        let lrect = Rect::from_origin_size(position, store.size[i]) + parent_origin;
        let child_origin = lrect.origin().to_vec2();
        let out = lrect - walk.origin;

        let walk_children = !store.has_native_widget_at(idx) || self.path.contains(&idx);
        let first = store.first_child[i];

        if let Some(clip) = store.clip[i].filter(|_| walk_children) {
            if first == INVALID {
                return false;
            }
            let clip_rect = clip.rect + child_origin - walk.origin;
            if !overlaps(clip_rect, walk.damage) {
                return false;
            }
            if !self.push(DisplayItemKind::PopClip, view, clip_rect) {
                return true;
            }
            // A stop inside the bracket ends the subtree only.
            let mut child = first;
            while child != INVALID && !self.visit(walk, child, child_origin) {
                child = store.next_sibling[child as usize];
            }
            return !self.push(DisplayItemKind::PushClip, view, clip_rect);
        }

        let mut child = if walk_children { first } else { INVALID };
        while child != INVALID && store.z_index[child as usize] >= 0 {
            if self.visit(walk, child, child_origin) {
                return true;
            }
            child = store.next_sibling[child as usize];
        }

        let irect = out.intersect(walk.damage);
        let shown = store.visibility[i] == Visibility::Show && store.opacity[i] > 0.0;
        if shown && !is_empty_rect(irect) {
            if !self.push(DisplayItemKind::Paint, view, out) {
                return true;
            }
            if !store.transparent[i] && store.opacity[i] == 1.0 && irect == walk.damage {
                return true;
            }
        }

        while child != INVALID {
            if self.visit(walk, child, child_origin) {
                return true;
            }
            child = store.next_sibling[child as usize];
        }
        false
    }
}
