// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loose-union damage regions.
//!
//! A [`Region`] is a set of axis-aligned rectangles, usually in device
//! pixels. Unions are loose: a rectangle already covered by a member is
//! dropped, members covered by a new rectangle are replaced, and everything
//! else is kept as-is (overlaps allowed). Subtraction is exact, splitting each
//! affected member into at most four pieces.

use alloc::vec::Vec;

use kurbo::Rect;

/// Returns `true` if `rect` has no area.
#[inline]
pub(crate) fn is_empty_rect(rect: Rect) -> bool {
    !(rect.width() > 0.0 && rect.height() > 0.0)
}

/// Returns `true` if the interiors of `a` and `b` overlap.
#[inline]
pub(crate) fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Returns `true` if `outer` fully contains `inner`.
#[inline]
pub(crate) fn contains_rect(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

/// A set of rectangles pending repaint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// Creates an empty region.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Creates a region covering `rect`.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        let mut region = Self::new();
        region.union_rect(rect);
        region
    }

    /// Returns `true` if the region covers no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Returns the member rectangles.
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Returns the bounding box of the region, or [`Rect::ZERO`] when empty.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        let mut it = self.rects.iter().copied();
        match it.next() {
            Some(first) => it.fold(first, |acc, r| acc.union(r)),
            None => Rect::ZERO,
        }
    }

    /// Returns `true` if any member overlaps `rect`.
    #[must_use]
    pub fn intersects(&self, rect: Rect) -> bool {
        self.rects.iter().any(|&r| overlaps(r, rect))
    }

    /// Adds `rect` to the region.
    pub fn union_rect(&mut self, rect: Rect) {
        if is_empty_rect(rect) {
            return;
        }
        if self.rects.iter().any(|&r| contains_rect(r, rect)) {
            return;
        }
        self.rects.retain(|&r| !contains_rect(rect, r));
        self.rects.push(rect);
    }

    /// Adds every member of `other` to the region.
    pub fn union(&mut self, other: &Self) {
        for &rect in &other.rects {
            self.union_rect(rect);
        }
    }

    /// Removes `hole` from the region.
    pub fn subtract_rect(&mut self, hole: Rect) {
        if is_empty_rect(hole) || !self.intersects(hole) {
            return;
        }
        let mut kept = Vec::with_capacity(self.rects.len() + 3);
        for &r in &self.rects {
            if !overlaps(r, hole) {
                kept.push(r);
                continue;
            }
            if hole.y0 > r.y0 {
                kept.push(Rect::new(r.x0, r.y0, r.x1, hole.y0));
            }
            if hole.y1 < r.y1 {
                kept.push(Rect::new(r.x0, hole.y1, r.x1, r.y1));
            }
            let band_y0 = r.y0.max(hole.y0);
            let band_y1 = r.y1.min(hole.y1);
            if hole.x0 > r.x0 {
                kept.push(Rect::new(r.x0, band_y0, hole.x0, band_y1));
            }
            if hole.x1 < r.x1 {
                kept.push(Rect::new(hole.x1, band_y0, r.x1, band_y1));
            }
        }
        kept.retain(|&r| !is_empty_rect(r));
        self.rects = kept;
    }

    /// Empties the region, keeping its allocation.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Returns the total area of the members, counting overlaps twice.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.rects.iter().map(|r| r.area()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_ignores_empty_and_covered_rects() {
        let mut region = Region::new();
        region.union_rect(Rect::new(0.0, 0.0, 0.0, 10.0));
        assert!(region.is_empty());

        region.union_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        region.union_rect(Rect::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(region.rects().len(), 1);
    }

    #[test]
    fn union_replaces_covered_members() {
        let mut region = Region::new();
        region.union_rect(Rect::new(10.0, 10.0, 20.0, 20.0));
        region.union_rect(Rect::new(30.0, 30.0, 40.0, 40.0));
        region.union_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(region.rects(), &[Rect::new(0.0, 0.0, 50.0, 50.0)]);
    }

    #[test]
    fn subtract_punches_a_hole() {
        let mut region = Region::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        region.subtract_rect(Rect::new(25.0, 25.0, 75.0, 75.0));
        assert_eq!(region.rects().len(), 4);
        assert!((region.area() - (10_000.0 - 2_500.0)).abs() < 1e-9);
        assert!(!region.intersects(Rect::new(30.0, 30.0, 70.0, 70.0)));
        assert_eq!(region.bounds(), Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn subtract_covering_rect_empties_region() {
        let mut region = Region::from_rect(Rect::new(10.0, 10.0, 20.0, 20.0));
        region.union_rect(Rect::new(40.0, 40.0, 60.0, 60.0));
        region.subtract_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(region.is_empty());
    }

    #[test]
    fn subtract_disjoint_rect_is_noop() {
        let mut region = Region::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        region.subtract_rect(Rect::new(20.0, 20.0, 30.0, 30.0));
        assert_eq!(region.rects(), &[Rect::new(0.0, 0.0, 10.0, 10.0)]);
    }
}
