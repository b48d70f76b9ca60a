// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! App-unit / device-pixel conversion.
//!
//! View geometry is kept in resolution-independent app units. Widgets, dirty
//! regions and paint events speak device pixels. The scale between the two
//! comes from [`DeviceContext::app_units_to_dev_units`](crate::backend::DeviceContext::app_units_to_dev_units).

use kurbo::{Point, Rect};

/// A conversion factor between app units and device pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitScale {
    app_to_dev: f64,
}

impl UnitScale {
    /// Creates a scale from the number of device pixels per app unit.
    ///
    /// Non-finite or non-positive factors fall back to `1.0`.
    #[must_use]
    pub fn new(app_to_dev: f64) -> Self {
        let app_to_dev = if app_to_dev.is_finite() && app_to_dev > 0.0 {
            app_to_dev
        } else {
            1.0
        };
        Self { app_to_dev }
    }

    /// Device pixels per app unit.
    #[must_use]
    pub const fn app_to_dev(self) -> f64 {
        self.app_to_dev
    }

    /// App units per device pixel.
    #[must_use]
    pub fn dev_to_app(self) -> f64 {
        1.0 / self.app_to_dev
    }

    /// Converts an app-unit rectangle to the smallest enclosing pixel
    /// rectangle.
    #[must_use]
    pub fn to_dev_round_out(self, rect: Rect) -> Rect {
        rect.scale_from_origin(self.app_to_dev).expand()
    }

    /// Converts an app-unit rectangle to the largest enclosed pixel
    /// rectangle.
    #[must_use]
    pub fn to_dev_round_in(self, rect: Rect) -> Rect {
        rect.scale_from_origin(self.app_to_dev).trunc()
    }

    /// Converts a pixel rectangle to app units, rounding outward.
    #[must_use]
    pub fn to_app_round_out(self, rect: Rect) -> Rect {
        rect.scale_from_origin(self.dev_to_app()).expand()
    }

    /// Converts app units to device pixels without rounding.
    #[must_use]
    pub fn to_dev(self, rect: Rect) -> Rect {
        rect.scale_from_origin(self.app_to_dev)
    }

    /// Converts a pixel point to app units, rounding to the nearest unit.
    #[must_use]
    pub fn point_to_app(self, point: Point) -> Point {
        Point::new(point.x * self.dev_to_app(), point.y * self.dev_to_app()).round()
    }

    /// Converts a pixel length to app units, rounding to the nearest unit.
    #[must_use]
    pub fn length_to_app(self, length: f64) -> f64 {
        Point::new(length * self.dev_to_app(), 0.0).round().x
    }
}

impl Default for UnitScale {
    fn default() -> Self {
        Self { app_to_dev: 1.0 }
    }
}
