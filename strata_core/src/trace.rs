// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for the update and refresh pipeline.
//!
//! This module provides a [`TraceSink`] trait with one method per pipeline
//! event. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! A [`ViewManager`](crate::ViewManager) owns a [`Tracer`] holding an
//! optional boxed sink, installed with
//! [`ViewManager::set_trace_sink`](crate::ViewManager::set_trace_sink). When
//! the `trace` feature is **off**, every `Tracer` method compiles to nothing
//! and installed sinks are dropped. When **on**, each method performs a
//! single `Option` branch before dispatching.
//!
//! Sinks that need to be read back after being handed to a manager share
//! their storage (for example through `Rc<RefCell<_>>`).
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies.

use alloc::boxed::Box;

use kurbo::Rect;

use crate::flags::RefreshFlags;
use crate::time::HostTime;
use crate::view::ViewId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What became of an update request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdateOutcome {
    /// Dropped: zero area, hidden view, or no widget-backed ancestor.
    Ignored,
    /// Merged into a dirty region while refresh was disabled.
    Accumulated,
    /// Sent to the widget; compositing waits for the timer.
    Deferred,
    /// Sent to the widget and composited right away.
    Composited,
}

/// Which refresh entry point ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshKind {
    /// A single damage rectangle.
    Rect,
    /// A device-pixel damage region.
    Region,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted for every update request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpdateEvent {
    /// The view the request named.
    pub view: ViewId,
    /// Damaged rectangle in the view's space.
    pub rect: Rect,
    /// Flags passed with the request.
    pub flags: RefreshFlags,
    /// What the scheduler decided.
    pub outcome: UpdateOutcome,
    /// Pending update count after the request.
    pub pending: u32,
}

/// Marks the start of a refresh pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RefreshBeginEvent {
    /// The refreshed view.
    pub view: ViewId,
    /// Rectangle or region variant.
    pub kind: RefreshKind,
    /// Effective flags after transparency forcing.
    pub flags: RefreshFlags,
    /// Host time at the start of the pass.
    pub timestamp: HostTime,
}

/// Marks the end of a refresh pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RefreshEndEvent {
    /// The refreshed view.
    pub view: ViewId,
    /// Rectangle or region variant.
    pub kind: RefreshKind,
    /// Whether painting went through an offscreen surface.
    pub double_buffered: bool,
    /// Host time at the end of the pass.
    pub timestamp: HostTime,
}

/// Emitted after a display list is built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayListEvent {
    /// The view whose damage the list covers.
    pub target: ViewId,
    /// Damage rectangle in the target's space.
    pub damage: Rect,
    /// Number of entries.
    pub len: usize,
    /// Number of paint entries.
    pub paints: usize,
    /// Number of clip push markers.
    pub clips: usize,
    /// Whether an allocation failure cut the list short.
    pub truncated: bool,
}

/// Emitted when pending updates are flushed to the root widget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeEvent {
    /// Number of pending updates flushed.
    pub flushed: u32,
    /// Host time of the flush.
    pub timestamp: HostTime,
}

/// Emitted when an update batch opens or closes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatchEvent {
    /// Nesting depth after the transition.
    pub depth: u32,
    /// Whether refresh is enabled after the transition.
    pub refresh_enabled: bool,
    /// Number of widget views whose dirty region was replayed.
    pub replayed: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the view manager.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called for each update request.
    fn on_update(&mut self, e: &UpdateEvent) {
        _ = e;
    }

    /// Called when a refresh pass begins painting.
    fn on_refresh_begin(&mut self, e: &RefreshBeginEvent) {
        _ = e;
    }

    /// Called when a refresh pass finishes.
    fn on_refresh_end(&mut self, e: &RefreshEndEvent) {
        _ = e;
    }

    /// Called after a display list is built.
    fn on_display_list(&mut self, e: &DisplayListEvent) {
        _ = e;
    }

    /// Called when pending updates are flushed.
    fn on_composite(&mut self, e: &CompositeEvent) {
        _ = e;
    }

    /// Called when an update batch opens or closes.
    fn on_batch(&mut self, e: &BatchEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional boxed [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        let mut tracer = Self::none();
        tracer.set_sink(Some(sink));
        tracer
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Replaces the sink, returning the previous one.
    ///
    /// Without the `trace` feature the new sink is dropped and `None` is
    /// returned.
    pub fn set_sink(&mut self, sink: Option<Box<dyn TraceSink>>) -> Option<Box<dyn TraceSink>> {
        #[cfg(feature = "trace")]
        {
            core::mem::replace(&mut self.sink, sink)
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            None
        }
    }

    /// Emits an [`UpdateEvent`].
    #[inline]
    pub fn update(&mut self, e: &UpdateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_update(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RefreshBeginEvent`].
    #[inline]
    pub fn refresh_begin(&mut self, e: &RefreshBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_refresh_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RefreshEndEvent`].
    #[inline]
    pub fn refresh_end(&mut self, e: &RefreshEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_refresh_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DisplayListEvent`].
    #[inline]
    pub fn display_list(&mut self, e: &DisplayListEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_display_list(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CompositeEvent`].
    #[inline]
    pub fn composite(&mut self, e: &CompositeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_composite(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BatchEvent`].
    #[inline]
    pub fn batch(&mut self, e: &BatchEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_batch(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
