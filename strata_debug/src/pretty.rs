// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Host times
//! are printed in microseconds.
//!
//! [`dump_display_list`] prints a display list in paint order, indented by
//! clip depth.

use std::io::{self, Write};

use kurbo::Rect;
use strata_core::display_list::{DisplayItemKind, DisplayList};
use strata_core::time::HostTime;
use strata_core::trace::{
    BatchEvent, CompositeEvent, DisplayListEvent, RefreshBeginEvent, RefreshEndEvent, RefreshKind,
    TraceSink, UpdateEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

fn kind_name(kind: RefreshKind) -> &'static str {
    match kind {
        RefreshKind::Rect => "rect",
        RefreshKind::Region => "region",
    }
}

fn fmt_rect(r: Rect) -> String {
    format!("({}, {})-({}, {})", r.x0, r.y0, r.x1, r.y1)
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_update(&mut self, e: &UpdateEvent) {
        let _ = writeln!(
            self.writer,
            "[update] {:?} {} {:?} -> {:?} pending={}",
            e.view,
            fmt_rect(e.rect),
            e.flags,
            e.outcome,
            e.pending,
        );
    }

    fn on_refresh_begin(&mut self, e: &RefreshBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[refresh:begin] {:?} {} {:?} at {:.1}µs",
            e.view,
            kind_name(e.kind),
            e.flags,
            us(e.timestamp),
        );
    }

    fn on_refresh_end(&mut self, e: &RefreshEndEvent) {
        let buffered = if e.double_buffered { " buffered" } else { "" };
        let _ = writeln!(
            self.writer,
            "[refresh:end] {:?} {}{buffered} at {:.1}µs",
            e.view,
            kind_name(e.kind),
            us(e.timestamp),
        );
    }

    fn on_display_list(&mut self, e: &DisplayListEvent) {
        let truncated = if e.truncated { " TRUNCATED" } else { "" };
        let _ = writeln!(
            self.writer,
            "[display-list] {:?} damage={} entries={} paints={} clips={}{truncated}",
            e.target,
            fmt_rect(e.damage),
            e.len,
            e.paints,
            e.clips,
        );
    }

    fn on_composite(&mut self, e: &CompositeEvent) {
        let _ = writeln!(
            self.writer,
            "[composite] flushed={} at {:.1}µs",
            e.flushed,
            us(e.timestamp),
        );
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        let state = if e.refresh_enabled { "on" } else { "off" };
        let _ = writeln!(
            self.writer,
            "[batch] depth={} refresh={state} replayed={}",
            e.depth, e.replayed,
        );
    }
}

/// Writes `list` in paint order (back to front), one entry per line,
/// indenting entries inside clip brackets.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn dump_display_list(list: &DisplayList, writer: &mut dyn Write) -> io::Result<()> {
    let mut depth = 0_usize;
    for item in list.paint_order() {
        if item.kind == DisplayItemKind::PopClip {
            depth = depth.saturating_sub(1);
        }
        let indent = "  ".repeat(depth);
        let label = match item.kind {
            DisplayItemKind::Paint => "paint",
            DisplayItemKind::PushClip => "push-clip",
            DisplayItemKind::PopClip => "pop-clip",
        };
        writeln!(writer, "{indent}{label} {:?} {}", item.view, fmt_rect(item.rect))?;
        if item.kind == DisplayItemKind::PushClip {
            depth += 1;
        }
    }
    if list.is_truncated() {
        writeln!(writer, "(truncated)")?;
    }
    Ok(())
}
