// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Update, display-list and batch events carry no timestamp of their own;
//! they are placed at the most recent timestamp seen before them.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use kurbo::Rect;
use serde_json::{Value, json};
use strata_core::time::HostTime;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Refresh passes become duration slices, batch depth a counter track, and
/// everything else instant events.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut now = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Update(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Update",
                    "cat": "Scheduler",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "view": e.view.index(),
                        "rect": rect_json(e.rect),
                        "flags": e.flags.bits(),
                        "outcome": format!("{:?}", e.outcome),
                        "pending": e.pending,
                    }
                }));
            }
            RecordedEvent::RefreshBegin(e) => {
                now = to_us(e.timestamp);
                events.push(json!({
                    "ph": "B",
                    "name": format!("Refresh{:?}", e.kind),
                    "cat": "Refresh",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "view": e.view.index(),
                        "flags": e.flags.bits(),
                    }
                }));
            }
            RecordedEvent::RefreshEnd(e) => {
                now = to_us(e.timestamp);
                events.push(json!({
                    "ph": "E",
                    "name": format!("Refresh{:?}", e.kind),
                    "cat": "Refresh",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "double_buffered": e.double_buffered,
                    }
                }));
            }
            RecordedEvent::DisplayList(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "DisplayList",
                    "cat": "Refresh",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "target": e.target.index(),
                        "damage": rect_json(e.damage),
                        "len": e.len,
                        "paints": e.paints,
                        "clips": e.clips,
                        "truncated": e.truncated,
                    }
                }));
            }
            RecordedEvent::Composite(e) => {
                now = to_us(e.timestamp);
                events.push(json!({
                    "ph": "i",
                    "name": "Composite",
                    "cat": "Scheduler",
                    "ts": now,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "flushed": e.flushed,
                    }
                }));
            }
            RecordedEvent::Batch(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "BatchDepth",
                    "cat": "Scheduler",
                    "ts": now,
                    "pid": 0,
                    "args": {
                        "depth": e.depth,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

fn rect_json(r: Rect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}
