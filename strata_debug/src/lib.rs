// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics for strata view managers.
//!
//! This crate provides [`TraceSink`](strata_core::trace::TraceSink)
//! implementations for development and post-mortem analysis, plus backends
//! for running a manager without a windowing system:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output,
//!   and [`pretty::dump_display_list`] for the last paint order.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.
//! - [`headless`]: collaborators that log what they are asked to do.

pub mod chrome;
pub mod headless;
pub mod pretty;
pub mod recorder;
