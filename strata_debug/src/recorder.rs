// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events as
//! little-endian records into a buffer shared with its [`Recording`]
//! handles, so the bytes stay readable after the sink has been handed to a
//! manager. [`decode`] reads them back as an iterator of [`RecordedEvent`].

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::Rect;
use strata_core::RefreshFlags;
use strata_core::ViewId;
use strata_core::time::HostTime;
use strata_core::trace::{
    BatchEvent, CompositeEvent, DisplayListEvent, RefreshBeginEvent, RefreshEndEvent, RefreshKind,
    TraceSink, UpdateEvent, UpdateOutcome,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_UPDATE: u8 = 1;
const TAG_REFRESH_BEGIN: u8 = 2;
const TAG_REFRESH_END: u8 = 3;
const TAG_DISPLAY_LIST: u8 = 4;
const TAG_COMPOSITE: u8 = 5;
const TAG_BATCH: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A shared handle to the bytes written by a [`RecorderSink`].
#[derive(Clone, Debug, Default)]
pub struct Recording(Rc<RefCell<Vec<u8>>>);

impl Recording {
    /// Returns a copy of the bytes recorded so far.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }

    /// Returns the number of recorded bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Decodes everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        decode(&self.0.borrow()).collect()
    }
}

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Recording,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle that observes this recorder's bytes.
    #[must_use]
    pub fn recording(&self) -> Recording {
        self.buf.clone()
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.to_bytes()
    }

    // -- encoding helpers --------------------------------------------------

    fn write(&self, bytes: &[u8]) {
        self.buf.0.borrow_mut().extend_from_slice(bytes);
    }

    fn write_u8(&self, v: u8) {
        self.write(&[v]);
    }

    fn write_u32(&self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    fn write_u64(&self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    fn write_count(&self, v: usize) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "counts capped at u32::MAX for recording"
        )]
        self.write_u32(v.min(u32::MAX as usize) as u32);
    }

    fn write_bool(&self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_view(&self, id: ViewId) {
        self.write_u32(id.index());
        self.write_u32(id.generation());
    }

    fn write_rect(&self, r: Rect) {
        for v in [r.x0, r.y0, r.x1, r.y1] {
            self.write_u64(v.to_bits());
        }
    }

    fn write_kind(&self, kind: RefreshKind) {
        self.write_u8(match kind {
            RefreshKind::Rect => 0,
            RefreshKind::Region => 1,
        });
    }

    fn write_outcome(&self, outcome: UpdateOutcome) {
        self.write_u8(match outcome {
            UpdateOutcome::Ignored => 0,
            UpdateOutcome::Accumulated => 1,
            UpdateOutcome::Deferred => 2,
            UpdateOutcome::Composited => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_update(&mut self, e: &UpdateEvent) {
        self.write_u8(TAG_UPDATE);
        self.write_view(e.view);
        self.write_rect(e.rect);
        self.write_u32(e.flags.bits());
        self.write_outcome(e.outcome);
        self.write_u32(e.pending);
    }

    fn on_refresh_begin(&mut self, e: &RefreshBeginEvent) {
        self.write_u8(TAG_REFRESH_BEGIN);
        self.write_view(e.view);
        self.write_kind(e.kind);
        self.write_u32(e.flags.bits());
        self.write_u64(e.timestamp.nanos());
    }

    fn on_refresh_end(&mut self, e: &RefreshEndEvent) {
        self.write_u8(TAG_REFRESH_END);
        self.write_view(e.view);
        self.write_kind(e.kind);
        self.write_bool(e.double_buffered);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_display_list(&mut self, e: &DisplayListEvent) {
        self.write_u8(TAG_DISPLAY_LIST);
        self.write_view(e.target);
        self.write_rect(e.damage);
        self.write_count(e.len);
        self.write_count(e.paints);
        self.write_count(e.clips);
        self.write_bool(e.truncated);
    }

    fn on_composite(&mut self, e: &CompositeEvent) {
        self.write_u8(TAG_COMPOSITE);
        self.write_u32(e.flushed);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        self.write_u8(TAG_BATCH);
        self.write_u32(e.depth);
        self.write_bool(e.refresh_enabled);
        self.write_u32(e.replayed);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// An [`UpdateEvent`].
    Update(UpdateEvent),
    /// A [`RefreshBeginEvent`].
    RefreshBegin(RefreshBeginEvent),
    /// A [`RefreshEndEvent`].
    RefreshEnd(RefreshEndEvent),
    /// A [`DisplayListEvent`].
    DisplayList(DisplayListEvent),
    /// A [`CompositeEvent`].
    Composite(CompositeEvent),
    /// A [`BatchEvent`].
    Batch(BatchEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.read().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read().map(u64::from_le_bytes)
    }

    fn read_count(&mut self) -> Option<usize> {
        usize::try_from(self.read_u32()?).ok()
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_view(&mut self) -> Option<ViewId> {
        let index = self.read_u32()?;
        let generation = self.read_u32()?;
        Some(ViewId::from_raw(index, generation))
    }

    fn read_rect(&mut self) -> Option<Rect> {
        let mut v = [0.0; 4];
        for slot in &mut v {
            *slot = f64::from_bits(self.read_u64()?);
        }
        Some(Rect::new(v[0], v[1], v[2], v[3]))
    }

    fn read_flags(&mut self) -> Option<RefreshFlags> {
        self.read_u32().map(RefreshFlags::from_bits_truncate)
    }

    fn read_kind(&mut self) -> Option<RefreshKind> {
        Some(match self.read_u8()? {
            0 => RefreshKind::Rect,
            _ => RefreshKind::Region,
        })
    }

    fn read_outcome(&mut self) -> Option<UpdateOutcome> {
        Some(match self.read_u8()? {
            0 => UpdateOutcome::Ignored,
            1 => UpdateOutcome::Accumulated,
            2 => UpdateOutcome::Deferred,
            _ => UpdateOutcome::Composited,
        })
    }

    fn decode_update(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Update(UpdateEvent {
            view: self.read_view()?,
            rect: self.read_rect()?,
            flags: self.read_flags()?,
            outcome: self.read_outcome()?,
            pending: self.read_u32()?,
        }))
    }

    fn decode_refresh_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RefreshBegin(RefreshBeginEvent {
            view: self.read_view()?,
            kind: self.read_kind()?,
            flags: self.read_flags()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_refresh_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RefreshEnd(RefreshEndEvent {
            view: self.read_view()?,
            kind: self.read_kind()?,
            double_buffered: self.read_bool()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_display_list(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DisplayList(DisplayListEvent {
            target: self.read_view()?,
            damage: self.read_rect()?,
            len: self.read_count()?,
            paints: self.read_count()?,
            clips: self.read_count()?,
            truncated: self.read_bool()?,
        }))
    }

    fn decode_composite(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Composite(CompositeEvent {
            flushed: self.read_u32()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_batch(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Batch(BatchEvent {
            depth: self.read_u32()?,
            refresh_enabled: self.read_bool()?,
            replayed: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_UPDATE => self.decode_update(),
            TAG_REFRESH_BEGIN => self.decode_refresh_begin(),
            TAG_REFRESH_END => self.decode_refresh_end(),
            TAG_DISPLAY_LIST => self.decode_display_list(),
            TAG_COMPOSITE => self.decode_composite(),
            TAG_BATCH => self.decode_batch(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
