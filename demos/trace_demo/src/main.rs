// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless session that exercises the update, refresh and tracing paths.
//!
//! Builds a small view tree on logging backends, animates a translucent card
//! for a few frames, runs an update batch and some input, and records every
//! trace event to both a
//! [`PrettyPrintSink`](strata_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](strata_debug::recorder::RecorderSink). The recording is
//! exported as Chrome trace JSON.
//!
//! Set `RUST_LOG=debug` (or `trace`) to see the backends' side of the story.

use std::fs::File;
use std::io::{self, BufWriter};

use kurbo::{Point, Rect, Vec2};
use strata_core::trace::{
    BatchEvent, CompositeEvent, DisplayListEvent, RefreshBeginEvent, RefreshEndEvent, TraceSink,
    UpdateEvent,
};
use strata_core::{
    ClipDescriptor, EventKind, InputClass, ManagerConfig, OffscreenCache, RefreshFlags, ViewEvent,
    ViewId, ViewInit, ViewManager, Visibility,
};
use strata_debug::headless::{HeadlessWindow, PaintQueue, backends};
use strata_debug::pretty::{PrettyPrintSink, dump_display_list};
use strata_debug::recorder::RecorderSink;

const FRAME_COUNT: u32 = 12;
const WINDOW: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

/// Forwards every event to each of its sinks.
struct Tee(Vec<Box<dyn TraceSink>>);

impl TraceSink for Tee {
    fn on_update(&mut self, e: &UpdateEvent) {
        self.0.iter_mut().for_each(|s| s.on_update(e));
    }

    fn on_refresh_begin(&mut self, e: &RefreshBeginEvent) {
        self.0.iter_mut().for_each(|s| s.on_refresh_begin(e));
    }

    fn on_refresh_end(&mut self, e: &RefreshEndEvent) {
        self.0.iter_mut().for_each(|s| s.on_refresh_end(e));
    }

    fn on_display_list(&mut self, e: &DisplayListEvent) {
        self.0.iter_mut().for_each(|s| s.on_display_list(e));
    }

    fn on_composite(&mut self, e: &CompositeEvent) {
        self.0.iter_mut().for_each(|s| s.on_composite(e));
    }

    fn on_batch(&mut self, e: &BatchEvent) {
        self.0.iter_mut().for_each(|s| s.on_batch(e));
    }
}

struct Scene {
    root: ViewId,
    content: ViewId,
    card: ViewId,
    popup: ViewId,
}

fn build_scene(vm: &mut ViewManager, queue: &PaintQueue) -> Scene {
    let root = vm.create_view(
        ViewInit::new(WINDOW)
            .with_widget(Box::new(HeadlessWindow::new("main", WINDOW, queue.clone()))),
    );
    vm.set_root_view(root);

    let sidebar = vm.create_view(ViewInit::new(Rect::new(0.0, 0.0, 200.0, 600.0)));
    vm.insert_child_at_z(root, sidebar, 0);

    let content = vm.create_view(
        ViewInit::new(Rect::new(200.0, 0.0, 800.0, 600.0))
            .with_clip(ClipDescriptor::new(Rect::new(0.0, 0.0, 600.0, 600.0))),
    );
    vm.insert_child_at_z(root, content, 0);

    let card = vm.create_view(ViewInit::new(Rect::new(20.0, 20.0, 220.0, 140.0)).with_opacity(0.5));
    vm.insert_child_at_z(content, card, 1);

    let popup = vm.create_view(
        ViewInit::new(Rect::new(300.0, 200.0, 500.0, 300.0))
            .with_floating(true)
            .with_visibility(Visibility::Hide),
    );
    vm.insert_child_at_z(root, popup, 10);

    log::info!(
        "scene built: {} views, {} transparent",
        vm.views().live_count(),
        vm.transparent_count()
    );
    Scene {
        root,
        content,
        card,
        popup,
    }
}

/// Delivers queued window damage the way a platform paint event would.
fn pump_paints(vm: &mut ViewManager, root: ViewId, queue: &PaintQueue) {
    let mut damage = queue.take();
    if damage.is_empty() {
        return;
    }
    if let Err(err) = vm.refresh_region(root, None, Some(&mut damage), RefreshFlags::empty()) {
        log::warn!("refresh failed: {err}");
    }
}

fn main() -> io::Result<()> {
    env_logger::init();

    // -- sinks -------------------------------------------------------------
    let recorder = RecorderSink::new();
    let recording = recorder.recording();
    let pretty = PrettyPrintSink::new(Box::new(io::stdout()));

    // -- manager -----------------------------------------------------------
    let queue = PaintQueue::new();
    let mut vm = ViewManager::new(ManagerConfig::default(), backends(1.0), OffscreenCache::new());
    vm.set_trace_sink(Some(Box::new(Tee(vec![Box::new(pretty), Box::new(recorder)]))));
    let scene = build_scene(&mut vm, &queue);
    vm.on_timer_tick();
    pump_paints(&mut vm, scene.root, &queue);

    // -- animation ---------------------------------------------------------
    for frame in 0..FRAME_COUNT {
        vm.move_view_by(scene.card, Vec2::new(15.0, 5.0));
        if frame % 4 == 3 {
            vm.update_view(scene.content, RefreshFlags::IMMEDIATE);
        }
        // The platform timer fires once per frame here.
        vm.on_timer_tick();
        pump_paints(&mut vm, scene.root, &queue);
    }

    // -- batched restyle ---------------------------------------------------
    vm.begin_update_batch();
    vm.set_view_opacity(scene.card, 1.0);
    vm.resize_view(scene.card, 300.0, 200.0);
    vm.set_view_visibility(scene.popup, Visibility::Show);
    if let Err(err) = vm.end_update_batch() {
        log::warn!("{err}");
    }
    vm.on_timer_tick();
    pump_paints(&mut vm, scene.root, &queue);
    if let Err(err) = vm.refresh_rect(
        scene.popup,
        None,
        Rect::new(0.0, 0.0, 200.0, 100.0),
        RefreshFlags::empty(),
    ) {
        log::warn!("popup refresh failed: {err}");
    }

    // -- input -------------------------------------------------------------
    vm.grab_mouse_events(Some(scene.card));
    let click = ViewEvent::new(
        EventKind::Input(InputClass::Mouse),
        Some(scene.root),
        Point::new(400.0, 120.0),
    );
    let status = vm.dispatch_event(&click, None);
    log::info!("click handled: {status:?}");
    vm.grab_mouse_events(None);

    // -- last paint order --------------------------------------------------
    println!("last display list:");
    dump_display_list(vm.display_list(), &mut io::stdout())?;

    vm.detach();

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let mut writer = BufWriter::new(File::create(path)?);
    strata_debug::chrome::export(&recording.to_bytes(), &mut writer)?;
    println!("Wrote {path} ({} bytes recorded)", recording.len());
    Ok(())
}
