// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated scroll that exercises the tracing and diagnostics pipeline.
//!
//! Lays out a column of cards on a [`SimHost`] page, attaches a
//! [`VisibilityController`] to each, then scrolls to the bottom in fixed
//! steps. Events go to both a [`PrettyPrintSink`] per card and one shared
//! [`RecorderSink`], which is exported as JSON at the end.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufWriter};
use std::rc::Rc;

use kurbo::{Point, Rect, Size, Vec2};

use deferview_core::trace::{
    ForceCheckEvent, IntersectionEvent, SessionEndEvent, SessionStartEvent, TraceSink,
    VisibilityEvent,
};
use deferview_core::{ObservationOptions, VisibilityController};
use deferview_debug::pretty::PrettyPrintSink;
use deferview_debug::recorder::RecorderSink;
use deferview_sim::SimHost;

const VIEWPORT: Size = Size::new(800.0, 600.0);
const CARD_COUNT: u32 = 12;
const CARD_HEIGHT: f64 = 300.0;
const CARD_GAP: f64 = 40.0;
const SCROLL_STEP: f64 = 250.0;

/// Forwards every event to two sinks.
struct Tee<A, B>(A, B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_session_start(&mut self, e: &SessionStartEvent) {
        self.0.on_session_start(e);
        self.1.on_session_start(e);
    }

    fn on_session_end(&mut self, e: &SessionEndEvent) {
        self.0.on_session_end(e);
        self.1.on_session_end(e);
    }

    fn on_intersection(&mut self, e: &IntersectionEvent) {
        self.0.on_intersection(e);
        self.1.on_intersection(e);
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        self.0.on_visibility(e);
        self.1.on_visibility(e);
    }

    fn on_force_check(&mut self, e: &ForceCheckEvent) {
        self.0.on_force_check(e);
        self.1.on_force_check(e);
    }
}

fn main() -> io::Result<()> {
    let host = SimHost::new(VIEWPORT);
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));

    // -- page --------------------------------------------------------------
    let options = ObservationOptions::new()
        .with_root_margin("0px 0px 100px 0px")
        .with_thresholds([0.0, 0.5, 1.0]);

    let cards: Vec<_> = (0..CARD_COUNT)
        .map(|i| {
            let top = f64::from(i) * (CARD_HEIGHT + CARD_GAP);
            let element = host.add_element(Rect::new(40.0, top, 760.0, top + CARD_HEIGHT));

            let controller = VisibilityController::new(host.clone(), options.clone());
            let pretty = PrettyPrintSink::with_writer(io::stdout()).labeled(format!("card#{i}"));
            controller.set_trace_sink(Tee(pretty, Rc::clone(&recorder)));
            controller.on_visible(move || println!("  -> card#{i} mounted"));
            controller.attach(Some(element));
            controller
        })
        .collect();

    // -- simulated scroll --------------------------------------------------
    let page_height = f64::from(CARD_COUNT) * (CARD_HEIGHT + CARD_GAP);
    let mut step = 0;
    loop {
        let reports = host.flush();
        let visible = cards.iter().filter(|c| c.is_visible()).count();
        println!(
            "[step {step}] offset={} reports={reports} visible={visible}/{CARD_COUNT} sessions={}",
            host.scroll_offset().y,
            host.live_sessions(),
        );

        if host.scroll_offset().y + VIEWPORT.height >= page_height {
            break;
        }
        host.scroll_by(Vec2::new(0.0, SCROLL_STEP));
        step += 1;
    }

    // Scrolling back up changes nothing: every card stays mounted.
    host.scroll_to(Point::ORIGIN);
    let reports = host.flush();
    println!("[rewind] reports={reports} sessions={}", host.live_sessions());

    drop(cards);

    // -- export ------------------------------------------------------------
    let path = "deferview_trace.json";
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let recorder = recorder.borrow();
    deferview_debug::json::export(recorder.events(), &mut writer)?;

    println!("Wrote {path} ({} events)", recorder.len());
    Ok(())
}
