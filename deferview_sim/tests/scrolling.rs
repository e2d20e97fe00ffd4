// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end controller behavior against the simulated host.

use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use deferview_core::trace::{
    IntersectionEvent, SessionEndEvent, SessionId, SessionStartEvent, TraceSink, VisibilityCause,
    VisibilityEvent,
};
use deferview_core::{ObservationOptions, VisibilityController};
use deferview_sim::{HostCall, ObserverId, SimElement, SimHost};
use kurbo::{Point, Rect, Size, Vec2};

const VIEWPORT: Size = Size::new(800.0, 600.0);
const CARD_HEIGHT: f64 = 400.0;

/// Lays out `count` full-width cards stacked from the top of the page.
fn page(count: u32) -> (SimHost, Vec<SimElement>) {
    let host = SimHost::new(VIEWPORT);
    let cards = (0..count)
        .map(|i| {
            let top = f64::from(i) * CARD_HEIGHT;
            host.add_element(Rect::new(0.0, top, VIEWPORT.width, top + CARD_HEIGHT))
        })
        .collect();
    (host, cards)
}

fn controllers(
    host: &SimHost,
    cards: &[SimElement],
    options: &ObservationOptions<SimElement>,
) -> Vec<VisibilityController<SimHost>> {
    cards
        .iter()
        .map(|&card| {
            let c = VisibilityController::new(host.clone(), options.clone());
            c.attach(Some(card));
            c
        })
        .collect()
}

fn visible(cs: &[VisibilityController<SimHost>]) -> Vec<bool> {
    cs.iter().map(VisibilityController::is_visible).collect()
}

#[test]
fn cards_latch_as_they_scroll_into_view() {
    let (host, cards) = page(5);
    let cs = controllers(&host, &cards, &ObservationOptions::new());
    host.flush();

    // Card 0 is fully inside; card 1 is only half visible at threshold 1.0,
    // but the first report already says it intersects.
    assert_eq!(visible(&cs), [true, true, false, false, false]);

    host.scroll_to(Point::new(0.0, 700.0));
    host.flush();
    assert_eq!(visible(&cs), [true, true, true, true, false]);

    // Scrolling back never hides anything.
    host.scroll_to(Point::ORIGIN);
    host.flush();
    assert_eq!(visible(&cs), [true, true, true, true, false]);

    // Only the card that never intersected still has a session.
    assert_eq!(host.live_sessions(), 1);
    assert!(cs[4].has_active_session());
}

#[test]
fn root_margin_latches_ahead_of_the_viewport() {
    let (host, cards) = page(4);
    let options = ObservationOptions::new().with_root_margin("0px 0px 400px 0px");
    let cs = controllers(&host, &cards, &options);
    host.flush();
    // The viewport reaches y=600; the margin extends it to y=1000, into card 2.
    assert_eq!(visible(&cs), [true, true, true, false]);
}

#[test]
fn root_margin_units_ignore_case() {
    let (host, cards) = page(4);
    let options = ObservationOptions::new().with_root_margin("0PX 0px 400Px 0%");
    let cs = controllers(&host, &cards, &options);
    host.flush();
    assert_eq!(visible(&cs), [true, true, true, false]);

    let c = VisibilityController::new(host.clone(), ObservationOptions::new());
    c.set_options(ObservationOptions::new().with_root_margin("10PX"));
    c.attach(Some(cards[0]));
    assert!(c.has_active_session());
    host.flush();
    assert!(c.is_visible());
    assert_eq!(host.live_sessions(), 1);
}

#[test]
fn latched_controller_ignores_later_reports() {
    let (host, cards) = page(1);
    let c = VisibilityController::new(host.clone(), ObservationOptions::new());
    c.attach(Some(cards[0]));
    host.flush();
    assert!(c.is_visible());

    host.scroll_by(Vec2::new(0.0, 5000.0));
    host.flush();
    assert!(c.is_visible());
    assert_eq!(host.sessions_created(), 1);
}

#[test]
fn replacing_element_disconnects_before_creating() {
    let (host, cards) = page(3);
    let c = VisibilityController::new(host.clone(), ObservationOptions::new());
    c.attach(Some(cards[2]));
    c.attach(Some(cards[1]));
    c.attach(Some(cards[2]));

    assert_eq!(
        host.calls(),
        [
            HostCall::Create(ObserverId(0)),
            HostCall::Observe(ObserverId(0), cards[2]),
            HostCall::Disconnect(ObserverId(0)),
            HostCall::Create(ObserverId(1)),
            HostCall::Observe(ObserverId(1), cards[1]),
            HostCall::Disconnect(ObserverId(1)),
            HostCall::Create(ObserverId(2)),
            HostCall::Observe(ObserverId(2), cards[2]),
        ]
    );
    assert_eq!(host.live_sessions(), 1);
    assert_eq!(host.observed_targets(ObserverId(2)), [cards[2]]);

    host.flush();
    assert!(!c.is_visible());
}

#[test]
fn replaced_before_first_report_waits_for_new_element() {
    let (host, cards) = page(3);
    let c = VisibilityController::new(host.clone(), ObservationOptions::new());
    // Card 0 would latch on the next flush, but is replaced first.
    c.attach(Some(cards[0]));
    c.attach(Some(cards[2]));
    host.flush();
    assert!(!c.is_visible());

    host.scroll_to(Point::new(0.0, 800.0));
    host.flush();
    assert!(c.is_visible());
}

#[test]
fn force_check_makes_host_report_again() {
    let (host, cards) = page(3);
    let reports = Rc::new(Cell::new(0));
    struct CountReports(Rc<Cell<u32>>);
    impl TraceSink for CountReports {
        fn on_intersection(&mut self, _: &IntersectionEvent) {
            self.0.set(self.0.get() + 1);
        }
    }

    let c = VisibilityController::new(host.clone(), ObservationOptions::new());
    c.set_trace_sink(CountReports(Rc::clone(&reports)));
    c.attach(Some(cards[2]));
    host.flush();
    assert_eq!(reports.get(), 1);

    // No movement: nothing to report.
    host.flush();
    assert_eq!(reports.get(), 1);

    c.force_check();
    host.flush();
    assert_eq!(reports.get(), 2);
    assert!(!c.is_visible());
    assert_eq!(host.sessions_created(), 1);
}

#[test]
fn force_visible_disconnects_and_stops_observing() {
    let (host, cards) = page(3);
    let c = VisibilityController::new(host.clone(), ObservationOptions::new());
    c.attach(Some(cards[2]));
    c.force_visible();
    assert!(c.is_visible());
    assert_eq!(host.live_sessions(), 0);

    c.attach(Some(cards[1]));
    host.flush();
    assert_eq!(host.sessions_created(), 1);
}

#[test]
fn initially_visible_controller_never_touches_host() {
    let (host, cards) = page(2);
    let c = VisibilityController::with_initial_visibility(
        host.clone(),
        ObservationOptions::new(),
        true,
    );
    c.attach(Some(cards[1]));
    c.force_check();
    host.flush();
    drop(c);
    assert!(host.calls().is_empty());
}

#[test]
fn threshold_change_resubscribes_only_on_value_change() {
    let (host, cards) = page(3);
    let c = VisibilityController::new(host.clone(), ObservationOptions::new().with_threshold(1.0));
    c.attach(Some(cards[2]));

    for _ in 0..3 {
        c.set_options(ObservationOptions::new().with_threshold(1.0));
    }
    assert_eq!(host.sessions_created(), 1);

    c.set_options(ObservationOptions::new().with_threshold(0.25));
    assert_eq!(host.sessions_created(), 2);
    assert_eq!(host.live_sessions(), 1);

    // Card 2 spans y=800..1200; at offset 300 a quarter of it is visible.
    host.scroll_to(Point::new(0.0, 300.0));
    host.flush();
    assert!(c.is_visible());
}

#[test]
fn visibility_listener_mounts_content_once() {
    let (host, cards) = page(3);
    let mounted = Rc::new(RefCell::new(Vec::new()));
    let cs = controllers(&host, &cards, &ObservationOptions::new());
    for (i, c) in cs.iter().enumerate() {
        let mounted = Rc::clone(&mounted);
        c.on_visible(move || mounted.borrow_mut().push(i));
    }

    host.flush();
    host.scroll_to(Point::new(0.0, 200.0));
    host.flush();
    host.scroll_to(Point::new(0.0, 600.0));
    host.flush();
    assert_eq!(*mounted.borrow(), [0, 1, 2]);
}

#[test]
fn dropping_controller_releases_session() {
    let (host, cards) = page(3);
    let c = VisibilityController::new(host.clone(), ObservationOptions::new());
    c.attach(Some(cards[2]));
    assert_eq!(host.live_sessions(), 1);
    drop(c);
    assert_eq!(host.live_sessions(), 0);
    assert_eq!(host.flush(), 0);
}

#[derive(Default)]
struct Lifecycle {
    events: Vec<String>,
    /// Session that was active when the latch closed.
    latched_during: Option<Option<SessionId>>,
}

impl TraceSink for Lifecycle {
    fn on_session_start(&mut self, e: &SessionStartEvent) {
        self.events.push(format!("start {}", e.session.0));
    }

    fn on_session_end(&mut self, e: &SessionEndEvent) {
        self.events.push(format!("end {} {:?}", e.session.0, e.cause));
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        self.events.push(format!("visible {:?}", e.cause));
        self.latched_during = Some(e.session);
    }
}

#[test]
fn trace_shows_teardown_before_each_new_session() {
    let (host, cards) = page(3);
    let log = Rc::new(RefCell::new(Lifecycle::default()));
    let c = VisibilityController::new(host.clone(), ObservationOptions::new());
    c.set_trace_sink(Rc::clone(&log));

    c.attach(Some(cards[2]));
    c.attach(Some(cards[1]));
    c.set_options(ObservationOptions::new().with_threshold(0.5));
    host.flush();

    assert_eq!(
        log.borrow().events,
        [
            "start 1",
            "end 1 ElementReplaced",
            "start 2",
            "end 2 ConfigChanged",
            "start 3",
            "visible Intersection",
            "end 3 Latched",
        ]
    );
    assert_eq!(c.visibility_cause(), Some(VisibilityCause::Intersection));
}

#[test]
fn dropping_controller_ends_session_as_disposed() {
    let (host, cards) = page(3);
    let log = Rc::new(RefCell::new(Lifecycle::default()));
    let c = VisibilityController::new(host.clone(), ObservationOptions::new());
    c.set_trace_sink(Rc::clone(&log));
    c.attach(Some(cards[2]));
    drop(c);

    assert_eq!(log.borrow().events, ["start 1", "end 1 Disposed"]);
    assert_eq!(host.live_sessions(), 0);
}

#[test]
fn rejected_config_leaves_no_session_behind() {
    let (host, cards) = page(3);
    let log = Rc::new(RefCell::new(Lifecycle::default()));
    let c = VisibilityController::new(
        host.clone(),
        ObservationOptions::new().with_root_margin("10em"),
    );
    c.set_trace_sink(Rc::clone(&log));

    let attached = catch_unwind(AssertUnwindSafe(|| c.attach(Some(cards[2]))));
    assert!(attached.is_err());
    assert!(!c.has_active_session());
    assert_eq!(c.active_session_id(), None);
    assert_eq!(host.live_sessions(), 0);
    assert!(log.borrow().events.is_empty());

    // The latch must not attribute itself to the session that never started.
    c.force_visible();
    assert!(c.is_visible());
    assert_eq!(log.borrow().latched_during, Some(None));
    assert_eq!(log.borrow().events, ["visible Forced"]);
}
