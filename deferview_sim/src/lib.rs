// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated intersection host.
//!
//! [`SimHost`] implements [`IntersectionHost`] over an in-memory page: a
//! viewport of fixed size, a scroll offset, and element rectangles in document
//! coordinates. Nothing happens on its own; call [`SimHost::flush`] to run one
//! "update intersection observations" step, which computes intersections with
//! [`deferview_core::geometry`] and delivers queued records, the way a browser
//! does once per rendering update.
//!
//! The host keeps an ordered [`HostCall`] log so tests can check the order in
//! which sessions were created, observed and disconnected.
//!
//! ```
//! use deferview_core::{ObservationOptions, VisibilityController};
//! use deferview_sim::SimHost;
//! use kurbo::{Point, Rect, Size};
//!
//! let host = SimHost::new(Size::new(800.0, 600.0));
//! let card = host.add_element(Rect::new(0.0, 1000.0, 800.0, 1200.0));
//!
//! let controller = VisibilityController::new(host.clone(), ObservationOptions::new());
//! controller.attach(Some(card));
//! host.flush();
//! assert!(!controller.is_visible());
//!
//! host.scroll_to(Point::new(0.0, 700.0));
//! host.flush();
//! assert!(controller.is_visible());
//! ```

#![no_std]

extern crate alloc;

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use deferview_core::config::ObservationConfig;
use deferview_core::geometry::{RootMargin, compute_intersection, threshold_index};
use deferview_core::host::{
    IntersectionCallback, IntersectionHost, IntersectionRecord, ObserverSession,
};
use kurbo::{Point, Rect, Size, Vec2};

/// Handle to an element of the simulated page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimElement(pub u32);

/// Identifies one session created by a [`SimHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(pub u32);

/// One call made on the host, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostCall {
    /// A session was created.
    Create(ObserverId),
    /// A session started observing an element.
    Observe(ObserverId, SimElement),
    /// A session stopped observing an element.
    Unobserve(ObserverId, SimElement),
    /// A session was disconnected.
    Disconnect(ObserverId),
}

struct Target {
    element: SimElement,
    /// `None` until the first report, so the first update always reports.
    previous_index: Option<usize>,
    previous_intersecting: bool,
}

struct SimObserver {
    callback: Option<IntersectionCallback<SimElement>>,
    root: Option<SimElement>,
    margin: RootMargin,
    thresholds: Vec<f64>,
    targets: Vec<Target>,
    connected: bool,
}

struct World {
    viewport: Size,
    scroll: Vec2,
    elements: Vec<Option<Rect>>,
    observers: Vec<SimObserver>,
    calls: Vec<HostCall>,
}

impl World {
    fn rect(&self, element: SimElement) -> Option<Rect> {
        self.elements.get(element.0 as usize).copied().flatten()
    }

    fn observer_mut(&mut self, id: ObserverId) -> &mut SimObserver {
        &mut self.observers[id.0 as usize]
    }

    /// Runs the per-observer update and returns the records to deliver.
    fn collect(&mut self) -> Vec<(ObserverId, Vec<IntersectionRecord<SimElement>>)> {
        let viewport = Rect::from_origin_size(Point::ORIGIN, self.viewport);
        let scroll = self.scroll;
        let elements = &self.elements;
        let rect_of = |e: SimElement| {
            elements
                .get(e.0 as usize)
                .copied()
                .flatten()
                .map(|r| r - scroll)
        };

        let mut batches = Vec::new();
        for (index, observer) in self.observers.iter_mut().enumerate() {
            if !observer.connected || observer.targets.is_empty() {
                continue;
            }
            let root = match observer.root {
                Some(root) => rect_of(root),
                None => Some(viewport),
            };
            let mut records = Vec::new();
            for target in &mut observer.targets {
                let (is_intersecting, ratio) = match (rect_of(target.element), root) {
                    (Some(rect), Some(root)) => {
                        let g = compute_intersection(rect, root, observer.margin.resolve(root));
                        (g.is_intersecting, g.intersection_ratio)
                    }
                    _ => (false, 0.0),
                };
                let index = if is_intersecting {
                    threshold_index(ratio, &observer.thresholds)
                } else {
                    0
                };
                if target.previous_index != Some(index)
                    || target.previous_intersecting != is_intersecting
                {
                    target.previous_index = Some(index);
                    target.previous_intersecting = is_intersecting;
                    records.push(IntersectionRecord {
                        target: target.element,
                        is_intersecting,
                        intersection_ratio: ratio,
                    });
                }
            }
            if !records.is_empty() {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "observer count is bounded by ObserverId's u32 range"
                )]
                batches.push((ObserverId(index as u32), records));
            }
        }
        batches
    }
}

/// A simulated page that implements [`IntersectionHost`].
///
/// Cloning yields another handle to the same page.
#[derive(Clone)]
pub struct SimHost {
    world: Rc<RefCell<World>>,
}

impl fmt::Debug for SimHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let world = self.world.borrow();
        f.debug_struct("SimHost")
            .field("viewport", &world.viewport)
            .field("scroll", &world.scroll)
            .field("elements", &world.elements.len())
            .field("observers", &world.observers.len())
            .finish_non_exhaustive()
    }
}

impl SimHost {
    /// Creates an empty page with the given viewport size, scrolled to the
    /// top.
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        Self {
            world: Rc::new(RefCell::new(World {
                viewport,
                scroll: Vec2::ZERO,
                elements: Vec::new(),
                observers: Vec::new(),
                calls: Vec::new(),
            })),
        }
    }

    /// Adds an element at `rect` (document coordinates).
    pub fn add_element(&self, rect: Rect) -> SimElement {
        let mut world = self.world.borrow_mut();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "simulated pages stay far below u32::MAX elements"
        )]
        let element = SimElement(world.elements.len() as u32);
        world.elements.push(Some(rect));
        element
    }

    /// Moves or resizes an element. Ignored for removed elements.
    pub fn set_element_rect(&self, element: SimElement, rect: Rect) {
        let mut world = self.world.borrow_mut();
        if let Some(slot) = world.elements.get_mut(element.0 as usize)
            && slot.is_some()
        {
            *slot = Some(rect);
        }
    }

    /// Removes an element. Observers watching it report it as not
    /// intersecting.
    pub fn remove_element(&self, element: SimElement) {
        if let Some(slot) = self.world.borrow_mut().elements.get_mut(element.0 as usize) {
            *slot = None;
        }
    }

    /// Returns an element's rectangle in document coordinates.
    #[must_use]
    pub fn element_rect(&self, element: SimElement) -> Option<Rect> {
        self.world.borrow().rect(element)
    }

    /// Resizes the viewport.
    pub fn set_viewport(&self, viewport: Size) {
        self.world.borrow_mut().viewport = viewport;
    }

    /// Scrolls so that `offset` is the document point at the viewport's
    /// top-left corner.
    pub fn scroll_to(&self, offset: Point) {
        self.world.borrow_mut().scroll = offset.to_vec2();
    }

    /// Scrolls by `delta`.
    pub fn scroll_by(&self, delta: Vec2) {
        self.world.borrow_mut().scroll += delta;
    }

    /// Returns the current scroll offset.
    #[must_use]
    pub fn scroll_offset(&self) -> Point {
        self.world.borrow().scroll.to_point()
    }

    /// Runs one observation update and delivers the resulting records.
    ///
    /// Each observer with changes gets one callback invocation. Observers
    /// disconnected by an earlier callback in the same flush are skipped.
    /// Returns the number of callbacks invoked.
    pub fn flush(&self) -> usize {
        let batches = self.world.borrow_mut().collect();
        let mut delivered = 0;
        for (id, records) in batches {
            let callback = {
                let mut world = self.world.borrow_mut();
                let observer = world.observer_mut(id);
                if observer.connected {
                    observer.callback.take()
                } else {
                    None
                }
            };
            let Some(mut callback) = callback else {
                continue;
            };
            callback(&records);
            delivered += 1;

            // Dropped outside the borrow: a callback may own the last handle
            // to something that talks to this host when it goes away.
            let leftover = {
                let mut world = self.world.borrow_mut();
                let observer = world.observer_mut(id);
                if observer.connected && observer.callback.is_none() {
                    observer.callback = Some(callback);
                    None
                } else {
                    Some(callback)
                }
            };
            drop(leftover);
        }
        delivered
    }

    /// Returns every call made on this host so far.
    #[must_use]
    pub fn calls(&self) -> Vec<HostCall> {
        self.world.borrow().calls.clone()
    }

    /// Returns how many sessions have been created.
    #[must_use]
    pub fn sessions_created(&self) -> usize {
        self.world.borrow().observers.len()
    }

    /// Returns how many sessions are still connected.
    #[must_use]
    pub fn live_sessions(&self) -> usize {
        self.world
            .borrow()
            .observers
            .iter()
            .filter(|o| o.connected)
            .count()
    }

    /// Returns the elements a session currently observes.
    #[must_use]
    pub fn observed_targets(&self, id: ObserverId) -> Vec<SimElement> {
        self.world
            .borrow()
            .observers
            .get(id.0 as usize)
            .map(|o| o.targets.iter().map(|t| t.element).collect())
            .unwrap_or_default()
    }
}

impl IntersectionHost for SimHost {
    type Element = SimElement;
    type Session = SimSession;

    /// Creates a session.
    ///
    /// # Panics
    ///
    /// Panics if a threshold lies outside `[0, 1]` or the root margin does
    /// not parse, mirroring the exception a browser throws from the
    /// `IntersectionObserver` constructor.
    fn create(
        &self,
        config: &ObservationConfig<SimElement>,
        callback: IntersectionCallback<SimElement>,
    ) -> SimSession {
        if let Err(err) = config.threshold.validate() {
            panic!("RangeError: {err}");
        }
        let margin = match RootMargin::parse(&config.root_margin) {
            Ok(margin) => margin,
            Err(err) => panic!("SyntaxError: {err}"),
        };

        let mut world = self.world.borrow_mut();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "session count is bounded by ObserverId's u32 range"
        )]
        let id = ObserverId(world.observers.len() as u32);
        world.observers.push(SimObserver {
            callback: Some(callback),
            root: config.root,
            margin,
            thresholds: config.threshold.sorted(),
            targets: Vec::new(),
            connected: true,
        });
        world.calls.push(HostCall::Create(id));
        SimSession {
            world: Rc::clone(&self.world),
            id,
        }
    }
}

/// A session created by [`SimHost`].
pub struct SimSession {
    world: Rc<RefCell<World>>,
    id: ObserverId,
}

impl fmt::Debug for SimSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimSession")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl SimSession {
    /// Returns this session's id.
    #[must_use]
    pub fn id(&self) -> ObserverId {
        self.id
    }
}

impl ObserverSession<SimElement> for SimSession {
    fn observe(&self, target: &SimElement) {
        let mut world = self.world.borrow_mut();
        world.calls.push(HostCall::Observe(self.id, *target));
        let observer = world.observer_mut(self.id);
        if observer.connected && !observer.targets.iter().any(|t| t.element == *target) {
            observer.targets.push(Target {
                element: *target,
                previous_index: None,
                previous_intersecting: false,
            });
        }
    }

    fn unobserve(&self, target: &SimElement) {
        let mut world = self.world.borrow_mut();
        world.calls.push(HostCall::Unobserve(self.id, *target));
        world
            .observer_mut(self.id)
            .targets
            .retain(|t| t.element != *target);
    }

    fn disconnect(&self) {
        let callback = {
            let mut world = self.world.borrow_mut();
            world.calls.push(HostCall::Disconnect(self.id));
            let observer = world.observer_mut(self.id);
            observer.connected = false;
            observer.targets.clear();
            observer.callback.take()
        };
        drop(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;
    use alloc::vec;
    use core::cell::Cell;
    use deferview_core::config::ObservationOptions;

    fn counting_callback(
        hits: &Rc<RefCell<Vec<(SimElement, bool, f64)>>>,
    ) -> IntersectionCallback<SimElement> {
        let hits = Rc::clone(hits);
        Box::new(move |records: &[IntersectionRecord<SimElement>]| {
            for r in records {
                hits.borrow_mut()
                    .push((r.target, r.is_intersecting, r.intersection_ratio));
            }
        })
    }

    fn config(threshold: f64) -> ObservationConfig<SimElement> {
        ObservationOptions::new().with_threshold(threshold).resolve()
    }

    #[test]
    fn first_flush_reports_initial_state() {
        let host = SimHost::new(Size::new(100.0, 100.0));
        let below = host.add_element(Rect::new(0.0, 200.0, 100.0, 300.0));
        let hits = Rc::new(RefCell::new(Vec::new()));
        let session = host.create(&config(0.0), counting_callback(&hits));
        session.observe(&below);

        assert_eq!(host.flush(), 1);
        assert_eq!(*hits.borrow(), vec![(below, false, 0.0)]);

        // Nothing changed, nothing reported.
        assert_eq!(host.flush(), 0);
    }

    #[test]
    fn reports_threshold_crossings_while_scrolling() {
        let host = SimHost::new(Size::new(100.0, 100.0));
        let el = host.add_element(Rect::new(0.0, 150.0, 100.0, 250.0));
        let hits = Rc::new(RefCell::new(Vec::new()));
        let session = host.create(
            &ObservationOptions::new()
                .with_thresholds(vec![0.0, 0.5, 1.0])
                .resolve(),
            counting_callback(&hits),
        );
        session.observe(&el);
        host.flush();

        host.scroll_to(Point::new(0.0, 100.0));
        host.flush();
        // 0.6 stays between the 0.5 and 1.0 thresholds: no report.
        host.scroll_by(Vec2::new(0.0, 10.0));
        assert_eq!(host.flush(), 0);
        host.scroll_to(Point::new(0.0, 150.0));
        host.flush();

        assert_eq!(
            *hits.borrow(),
            vec![(el, false, 0.0), (el, true, 0.5), (el, true, 1.0)]
        );
        assert_eq!(host.scroll_offset(), Point::new(0.0, 150.0));
    }

    #[test]
    fn disconnect_drops_pending_and_future_reports() {
        let host = SimHost::new(Size::new(100.0, 100.0));
        let el = host.add_element(Rect::new(0.0, 0.0, 10.0, 10.0));
        let hits = Rc::new(RefCell::new(Vec::new()));
        let session = host.create(&config(1.0), counting_callback(&hits));
        session.observe(&el);
        session.disconnect();

        assert_eq!(host.flush(), 0);
        assert!(hits.borrow().is_empty());
        assert_eq!(host.live_sessions(), 0);
        assert_eq!(
            host.calls(),
            vec![
                HostCall::Create(ObserverId(0)),
                HostCall::Observe(ObserverId(0), el),
                HostCall::Disconnect(ObserverId(0)),
            ]
        );
    }

    #[test]
    fn reobserve_reports_again() {
        let host = SimHost::new(Size::new(100.0, 100.0));
        let el = host.add_element(Rect::new(0.0, 0.0, 10.0, 10.0));
        let hits = Rc::new(RefCell::new(Vec::new()));
        let session = host.create(&config(1.0), counting_callback(&hits));
        session.observe(&el);
        host.flush();
        session.unobserve(&el);
        session.observe(&el);
        host.flush();
        assert_eq!(hits.borrow().len(), 2);
        assert_eq!(host.observed_targets(session.id()), vec![el]);
    }

    #[test]
    fn explicit_root_and_margin_are_honored() {
        let host = SimHost::new(Size::new(1000.0, 1000.0));
        let scroller = host.add_element(Rect::new(0.0, 0.0, 100.0, 100.0));
        let el = host.add_element(Rect::new(0.0, 120.0, 100.0, 220.0));
        let hits = Rc::new(RefCell::new(Vec::new()));

        let plain = host.create(
            &ObservationOptions::new()
                .with_root(scroller)
                .with_threshold(0.0)
                .resolve(),
            counting_callback(&hits),
        );
        plain.observe(&el);
        host.flush();
        assert_eq!(hits.borrow().last(), Some(&(el, false, 0.0)));

        let grown = host.create(
            &ObservationOptions::new()
                .with_root(scroller)
                .with_root_margin("50%")
                .with_threshold(0.0)
                .resolve(),
            counting_callback(&hits),
        );
        grown.observe(&el);
        host.flush();
        assert_eq!(hits.borrow().last(), Some(&(el, true, 0.3)));
    }

    #[test]
    fn removed_element_reports_not_intersecting() {
        let host = SimHost::new(Size::new(100.0, 100.0));
        let el = host.add_element(Rect::new(0.0, 0.0, 10.0, 10.0));
        let hits = Rc::new(RefCell::new(Vec::new()));
        let session = host.create(&config(0.0), counting_callback(&hits));
        session.observe(&el);
        host.flush();
        host.remove_element(el);
        host.flush();
        assert_eq!(*hits.borrow(), vec![(el, true, 1.0), (el, false, 0.0)]);
        assert_eq!(host.element_rect(el), None);
    }

    #[test]
    fn callback_may_disconnect_its_own_session() {
        let host = SimHost::new(Size::new(100.0, 100.0));
        let el = host.add_element(Rect::new(0.0, 0.0, 10.0, 10.0));
        let slot: Rc<RefCell<Option<SimSession>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let (slot2, calls2) = (Rc::clone(&slot), Rc::clone(&calls));
        let session = host.create(
            &config(1.0),
            Box::new(move |_: &[IntersectionRecord<SimElement>]| {
                calls2.set(calls2.get() + 1);
                if let Some(s) = slot2.borrow().as_ref() {
                    s.disconnect();
                }
            }),
        );
        session.observe(&el);
        *slot.borrow_mut() = Some(session);

        assert_eq!(host.flush(), 1);
        host.scroll_to(Point::new(0.0, 50.0));
        assert_eq!(host.flush(), 0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    #[should_panic(expected = "RangeError")]
    fn out_of_range_threshold_panics_at_create() {
        let host = SimHost::new(Size::new(100.0, 100.0));
        let hits = Rc::new(RefCell::new(Vec::new()));
        let _session = host.create(&config(1.5), counting_callback(&hits));
    }

    #[test]
    #[should_panic(expected = "SyntaxError")]
    fn malformed_margin_panics_at_create() {
        let host = SimHost::new(Size::new(100.0, 100.0));
        let hits = Rc::new(RefCell::new(Vec::new()));
        let _session = host.create(
            &ObservationOptions::new().with_root_margin("1em").resolve(),
            counting_callback(&hits),
        );
    }
}
