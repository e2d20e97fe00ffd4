// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The visibility controller.
//!
//! [`VisibilityController`] tracks one element at a time and latches a
//! `visible` flag the first time the host reports that element intersecting.
//! It owns at most one observation session, created through an
//! [`IntersectionHost`], and tears it down as soon as it is no longer needed.
//!
//! # State machine
//!
//! ```text
//!                attach(Some(e))            callback: intersecting
//!   Idle ───────────────────────► Observing ───────────────────────► Visible
//!    ▲  ◄─────────────────────────  │  ▲                               ▲
//!    │       attach(None)           │  │ attach(Some(e2)),             │
//!    │                              │  │ set_options(different)        │
//!    │                              └──┘ (teardown, then new session)  │
//!    └─────────────────────── force_visible() ─────────────────────────┘
//! ```
//!
//! `Visible` is terminal: no session is ever started again and the flag never
//! reverts. `dispose()` (or dropping the controller) tears the session down
//! and stops the machine wherever it is.
//!
//! # Stale callbacks
//!
//! Each session callback carries the [`SessionId`] it was created for. A
//! callback whose session is no longer the active one is ignored, so a host
//! that delivers late (or delivers synchronously from inside `observe`)
//! cannot change state after teardown.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::config::{ObservationConfig, ObservationOptions};
use crate::host::{IntersectionHost, IntersectionRecord, ObserverSession};
use crate::trace::{
    EndCause, ForceCheckEvent, IntersectionEvent, SessionEndEvent, SessionId, SessionStartEvent,
    StartCause, TraceSink, Tracer, VisibilityCause, VisibilityEvent,
};

type Listener = Box<dyn FnOnce()>;

/// Tracks visibility of one observed element through a host's intersection
/// facility.
///
/// See the [module documentation](self) for the state machine.
pub struct VisibilityController<H: IntersectionHost> {
    inner: Rc<Inner<H>>,
}

struct ActiveSession<S> {
    id: SessionId,
    handle: Rc<S>,
}

struct Inner<H: IntersectionHost> {
    host: H,
    options: RefCell<ObservationOptions<H::Element>>,
    config: RefCell<ObservationConfig<H::Element>>,
    element: RefCell<Option<H::Element>>,
    visible: Cell<bool>,
    cause: Cell<Option<VisibilityCause>>,
    disposed: Cell<bool>,
    /// Id of the session whose callbacks are honored. Set before the host
    /// sees the session, cleared by teardown.
    active_id: Cell<Option<SessionId>>,
    session: RefCell<Option<ActiveSession<H::Session>>>,
    next_id: Cell<u64>,
    listeners: RefCell<Vec<Listener>>,
    tracer: RefCell<Tracer>,
}

impl<H: IntersectionHost + 'static> VisibilityController<H> {
    /// Creates a controller that is not yet visible and observes nothing.
    #[must_use]
    pub fn new(host: H, options: ObservationOptions<H::Element>) -> Self {
        Self::with_initial_visibility(host, options, false)
    }

    /// Creates a controller, optionally starting in the forced-visible state.
    ///
    /// A controller created visible never starts an observation session.
    #[must_use]
    pub fn with_initial_visibility(
        host: H,
        options: ObservationOptions<H::Element>,
        initially_visible: bool,
    ) -> Self {
        let config = options.resolve();
        let inner = Rc::new(Inner {
            host,
            options: RefCell::new(options),
            config: RefCell::new(config),
            element: RefCell::new(None),
            visible: Cell::new(initially_visible),
            cause: Cell::new(initially_visible.then_some(VisibilityCause::Initial)),
            disposed: Cell::new(false),
            active_id: Cell::new(None),
            session: RefCell::new(None),
            next_id: Cell::new(1),
            listeners: RefCell::new(Vec::new()),
            tracer: RefCell::new(Tracer::none()),
        });
        Self { inner }
    }

    /// Installs a trace sink. Events are only delivered with the `trace`
    /// feature enabled.
    pub fn set_trace_sink(&self, sink: impl TraceSink + 'static) {
        self.inner.tracer.borrow_mut().set_sink(Box::new(sink));
    }

    /// Registers `element` as the observed element.
    ///
    /// - Attaching the element that is already observed does nothing.
    /// - Attaching a different element tears down the current session before
    ///   starting one for the new element.
    /// - Attaching `None` forgets the current element and tears down its
    ///   session; no session is started.
    ///
    /// While visible or disposed, the element is recorded but never observed.
    pub fn attach(&self, element: Option<H::Element>) {
        let inner = &self.inner;
        let previous = inner.element.replace(element.clone());
        if previous == element {
            return;
        }
        match element {
            None => Inner::teardown(inner, EndCause::Detached),
            Some(_) => {
                let (end, start) = if previous.is_some() {
                    (EndCause::ElementReplaced, StartCause::ElementReplaced)
                } else {
                    (EndCause::Detached, StartCause::Attached)
                };
                Inner::teardown(inner, end);
                Inner::start_session(inner, start);
            }
        }
    }

    /// Forgets the observed element. Same as `attach(None)`.
    pub fn detach(&self) {
        self.attach(None);
    }

    /// Replaces the observation options.
    ///
    /// The session is re-created only when the resolved configuration differs
    /// by value from the current one.
    pub fn set_options(&self, options: ObservationOptions<H::Element>) {
        let inner = &self.inner;
        let config = options.resolve();
        *inner.options.borrow_mut() = options;
        if *inner.config.borrow() == config {
            return;
        }
        *inner.config.borrow_mut() = config;
        if inner.element.borrow().is_some() {
            Inner::teardown(inner, EndCause::ConfigChanged);
            Inner::start_session(inner, StartCause::ConfigChanged);
        }
    }

    /// Returns the latched visibility.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.inner.visible.get()
    }

    /// Returns how the latch closed, or `None` while not visible.
    #[must_use]
    pub fn visibility_cause(&self) -> Option<VisibilityCause> {
        self.inner.cause.get()
    }

    /// Makes the controller visible now and tears down any active session.
    ///
    /// Idempotent.
    pub fn force_visible(&self) {
        let inner = &self.inner;
        Inner::latch(inner, VisibilityCause::Forced);
        Inner::teardown(inner, EndCause::Forced);
    }

    /// Asks the host to re-evaluate the observed element.
    ///
    /// Unobserves and re-observes the element on the active session so the
    /// host delivers a fresh record. Does nothing without an active session,
    /// and never changes visibility by itself.
    pub fn force_check(&self) {
        let inner = &self.inner;
        let active = inner
            .session
            .borrow()
            .as_ref()
            .map(|s| (s.id, Rc::clone(&s.handle)));
        let element = inner.element.borrow().clone();

        let session = match (active, element) {
            (Some((id, handle)), Some(element)) => {
                handle.unobserve(&element);
                handle.observe(&element);
                Some(id)
            }
            _ => None,
        };
        inner
            .tracer
            .borrow_mut()
            .force_check(&ForceCheckEvent { session });
    }

    /// Runs `listener` once the controller becomes visible.
    ///
    /// Runs it immediately if already visible. Listeners registered after
    /// [`dispose`](Self::dispose) are dropped.
    pub fn on_visible(&self, listener: impl FnOnce() + 'static) {
        let inner = &self.inner;
        if inner.visible.get() {
            listener();
        } else if !inner.disposed.get() {
            inner.listeners.borrow_mut().push(Box::new(listener));
        }
    }

    /// Returns the observed element, if any.
    #[must_use]
    pub fn observed_element(&self) -> Option<H::Element> {
        self.inner.element.borrow().clone()
    }

    /// Returns `true` while an observation session is active.
    #[must_use]
    pub fn has_active_session(&self) -> bool {
        self.inner.session.borrow().is_some()
    }

    /// Returns the id of the active session, if any.
    #[must_use]
    pub fn active_session_id(&self) -> Option<SessionId> {
        self.inner.session.borrow().as_ref().map(|s| s.id)
    }

    /// Returns a copy of the caller options last supplied.
    #[must_use]
    pub fn options(&self) -> ObservationOptions<H::Element> {
        self.inner.options.borrow().clone()
    }

    /// Returns a copy of the resolved configuration new sessions use.
    #[must_use]
    pub fn config(&self) -> ObservationConfig<H::Element> {
        self.inner.config.borrow().clone()
    }

    /// Returns the host this controller creates sessions with.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.inner.host
    }

    /// Tears down the active session and stops observing for good.
    ///
    /// Pending [`on_visible`](Self::on_visible) listeners are dropped.
    /// Visibility is left as it is. Idempotent; also run on drop.
    pub fn dispose(&self) {
        let inner = &self.inner;
        if inner.disposed.replace(true) {
            return;
        }
        Inner::teardown(inner, EndCause::Disposed);
        let dropped = core::mem::take(&mut *inner.listeners.borrow_mut());
        drop(dropped);
    }

    /// Returns `true` after [`dispose`](Self::dispose).
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl<H: IntersectionHost + 'static> Inner<H> {
    fn start_session(this: &Rc<Self>, cause: StartCause) {
        if this.disposed.get() || this.visible.get() {
            return;
        }
        let Some(element) = this.element.borrow().clone() else {
            return;
        };

        let id = SessionId(this.next_id.get());
        this.next_id.set(id.0 + 1);

        let weak: Weak<Self> = Rc::downgrade(this);
        let callback = Box::new(move |records: &[IntersectionRecord<H::Element>]| {
            if let Some(inner) = weak.upgrade() {
                Self::on_records(&inner, id, records);
            }
        });
        let config = this.config.borrow().clone();
        let handle = Rc::new(this.host.create(&config, callback));
        // Only claim the slot once the host accepted the config.
        this.active_id.set(Some(id));
        this.tracer
            .borrow_mut()
            .session_start(&SessionStartEvent { session: id, cause });
        handle.observe(&element);

        // A host may report synchronously from `observe`; if that closed the
        // latch (or anything else tore the session down) it must not be kept.
        if this.active_id.get() != Some(id) {
            handle.disconnect();
            this.tracer.borrow_mut().session_end(&SessionEndEvent {
                session: id,
                cause: EndCause::Latched,
            });
            return;
        }

        *this.session.borrow_mut() = Some(ActiveSession { id, handle });
    }

    fn on_records(this: &Rc<Self>, id: SessionId, records: &[IntersectionRecord<H::Element>]) {
        let first = records.first();
        let stale = this.active_id.get() != Some(id);
        this.tracer.borrow_mut().intersection(&IntersectionEvent {
            session: id,
            records: records.len(),
            is_intersecting: first.map(|r| r.is_intersecting),
            intersection_ratio: first.map(|r| r.intersection_ratio),
            stale,
        });
        if stale {
            return;
        }
        if first.is_some_and(|r| r.is_intersecting) {
            Self::latch(this, VisibilityCause::Intersection);
            Self::teardown(this, EndCause::Latched);
        }
    }
}

impl<H: IntersectionHost> Inner<H> {
    fn teardown(this: &Self, cause: EndCause) {
        this.active_id.set(None);
        let taken = this.session.borrow_mut().take();
        if let Some(session) = taken {
            session.handle.disconnect();
            this.tracer.borrow_mut().session_end(&SessionEndEvent {
                session: session.id,
                cause,
            });
        }
    }

    fn latch(this: &Self, cause: VisibilityCause) {
        if this.visible.replace(true) {
            return;
        }
        this.cause.set(Some(cause));
        let session = this.active_id.get();
        // Closing the latch ends observation; later callbacks are stale even
        // before the session is formally torn down.
        this.active_id.set(None);
        this.tracer
            .borrow_mut()
            .visibility(&VisibilityEvent { cause, session });

        let listeners = core::mem::take(&mut *this.listeners.borrow_mut());
        for listener in listeners {
            listener();
        }
    }
}

impl<H: IntersectionHost> Drop for VisibilityController<H> {
    fn drop(&mut self) {
        let inner = &self.inner;
        if !inner.disposed.replace(true) {
            Inner::teardown(inner, EndCause::Disposed);
        }
    }
}

impl<H: IntersectionHost> fmt::Debug for VisibilityController<H>
where
    H::Element: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("VisibilityController")
            .field("element", &inner.element.borrow())
            .field("visible", &inner.visible.get())
            .field("cause", &inner.cause.get())
            .field("disposed", &inner.disposed.get())
            .field(
                "session",
                &inner.session.borrow().as_ref().map(|s| s.id),
            )
            .finish_non_exhaustive()
    }
}
