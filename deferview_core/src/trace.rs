// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the visibility controller.
//!
//! This module provides a [`TraceSink`] trait with one method per controller
//! event. All method bodies default to no-ops, so implementing only the events
//! you care about is fine.
//!
//! [`Tracer`] owns an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing (zero overhead) and an
//! installed sink is dropped. When **on**, each method performs a single
//! `Option` branch before dispatching.
//!
//! Sinks are moved into the controller. To read a sink back afterwards,
//! install an `Rc<RefCell<S>>` and keep a clone; the blanket impl below
//! forwards to the inner sink.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

// ---------------------------------------------------------------------------
// Identifiers and causes
// ---------------------------------------------------------------------------

/// Identifies one observation session of one controller.
///
/// Ids increase monotonically and are never reused within a controller.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionId(pub u64);

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

/// Why a session was started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StartCause {
    /// An element was attached where none was before.
    Attached,
    /// A different element replaced the observed one.
    ElementReplaced,
    /// The resolved configuration changed value.
    ConfigChanged,
}

/// Why a session was torn down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndCause {
    /// A different element is about to be observed.
    ElementReplaced,
    /// The observed element was detached.
    Detached,
    /// The resolved configuration changed value.
    ConfigChanged,
    /// The element was reported intersecting; observation is complete.
    Latched,
    /// Visibility was forced by the caller.
    Forced,
    /// The controller was disposed or dropped.
    Disposed,
}

/// How the visibility latch was closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisibilityCause {
    /// The controller was constructed visible.
    Initial,
    /// The host reported the element intersecting.
    Intersection,
    /// The caller forced visibility.
    Forced,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after a session has been created and told to observe its element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionStartEvent {
    /// The new session.
    pub session: SessionId,
    /// Why it was started.
    pub cause: StartCause,
}

/// Emitted after a session has been disconnected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionEndEvent {
    /// The session that ended.
    pub session: SessionId,
    /// Why it ended.
    pub cause: EndCause,
}

/// Emitted for every callback invocation, stale or not.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionEvent {
    /// Session the callback belongs to.
    pub session: SessionId,
    /// Number of records delivered.
    pub records: usize,
    /// `is_intersecting` of the first record, if any.
    pub is_intersecting: Option<bool>,
    /// `intersection_ratio` of the first record, if any.
    pub intersection_ratio: Option<f64>,
    /// `true` when the session had already been torn down; the records were
    /// ignored.
    pub stale: bool,
}

/// Emitted once, when the visibility latch closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibilityEvent {
    /// How the latch closed.
    pub cause: VisibilityCause,
    /// Active session at the time, if any.
    pub session: Option<SessionId>,
}

/// Emitted for every `force_check` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForceCheckEvent {
    /// Session that was re-subscribed, or `None` if the call was a no-op.
    pub session: Option<SessionId>,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a visibility controller.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a session starts.
    fn on_session_start(&mut self, e: &SessionStartEvent) {
        _ = e;
    }

    /// Called when a session ends.
    fn on_session_end(&mut self, e: &SessionEndEvent) {
        _ = e;
    }

    /// Called when a host callback arrives.
    fn on_intersection(&mut self, e: &IntersectionEvent) {
        _ = e;
    }

    /// Called when the visibility latch closes.
    fn on_visibility(&mut self, e: &VisibilityEvent) {
        _ = e;
    }

    /// Called on `force_check`.
    fn on_force_check(&mut self, e: &ForceCheckEvent) {
        _ = e;
    }
}

impl<T: TraceSink + ?Sized> TraceSink for Rc<RefCell<T>> {
    fn on_session_start(&mut self, e: &SessionStartEvent) {
        self.borrow_mut().on_session_start(e);
    }

    fn on_session_end(&mut self, e: &SessionEndEvent) {
        self.borrow_mut().on_session_end(e);
    }

    fn on_intersection(&mut self, e: &IntersectionEvent) {
        self.borrow_mut().on_intersection(e);
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        self.borrow_mut().on_visibility(e);
    }

    fn on_force_check(&mut self, e: &ForceCheckEvent) {
        self.borrow_mut().on_force_check(e);
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

/// Owner of an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to `sink`.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        let mut tracer = Self::none();
        tracer.set_sink(sink);
        tracer
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Replaces the sink.
    #[inline]
    pub fn set_sink(&mut self, sink: Box<dyn TraceSink>) {
        #[cfg(feature = "trace")]
        {
            self.sink = Some(sink);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
        }
    }

    /// Returns `true` if events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Emits a [`SessionStartEvent`].
    #[inline]
    pub fn session_start(&mut self, e: &SessionStartEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_session_start(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SessionEndEvent`].
    #[inline]
    pub fn session_end(&mut self, e: &SessionEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_session_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`IntersectionEvent`].
    #[inline]
    pub fn intersection(&mut self, e: &IntersectionEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_intersection(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`VisibilityEvent`].
    #[inline]
    pub fn visibility(&mut self, e: &VisibilityEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_visibility(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ForceCheckEvent`].
    #[inline]
    pub fn force_check(&mut self, e: &ForceCheckEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_force_check(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}
