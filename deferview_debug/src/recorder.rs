// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and appends every event, in the
//! order it was emitted, as a [`RecordedEvent`]. Install it behind an
//! `Rc<RefCell<_>>` to read the recording back while the controller is alive.

use deferview_core::trace::{
    ForceCheckEvent, IntersectionEvent, SessionEndEvent, SessionId, SessionStartEvent, TraceSink,
    VisibilityEvent,
};

// ---------------------------------------------------------------------------
// RecordedEvent
// ---------------------------------------------------------------------------

/// One recorded trace event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`SessionStartEvent`].
    SessionStart(SessionStartEvent),
    /// A [`SessionEndEvent`].
    SessionEnd(SessionEndEvent),
    /// An [`IntersectionEvent`].
    Intersection(IntersectionEvent),
    /// A [`VisibilityEvent`].
    Visibility(VisibilityEvent),
    /// A [`ForceCheckEvent`].
    ForceCheck(ForceCheckEvent),
}

impl RecordedEvent {
    /// Short stable name of the event kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionStart(_) => "SessionStart",
            Self::SessionEnd(_) => "SessionEnd",
            Self::Intersection(_) => "Intersection",
            Self::Visibility(_) => "Visibility",
            Self::ForceCheck(_) => "ForceCheck",
        }
    }

    /// Session the event refers to, if any.
    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        match self {
            Self::SessionStart(e) => Some(e.session),
            Self::SessionEnd(e) => Some(e.session),
            Self::Intersection(e) => Some(e.session),
            Self::Visibility(e) => e.session,
            Self::ForceCheck(e) => e.session,
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events in emission order.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Discards the recording.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Consumes the recorder and returns the events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }
}

impl TraceSink for RecorderSink {
    fn on_session_start(&mut self, e: &SessionStartEvent) {
        self.events.push(RecordedEvent::SessionStart(*e));
    }

    fn on_session_end(&mut self, e: &SessionEndEvent) {
        self.events.push(RecordedEvent::SessionEnd(*e));
    }

    fn on_intersection(&mut self, e: &IntersectionEvent) {
        self.events.push(RecordedEvent::Intersection(*e));
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        self.events.push(RecordedEvent::Visibility(*e));
    }

    fn on_force_check(&mut self, e: &ForceCheckEvent) {
        self.events.push(RecordedEvent::ForceCheck(*e));
    }
}
