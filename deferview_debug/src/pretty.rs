// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). An optional
//! label prefixes every line so several controllers can share one stream.

use std::io::Write;

use deferview_core::trace::{
    EndCause, ForceCheckEvent, IntersectionEvent, SessionEndEvent, SessionStartEvent, StartCause,
    TraceSink, VisibilityCause, VisibilityEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    label: Option<String>,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            label: None,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            label: None,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            label: None,
        }
    }

    /// Prefixes every line with `label`.
    #[must_use]
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn prefix(&self) -> String {
        match &self.label {
            Some(label) => format!("{label} "),
            None => String::new(),
        }
    }
}

fn start_name(cause: StartCause) -> &'static str {
    match cause {
        StartCause::Attached => "attached",
        StartCause::ElementReplaced => "replaced",
        StartCause::ConfigChanged => "config",
    }
}

fn end_name(cause: EndCause) -> &'static str {
    match cause {
        EndCause::ElementReplaced => "replaced",
        EndCause::Detached => "detached",
        EndCause::ConfigChanged => "config",
        EndCause::Latched => "latched",
        EndCause::Forced => "forced",
        EndCause::Disposed => "disposed",
    }
}

fn visibility_name(cause: VisibilityCause) -> &'static str {
    match cause {
        VisibilityCause::Initial => "initial",
        VisibilityCause::Intersection => "intersection",
        VisibilityCause::Forced => "forced",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_session_start(&mut self, e: &SessionStartEvent) {
        let prefix = self.prefix();
        let _ = writeln!(
            self.writer,
            "{prefix}[session:start] id={} cause={}",
            e.session.0,
            start_name(e.cause),
        );
    }

    fn on_session_end(&mut self, e: &SessionEndEvent) {
        let prefix = self.prefix();
        let _ = writeln!(
            self.writer,
            "{prefix}[session:end] id={} cause={}",
            e.session.0,
            end_name(e.cause),
        );
    }

    fn on_intersection(&mut self, e: &IntersectionEvent) {
        let prefix = self.prefix();
        let hit = match e.is_intersecting {
            Some(true) => "yes",
            Some(false) => "no",
            None => "?",
        };
        let stale = if e.stale { " STALE" } else { "" };
        let _ = writeln!(
            self.writer,
            "{prefix}[report] id={} records={} intersecting={hit} ratio={:.3}{stale}",
            e.session.0,
            e.records,
            e.intersection_ratio.unwrap_or(0.0),
        );
    }

    fn on_visibility(&mut self, e: &VisibilityEvent) {
        let prefix = self.prefix();
        match e.session {
            Some(id) => {
                let _ = writeln!(
                    self.writer,
                    "{prefix}[visible] cause={} id={}",
                    visibility_name(e.cause),
                    id.0,
                );
            }
            None => {
                let _ = writeln!(
                    self.writer,
                    "{prefix}[visible] cause={}",
                    visibility_name(e.cause),
                );
            }
        }
    }

    fn on_force_check(&mut self, e: &ForceCheckEvent) {
        let prefix = self.prefix();
        let _ = match e.session {
            Some(id) => writeln!(self.writer, "{prefix}[force_check] id={}", id.0),
            None => writeln!(self.writer, "{prefix}[force_check] idle"),
        };
    }
}
