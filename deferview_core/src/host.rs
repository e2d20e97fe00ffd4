// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for intersection observation.
//!
//! Deferview does not observe anything itself. Each *host* crate wraps a
//! platform facility that reports when an element intersects a root
//! (`IntersectionObserver` in the browser, a geometric simulation in tests)
//! and exposes it through two traits:
//!
//! - [`IntersectionHost`] creates observation sessions from a resolved
//!   [`ObservationConfig`] and a callback.
//! - [`ObserverSession`] is the handle for one session: it starts and stops
//!   observing targets and releases everything on
//!   [`disconnect`](ObserverSession::disconnect).
//!
//! # Host obligations
//!
//! - Callbacks are delivered on the host's event thread, never concurrently.
//! - After `disconnect` returns, the session's callback is not invoked again.
//!   The controller also guards against hosts that break this rule.
//! - Config values are not validated by the controller. A host that cannot
//!   honor a config raises the fault its platform would raise.

use alloc::boxed::Box;

use crate::config::ObservationConfig;

/// One host report about one observed target.
#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionRecord<E> {
    /// The observed element the record is about.
    pub target: E,
    /// Whether the target currently intersects the (margin-adjusted) root.
    pub is_intersecting: bool,
    /// Visible fraction of the target, in `[0, 1]`.
    pub intersection_ratio: f64,
}

/// Callback a session invokes with the records gathered in one update.
pub type IntersectionCallback<E> = Box<dyn FnMut(&[IntersectionRecord<E>])>;

/// Creates observation sessions.
///
/// Hosts are usually cheap handles (zero-sized for the browser, a shared
/// reference for the simulator), so methods take `&self`.
pub trait IntersectionHost {
    /// Handle type for observable elements. Equality is element identity.
    type Element: Clone + PartialEq + 'static;

    /// Session handle returned by [`create`](Self::create).
    type Session: ObserverSession<Self::Element>;

    /// Creates a session that will report to `callback`.
    ///
    /// The session observes nothing until [`ObserverSession::observe`] is
    /// called.
    fn create(
        &self,
        config: &ObservationConfig<Self::Element>,
        callback: IntersectionCallback<Self::Element>,
    ) -> Self::Session;
}

/// One subscription to the host's observation facility.
pub trait ObserverSession<E> {
    /// Starts observing `target`. The host reports the target's initial state
    /// at its next update.
    fn observe(&self, target: &E);

    /// Stops observing `target`.
    fn unobserve(&self, target: &E);

    /// Stops observing every target and releases the callback.
    fn disconnect(&self);
}
