// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility latch and observation lifecycle for deferred rendering.
//!
//! `deferview_core` decides when a container element has scrolled into view
//! so its children can be rendered. It is `no_std` compatible (with `alloc`)
//! and knows nothing about any particular platform: hosts plug in through the
//! [`host`] traits.
//!
//! # Architecture
//!
//! ```text
//!   Boundary (owns the element)
//!       │ attach(element)
//!       ▼
//!   VisibilityController ──create/observe──► IntersectionHost
//!       ▲                                          │
//!       └────── IntersectionRecord callbacks ──────┘
//!       │
//!       ▼ on_visible / is_visible
//!   Boundary mounts its children
//! ```
//!
//! **[`controller`]**: [`VisibilityController`](controller::VisibilityController),
//! the one-way visibility latch with imperative overrides.
//!
//! **[`config`]**: Observation options and resolved configs, compared by value.
//!
//! **[`host`]**: The [`IntersectionHost`](host::IntersectionHost) and
//! [`ObserverSession`](host::ObserverSession) traits platform backends
//! implement.
//!
//! **[`geometry`]**: Root-margin parsing, intersection ratios and threshold
//! indices, for hosts that compute intersections themselves.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! controller instrumentation, with a zero-overhead [`Tracer`](trace::Tracer).
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod controller;
pub mod geometry;
pub mod host;
pub mod trace;

pub use config::{ObservationConfig, ObservationOptions, Threshold};
pub use controller::VisibilityController;
pub use host::{IntersectionCallback, IntersectionHost, IntersectionRecord, ObserverSession};
