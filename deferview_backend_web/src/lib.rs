// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for deferview.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebHost`]: an [`IntersectionHost`] over `IntersectionObserver`
//! - [`DomBoundary`]: a container element that renders its content once it
//!   scrolls into view
//!
//! [`IntersectionHost`]: deferview_core::host::IntersectionHost

#![no_std]

extern crate alloc;

mod boundary;
mod host;

pub use boundary::{BoundaryProps, DomBoundary};
pub use host::{WebHost, WebSession};
