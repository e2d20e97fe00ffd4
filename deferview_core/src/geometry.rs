// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Intersection geometry.
//!
//! The pieces of the intersection-observer processing model that do not
//! depend on a platform: parsing and resolving root margins, computing the
//! intersection between a target and a root, and mapping a ratio onto a
//! threshold list. Hosts that simulate observation (see `deferview_sim`) build
//! on these; the browser backend does not need them.
//!
//! All rectangles are `kurbo` rectangles in a shared coordinate space.

use core::fmt;

use kurbo::{Insets, Rect};

/// One root-margin component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarginLength {
    /// Absolute length in pixels.
    Px(f64),
    /// Percentage of the root's width (left/right) or height (top/bottom).
    Percent(f64),
}

impl MarginLength {
    fn resolve(self, basis: f64) -> f64 {
        match self {
            Self::Px(px) => px,
            Self::Percent(pct) => basis * pct / 100.0,
        }
    }

    fn parse(token: &str) -> Result<Self, RootMarginError> {
        let invalid = || RootMarginError::InvalidLength;
        // Units are ASCII case-insensitive.
        let unit_start = token
            .trim_end_matches(|c: char| c.is_ascii_alphabetic())
            .len();
        let (number, unit) = token.split_at(unit_start);
        let (number, make): (&str, fn(f64) -> Self) = if unit.eq_ignore_ascii_case("px") {
            (number, Self::Px)
        } else if !unit.is_empty() {
            return Err(invalid());
        } else if let Some(n) = token.strip_suffix('%') {
            (n, Self::Percent)
        } else if token == "0" {
            return Ok(Self::Px(0.0));
        } else {
            return Err(invalid());
        };
        let value: f64 = number.parse().map_err(|_| invalid())?;
        if value.is_finite() {
            Ok(make(value))
        } else {
            Err(invalid())
        }
    }
}

/// Errors from [`RootMargin::parse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootMarginError {
    /// The margin string has no components.
    Empty,
    /// More than four components.
    TooManyValues,
    /// A component is not a pixel or percentage length.
    InvalidLength,
}

impl fmt::Display for RootMarginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "root margin is empty"),
            Self::TooManyValues => write!(f, "root margin has more than four values"),
            Self::InvalidLength => {
                write!(f, "root margin values must be specified in pixels or percent")
            }
        }
    }
}

impl core::error::Error for RootMarginError {}

/// A parsed root margin: top, right, bottom, left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootMargin {
    /// Top edge.
    pub top: MarginLength,
    /// Right edge.
    pub right: MarginLength,
    /// Bottom edge.
    pub bottom: MarginLength,
    /// Left edge.
    pub left: MarginLength,
}

impl Default for RootMargin {
    fn default() -> Self {
        let zero = MarginLength::Px(0.0);
        Self {
            top: zero,
            right: zero,
            bottom: zero,
            left: zero,
        }
    }
}

impl RootMargin {
    /// Parses CSS margin shorthand with one to four components.
    ///
    /// # Errors
    ///
    /// See [`RootMarginError`].
    pub fn parse(input: &str) -> Result<Self, RootMarginError> {
        let mut parts = [MarginLength::Px(0.0); 4];
        let mut count = 0;
        for token in input.split_ascii_whitespace() {
            if count == 4 {
                return Err(RootMarginError::TooManyValues);
            }
            parts[count] = MarginLength::parse(token)?;
            count += 1;
        }
        let [a, b, c, d] = parts;
        let (top, right, bottom, left) = match count {
            0 => return Err(RootMarginError::Empty),
            1 => (a, a, a, a),
            2 => (a, b, a, b),
            3 => (a, b, c, b),
            _ => (a, b, c, d),
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }

    /// Resolves percentages against `root` and returns outward insets.
    #[must_use]
    pub fn resolve(&self, root: Rect) -> Insets {
        let (w, h) = (root.width(), root.height());
        Insets::new(
            self.left.resolve(w),
            self.top.resolve(h),
            self.right.resolve(w),
            self.bottom.resolve(h),
        )
    }
}

/// Result of intersecting a target with a margin-adjusted root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionGeometry {
    /// `true` when the rectangles overlap or touch.
    pub is_intersecting: bool,
    /// Intersection area over target area. A zero-area target that
    /// intersects has ratio `1.0`.
    pub intersection_ratio: f64,
    /// The overlapping region; [`Rect::ZERO`] when not intersecting.
    pub intersection_rect: Rect,
}

/// Intersects `target` with `root` grown by `margin`.
///
/// Edge-adjacent rectangles count as intersecting (with a zero ratio), which
/// is what lets a zero-threshold observer fire as soon as an element touches
/// the viewport.
#[must_use]
pub fn compute_intersection(target: Rect, root: Rect, margin: Insets) -> IntersectionGeometry {
    let root_bounds = root + margin;
    let x0 = target.x0.max(root_bounds.x0);
    let y0 = target.y0.max(root_bounds.y0);
    let x1 = target.x1.min(root_bounds.x1);
    let y1 = target.y1.min(root_bounds.y1);

    if x0 > x1 || y0 > y1 {
        return IntersectionGeometry {
            is_intersecting: false,
            intersection_ratio: 0.0,
            intersection_rect: Rect::ZERO,
        };
    }

    let intersection_rect = Rect::new(x0, y0, x1, y1);
    let target_area = target.area();
    let intersection_ratio = if target_area > 0.0 {
        (intersection_rect.area() / target_area).clamp(0.0, 1.0)
    } else {
        1.0
    };
    IntersectionGeometry {
        is_intersecting: true,
        intersection_ratio,
        intersection_rect,
    }
}

/// Index of the first threshold greater than `ratio`, or the list length if
/// `ratio` reaches the last one.
///
/// `sorted_thresholds` must be ascending.
#[must_use]
pub fn threshold_index(ratio: f64, sorted_thresholds: &[f64]) -> usize {
    sorted_thresholds
        .iter()
        .position(|&t| t > ratio)
        .unwrap_or(sorted_thresholds.len())
}
