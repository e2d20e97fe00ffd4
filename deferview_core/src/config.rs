// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observation configuration.
//!
//! Callers describe how an element should be observed with
//! [`ObservationOptions`], where every field is optional. Options are merged
//! over [`ObservationConfig::default()`] to produce the resolved config a host
//! receives when it creates a session.
//!
//! Resolved configs compare **by value**: two options values built
//! independently but carrying the same root, margin and thresholds resolve to
//! equal configs, so a caller that rebuilds its options on every render does
//! not cause the controller to re-subscribe.
//!
//! No value is validated here. Out-of-range thresholds and malformed margins
//! are handed to the host as-is; see [`Threshold::validate`] for hosts that
//! want to reject them.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Default `root_margin`, in CSS margin syntax.
pub const DEFAULT_ROOT_MARGIN: &str = "0px";

/// Default intersection threshold.
pub const DEFAULT_THRESHOLD: f64 = 1.0;

/// Intersection ratio(s) at which the host should report changes.
#[derive(Clone, Debug)]
pub enum Threshold {
    /// A single ratio.
    Single(f64),
    /// Several ratios, in caller order.
    List(Vec<f64>),
}

impl Threshold {
    /// Returns the threshold values as a slice, in caller order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        match self {
            Self::Single(v) => core::slice::from_ref(v),
            Self::List(vs) => vs,
        }
    }

    /// Returns the values sorted ascending, the order hosts evaluate them in.
    ///
    /// An empty list is treated as `[0.0]`.
    #[must_use]
    pub fn sorted(&self) -> Vec<f64> {
        let mut out: Vec<f64> = self.values().to_vec();
        if out.is_empty() {
            out.push(0.0);
        }
        out.sort_by(f64::total_cmp);
        out
    }

    /// Checks that every value lies in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns the first offending value.
    pub fn validate(&self) -> Result<(), InvalidThreshold> {
        match self.values().iter().find(|v| !(0.0..=1.0).contains(*v)) {
            Some(&value) => Err(InvalidThreshold(value)),
            None => Ok(()),
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::Single(DEFAULT_THRESHOLD)
    }
}

impl From<f64> for Threshold {
    fn from(value: f64) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<f64>> for Threshold {
    fn from(values: Vec<f64>) -> Self {
        Self::List(values)
    }
}

impl PartialEq for Threshold {
    // Bitwise, so a NaN threshold still equals itself and does not force a
    // re-subscription on every comparison.
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.values(), other.values());
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
    }
}

/// A threshold value outside `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InvalidThreshold(pub f64);

impl fmt::Display for InvalidThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "threshold {} is outside the range [0, 1]", self.0)
    }
}

impl core::error::Error for InvalidThreshold {}

/// A fully resolved observation configuration.
///
/// Immutable for the lifetime of one observation session. `E` is the host's
/// element handle type.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationConfig<E> {
    /// Element whose bounds act as the viewport, or `None` for the host's
    /// top-level viewport.
    pub root: Option<E>,
    /// Margin around the root, in CSS margin syntax (e.g. `"10px 20%"`).
    pub root_margin: String,
    /// Ratio(s) at which the host reports intersection changes.
    pub threshold: Threshold,
}

impl<E> Default for ObservationConfig<E> {
    fn default() -> Self {
        Self {
            root: None,
            root_margin: String::from(DEFAULT_ROOT_MARGIN),
            threshold: Threshold::default(),
        }
    }
}

/// Caller-supplied observation options; unset fields take the defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationOptions<E> {
    /// Root element override.
    pub root: Option<E>,
    /// Root margin override.
    pub root_margin: Option<String>,
    /// Threshold override.
    pub threshold: Option<Threshold>,
}

impl<E> Default for ObservationOptions<E> {
    fn default() -> Self {
        Self {
            root: None,
            root_margin: None,
            threshold: None,
        }
    }
}

impl<E: Clone> ObservationOptions<E> {
    /// Creates options with every field unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root element.
    #[must_use]
    pub fn with_root(mut self, root: E) -> Self {
        self.root = Some(root);
        self
    }

    /// Sets the root margin.
    #[must_use]
    pub fn with_root_margin(mut self, margin: impl Into<String>) -> Self {
        self.root_margin = Some(margin.into());
        self
    }

    /// Sets a single threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(Threshold::Single(threshold));
        self
    }

    /// Sets a list of thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: impl Into<Vec<f64>>) -> Self {
        self.threshold = Some(Threshold::List(thresholds.into()));
        self
    }

    /// Merges these options over the defaults.
    #[must_use]
    pub fn resolve(&self) -> ObservationConfig<E> {
        let defaults = ObservationConfig::default();
        ObservationConfig {
            root: self.root.clone().or(defaults.root),
            root_margin: self.root_margin.clone().unwrap_or(defaults.root_margin),
            threshold: self.threshold.clone().unwrap_or(defaults.threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn empty_options_resolve_to_defaults() {
        let config = ObservationOptions::<u32>::new().resolve();
        assert_eq!(config, ObservationConfig::default());
        assert_eq!(config.root_margin, "0px");
        assert_eq!(config.threshold.values(), &[1.0]);
        assert!(config.root.is_none());
    }

    #[test]
    fn supplied_fields_override_defaults() {
        let config = ObservationOptions::new()
            .with_root(7_u32)
            .with_root_margin("10px 0px")
            .resolve();
        assert_eq!(config.root, Some(7));
        assert_eq!(config.root_margin, "10px 0px");
        assert_eq!(config.threshold, Threshold::Single(1.0));
    }

    #[test]
    fn independently_built_options_compare_equal() {
        let a = ObservationOptions::<u32>::new()
            .with_thresholds(vec![0.0, 0.5])
            .resolve();
        let b = ObservationOptions::<u32>::new()
            .with_thresholds(vec![0.0, 0.5])
            .resolve();
        assert_eq!(a, b);

        let c = ObservationOptions::<u32>::new()
            .with_thresholds(vec![0.0, 0.75])
            .resolve();
        assert_ne!(a, c);
    }

    #[test]
    fn nan_threshold_equals_itself() {
        assert_eq!(Threshold::Single(f64::NAN), Threshold::Single(f64::NAN));
    }

    #[test]
    fn sorted_orders_values_and_fills_empty_list() {
        assert_eq!(Threshold::List(vec![1.0, 0.0, 0.5]).sorted(), vec![0.0, 0.5, 1.0]);
        assert_eq!(Threshold::List(Vec::new()).sorted(), vec![0.0]);
    }

    #[test]
    fn validate_reports_out_of_range_values() {
        assert!(Threshold::Single(0.25).validate().is_ok());
        assert_eq!(
            Threshold::List(vec![0.5, 1.5]).validate(),
            Err(InvalidThreshold(1.5))
        );
        assert!(Threshold::Single(-0.1).validate().is_err());
    }
}
