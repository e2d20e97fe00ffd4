// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `IntersectionObserver` host.
//!
//! [`WebHost`] creates one [`WebSession`] per controller session. Each
//! session owns a native `IntersectionObserver` and the JS closure it calls;
//! the observer's entries are converted to [`IntersectionRecord`]s before the
//! controller sees them.
//!
//! Options are handed to the browser as a plain `{ root, rootMargin,
//! threshold }` object without validation. If the browser's constructor
//! throws (a malformed `rootMargin`, a threshold outside `[0, 1]`), the
//! exception is rethrown unchanged.

use alloc::vec::Vec;
use core::cell::RefCell;

use deferview_core::config::{ObservationConfig, Threshold};
use deferview_core::host::{
    IntersectionCallback, IntersectionHost, IntersectionRecord, ObserverSession,
};
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

type ObserverClosure = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// An [`IntersectionHost`] backed by the browser's `IntersectionObserver`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WebHost;

impl IntersectionHost for WebHost {
    type Element = Element;
    type Session = WebSession;

    fn create(
        &self,
        config: &ObservationConfig<Element>,
        callback: IntersectionCallback<Element>,
    ) -> WebSession {
        match WebSession::new(config, callback) {
            Ok(session) => session,
            Err(err) => wasm_bindgen::throw_val(err),
        }
    }
}

/// One native `IntersectionObserver` and the closure it reports to.
///
/// Dropping the session disconnects the observer and releases the closure.
pub struct WebSession {
    observer: IntersectionObserver,
    // Kept alive for as long as the observer may call it.
    closure: RefCell<Option<ObserverClosure>>,
}

impl WebSession {
    fn new(
        config: &ObservationConfig<Element>,
        mut callback: IntersectionCallback<Element>,
    ) -> Result<Self, JsValue> {
        let closure: ObserverClosure = Closure::new(
            move |entries: Array, _observer: IntersectionObserver| {
                let records: Vec<_> = entries
                    .iter()
                    .map(|entry| to_record(&entry.unchecked_into()))
                    .collect();
                callback(&records);
            },
        );

        let init = observer_init(config)?;
        let observer =
            IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init)?;

        Ok(Self {
            observer,
            closure: RefCell::new(Some(closure)),
        })
    }

    /// Returns the native observer.
    #[must_use]
    pub fn observer(&self) -> &IntersectionObserver {
        &self.observer
    }
}

impl ObserverSession<Element> for WebSession {
    fn observe(&self, target: &Element) {
        self.observer.observe(target);
    }

    fn unobserve(&self, target: &Element) {
        self.observer.unobserve(target);
    }

    fn disconnect(&self) {
        self.observer.disconnect();
        // The browser queues no further callbacks after `disconnect`, so the
        // closure can go. One that is currently running is freed by
        // wasm-bindgen once it returns.
        drop(self.closure.borrow_mut().take());
    }
}

impl Drop for WebSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl core::fmt::Debug for WebSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebSession")
            .field("connected", &self.closure.borrow().is_some())
            .finish_non_exhaustive()
    }
}

fn to_record(entry: &IntersectionObserverEntry) -> IntersectionRecord<Element> {
    IntersectionRecord {
        target: entry.target(),
        is_intersecting: entry.is_intersecting(),
        intersection_ratio: entry.intersection_ratio(),
    }
}

/// Builds the `IntersectionObserverInit` dictionary as a plain object.
fn observer_init(
    config: &ObservationConfig<Element>,
) -> Result<IntersectionObserverInit, JsValue> {
    let init = Object::new();
    let root = config
        .root
        .as_ref()
        .map_or(JsValue::NULL, |root| JsValue::from(root.clone()));
    Reflect::set(&init, &JsValue::from_str("root"), &root)?;
    Reflect::set(
        &init,
        &JsValue::from_str("rootMargin"),
        &JsValue::from_str(&config.root_margin),
    )?;
    Reflect::set(
        &init,
        &JsValue::from_str("threshold"),
        &threshold_value(&config.threshold),
    )?;
    Ok(init.unchecked_into())
}

fn threshold_value(threshold: &Threshold) -> JsValue {
    match threshold {
        Threshold::Single(t) => JsValue::from_f64(*t),
        Threshold::List(ts) => ts
            .iter()
            .map(|&t| JsValue::from_f64(t))
            .collect::<Array>()
            .into(),
    }
}
