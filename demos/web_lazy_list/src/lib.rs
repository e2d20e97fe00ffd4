// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web demo: a long list whose rows render as they scroll into view.
//!
//! Creates a scrollable panel of fixed-height placeholders, each a
//! [`DomBoundary`] observed against the panel with a bottom margin so rows
//! render slightly before they appear. A status line counts rendered rows.
//!
//! Build with: `wasm-pack build --target web demos/web_lazy_list`
//!
//! Then serve `demos/web_lazy_list/` and open `index.html` in a browser.

// This crate only runs in the browser; suppress dead-code warnings when
// cargo-checking on a native host target.
#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement};

use deferview_backend_web::{BoundaryProps, DomBoundary};
use deferview_core::ObservationOptions;

const PANEL_W: f64 = 480.0;
const PANEL_H: f64 = 600.0;
const ROW_H: f64 = 120.0;
const ROW_COUNT: usize = 200;
/// Rows within this distance below the panel render early.
const PRELOAD_MARGIN: &str = "0px 0px 240px 0px";

const ROW_COLORS: [&str; 4] = [
    "rgba(242, 67, 54, 0.9)",
    "rgba(77, 176, 80, 0.9)",
    "rgba(33, 150, 243, 0.9)",
    "rgba(255, 194, 8, 0.9)",
];

/// Entry point, called automatically by `wasm_bindgen(start)`.
#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    let window = web_sys::window().expect("no global window");
    let document = window.document().expect("no document");
    let body = document.body().expect("no body");

    let status: HtmlElement = document.create_element("p")?.unchecked_into();
    body.append_child(&status)?;
    let panel = create_panel(&document)?;
    body.append_child(&panel)?;

    let rendered = Rc::new(Cell::new(0_usize));
    update_status(&status, 0);

    let options = ObservationOptions::new()
        .with_root(Element::from(panel.clone()))
        .with_root_margin(PRELOAD_MARGIN)
        .with_threshold(0.0);

    let mut rows = Vec::with_capacity(ROW_COUNT);
    for i in 0..ROW_COUNT {
        let props = BoundaryProps::new()
            .with_style(format!(
                "height: {ROW_H}px; box-sizing: border-box; padding: 8px; \
                 border-bottom: 1px solid #333"
            ))
            .with_options(options.clone());

        let doc = document.clone();
        let status = status.clone();
        let rendered = Rc::clone(&rendered);
        let row = DomBoundary::new(&document, props, move |container| {
            if render_row(&doc, container, i).is_ok() {
                rendered.set(rendered.get() + 1);
                update_status(&status, rendered.get());
            }
        })?;
        row.append_to(&panel)?;
        rows.push(row);
    }

    // Keep the boundaries alive; there is no graceful shutdown on the web.
    core::mem::forget(rows);

    Ok(())
}

fn create_panel(doc: &Document) -> Result<HtmlElement, JsValue> {
    let el: HtmlElement = doc.create_element("div")?.unchecked_into();
    let s = el.style();
    s.set_property("width", &format!("{PANEL_W}px"))?;
    s.set_property("height", &format!("{PANEL_H}px"))?;
    s.set_property("overflow-y", "auto")?;
    s.set_property("background", "#1e1e2e")?;
    s.set_property("border-radius", "16px")?;
    Ok(el)
}

/// Fills a row container with its content.
fn render_row(doc: &Document, container: &HtmlElement, index: usize) -> Result<(), JsValue> {
    let card: HtmlElement = doc.create_element("div")?.unchecked_into();
    let s = card.style();
    s.set_property("height", "100%")?;
    s.set_property("border-radius", "12px")?;
    s.set_property("background", ROW_COLORS[index % ROW_COLORS.len()])?;
    s.set_property("color", "white")?;
    s.set_property("font", "600 20px sans-serif")?;
    s.set_property("display", "flex")?;
    s.set_property("align-items", "center")?;
    s.set_property("justify-content", "center")?;
    card.set_text_content(Some(&format!("Row {index}")));
    container.append_child(&card)?;
    Ok(())
}

fn update_status(status: &HtmlElement, rendered: usize) {
    status.set_text_content(Some(&format!("rendered {rendered} / {ROW_COUNT} rows")));
}
