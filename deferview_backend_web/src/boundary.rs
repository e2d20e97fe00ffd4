// Copyright 2026 the Deferview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazily rendered DOM containers.
//!
//! A [`DomBoundary`] creates its container element up front, so the page
//! layout is stable, and fills it by running a render closure the first time
//! the container scrolls into view.

use alloc::string::String;

use deferview_core::config::ObservationOptions;
use deferview_core::controller::VisibilityController;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Document, Element, HtmlElement, Node};

use crate::host::WebHost;

/// Construction options for a [`DomBoundary`].
#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryProps {
    /// Tag name of the container element.
    pub tag: String,
    /// Inline `style` attribute for the container, if any.
    pub style: Option<String>,
    /// Observation options for the container.
    pub options: ObservationOptions<Element>,
    /// Render immediately without observing.
    pub initially_visible: bool,
}

impl Default for BoundaryProps {
    fn default() -> Self {
        Self {
            tag: String::from("div"),
            style: None,
            options: ObservationOptions::default(),
            initially_visible: false,
        }
    }
}

impl BoundaryProps {
    /// Creates props for a `<div>` container with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the container tag name.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Sets the container's inline style.
    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Sets the observation options.
    #[must_use]
    pub fn with_options(mut self, options: ObservationOptions<Element>) -> Self {
        self.options = options;
        self
    }

    /// Renders immediately instead of waiting for the container to intersect.
    #[must_use]
    pub fn initially_visible(mut self, visible: bool) -> Self {
        self.initially_visible = visible;
        self
    }
}

/// A container element whose content is rendered on first visibility.
///
/// The container is created detached; insert it with
/// [`append_to`](Self::append_to) or through [`element`](Self::element).
/// Dropping the boundary stops observation but leaves the element (and any
/// rendered content) in the document.
pub struct DomBoundary {
    element: HtmlElement,
    controller: VisibilityController<WebHost>,
}

impl DomBoundary {
    /// Creates the container and starts observing it.
    ///
    /// `render` receives the container once, when the controller latches
    /// visible (immediately if `props.initially_visible` is set).
    pub fn new(
        document: &Document,
        props: BoundaryProps,
        render: impl FnOnce(&HtmlElement) + 'static,
    ) -> Result<Self, JsValue> {
        let element: HtmlElement = document.create_element(&props.tag)?.unchecked_into();
        if let Some(style) = &props.style {
            element.set_attribute("style", style)?;
        }

        let controller = VisibilityController::with_initial_visibility(
            WebHost,
            props.options,
            props.initially_visible,
        );
        let target = element.clone();
        controller.on_visible(move || render(&target));
        controller.attach(Some(Element::from(element.clone())));

        Ok(Self {
            element,
            controller,
        })
    }

    /// Returns the container element.
    #[must_use]
    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    /// Appends the container to `parent`.
    pub fn append_to(&self, parent: &Node) -> Result<(), JsValue> {
        parent.append_child(&self.element)?;
        Ok(())
    }

    /// Returns `true` once the content has been rendered.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.controller.is_visible()
    }

    /// Renders the content now, without waiting for intersection.
    pub fn force_visible(&self) {
        self.controller.force_visible();
    }

    /// Asks the browser to report the container's intersection again.
    pub fn force_check(&self) {
        self.controller.force_check();
    }

    /// Replaces the observation options.
    ///
    /// The observer is recreated only if the resolved values differ.
    pub fn set_options(&self, options: ObservationOptions<Element>) {
        self.controller.set_options(options);
    }

    /// Returns the underlying controller.
    #[must_use]
    pub fn controller(&self) -> &VisibilityController<WebHost> {
        &self.controller
    }
}

impl core::fmt::Debug for DomBoundary {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomBoundary")
            .field("element", &"HtmlElement")
            .field("visible", &self.controller.is_visible())
            .finish()
    }
}
