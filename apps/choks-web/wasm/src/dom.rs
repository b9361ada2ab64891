//! DOM access for the location form and results section
//!
//! `DomView` implements the controller's `AnalysisView` over the element
//! ids in `DomIds`. Missing elements are logged and skipped; the page keeps
//! working with whatever markup is present.

use choks_core::render::{banner_html, error_panel_html};
use choks_core::{AnalysisView, BannerKind, DomIds, FormSnapshot, InputHint, ResultCard};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlSelectElement,
    ScrollBehavior, ScrollIntoViewOptions,
};

/// Current value of an input or select element.
pub fn field_value(element: &Element) -> String {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        select.value()
    } else {
        String::new()
    }
}

/// Read the location form as it is right now.
pub fn read_form(document: &Document, ids: &DomIds) -> FormSnapshot {
    let value_of = |id: &str| {
        document
            .get_element_by_id(id)
            .map(|el| field_value(&el))
            .unwrap_or_default()
    };

    let mut demographics = Vec::new();
    let selector = format!("input[name=\"{}\"]:checked", ids.demographics_name);
    if let Ok(nodes) = document.query_selector_all(&selector) {
        for i in 0..nodes.length() {
            if let Some(input) = nodes
                .item(i)
                .and_then(|node| node.dyn_into::<HtmlInputElement>().ok())
            {
                demographics.push(input.value());
            }
        }
    }

    FormSnapshot::new(
        value_of(&ids.location),
        value_of(&ids.business_type),
        demographics,
    )
}

/// Heading text of a feature card, or empty when it has none.
pub fn card_heading(card: &Element) -> String {
    card.query_selector("h1, h2, h3, h4, h5, h6")
        .ok()
        .flatten()
        .and_then(|heading| heading.text_content())
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

fn set_display(element: &HtmlElement, value: &str) {
    if let Err(e) = element.style().set_property("display", value) {
        tracing::debug!("could not set display: {:?}", e);
    }
}

pub struct DomView {
    document: Document,
    ids: DomIds,
    banner_duration_ms: u32,
}

impl DomView {
    pub fn new(document: Document, ids: DomIds, banner_duration_ms: u32) -> Self {
        Self {
            document,
            ids,
            banner_duration_ms,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn ids(&self) -> &DomIds {
        &self.ids
    }

    pub fn read_form(&self) -> FormSnapshot {
        read_form(&self.document, &self.ids)
    }

    fn element(&self, id: &str) -> Option<Element> {
        let element = self.document.get_element_by_id(id);
        if element.is_none() {
            tracing::warn!("element #{} not found", id);
        }
        element
    }

    fn html_element(&self, id: &str) -> Option<HtmlElement> {
        self.element(id)?.dyn_into::<HtmlElement>().ok()
    }

    fn set_submit_disabled(&self, disabled: bool) {
        let button = self
            .element(&self.ids.form)
            .and_then(|form| form.query_selector("[type=\"submit\"]").ok().flatten());
        if let Some(button) = button {
            let _ = if disabled {
                button.set_attribute("disabled", "")
            } else {
                button.remove_attribute("disabled")
            };
        }
    }

    fn show_results_section(&self) -> Option<HtmlElement> {
        let section = self.html_element(&self.ids.results_section)?;
        set_display(&section, "block");
        Some(section)
    }

    fn remove_banner_later(&self, kind: BannerKind) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let content_id = self.ids.results_content.clone();
        let selector = format!(".{}", kind.class_name());
        let document = self.document.clone();

        let remove = Closure::once(Box::new(move || {
            let banner = document
                .get_element_by_id(&content_id)
                .and_then(|content| content.query_selector(&selector).ok().flatten());
            if let Some(banner) = banner {
                banner.remove();
            }
        }) as Box<dyn FnOnce()>);

        if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            remove.as_ref().unchecked_ref(),
            self.banner_duration_ms as i32,
        ) {
            tracing::debug!("banner timer not scheduled: {:?}", e);
        }
        remove.forget();
    }
}

impl AnalysisView for DomView {
    fn show_loading(&self) {
        if let Some(modal) = self.html_element(&self.ids.loading_modal) {
            set_display(&modal, "flex");
            let _ = modal.class_list().add_1("show");
            let _ = modal.set_attribute("aria-hidden", "false");
        }
        self.set_submit_disabled(true);
    }

    fn hide_loading(&self) {
        if let Some(modal) = self.html_element(&self.ids.loading_modal) {
            set_display(&modal, "none");
            let _ = modal.class_list().remove_1("show");
            let _ = modal.set_attribute("aria-hidden", "true");
        }
        self.set_submit_disabled(false);
    }

    fn show_result(&self, card: &ResultCard) {
        if let Some(content) = self.element(&self.ids.results_content) {
            content.set_inner_html(&card.to_html());
        }
        if let Some(section) = self.show_results_section() {
            let options = ScrollIntoViewOptions::new();
            options.set_behavior(ScrollBehavior::Smooth);
            section.scroll_into_view_with_scroll_into_view_options(&options);
        }
    }

    fn show_error(&self, message: &str) {
        if let Some(content) = self.element(&self.ids.results_content) {
            content.set_inner_html(&error_panel_html(message));
        }
        self.show_results_section();
    }

    fn show_banner(&self, kind: BannerKind, message: &str) {
        if let Some(content) = self.element(&self.ids.results_content) {
            if let Err(e) = content.insert_adjacent_html("afterbegin", &banner_html(kind, message)) {
                tracing::debug!("banner not inserted: {:?}", e);
                return;
            }
            self.remove_banner_later(kind);
        }
    }

    fn location_value(&self) -> String {
        self.element(&self.ids.location)
            .map(|el| field_value(&el))
            .unwrap_or_default()
    }

    fn set_location_hint(&self, hint: InputHint) {
        if let Some(input) = self.element(&self.ids.location) {
            let classes = input.class_list();
            let _ = classes.remove_1(hint.opposite_class_name());
            let _ = classes.add_1(hint.class_name());
        }
    }

    fn clear_form(&self) {
        if let Some(form) = self
            .element(&self.ids.form)
            .and_then(|el| el.dyn_into::<HtmlFormElement>().ok())
        {
            form.reset();
        }
        if let Some(input) = self.element(&self.ids.location) {
            let _ = input.class_list().remove_2("is-valid", "is-invalid");
        }
    }

    fn hide_results(&self) {
        if let Some(section) = self.html_element(&self.ids.results_section) {
            set_display(&section, "none");
        }
        if let Some(content) = self.element(&self.ids.results_content) {
            content.set_inner_html("");
        }
    }

    fn focus_location(&self) {
        if let Some(input) = self.html_element(&self.ids.location) {
            let _ = input.focus();
        }
    }
}
