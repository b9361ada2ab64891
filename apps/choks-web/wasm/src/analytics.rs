//! Page telemetry wiring
//!
//! Independent of the analysis controller: it reads the form itself and
//! never prevents or waits on anything.

use std::rc::Rc;

use choks_core::{AnalyticsReporter, AnalyticsSink, AppConfig};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event};

use crate::dom::{card_heading, read_form};

/// Report the page view and attach submit and feature-card listeners.
pub fn mount_analytics<S: AnalyticsSink + 'static>(
    document: &Document,
    config: &AppConfig,
    sink: S,
) -> Result<Rc<AnalyticsReporter<S>>, JsValue> {
    let window = web_sys::window().ok_or("No window")?;
    let reporter = Rc::new(AnalyticsReporter::new(sink));

    let path = window
        .location()
        .pathname()
        .unwrap_or_else(|_| "/".to_string());
    let user_agent = window.navigator().user_agent().unwrap_or_default();
    reporter.report_page_view(&path, &user_agent);

    if let Some(form) = document.get_element_by_id(&config.dom.form) {
        let reporter = Rc::clone(&reporter);
        let document = document.clone();
        let ids = config.dom.clone();
        let on_submit = Closure::wrap(Box::new(move |_event: Event| {
            let snapshot = read_form(&document, &ids);
            reporter.report_analysis_started(&snapshot.business_type, snapshot.has_demographics());
        }) as Box<dyn FnMut(_)>);
        form.add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref())?;
        on_submit.forget();
    }

    let cards = document.query_selector_all(&format!(".{}", config.dom.feature_card_class))?;
    for i in 0..cards.length() {
        let Some(card) = cards.item(i).and_then(|node| node.dyn_into::<Element>().ok()) else {
            continue;
        };
        let reporter = Rc::clone(&reporter);
        let clicked = card.clone();
        let on_click = Closure::wrap(Box::new(move |_event: Event| {
            reporter.report_feature_card_click(&card_heading(&clicked));
        }) as Box<dyn FnMut(_)>);
        card.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
    }

    tracing::debug!("analytics attached to {} feature cards", cards.length());
    Ok(reporter)
}
