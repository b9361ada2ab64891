//! Page wiring for the analysis form
//!
//! Builds the single `AnalysisController` for the page and connects it to
//! the form, the location field and the results container. Elements that
//! are not on the page are skipped, so pages without the form still get
//! analytics.

use std::cell::RefCell;
use std::rc::Rc;

use choks_core::render::{ACTION_NEW_ANALYSIS, ACTION_SAVE};
use choks_core::{AnalysisController, AppConfig};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event};

use crate::dom::{field_value, DomView};
use crate::fetch::FetchBackend;
use crate::storage::LocalStore;

pub type Controller = AnalysisController<FetchBackend, DomView, LocalStore>;

thread_local! {
    static CONTROLLER: RefCell<Option<Rc<Controller>>> = const { RefCell::new(None) };
}

/// The page's controller, once mounted.
pub fn controller() -> Option<Rc<Controller>> {
    CONTROLLER.with(|slot| slot.borrow().clone())
}

/// Run `init` now if the DOM is parsed, otherwise on `DOMContentLoaded`.
pub fn when_ready(document: &Document, init: impl FnOnce() + 'static) -> Result<(), JsValue> {
    if document.ready_state() != "loading" {
        init();
        return Ok(());
    }

    let on_ready = Closure::once(Box::new(move |_event: Event| init()) as Box<dyn FnOnce(_)>);
    document.add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())?;
    on_ready.forget();
    Ok(())
}

/// Create the controller and attach its listeners.
pub fn mount_analysis(document: &Document, config: Rc<AppConfig>) -> Result<Rc<Controller>, JsValue> {
    let view = DomView::new(document.clone(), config.dom.clone(), config.banner_duration_ms);
    let controller = Rc::new(AnalysisController::new(
        FetchBackend::new(config.clone()),
        view,
        LocalStore,
        config.storage_key.clone(),
    ));

    attach_submit(&controller)?;
    attach_location_hint(&controller)?;
    attach_result_actions(&controller)?;

    CONTROLLER.with(|slot| *slot.borrow_mut() = Some(controller.clone()));
    Ok(controller)
}

fn find(controller: &Controller, id: &str) -> Option<Element> {
    let element = controller.view().document().get_element_by_id(id);
    if element.is_none() {
        tracing::debug!("#{} not on this page", id);
    }
    element
}

fn attach_submit(controller: &Rc<Controller>) -> Result<(), JsValue> {
    let Some(form) = find(controller, &controller.view().ids().form) else {
        return Ok(());
    };

    let controller = Rc::clone(controller);
    let on_submit = Closure::wrap(Box::new(move |event: Event| {
        event.prevent_default();
        let snapshot = controller.view().read_form();
        let controller = Rc::clone(&controller);
        spawn_local(async move {
            controller.submit(snapshot).await;
        });
    }) as Box<dyn FnMut(_)>);

    form.add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref())?;
    on_submit.forget();
    Ok(())
}

fn attach_location_hint(controller: &Rc<Controller>) -> Result<(), JsValue> {
    let Some(input) = find(controller, &controller.view().ids().location) else {
        return Ok(());
    };

    let controller = Rc::clone(controller);
    let on_input = Closure::wrap(Box::new(move |event: Event| {
        let value = event
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
            .map(|el| field_value(&el))
            .unwrap_or_default();
        controller.validate_input(&value);
    }) as Box<dyn FnMut(_)>);

    input.add_event_listener_with_callback("input", on_input.as_ref().unchecked_ref())?;
    on_input.forget();
    Ok(())
}

/// Save and new-analysis buttons are re-rendered with every card, so one
/// delegated listener on the container handles them.
fn attach_result_actions(controller: &Rc<Controller>) -> Result<(), JsValue> {
    let Some(content) = find(controller, &controller.view().ids().results_content) else {
        return Ok(());
    };

    let controller = Rc::clone(controller);
    let on_click = Closure::wrap(Box::new(move |event: Event| {
        let button = event
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
            .and_then(|el| el.closest("[data-action]").ok().flatten());
        let Some(button) = button else {
            return;
        };

        match button.get_attribute("data-action").as_deref() {
            Some(ACTION_SAVE) => {
                if let Some(id) = button.get_attribute("data-analysis-id") {
                    // The controller logs the failure and shows the error banner
                    let _ = controller.save_current_analysis(&id);
                }
            }
            Some(ACTION_NEW_ANALYSIS) => controller.reset_for_new_analysis(),
            _ => {}
        }
    }) as Box<dyn FnMut(_)>);

    content.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    Ok(())
}
