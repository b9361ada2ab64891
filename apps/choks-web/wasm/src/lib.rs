//! WASM client for the Choks location dashboard
//!
//! Loading the module is enough: once the DOM is parsed it reads the
//! optional `#choks-config` block, installs console logging, mounts the
//! analysis controller and reports the page view. The exports below are
//! for pages that want to drive the client from script.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { savedAnalyses, openSavedAnalysis } from './pkg/choks_wasm.js';
//!
//! await init();
//!
//! for (const saved of savedAnalyses()) {
//!     console.log(saved.id, saved.location, saved.timestamp);
//! }
//! await openSavedAnalysis('analysis_1700000000');
//! ```

pub mod analytics;
pub mod app;
pub mod dom;
pub mod fetch;
pub mod logging;
pub mod storage;

use std::rc::Rc;

use choks_core::{AppConfig, ConfigError, SubmitOutcome, CONFIG_ELEMENT_ID};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Document;

pub use app::Controller;
pub use dom::DomView;
pub use fetch::{AnalyticsBeacon, FetchBackend};
pub use storage::LocalStore;

/// Best-effort text for a thrown JS value.
pub(crate) fn js_error_message(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        text
    } else if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        String::from(error.message())
    } else {
        format!("{:?}", value)
    }
}

/// Read `#choks-config`, falling back to defaults.
fn load_config(document: &Document) -> (AppConfig, Option<ConfigError>) {
    let text = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content())
        .filter(|text| !text.trim().is_empty());

    match text.map(|text| AppConfig::from_json(&text)) {
        Some(Ok(config)) => (config, None),
        Some(Err(e)) => (AppConfig::default(), Some(e)),
        None => (AppConfig::default(), None),
    }
}

fn mount(document: &Document) -> Result<(), JsValue> {
    let (config, config_error) = load_config(document);
    logging::init(config.tracing_level().unwrap_or(tracing::Level::INFO));
    if let Some(e) = config_error {
        tracing::error!("ignoring page config: {}", e);
    }

    let config = Rc::new(config);
    app::mount_analysis(document, config.clone())?;
    analytics::mount_analytics(document, &config, AnalyticsBeacon::new(&config))?;
    fetch::check_health(&config);

    tracing::info!("Choks client v{} ready", env!("CARGO_PKG_VERSION"));
    Ok(())
}

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("No document")?;
    let ready_document = document.clone();

    app::when_ready(&document, move || {
        if let Err(e) = mount(&ready_document) {
            web_sys::console::error_1(&JsValue::from_str(&format!(
                "Choks client failed to start: {}",
                js_error_message(&e)
            )));
        }
    })
}

fn mounted() -> Result<Rc<Controller>, JsValue> {
    app::controller().ok_or_else(|| JsValue::from_str("Choks client is not mounted yet"))
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Saved analyses as `[{id, timestamp, location}]`, oldest first.
#[wasm_bindgen(js_name = savedAnalyses)]
pub fn saved_analyses() -> Result<JsValue, JsValue> {
    let records = mounted()?.saved_analyses();
    serde_wasm_bindgen::to_value(&records)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Load a stored analysis from the backend and render it.
/// Resolves to `true` when a card was rendered.
#[wasm_bindgen(js_name = openSavedAnalysis)]
pub async fn open_saved_analysis(analysis_id: String) -> Result<bool, JsValue> {
    let controller = mounted()?;
    let outcome = controller.open_saved(&analysis_id).await;
    Ok(outcome == SubmitOutcome::Rendered)
}

/// Same as the "New Analysis" button.
#[wasm_bindgen(js_name = startNewAnalysis)]
pub fn start_new_analysis() -> Result<(), JsValue> {
    mounted()?.reset_for_new_analysis();
    Ok(())
}
