//! `fetch` transport for the analysis service and the analytics collector

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use choks_core::{
    AnalysisBackend, AnalysisRequest, AnalyticsPayload, AnalyticsSink, AppConfig, BackendHealth,
    HttpReply, TransportError,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{AbortController, Request, RequestInit, RequestMode, Response, Window};

use crate::js_error_message;

fn network_error(value: JsValue) -> TransportError {
    TransportError::Network(js_error_message(&value))
}

/// Aborts a request when its timer fires. Dropping clears the timer.
struct AbortTimer {
    window: Window,
    handle: i32,
    fired: Rc<Cell<bool>>,
    _on_timeout: Closure<dyn FnMut()>,
}

impl AbortTimer {
    fn arm(window: &Window, opts: &RequestInit, timeout: Duration) -> Result<Self, TransportError> {
        let controller = AbortController::new().map_err(network_error)?;
        opts.set_signal(Some(&controller.signal()));

        let fired = Rc::new(Cell::new(false));
        let fired_flag = fired.clone();
        let on_timeout = Closure::wrap(Box::new(move || {
            fired_flag.set(true);
            controller.abort();
        }) as Box<dyn FnMut()>);

        let millis = timeout.as_millis().min(i32::MAX as u128) as i32;
        let handle = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                on_timeout.as_ref().unchecked_ref(),
                millis,
            )
            .map_err(network_error)?;

        Ok(Self {
            window: window.clone(),
            handle,
            fired,
            _on_timeout: on_timeout,
        })
    }

    fn fired(&self) -> bool {
        self.fired.get()
    }
}

impl Drop for AbortTimer {
    fn drop(&mut self) {
        self.window.clear_timeout_with_handle(self.handle);
    }
}

/// Issue one request and read the whole body as text.
async fn send(
    method: &str,
    url: &str,
    body: Option<&str>,
    timeout: Option<Duration>,
) -> Result<HttpReply, TransportError> {
    let window = web_sys::window().ok_or_else(|| TransportError::Network("No window".into()))?;

    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);
    if let Some(body) = body {
        opts.set_body(&JsValue::from_str(body));
    }

    let timer = match timeout {
        Some(timeout) => Some(AbortTimer::arm(&window, &opts, timeout)?),
        None => None,
    };
    let timed_out = |err: TransportError| match (&timer, timeout) {
        (Some(timer), Some(timeout)) if timer.fired() => TransportError::Timeout(timeout),
        _ => err,
    };

    let request = Request::new_with_str_and_init(url, &opts).map_err(network_error)?;
    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(network_error)?;
    }

    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| timed_out(network_error(e)))?;
    let response: Response = response.dyn_into().map_err(network_error)?;
    let status = response.status();

    let text = response
        .text()
        .map_err(|e| TransportError::Body(js_error_message(&e)))?;
    let text = JsFuture::from(text)
        .await
        .map_err(|e| timed_out(TransportError::Body(js_error_message(&e))))?;

    Ok(HttpReply::new(status, text.as_string().unwrap_or_default()))
}

/// Analysis service reached through `window.fetch`.
pub struct FetchBackend {
    config: Rc<AppConfig>,
}

impl FetchBackend {
    pub fn new(config: Rc<AppConfig>) -> Self {
        Self { config }
    }
}

impl AnalysisBackend for FetchBackend {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<HttpReply, TransportError> {
        let body =
            serde_json::to_string(request).map_err(|e| TransportError::Body(e.to_string()))?;
        let reply = send(
            "POST",
            &self.config.analyze_url(),
            Some(&body),
            Some(self.config.analyze_timeout()),
        )
        .await?;
        tracing::debug!(status = reply.status, "analyze replied");
        Ok(reply)
    }

    async fn fetch_saved(&self, analysis_id: &str) -> Result<HttpReply, TransportError> {
        let url = self.config.saved_analysis_url(analysis_id).ok_or_else(|| {
            TransportError::Network(format!("'{}' is not an analysis id", analysis_id))
        })?;
        send(
            "GET",
            &url,
            None,
            Some(self.config.analyze_timeout()),
        )
        .await
    }
}

/// Posts analytics payloads without waiting for them.
pub struct AnalyticsBeacon {
    url: String,
}

impl AnalyticsBeacon {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            url: config.analytics_url(),
        }
    }
}

impl AnalyticsSink for AnalyticsBeacon {
    fn send(&self, payload: AnalyticsPayload) {
        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("analytics event {} not encoded: {}", payload.event_type, e);
                return;
            }
        };
        let url = self.url.clone();
        let event_type = payload.event_type;

        spawn_local(async move {
            match send("POST", &url, Some(&body), None).await {
                Ok(reply) if !reply.is_success() => {
                    tracing::debug!("analytics {} answered {}", event_type, reply.status);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("analytics {} not delivered: {}", event_type, e),
            }
        });
    }
}

/// Log the backend health once; failures only reach the console.
pub fn check_health(config: &AppConfig) {
    let url = config.health_url();
    spawn_local(async move {
        let reply = match send("GET", &url, None, None).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("health check failed: {}", e);
                return;
            }
        };
        match serde_json::from_str::<BackendHealth>(&reply.body) {
            Ok(health) if health.is_healthy() => tracing::info!(
                "backend {} {} is healthy",
                health.app_name.as_deref().unwrap_or("service"),
                health.version.as_deref().unwrap_or("")
            ),
            Ok(health) => tracing::warn!("backend reports status '{}'", health.status),
            Err(e) => tracing::warn!("unreadable health response ({}): {}", reply.status, e),
        }
    });
}

// WASM-specific tests that run in a browser environment
#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use choks_core::error::{NETWORK_MESSAGE, TIMEOUT_MESSAGE};
    use choks_core::AnalysisError;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    /// Replaces `window.fetch` with a JS function of `request` until dropped.
    struct FetchStub {
        original: JsValue,
    }

    impl FetchStub {
        fn install(body: &str) -> Self {
            let window = web_sys::window().unwrap();
            let original = js_sys::Reflect::get(&window, &"fetch".into()).unwrap();
            let stub = js_sys::Function::new_with_args("request", body);
            js_sys::Reflect::set(&window, &"fetch".into(), &stub).unwrap();
            Self { original }
        }
    }

    impl Drop for FetchStub {
        fn drop(&mut self) {
            let window = web_sys::window().unwrap();
            js_sys::Reflect::set(&window, &"fetch".into(), &self.original).unwrap();
        }
    }

    /// Pending until the request's signal aborts, like a stalled server.
    const STALLED: &str = "return new Promise((_, reject) => request.signal.addEventListener('abort', \
        () => reject(new DOMException('The operation was aborted.', 'AbortError'))));";

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            location: "Downtown Plaza".into(),
            business_type: "food_truck".into(),
            target_demographics: vec![],
        }
    }

    #[wasm_bindgen_test]
    async fn test_stalled_request_times_out() {
        let _stub = FetchStub::install(STALLED);
        let timeout = Duration::from_millis(1);
        let err = send("POST", "/api/analyze", Some("{}"), Some(timeout))
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Timeout(timeout));
        assert_eq!(AnalysisError::from(err).user_message(), TIMEOUT_MESSAGE);
    }

    #[wasm_bindgen_test]
    async fn test_backend_applies_configured_timeout() {
        let _stub = FetchStub::install(STALLED);
        let config = AppConfig::from_json(r#"{"analyze_timeout_ms":5}"#).unwrap();
        let backend = FetchBackend::new(Rc::new(config));
        let err = backend.analyze(&request()).await.unwrap_err();
        assert_eq!(err, TransportError::Timeout(Duration::from_millis(5)));
    }

    #[wasm_bindgen_test]
    async fn test_error_status_keeps_body() {
        let _stub = FetchStub::install(
            "return Promise.resolve(new Response('{\"error\":\"rate limited\"}', { status: 500 }));",
        );
        let reply = send("POST", "/api/analyze", Some("{}"), Some(Duration::from_secs(30)))
            .await
            .unwrap();
        assert_eq!(reply, HttpReply::new(500, r#"{"error":"rate limited"}"#));
    }

    #[wasm_bindgen_test]
    async fn test_rejected_fetch_is_network_error() {
        let _stub = FetchStub::install("return Promise.reject(new TypeError('Failed to fetch'));");
        let err = FetchBackend::new(Rc::new(AppConfig::default()))
            .analyze(&request())
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Network("Failed to fetch".into()));
        assert_eq!(AnalysisError::from(err).user_message(), NETWORK_MESSAGE);
    }

    #[wasm_bindgen_test]
    async fn test_dot_segment_id_never_reaches_fetch() {
        let _stub = FetchStub::install("throw new Error('fetch called');");
        let err = FetchBackend::new(Rc::new(AppConfig::default()))
            .fetch_saved("..")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Network("'..' is not an analysis id".into())
        );
    }
}
