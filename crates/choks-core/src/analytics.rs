//! Best-effort telemetry
//!
//! Events are handed to an `AnalyticsSink` and forgotten. A sink must never
//! block the caller or surface an error to the user.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Body of `POST /api/analytics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsPayload {
    pub event_type: String,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsEvent {
    PageView {
        path: String,
        timestamp: DateTime<Utc>,
        user_agent: String,
    },
    AnalysisStarted {
        business_type: String,
        has_demographics: bool,
    },
    FeatureCardClick {
        card: String,
    },
}

impl AnalyticsEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AnalyticsEvent::PageView { .. } => "page_view",
            AnalyticsEvent::AnalysisStarted { .. } => "analysis_started",
            AnalyticsEvent::FeatureCardClick { .. } => "feature_card_click",
        }
    }

    pub fn to_payload(&self) -> AnalyticsPayload {
        let data = match self {
            AnalyticsEvent::PageView {
                path,
                timestamp,
                user_agent,
            } => json!({
                "page": path,
                "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                "user_agent": user_agent,
            }),
            AnalyticsEvent::AnalysisStarted {
                business_type,
                has_demographics,
            } => json!({
                "business_type": business_type,
                "has_demographics": has_demographics,
            }),
            AnalyticsEvent::FeatureCardClick { card } => json!({ "card": card }),
        };

        AnalyticsPayload {
            event_type: self.event_type().to_string(),
            data: match data {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }
}

/// Fire-and-forget delivery of analytics payloads.
pub trait AnalyticsSink {
    fn send(&self, payload: AnalyticsPayload);
}

/// Builds analytics events from page interactions.
pub struct AnalyticsReporter<S: AnalyticsSink> {
    sink: S,
}

impl<S: AnalyticsSink> AnalyticsReporter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn report_page_view(&self, path: &str, user_agent: &str) {
        self.emit(AnalyticsEvent::PageView {
            path: path.to_string(),
            timestamp: Utc::now(),
            user_agent: user_agent.to_string(),
        });
    }

    pub fn report_analysis_started(&self, business_type: &str, has_demographics: bool) {
        self.emit(AnalyticsEvent::AnalysisStarted {
            business_type: business_type.to_string(),
            has_demographics,
        });
    }

    pub fn report_feature_card_click(&self, card_label: &str) {
        self.emit(AnalyticsEvent::FeatureCardClick {
            card: card_label.trim().to_string(),
        });
    }

    pub fn emit(&self, event: AnalyticsEvent) {
        tracing::debug!("analytics event: {}", event.event_type());
        self.sink.send(event.to_payload());
    }
}
