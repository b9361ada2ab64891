//! Choks location-analysis client core
//!
//! Everything the dashboard decides without a browser: form validation,
//! the analyze response boundary, the result card and its markup, the
//! browser-local save-list, analytics payloads and configuration.
//!
//! Two lifecycles sit on top:
//! - `AnalysisController`: submit, render, error, save, reset
//! - `AnalyticsReporter`: fire-and-forget page telemetry
//!
//! Both are written against small traits (`AnalysisBackend`, `AnalysisView`,
//! `KeyValueStore`, `AnalyticsSink`) implemented by the wasm app crate.

pub mod analytics;
pub mod config;
pub mod controller;
pub mod error;
pub mod render;
pub mod saved;
pub mod types;
pub mod validation;

pub use analytics::{AnalyticsEvent, AnalyticsPayload, AnalyticsReporter, AnalyticsSink};
pub use config::{analysis_id_segment, AppConfig, DomIds, CONFIG_ELEMENT_ID};
pub use controller::{AnalysisBackend, AnalysisController, AnalysisView, LoadingGuard, SubmitOutcome};
pub use error::{AnalysisError, ConfigError, StoreError, TransportError, ValidationError};
pub use render::{BannerKind, ConfidenceTier, ResultCard};
pub use saved::{KeyValueStore, SaveList, SavedAnalysisRecord};
pub use types::{
    AnalysisRequest, AnalysisResult, BackendHealth, HttpReply, Insights, Recommendation,
    SavedAnalysis,
};
pub use validation::{FormSnapshot, InputHint};
