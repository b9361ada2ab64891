//! Client configuration
//!
//! Every field has a default so a page without a config block still works.
//! Pages override values with a JSON object, usually embedded as
//! `<script type="application/json" id="choks-config">`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Element id of the optional JSON config block.
pub const CONFIG_ELEMENT_ID: &str = "choks-config";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend origin; empty means same origin
    pub api_base: String,
    /// Abort the analyze call after this many milliseconds
    pub analyze_timeout_ms: u64,
    /// localStorage key holding the save-list
    pub storage_key: String,
    /// How long the "saved" banner stays up
    pub banner_duration_ms: u32,
    /// trace, debug, info, warn or error
    pub log_level: String,
    pub dom: DomIds,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            analyze_timeout_ms: 30_000,
            storage_key: "savedAnalyses".to_string(),
            banner_duration_ms: 3_000,
            log_level: "info".to_string(),
            dom: DomIds::default(),
        }
    }
}

/// Identifiers of the markup owned by the page templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomIds {
    pub form: String,
    pub location: String,
    pub business_type: String,
    /// `name` attribute shared by the demographic checkboxes
    pub demographics_name: String,
    pub loading_modal: String,
    pub results_section: String,
    pub results_content: String,
    /// Class carried by every feature card
    pub feature_card_class: String,
}

impl Default for DomIds {
    fn default() -> Self {
        Self {
            form: "locationForm".to_string(),
            location: "location".to_string(),
            business_type: "businessType".to_string(),
            demographics_name: "demographics".to_string(),
            loading_modal: "loadingModal".to_string(),
            results_section: "resultsSection".to_string(),
            results_content: "resultsContent".to_string(),
            feature_card_class: "feature-card".to_string(),
        }
    }
}

/// Percent-encoded path segment for an analysis id.
///
/// Blank ids and the dot segments `.` and `..` are rejected; URL parsers
/// resolve the latter against the parent path even when escaped.
pub fn analysis_id_segment(analysis_id: &str) -> Option<String> {
    match analysis_id.trim() {
        "" | "." | ".." => None,
        _ => Some(urlencoding::encode(analysis_id).into_owned()),
    }
}

impl AppConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analyze_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "analyze_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "storage_key",
                reason: "must not be empty".to_string(),
            });
        }
        if self.tracing_level().is_none() {
            return Err(ConfigError::Invalid {
                field: "log_level",
                reason: format!("unknown level '{}'", self.log_level),
            });
        }
        Ok(())
    }

    pub fn analyze_timeout(&self) -> Duration {
        Duration::from_millis(self.analyze_timeout_ms)
    }

    pub fn tracing_level(&self) -> Option<tracing::Level> {
        self.log_level.trim().parse().ok()
    }

    pub fn analyze_url(&self) -> String {
        self.endpoint("/api/analyze")
    }

    pub fn analytics_url(&self) -> String {
        self.endpoint("/api/analytics")
    }

    pub fn health_url(&self) -> String {
        self.endpoint("/api/health")
    }

    /// `None` when the id can not name a record, see `analysis_id_segment`.
    pub fn saved_analysis_url(&self, analysis_id: &str) -> Option<String> {
        let segment = analysis_id_segment(analysis_id)?;
        Some(self.endpoint(&format!("/api/analysis/{}", segment)))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }
}
