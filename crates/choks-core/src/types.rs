//! Wire types for the analysis backend
//!
//! The backend speaks snake_case JSON. Responses are read loosely first
//! (`RawAnalysisResponse`) and only then checked against the typed
//! `Recommendation` shape, so a malformed payload becomes a backend error
//! instead of a half-rendered card.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AnalysisError, TransportError};

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub location: String,
    pub business_type: String,
    pub target_demographics: Vec<String>,
}

/// Per-location metrics computed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub foot_traffic_score: f64,
    pub competition_density: f64,
    pub demographic_match: f64,
    pub category_gaps: Vec<String>,
    pub nearby_attractions: Vec<String>,
    pub risk_factors: Vec<String>,
    pub optimal_hours: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub confidence_score: f64,
    pub reasoning: String,
    pub estimated_revenue_potential: String,
    pub setup_requirements: Vec<String>,
    pub recommended_duration: String,
    pub insights: Insights,
    /// ISO timestamp the backend stamps on each recommendation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

/// A successful analysis, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub analysis_id: Option<String>,
    pub recommendation: Recommendation,
}

/// Response of `POST /api/analyze`, before shape checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnalysisResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub analysis_id: Option<String>,
    #[serde(default)]
    pub recommendation: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `GET /api/analysis/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSavedAnalysis {
    #[serde(default)]
    pub analysis_id: Option<String>,
    #[serde(default)]
    pub data: Option<SavedAnalysisData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavedAnalysisData {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub recommendation: Option<Value>,
}

/// A stored analysis together with the form values it was run with.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedAnalysis {
    pub result: AnalysisResult,
    pub location: String,
    pub business_type: String,
}

/// Response of `GET /api/health`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BackendHealth {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl BackendHealth {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Status line and raw body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Message used when `success:true` arrives without a usable recommendation.
pub const INCOMPLETE_ANALYSIS_MESSAGE: &str = "Received an incomplete analysis from the server";

fn parse_recommendation(value: Option<Value>) -> Result<Recommendation, AnalysisError> {
    let value = value.ok_or_else(|| {
        tracing::error!("analysis response has no recommendation");
        AnalysisError::Backend(Some(INCOMPLETE_ANALYSIS_MESSAGE.to_string()))
    })?;
    serde_json::from_value(value).map_err(|e| {
        tracing::error!("malformed recommendation payload: {}", e);
        AnalysisError::Backend(Some(INCOMPLETE_ANALYSIS_MESSAGE.to_string()))
    })
}

/// Interpret an analyze reply.
///
/// Non-JSON bodies are network errors; non-2xx or anything but
/// `success:true` is a backend error carrying the backend message if any.
pub fn interpret_analyze_reply(reply: &HttpReply) -> Result<AnalysisResult, AnalysisError> {
    let raw: RawAnalysisResponse = serde_json::from_str(&reply.body)
        .map_err(|e| TransportError::Body(e.to_string()))?;

    if !reply.is_success() || raw.success != Some(true) {
        tracing::debug!(status = reply.status, "analysis rejected by backend");
        return Err(AnalysisError::Backend(raw.error));
    }

    Ok(AnalysisResult {
        analysis_id: raw.analysis_id,
        recommendation: parse_recommendation(raw.recommendation)?,
    })
}

/// Interpret a saved-analysis lookup reply.
pub fn interpret_saved_reply(reply: &HttpReply) -> Result<SavedAnalysis, AnalysisError> {
    let raw: RawSavedAnalysis = serde_json::from_str(&reply.body)
        .map_err(|e| TransportError::Body(e.to_string()))?;

    if !reply.is_success() || raw.error.is_some() {
        return Err(AnalysisError::Backend(raw.error));
    }

    let data = raw.data.unwrap_or_default();
    Ok(SavedAnalysis {
        result: AnalysisResult {
            analysis_id: raw.analysis_id,
            recommendation: parse_recommendation(data.recommendation)?,
        },
        location: data.location.unwrap_or_default(),
        business_type: data.business_type.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recommendation_json() -> Value {
        json!({
            "confidence_score": 82.4,
            "reasoning": "High lunch-hour demand",
            "estimated_revenue_potential": "$800-1200/day",
            "setup_requirements": ["permit A"],
            "recommended_duration": "3 months",
            "insights": {
                "foot_traffic_score": 91.2,
                "competition_density": 40.0,
                "demographic_match": 77.6,
                "category_gaps": ["vegan"],
                "nearby_attractions": [],
                "risk_factors": [],
                "optimal_hours": ["11:00-14:00"]
            }
        })
    }

    #[test]
    fn test_request_serializes_snake_case() {
        let request = AnalysisRequest {
            location: "Downtown Plaza".into(),
            business_type: "food_truck".into(),
            target_demographics: vec!["young_professionals".into()],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "location": "Downtown Plaza",
                "business_type": "food_truck",
                "target_demographics": ["young_professionals"]
            })
        );
    }

    #[test]
    fn test_success_reply() {
        let body = json!({
            "success": true,
            "analysis_id": "a1",
            "recommendation": recommendation_json()
        });
        let result = interpret_analyze_reply(&HttpReply::new(200, body.to_string())).unwrap();
        assert_eq!(result.analysis_id.as_deref(), Some("a1"));
        assert_eq!(result.recommendation.insights.category_gaps, vec!["vegan"]);
    }

    #[test]
    fn test_extra_backend_fields_are_tolerated() {
        let mut rec = recommendation_json();
        rec["location"] = json!({"name": "Downtown Plaza", "latitude": 1.0});
        rec["generated_at"] = json!("2024-05-01T12:00:00");
        let body = json!({"success": true, "recommendation": rec});
        let result = interpret_analyze_reply(&HttpReply::new(200, body.to_string())).unwrap();
        assert_eq!(
            result.recommendation.generated_at.as_deref(),
            Some("2024-05-01T12:00:00")
        );
    }

    #[test]
    fn test_server_error_with_message() {
        let body = json!({"success": false, "error": "rate limited"});
        let err = interpret_analyze_reply(&HttpReply::new(500, body.to_string())).unwrap_err();
        assert_eq!(err, AnalysisError::Backend(Some("rate limited".into())));
    }

    #[test]
    fn test_error_only_payload() {
        let body = json!({"error": "Location and business_type are required"});
        let err = interpret_analyze_reply(&HttpReply::new(400, body.to_string())).unwrap_err();
        assert_eq!(err.user_message(), "Location and business_type are required");
    }

    #[test]
    fn test_success_status_without_success_flag() {
        let body = json!({"recommendation": recommendation_json()});
        let err = interpret_analyze_reply(&HttpReply::new(200, body.to_string())).unwrap_err();
        assert_eq!(err, AnalysisError::Backend(None));
    }

    #[test]
    fn test_success_flag_on_error_status_is_still_failure() {
        let body = json!({"success": true, "recommendation": recommendation_json()});
        let err = interpret_analyze_reply(&HttpReply::new(503, body.to_string())).unwrap_err();
        assert_eq!(err.user_message(), "Analysis failed");
    }

    #[test]
    fn test_malformed_recommendation_is_backend_error() {
        let mut rec = recommendation_json();
        rec["insights"]
            .as_object_mut()
            .unwrap()
            .remove("foot_traffic_score");
        let body = json!({"success": true, "recommendation": rec});
        let err = interpret_analyze_reply(&HttpReply::new(200, body.to_string())).unwrap_err();
        assert_eq!(err.user_message(), INCOMPLETE_ANALYSIS_MESSAGE);
    }

    #[test]
    fn test_missing_recommendation_is_backend_error() {
        let body = json!({"success": true, "analysis_id": "a1"});
        let err = interpret_analyze_reply(&HttpReply::new(200, body.to_string())).unwrap_err();
        assert_eq!(err.kind(), "backend");
    }

    #[test]
    fn test_html_body_is_network_error() {
        let err =
            interpret_analyze_reply(&HttpReply::new(502, "<html>Bad Gateway</html>")).unwrap_err();
        assert!(matches!(err, AnalysisError::Network(TransportError::Body(_))));
    }

    #[test]
    fn test_saved_reply() {
        let body = json!({
            "analysis_id": "analysis_1700000000",
            "data": {
                "location": "Downtown Plaza",
                "business_type": "food_truck",
                "target_demographics": [],
                "coordinates": [40.7, -74.0],
                "recommendation": recommendation_json(),
                "raw_data": {}
            },
            "created_at": "2024-05-01T12:00:00",
            "updated_at": "2024-05-01T12:00:00"
        });
        let saved = interpret_saved_reply(&HttpReply::new(200, body.to_string())).unwrap();
        assert_eq!(saved.result.analysis_id.as_deref(), Some("analysis_1700000000"));
        assert_eq!(saved.result.recommendation.recommended_duration, "3 months");
        assert_eq!(saved.location, "Downtown Plaza");
        assert_eq!(saved.business_type, "food_truck");
    }

    #[test]
    fn test_saved_reply_without_form_values() {
        let body = json!({
            "analysis_id": "a1",
            "data": {"recommendation": recommendation_json()}
        });
        let saved = interpret_saved_reply(&HttpReply::new(200, body.to_string())).unwrap();
        assert_eq!(saved.location, "");
        assert_eq!(saved.business_type, "");
    }

    #[test]
    fn test_health_payload() {
        let health: BackendHealth = serde_json::from_str(
            r#"{"status":"healthy","timestamp":1700000000.5,"app_name":"Choks","version":"1.0.0"}"#,
        )
        .unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.app_name.as_deref(), Some("Choks"));
    }

    #[test]
    fn test_saved_reply_not_found() {
        let body = json!({"error": "Analysis not found"});
        let err = interpret_saved_reply(&HttpReply::new(404, body.to_string())).unwrap_err();
        assert_eq!(err.user_message(), "Analysis not found");
    }
}
