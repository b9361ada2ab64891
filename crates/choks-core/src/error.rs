use std::time::Duration;

use thiserror::Error;

/// Shown when the backend reports a failure without a message.
pub const GENERIC_BACKEND_MESSAGE: &str = "Analysis failed";

/// Shown when the request never produced a readable response.
pub const NETWORK_MESSAGE: &str = "Network error. Please check your connection and try again.";

/// Shown when the analyze call is aborted by the client-side timeout.
pub const TIMEOUT_MESSAGE: &str = "The analysis is taking too long. Please try again.";

/// Missing required form input, detected before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a location to analyze")]
    MissingLocation,

    #[error("Please select a business type")]
    MissingBusinessType,
}

/// The request could not complete or its body could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Unreadable response body: {0}")]
    Body(String),
}

/// Everything that can end an analysis attempt in the error panel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Structured failure from the service, with its message when supplied
    #[error("Backend error: {}", .0.as_deref().unwrap_or(GENERIC_BACKEND_MESSAGE))]
    Backend(Option<String>),

    #[error(transparent)]
    Network(#[from] TransportError),
}

impl AnalysisError {
    /// Text rendered into the error panel.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Validation(err) => err.to_string(),
            AnalysisError::Backend(Some(message)) if !message.trim().is_empty() => message.clone(),
            AnalysisError::Backend(_) => GENERIC_BACKEND_MESSAGE.to_string(),
            AnalysisError::Network(TransportError::Timeout(_)) => TIMEOUT_MESSAGE.to_string(),
            AnalysisError::Network(_) => NETWORK_MESSAGE.to_string(),
        }
    }

    /// Short tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Validation(_) => "validation",
            AnalysisError::Backend(_) => "backend",
            AnalysisError::Network(_) => "network",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Local storage unavailable: {0}")]
    Unavailable(String),

    #[error("Local storage write failed: {0}")]
    Write(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_is_verbatim() {
        let err = AnalysisError::Backend(Some("rate limited".to_string()));
        assert_eq!(err.user_message(), "rate limited");
    }

    #[test]
    fn test_backend_without_message_is_generic() {
        assert_eq!(AnalysisError::Backend(None).user_message(), "Analysis failed");
        assert_eq!(
            AnalysisError::Backend(Some("   ".to_string())).user_message(),
            "Analysis failed"
        );
    }

    #[test]
    fn test_network_errors_share_generic_message() {
        let err: AnalysisError = TransportError::Network("TypeError: Failed to fetch".into()).into();
        assert_eq!(err.user_message(), NETWORK_MESSAGE);
        let err: AnalysisError = TransportError::Body("expected value".into()).into();
        assert_eq!(err.user_message(), NETWORK_MESSAGE);
        assert_eq!(err.kind(), "network");
    }

    #[test]
    fn test_timeout_has_its_own_message() {
        let err: AnalysisError = TransportError::Timeout(Duration::from_secs(30)).into();
        assert_eq!(err.user_message(), TIMEOUT_MESSAGE);
        assert_eq!(err.to_string(), "Request timed out after 30000ms");
    }

    #[test]
    fn test_validation_message() {
        let err: AnalysisError = ValidationError::MissingBusinessType.into();
        assert_eq!(err.user_message(), "Please select a business type");
        assert_eq!(err.kind(), "validation");
    }
}
