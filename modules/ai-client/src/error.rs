use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AiError>;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model over capacity ({message}), estimated wait {estimated_secs}s")]
    Capacity { estimated_secs: f64, message: String },

    #[error("Empty completion response")]
    Empty,
}

/// Body shape returned by the inference API while a model is loading.
#[derive(Debug, Deserialize)]
struct CapacityHint {
    error: String,
    estimated_time: f64,
}

impl AiError {
    /// Classify a non-success HTTP response. A 503 carrying an
    /// `estimated_time` hint is a transient capacity error; everything else
    /// is a plain API error.
    pub fn from_response(status: u16, body: String) -> Self {
        if status == 503 {
            if let Ok(hint) = serde_json::from_str::<CapacityHint>(&body) {
                return AiError::Capacity {
                    estimated_secs: hint.estimated_time,
                    message: hint.error,
                };
            }
        }
        AiError::Api {
            status,
            message: body,
        }
    }

    /// Server-suggested wait before the call is worth repeating.
    /// `None` means the error is not retryable.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AiError::Capacity { estimated_secs, .. } => {
                Some(Duration::from_secs_f64(estimated_secs.max(0.0)))
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_hint_parsed_from_503() {
        let body = r#"{"error": "Model is currently loading", "estimated_time": 5.0}"#;
        let err = AiError::from_response(503, body.to_string());
        assert!(matches!(err, AiError::Capacity { .. }));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn plain_503_is_api_error() {
        let err = AiError::from_response(503, "Service Unavailable".to_string());
        assert!(matches!(err, AiError::Api { status: 503, .. }));
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn non_503_never_retryable() {
        let body = r#"{"error": "bad key", "estimated_time": 5.0}"#;
        let err = AiError::from_response(401, body.to_string());
        assert!(matches!(err, AiError::Api { status: 401, .. }));
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn negative_estimate_clamped() {
        let err = AiError::Capacity {
            estimated_secs: -1.0,
            message: "weird".to_string(),
        };
        assert_eq!(err.retry_after(), Some(Duration::ZERO));
    }
}
