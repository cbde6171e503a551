// Error taxonomy for the gateway and its mapping onto the JSON envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use thiserror::Error;

use crate::models::{ResultEnvelope, ResultInfo};
use crate::proxy::upstream::client::UpstreamFailure;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Missing or malformed required input
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized: token required")]
    MissingToken,

    #[error("Forbidden: invalid token")]
    InvalidToken,

    #[error("Content blocked by the Gemini API")]
    Blocked {
        reason: String,
        prompt_feedback: Value,
    },

    #[error("Failed to initialize the Gemini API client")]
    UpstreamUnavailable(String),

    /// The generation call itself failed
    #[error("{summary}")]
    Upstream { summary: String, message: String },

    #[error("Could not extract text from the Gemini response. Unexpected structure.")]
    NoContent,

    #[error("No image found in the Gemini API response.")]
    NoImage,
}

impl ProxyError {
    /// Map an upstream failure, using `context` when the API itself gave no status
    pub fn upstream(context: &str, failure: UpstreamFailure) -> Self {
        match failure {
            UpstreamFailure::Api { status, message } => Self::Upstream {
                summary: format!("Gemini API error: HTTP {}", status),
                message,
            },
            other => Self::Upstream {
                summary: context.to_string(),
                message: other.to_string(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Blocked { .. } => StatusCode::BAD_REQUEST,
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::FORBIDDEN,
            Self::UpstreamUnavailable(_)
            | Self::Upstream { .. }
            | Self::NoContent
            | Self::NoImage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            Self::Blocked { reason, .. } => Some(format!("Reason: {}", reason)),
            Self::UpstreamUnavailable(msg) => Some(msg.clone()),
            Self::Upstream { message, .. } => Some(message.clone()),
            Self::NoContent => {
                Some("Check the server logs for the response structure.".to_string())
            }
            Self::NoImage => {
                Some("The response structure did not contain the expected image data.".to_string())
            }
            _ => None,
        }
    }

    pub fn with_result(self, result: ResultInfo) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self,
            result: Some(result),
        }
    }

    pub fn to_envelope(&self, result: Option<ResultInfo>) -> ResultEnvelope {
        let mut envelope = ResultEnvelope::failure(self.to_string());
        envelope.result = result;
        envelope.details = self.details();
        if let Self::Blocked {
            prompt_feedback, ..
        } = self
        {
            envelope.prompt_feedback = Some(prompt_feedback.clone());
        }
        envelope
    }
}

/// A failure plus whatever result bookkeeping was known when it happened
#[derive(Debug)]
pub struct ErrorEnvelope {
    pub error: ProxyError,
    pub result: Option<ResultInfo>,
}

impl From<ProxyError> for ErrorEnvelope {
    fn from(error: ProxyError) -> Self {
        Self {
            error,
            result: None,
        }
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        let status = self.error.status();
        (status, Json(self.error.to_envelope(self.result))).into_response()
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        ErrorEnvelope::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenUsage;
    use serde_json::json;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ProxyError::InvalidToken.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ProxyError::Blocked {
                reason: "SAFETY".into(),
                prompt_feedback: json!({})
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::UpstreamUnavailable("no key".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ProxyError::NoContent.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ProxyError::NoImage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_failure_envelope_always_has_error() {
        let errors = vec![
            ProxyError::Validation("Model is required".into()),
            ProxyError::MissingToken,
            ProxyError::InvalidToken,
            ProxyError::NoContent,
            ProxyError::NoImage,
            ProxyError::UpstreamUnavailable("x".into()),
        ];
        for e in errors {
            let env = e.to_envelope(None);
            assert!(!env.success);
            assert!(env.error.as_deref().map(|s| !s.is_empty()).unwrap_or(false));
        }
    }

    #[test]
    fn test_blocked_envelope_surfaces_reason_and_feedback() {
        let feedback = json!({"blockReason": "SAFETY"});
        let err = ProxyError::Blocked {
            reason: "SAFETY".into(),
            prompt_feedback: feedback.clone(),
        };
        let result = ResultInfo::new("m", TokenUsage::from_metadata(None), None, None);
        let env = err.to_envelope(Some(result));

        assert_eq!(env.details.as_deref(), Some("Reason: SAFETY"));
        assert_eq!(env.prompt_feedback, Some(feedback));
        assert_eq!(env.result.unwrap().model_used.as_deref(), Some("m"));
    }

    #[test]
    fn test_upstream_mapping() {
        let api = ProxyError::upstream(
            "Error processing the request",
            UpstreamFailure::Api {
                status: 400,
                message: "API key not valid".into(),
            },
        );
        assert_eq!(api.to_string(), "Gemini API error: HTTP 400");
        assert_eq!(api.details().as_deref(), Some("API key not valid"));

        let transport = ProxyError::upstream(
            "Error processing the request",
            UpstreamFailure::Transport("connection refused".into()),
        );
        assert_eq!(transport.to_string(), "Error processing the request");
        assert!(transport.details().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_into_response_status_and_body() {
        let response = ProxyError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Forbidden: invalid token");
    }
}
