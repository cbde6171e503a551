use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TOKEN_USAGE_UNAVAILABLE: &str = "Token usage information not available in the response.";
pub const TOKEN_USAGE_ERRORED: &str = "Not available due to a generation error.";

/// Token usage as reported upstream, or a note explaining why it is missing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TokenUsage {
    Reported(Value),
    Unavailable(String),
}

impl TokenUsage {
    pub fn from_metadata(metadata: Option<Value>) -> Self {
        match metadata {
            Some(v) => Self::Reported(v),
            None => Self::Unavailable(TOKEN_USAGE_UNAVAILABLE.to_string()),
        }
    }

    pub fn errored() -> Self {
        Self::Unavailable(TOKEN_USAGE_ERRORED.to_string())
    }

    /// (prompt, candidates) token counts when the upstream reported them
    pub fn counts(&self) -> (Option<u64>, Option<u64>) {
        match self {
            Self::Reported(v) => (
                v.get("promptTokenCount").and_then(|n| n.as_u64()),
                v.get("candidatesTokenCount").and_then(|n| n.as_u64()),
            ),
            Self::Unavailable(_) => (None, None),
        }
    }
}

/// Bookkeeping block attached to every generation response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    pub token_usage: TokenUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config_used: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_settings_used: Option<Value>,
}

impl ResultInfo {
    pub fn new(
        model_used: impl Into<String>,
        token_usage: TokenUsage,
        generation_config_used: Option<Value>,
        safety_settings_used: Option<Value>,
    ) -> Self {
        Self {
            model_used: Some(model_used.into()),
            token_usage,
            generation_config_used,
            safety_settings_used,
        }
    }

    /// Result block for a request whose upstream call failed before usage was known
    pub fn for_failure(
        model_used: Option<String>,
        generation_config_used: Option<Value>,
        safety_settings_used: Option<Value>,
    ) -> Self {
        Self {
            model_used,
            token_usage: TokenUsage::errored(),
            generation_config_used,
            safety_settings_used,
        }
    }
}

/// Uniform JSON wrapper returned by every endpoint.
///
/// `success == false` is only ever produced together with `error`; failures are built by
/// [`crate::proxy::error::ErrorEnvelope`], never by hand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<Value>,
}

impl ResultEnvelope {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            result: None,
            data: Some(data),
            error: None,
            details: None,
            message: None,
            prompt_feedback: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            data: None,
            error: Some(error.into()),
            details: None,
            message: None,
            prompt_feedback: None,
        }
    }

    pub fn with_result(mut self, result: ResultInfo) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
