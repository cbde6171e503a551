// Gemini generateContent request models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Models advertised by `GET /api/gemini/models`
pub const SUPPORTED_MODELS: [&str; 4] = [
    "gemini-1.5-pro-latest",
    "gemini-1.5-flash-latest",
    "gemini-pro",
    "gemini-2.0-flash-preview-image-generation",
];

/// Modalities forced onto every image generation request
pub const IMAGE_RESPONSE_MODALITIES: [&str; 2] = ["TEXT", "IMAGE"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<TextPart>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![TextPart { text: text.into() }],
        }
    }
}

/// Body of `models/{model}:generateContent`. `model` travels in the URL, not the body.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip)]
    pub model: String,
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Caller entries forwarded untouched, whatever their shape
    pub safety_settings: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_request_serialization() {
        let req = GenerateContentRequest {
            model: "gemini-pro".to_string(),
            contents: vec![Content::user_text("hello")],
            generation_config: Some(json!({"temperature": 0.7})),
            safety_settings: None,
            tools: None,
        };

        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("model").is_none());
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(v["generationConfig"]["temperature"], 0.7);
        assert!(v.get("safetySettings").is_none());
        assert!(v.get("tools").is_none());
    }

    #[test]
    fn test_safety_settings_serialize_verbatim() {
        let entries = vec![
            json!({"category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_ONLY_HIGH", "method": "PROBABILITY"}),
            json!({"category": "HARM_CATEGORY_HARASSMENT", "threshold": 4}),
            json!({"category": "HARM_CATEGORY_DANGEROUS_CONTENT"}),
        ];
        let req = GenerateContentRequest {
            model: "m".to_string(),
            contents: vec![Content::user_text("hi")],
            generation_config: None,
            safety_settings: Some(entries.clone()),
            tools: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["safetySettings"], json!(entries));
    }
}
