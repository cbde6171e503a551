// Gemini response normalization
//
// The upstream payload comes in two shapes: wrapped in a `response` object, or bare.
// Every field is looked up on the inner layer first and the outer layer second.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::models::TokenUsage;
use crate::proxy::error::ProxyError;

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```json\s*\n([\s\S]*?)\n\s*```").expect("static fence regex is valid")
});

pub const PARSE_ERROR_NOTE: &str =
    "The content returned by Gemini is not valid JSON or is not in the expected format.";

/// The two shapes an upstream response can take
#[derive(Debug, Clone, Copy)]
pub enum UpstreamResponse<'a> {
    Wrapped { inner: &'a Value, outer: &'a Value },
    Bare(&'a Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SafetyBlock {
    /// `blockReasonMessage` when present, else `blockReason`
    pub reason: String,
    pub prompt_feedback: Value,
}

impl From<SafetyBlock> for ProxyError {
    fn from(block: SafetyBlock) -> Self {
        ProxyError::Blocked {
            reason: block.reason,
            prompt_feedback: block.prompt_feedback,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub data: String,
    pub mime_type: String,
    /// Text of the sibling parts, newline joined
    pub accompanying_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    Found(ImagePayload),
    /// Parts were present but none carried inline image data
    NoImage,
    /// The response had no candidate parts at all
    NoParts,
}

/// Result of a generation call with shape ambiguity resolved
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    pub token_usage: TokenUsage,
    pub block: Option<SafetyBlock>,
    pub text: Option<String>,
    pub image: ImageOutcome,
}

/// Generated text after optional JSON decoding
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredOutput {
    Json(Value),
    Raw { raw_text: String, parse_error: String },
}

impl StructuredOutput {
    pub fn into_data(self) -> Value {
        match self {
            Self::Json(v) => v,
            Self::Raw {
                raw_text,
                parse_error,
            } => json!({
                "raw_text": raw_text,
                "parse_error": parse_error,
            }),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw { .. })
    }
}

fn non_empty_str(v: Option<&Value>) -> Option<&str> {
    v.and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

fn first_candidate_parts(layer: &Value) -> Option<&Vec<Value>> {
    layer
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
}

impl<'a> UpstreamResponse<'a> {
    pub fn classify(raw: &'a Value) -> Self {
        match raw.get("response") {
            Some(inner) if inner.is_object() => Self::Wrapped { inner, outer: raw },
            _ => Self::Bare(raw),
        }
    }

    /// Layers in lookup order
    fn layers(&self) -> Vec<&'a Value> {
        match *self {
            Self::Wrapped { inner, outer } => vec![inner, outer],
            Self::Bare(outer) => vec![outer],
        }
    }

    fn outer(&self) -> &'a Value {
        match *self {
            Self::Wrapped { outer, .. } | Self::Bare(outer) => outer,
        }
    }

    pub fn usage_metadata(&self) -> Option<&'a Value> {
        self.layers()
            .into_iter()
            .find_map(|l| l.get("usageMetadata").filter(|v| !v.is_null()))
    }

    pub fn safety_block(&self) -> Option<SafetyBlock> {
        self.layers().into_iter().find_map(|l| {
            let feedback = l.get("promptFeedback")?;
            let reason = non_empty_str(feedback.get("blockReason"))?;
            let shown = non_empty_str(feedback.get("blockReasonMessage")).unwrap_or(reason);
            Some(SafetyBlock {
                reason: shown.to_string(),
                prompt_feedback: feedback.clone(),
            })
        })
    }

    /// First candidate's first part text, then the flat `.text` convenience field
    pub fn text(&self) -> Option<&'a str> {
        self.layers()
            .into_iter()
            .find_map(|l| {
                first_candidate_parts(l).and_then(|parts| non_empty_str(parts.first()?.get("text")))
            })
            .or_else(|| self.outer().get("text").and_then(|t| t.as_str()))
    }

    /// Parts of the first candidate on the first layer that has any
    pub fn parts(&self) -> Option<&'a Vec<Value>> {
        self.layers().into_iter().find_map(first_candidate_parts)
    }

    pub fn image(&self) -> ImageOutcome {
        let parts = match self.parts() {
            Some(p) if !p.is_empty() => p,
            _ => return ImageOutcome::NoParts,
        };

        let image_idx = parts.iter().position(|part| {
            part.get("inlineData")
                .map(|d| non_empty_str(d.get("data")).is_some() && non_empty_str(d.get("mimeType")).is_some())
                .unwrap_or(false)
        });

        let idx = match image_idx {
            Some(i) => i,
            None => return ImageOutcome::NoImage,
        };

        let inline = &parts[idx]["inlineData"];
        let texts: Vec<&str> = parts
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .filter_map(|(_, p)| non_empty_str(p.get("text")))
            .collect();

        ImageOutcome::Found(ImagePayload {
            data: inline["data"].as_str().unwrap_or_default().to_string(),
            mime_type: inline["mimeType"].as_str().unwrap_or_default().to_string(),
            accompanying_text: if texts.is_empty() {
                None
            } else {
                Some(texts.join("\n"))
            },
        })
    }
}

/// Resolve every field of an upstream response in one pass
pub fn normalize(raw: &Value) -> NormalizedResponse {
    let shape = UpstreamResponse::classify(raw);
    NormalizedResponse {
        token_usage: TokenUsage::from_metadata(shape.usage_metadata().cloned()),
        block: shape.safety_block(),
        text: shape.text().map(|s| s.to_string()),
        image: shape.image(),
    }
}

/// Strip a ```json fence when present and decode the text as JSON.
/// Undecodable text degrades to the raw string plus a note instead of failing.
pub fn parse_structured_output(text: &str) -> StructuredOutput {
    let candidate = JSON_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(text);

    match serde_json::from_str::<Value>(candidate) {
        Ok(v) => StructuredOutput::Json(v),
        Err(e) => {
            tracing::debug!("Generated text is not JSON: {}", e);
            StructuredOutput::Raw {
                raw_text: text.to_string(),
                parse_error: PARSE_ERROR_NOTE.to_string(),
            }
        }
    }
}
