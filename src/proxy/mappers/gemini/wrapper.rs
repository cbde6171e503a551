// Builds generateContent requests for each gateway endpoint

use serde_json::{json, Map, Value};

use super::models::{Content, GenerateContentRequest, IMAGE_RESPONSE_MODALITIES};

/// Course outline: the filled template as a single user message, caller options verbatim
pub fn wrap_course_request(
    model: &str,
    prompt: String,
    generation_config: Option<Value>,
    safety_settings: Option<Vec<Value>>,
    tools: Option<Vec<Value>>,
) -> GenerateContentRequest {
    GenerateContentRequest {
        model: model.to_string(),
        contents: vec![Content::user_text(prompt)],
        generation_config,
        safety_settings,
        tools,
    }
}

/// Merge the caller's generation config with the image+text modality flag.
/// The flag always wins; a non-object config is replaced.
pub fn force_image_modalities(user_config: Option<&Value>) -> Value {
    let mut merged: Map<String, Value> = user_config
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();
    merged.insert(
        "responseModalities".to_string(),
        json!(IMAGE_RESPONSE_MODALITIES),
    );
    Value::Object(merged)
}

/// Image generation: the prompt as-is, with modalities forced on
pub fn wrap_image_request(
    model: &str,
    prompt: &str,
    generation_config: Value,
    safety_settings: Option<Vec<Value>>,
) -> GenerateContentRequest {
    GenerateContentRequest {
        model: model.to_string(),
        contents: vec![Content::user_text(prompt)],
        generation_config: Some(generation_config),
        safety_settings,
        tools: None,
    }
}

/// Lesson content: instructional prompt, no tools
pub fn wrap_lesson_request(
    model: &str,
    prompt: String,
    generation_config: Option<Value>,
    safety_settings: Option<Vec<Value>>,
) -> GenerateContentRequest {
    wrap_course_request(model, prompt, generation_config, safety_settings, None)
}
