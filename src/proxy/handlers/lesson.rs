// Lesson content handler - POST /api/gemini/generate-lesson-content

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::common::{
    check_model, echo, new_trace_id, parse_body, require, EMPTY_RESPONSE_MESSAGE,
};
use super::AppState;
use crate::models::request::{lesson_id_string, non_blank};
use crate::models::{LessonContentRequest, ResultEnvelope, ResultInfo};
use crate::modules::audit::AuditRecord;
use crate::proxy::common::prompts::lesson_content_prompt;
use crate::proxy::error::{ErrorEnvelope, ProxyError};
use crate::proxy::mappers::gemini::normalizer::normalize;
use crate::proxy::mappers::gemini::wrapper::wrap_lesson_request;

pub const LESSON_ID_REQUIRED: &str = "\"lessonId\" must be provided.";
pub const CONTEXT_REQUIRED: &str = "\"context\" must be provided as an object.";
pub const LESSON_TITLE_REQUIRED: &str = "\"context.lessonTitle\" must be a non-empty string.";
const LESSON_FAILED: &str = "Error generating lesson content";
const LESSON_ENDPOINT: &str = "/api/gemini/generate-lesson-content";

static MARKDOWN_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^```(?:markdown|md)?[ \t]*\n([\s\S]*?)\n\s*```\s*$")
        .expect("static fence regex is valid")
});

/// Models sometimes wrap the whole lesson in a ```markdown fence
fn strip_markdown_fence(text: &str) -> &str {
    let trimmed = text.trim();
    MARKDOWN_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed)
}

pub async fn handle_generate_lesson_content(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ResultEnvelope>, ErrorEnvelope> {
    let trace_id = new_trace_id("lesson");
    let req: LessonContentRequest = parse_body(body)?;
    let lesson_id = lesson_id_string(&req.lesson_id)
        .ok_or_else(|| ProxyError::Validation(LESSON_ID_REQUIRED.to_string()))?;
    let context = req
        .context
        .as_ref()
        .ok_or_else(|| ProxyError::Validation(CONTEXT_REQUIRED.to_string()))?;
    let lesson_title = require(&context.lesson_title, LESSON_TITLE_REQUIRED)?;
    let model = non_blank(&req.model)
        .unwrap_or(&state.prompts.lesson_model)
        .to_string();
    check_model(&model)?;
    let upstream = state.upstream()?;

    info!(
        "[{}] Lesson request: lesson_id={}, title={}, model={}",
        trace_id, lesson_id, lesson_title, model
    );

    let prompt = lesson_content_prompt(&lesson_id, context, &state.prompts.content_language);
    let generation_config_used = req.generation_config.clone();
    let safety_settings_used = echo(&req.safety_settings);
    let audit = AuditRecord::new(&trace_id, LESSON_ENDPOINT, Some(model.clone()), lesson_title);
    let request = wrap_lesson_request(&model, prompt, req.generation_config, req.safety_settings);

    let raw = match upstream.generate_content(&request).await {
        Ok(v) => v,
        Err(failure) => {
            error!("[{}] Upstream call failed: {}", trace_id, failure);
            let err = ProxyError::Upstream {
                summary: LESSON_FAILED.to_string(),
                message: failure.to_string(),
            };
            state.audit(audit.failed(err.status().as_u16(), err.to_string()));
            let result =
                ResultInfo::for_failure(Some(model), generation_config_used, safety_settings_used);
            return Err(err.with_result(result));
        }
    };

    let normalized = normalize(&raw);
    let result = ResultInfo::new(
        &model,
        normalized.token_usage.clone(),
        generation_config_used,
        safety_settings_used,
    );
    let audit = audit.with_tokens(normalized.token_usage.counts());

    if let Some(block) = normalized.block {
        warn!("[{}] Content blocked: {}", trace_id, block.reason);
        let err = ProxyError::from(block);
        state.audit(audit.failed(err.status().as_u16(), err.to_string()));
        return Err(err.with_result(result));
    }

    let text = match normalized.text {
        Some(t) => t,
        None => {
            error!("[{}] Unexpected Gemini response structure: {}", trace_id, raw);
            let err = ProxyError::NoContent;
            state.audit(audit.failed(err.status().as_u16(), err.to_string()));
            return Err(err.with_result(result));
        }
    };

    state.audit(audit);

    let content = strip_markdown_fence(&text);
    let mut envelope = ResultEnvelope::ok(json!({
        "lessonId": lesson_id,
        "content": content,
        "format": "markdown",
    }))
    .with_result(result);
    if content.is_empty() {
        warn!("[{}] Gemini returned blank lesson content", trace_id);
        envelope = envelope.with_message(EMPTY_RESPONSE_MESSAGE);
    }

    info!("[{}] ✓ Lesson content generated ({} chars)", trace_id, content.len());
    Ok(Json(envelope))
}
