// Gemini Handler - course outline, image generation, model list, health
//
// Every generation call goes: validate → build request → upstream → normalize → envelope.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::common::{
    check_model, echo, new_trace_id, parse_body, require, EMPTY_RESPONSE_MESSAGE,
};
use super::AppState;
use crate::models::request::non_blank;
use crate::models::{CourseOutlineRequest, ImageRequest, ResultEnvelope, ResultInfo};
use crate::modules::audit::AuditRecord;
use crate::proxy::common::prompts::course_outline_prompt;
use crate::proxy::error::{ErrorEnvelope, ProxyError};
use crate::proxy::mappers::gemini::models::SUPPORTED_MODELS;
use crate::proxy::mappers::gemini::normalizer::{normalize, parse_structured_output, ImageOutcome};
use crate::proxy::mappers::gemini::wrapper::{
    force_image_modalities, wrap_course_request, wrap_image_request,
};

pub const MODEL_REQUIRED: &str = "A model must be specified.";
pub const KEYWORDS_REQUIRED: &str = "\"keywords\" must be provided as a non-empty string.";
pub const PROMPT_REQUIRED: &str = "\"prompt\" must be provided as a non-empty string.";
pub const UNSTRUCTURED_MESSAGE: &str =
    "The content returned by Gemini could not be interpreted as structured JSON.";

const COURSE_ENDPOINT: &str = "/api/gemini/generate";
const IMAGE_ENDPOINT: &str = "/api/gemini/generate-image";

/// POST /api/gemini/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ResultEnvelope>, ErrorEnvelope> {
    let trace_id = new_trace_id("course");
    let req: CourseOutlineRequest = parse_body(body)?;
    let model = require(&req.model, MODEL_REQUIRED)?.to_string();
    let keywords = require(&req.keywords, KEYWORDS_REQUIRED)?.to_string();
    check_model(&model)?;
    let upstream = state.upstream()?;

    info!("[{}] Course outline request: model={}, keywords={}", trace_id, model, keywords);

    let generation_config_used = req.generation_config.clone();
    let safety_settings_used = echo(&req.safety_settings);
    let prompt = course_outline_prompt(&keywords, &state.prompts.content_language);
    let request = wrap_course_request(
        &model,
        prompt,
        req.generation_config,
        req.safety_settings,
        req.tools,
    );

    let audit = AuditRecord::new(&trace_id, COURSE_ENDPOINT, Some(model.clone()), &keywords);

    let raw = match upstream.generate_content(&request).await {
        Ok(v) => v,
        Err(failure) => {
            error!("[{}] Upstream call failed: {}", trace_id, failure);
            let err = ProxyError::upstream("Error processing the request", failure);
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

    if text.trim().is_empty() {
        warn!("[{}] Gemini returned blank text", trace_id);
        return Ok(Json(
            ResultEnvelope::ok(json!({}))
                .with_result(result)
                .with_message(EMPTY_RESPONSE_MESSAGE),
        ));
    }

    let structured = parse_structured_output(&text);
    let is_raw = structured.is_raw();
    let mut envelope = ResultEnvelope::ok(structured.into_data()).with_result(result);
    if is_raw {
        debug!("[{}] Returning raw text, {} chars", trace_id, text.len());
        envelope = envelope.with_message(UNSTRUCTURED_MESSAGE);
    }

    info!("[{}] ✓ Course outline generated", trace_id);
    Ok(Json(envelope))
}

/// POST /api/gemini/generate-image
pub async fn handle_generate_image(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ResultEnvelope>, ErrorEnvelope> {
    let trace_id = new_trace_id("image");
    let req: ImageRequest = parse_body(body)?;
    let prompt = require(&req.prompt, PROMPT_REQUIRED)?.to_string();
    let model = non_blank(&req.model)
        .unwrap_or(&state.default_image_model)
        .to_string();
    check_model(&model)?;
    let upstream = state.upstream()?;

    info!("[{}] Image request: model={}", trace_id, model);

    let generation_config = force_image_modalities(req.generation_config.as_ref());
    let safety_settings_used = echo(&req.safety_settings);
    let request = wrap_image_request(
        &model,
        &prompt,
        generation_config.clone(),
        req.safety_settings,
    );

    let audit = AuditRecord::new(&trace_id, IMAGE_ENDPOINT, Some(model.clone()), &prompt);

    let raw = match upstream.generate_content(&request).await {
        Ok(v) => v,
        Err(failure) => {
            error!("[{}] Upstream call failed: {}", trace_id, failure);
            let err = ProxyError::upstream("Error processing the image generation request", failure);
            state.audit(audit.failed(err.status().as_u16(), err.to_string()));
            let result = ResultInfo::for_failure(
                Some(model),
                Some(generation_config),
                safety_settings_used,
            );
            return Err(err.with_result(result));
        }
    };

    let normalized = normalize(&raw);
    let result = ResultInfo::new(
        &model,
        normalized.token_usage.clone(),
        Some(generation_config),
        safety_settings_used,
    );
    let audit = audit.with_tokens(normalized.token_usage.counts());

    if let Some(block) = normalized.block {
        warn!("[{}] Content blocked: {}", trace_id, block.reason);
        let err = ProxyError::from(block);
        state.audit(audit.failed(err.status().as_u16(), err.to_string()));
        return Err(err.with_result(result));
    }

    let image = match normalized.image {
        ImageOutcome::Found(image) => image,
        ImageOutcome::NoParts => {
            error!("[{}] Unexpected Gemini response structure: {}", trace_id, raw);
            let err = ProxyError::NoContent;
            state.audit(audit.failed(err.status().as_u16(), err.to_string()));
            return Err(err.with_result(result));
        }
        ImageOutcome::NoImage => {
            error!("[{}] No image in Gemini response: {}", trace_id, raw);
            let err = ProxyError::NoImage;
            state.audit(audit.failed(err.status().as_u16(), err.to_string()));
            return Err(err.with_result(result));
        }
    };

    let (image_url, file_name) = match state.images.save_base64(&model, &image.data).await {
        Ok(saved) => {
            info!("[{}] Image saved: {} ({} bytes)", trace_id, saved.path.display(), saved.bytes);
            (Some(saved.url), Some(saved.file_name))
        }
        Err(e) => {
            warn!("[{}] Failed to save image: {}", trace_id, e);
            (None, None)
        }
    };

    state.audit(audit);

    Ok(Json(
        ResultEnvelope::ok(json!({
            "imageBase64": image.data,
            "mimeType": image.mime_type,
            "modelUsed": model,
            "textContent": image.accompanying_text,
            "imageUrl": image_url,
            "fileName": file_name,
        }))
        .with_result(result),
    ))
}

/// GET /api/gemini/models
pub async fn handle_list_models() -> Json<ResultEnvelope> {
    Json(ResultEnvelope::ok(json!({ "models": SUPPORTED_MODELS })))
}

/// GET /api/health
pub async fn handle_health() -> Json<ResultEnvelope> {
    Json(ResultEnvelope::ok(json!({
        "status": "online",
        "message": "Gemini API proxy is running",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
