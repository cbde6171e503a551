// Handlers module - API endpoint processors
//
// - POST /api/gemini/generate                → course outline
// - POST /api/gemini/generate-image          → image generation
// - POST /api/gemini/generate-lesson-content → lesson Markdown
// - GET  /api/gemini/models, /api/health
// - GET  /doc, /doc.json, /doc.md

pub mod common;
pub mod docs;
pub mod gemini;
pub mod lesson;

use std::sync::Arc;

use crate::models::{AppConfig, PromptConfig};
use crate::modules::audit::{AuditCollection, AuditLogger, AuditRecord};
use crate::modules::image_store::ImageStore;
use crate::proxy::error::ProxyError;
use crate::proxy::upstream::client::UpstreamClient;

/// Shared application state for Axum handlers
#[derive(Clone)]
pub struct AppState {
    /// None when the client could not be built (e.g. no API key)
    pub upstream: Option<Arc<UpstreamClient>>,
    pub upstream_error: Option<String>,
    pub images: Arc<ImageStore>,
    pub audit: Arc<AuditLogger>,
    pub prompts: PromptConfig,
    pub default_image_model: String,
}

impl AppState {
    pub fn new(
        upstream: Result<UpstreamClient, String>,
        images: Arc<ImageStore>,
        audit: Arc<AuditLogger>,
        prompts: PromptConfig,
        default_image_model: String,
    ) -> Self {
        let (upstream, upstream_error) = match upstream {
            Ok(client) => (Some(Arc::new(client)), None),
            Err(e) => (None, Some(e)),
        };
        Self {
            upstream,
            upstream_error,
            images,
            audit,
            prompts,
            default_image_model,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let upstream = UpstreamClient::new(&config.upstream);
        if let Err(e) = &upstream {
            tracing::warn!("Gemini client unavailable, generation endpoints will fail: {}", e);
        }
        let images = ImageStore::new(&config.images.output_dir, config.server.public_base_url());
        Self::new(
            upstream,
            Arc::new(images),
            Arc::new(AuditLogger::new(&config.audit)),
            config.prompts.clone(),
            config.images.default_model.clone(),
        )
    }

    pub fn upstream(&self) -> Result<&Arc<UpstreamClient>, ProxyError> {
        self.upstream.as_ref().ok_or_else(|| {
            ProxyError::UpstreamUnavailable(
                self.upstream_error
                    .clone()
                    .unwrap_or_else(|| "Gemini client not initialized".to_string()),
            )
        })
    }

    /// Queue an audit row; successes and failures land in different collections
    pub fn audit(&self, record: AuditRecord) {
        let collection = if record.success {
            AuditCollection::GeminiApi
        } else {
            AuditCollection::General
        };
        self.audit.dispatch(collection, record);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_upstream_maps_to_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_support::state_without_upstream(dir.path());
        match state.upstream() {
            Err(ProxyError::UpstreamUnavailable(msg)) => assert!(msg.contains("GEMINI_API_KEY")),
            _ => panic!("expected UpstreamUnavailable"),
        }
    }

    #[test]
    fn test_from_config_without_key() {
        let state = AppState::from_config(&AppConfig::default());
        assert!(state.upstream.is_none());
        assert!(state.upstream_error.is_some());
        assert_eq!(
            state.default_image_model,
            "gemini-2.0-flash-preview-image-generation"
        );
        assert!(!state.audit.is_enabled());
    }
}
