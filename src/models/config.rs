use serde::{Deserialize, Serialize};

// ============================================================================
// Server
// ============================================================================

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_size() -> usize {
    50 * 1024 * 1024
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL used to build links to generated images.
    /// Falls back to `http://localhost:<port>` when unset.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            max_body_size: default_max_body_size(),
        }
    }
}

impl ServerConfig {
    pub fn public_base_url(&self) -> String {
        match &self.base_url {
            Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ => format!("http://localhost:{}", self.port),
        }
    }
}

// ============================================================================
// Upstream (Gemini REST API)
// ============================================================================

fn default_upstream_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    /// Seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default)]
    pub user_agent_override: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_upstream_base_url(),
            request_timeout: default_request_timeout(),
            user_agent_override: None,
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// Static bearer secret shared with callers. Empty rejects every token.
    #[serde(default)]
    pub api_token: String,
}

// ============================================================================
// Generated images
// ============================================================================

fn default_images_dir() -> String {
    "public/images".to_string()
}

fn default_image_model() -> String {
    "gemini-2.0-flash-preview-image-generation".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageConfig {
    #[serde(default = "default_images_dir")]
    pub output_dir: String,
    #[serde(default = "default_image_model")]
    pub default_model: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_images_dir(),
            default_model: default_image_model(),
        }
    }
}

// ============================================================================
// Prompts
// ============================================================================

fn default_content_language() -> String {
    "Spanish".to_string()
}

fn default_lesson_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptConfig {
    /// Language the generated course material must be written in
    #[serde(default = "default_content_language")]
    pub content_language: String,
    #[serde(default = "default_lesson_model")]
    pub lesson_model: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            content_language: default_content_language(),
            lesson_model: default_lesson_model(),
        }
    }
}

// ============================================================================
// Audit log (Directus)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuditConfig {
    #[serde(default)]
    pub directus_url: Option<String>,
    #[serde(default)]
    pub directus_token: Option<String>,
}

impl AuditConfig {
    pub fn is_enabled(&self) -> bool {
        let has = |v: &Option<String>| v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false);
        has(&self.directus_url) && has(&self.directus_token)
    }
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// When set, logs are also written to a daily rolling file in this directory
    #[serde(default)]
    pub log_dir: Option<String>,
}

// ============================================================================
// AppConfig (top-level application configuration)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub images: ImageConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}
