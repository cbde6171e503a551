// Audit log sink backed by a Directus collection.
// Every write is best effort: failures are logged and never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client};
use serde::Serialize;
use serde_json::Value;

use crate::models::AuditConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditCollection {
    /// Generation request/response pairs
    GeminiApi,
    /// Everything else (upstream failures, rejected requests worth keeping)
    General,
}

impl AuditCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeminiApi => "logs_geminiapi",
            Self::General => "logs",
        }
    }
}

/// One row in the audit collection. Token column names follow the CMS schema.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditRecord {
    pub request_id: String,
    pub endpoint: String,
    pub model: Option<String>,
    pub description: String,
    pub success: bool,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "tokens_de_entrada")]
    pub input_tokens: Option<u64>,
    #[serde(rename = "tokens_de_salida")]
    pub output_tokens: Option<u64>,
    pub created_at: String,
}

impl AuditRecord {
    pub fn new(request_id: &str, endpoint: &str, model: Option<String>, description: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            endpoint: endpoint.to_string(),
            model,
            description: truncate(description, 500),
            success: true,
            status_code: 200,
            error: None,
            input_tokens: None,
            output_tokens: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_tokens(mut self, (input, output): (Option<u64>, Option<u64>)) -> Self {
        self.input_tokens = input;
        self.output_tokens = output;
        self
    }

    pub fn failed(mut self, status_code: u16, error: impl Into<String>) -> Self {
        self.success = false;
        self.status_code = status_code;
        self.error = Some(error.into());
        self
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

pub struct AuditLogger {
    client: Client,
    base_url: Option<String>,
    token: Option<String>,
}

impl AuditLogger {
    pub fn new(config: &AuditConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build audit HTTP client, using defaults: {}", e);
                Client::new()
            });

        let (base_url, token) = if config.is_enabled() {
            (
                config
                    .directus_url
                    .as_deref()
                    .map(|u| u.trim().trim_end_matches('/').to_string()),
                config.directus_token.clone(),
            )
        } else {
            (None, None)
        };

        Self {
            client,
            base_url,
            token,
        }
    }

    /// Logger that drops every record
    pub fn disabled() -> Self {
        Self::new(&AuditConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some() && self.token.is_some()
    }

    /// POST a record into `collection`. Returns the CMS response, or None on any failure.
    pub async fn create_log(
        &self,
        collection: AuditCollection,
        record: &AuditRecord,
    ) -> Option<Value> {
        let (base_url, token) = match (&self.base_url, &self.token) {
            (Some(u), Some(t)) => (u, t),
            _ => return None,
        };

        let url = format!("{}/items/{}", base_url, collection.as_str());
        let result = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .json(record)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => match resp.json::<Value>().await {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(
                        "[Audit] {} accepted record but body was unreadable: {}",
                        collection.as_str(),
                        e
                    );
                    None
                }
            },
            Ok(resp) => {
                tracing::warn!(
                    "[Audit] Failed to save log in {}: HTTP {}",
                    collection.as_str(),
                    resp.status()
                );
                None
            }
            Err(e) => {
                tracing::warn!("[Audit] Failed to save log in {}: {}", collection.as_str(), e);
                None
            }
        }
    }

    /// Fire-and-forget variant used from request handlers
    pub fn dispatch(self: &Arc<Self>, collection: AuditCollection, record: AuditRecord) {
        if !self.is_enabled() {
            return;
        }
        let logger = Arc::clone(self);
        tokio::spawn(async move {
            logger.create_log(collection, &record).await;
        });
    }
}
