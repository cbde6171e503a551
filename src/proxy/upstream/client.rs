// Upstream client for the Gemini REST API, built on reqwest.
// Constructed once at startup and shared through AppState.

use reqwest::{header, Client};
use serde_json::Value;
use thiserror::Error;
use tokio::time::Duration;
use url::Url;

use crate::models::UpstreamConfig;
use crate::proxy::mappers::gemini::models::GenerateContentRequest;

/// Default User-Agent
const DEFAULT_USER_AGENT: &str = "gemini-course-proxy/0.1";

const API_VERSION: &str = "v1beta";

#[derive(Debug, Error)]
pub enum UpstreamFailure {
    /// Upstream answered with a non-success status
    #[error("Gemini API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Failed to parse Gemini response: {0}")]
    Decode(String),
}

/// Strip the optional `models/` resource prefix callers sometimes send
pub fn normalize_model_name(model: &str) -> &str {
    let trimmed = model.trim();
    trimmed.strip_prefix("models/").unwrap_or(trimmed)
}

/// Model ids are limited to `[A-Za-z0-9._-]` (after the optional `models/` prefix)
pub fn is_valid_model_name(model: &str) -> bool {
    let name = normalize_model_name(model);
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
}

/// Pull `error.message` out of a Google error body, falling back to the raw text
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| body.trim().to_string())
}

pub struct UpstreamClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, String> {
        if config.api_key.trim().is_empty() {
            return Err("GEMINI_API_KEY is not configured".to_string());
        }

        let user_agent = config
            .user_agent_override
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(Duration::from_secs(config.request_timeout.max(1)))
            .user_agent(user_agent)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| format!("Invalid GEMINI_API_BASE_URL {:?}: {}", config.base_url, e))?;
        if base_url.cannot_be_a_base() {
            return Err(format!("Invalid GEMINI_API_BASE_URL {:?}", config.base_url));
        }

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.trim().to_string(),
        })
    }

    /// Build `{base}/v1beta/models/{model}:{method}`. The model lands in a single
    /// percent-encoded path segment, so `/`, `?` and `#` cannot leave it.
    fn build_url(base_url: &Url, model: &str, method: &str) -> Url {
        let mut url = base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(API_VERSION)
                .push("models")
                .push(&format!("{}:{}", normalize_model_name(model), method));
        }
        url
    }

    /// Single generateContent call. No retries: any failure goes straight back to the handler.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<Value, UpstreamFailure> {
        let url = Self::build_url(&self.base_url, &request.model, "generateContent");
        tracing::debug!("Upstream call: {}", url);

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| UpstreamFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            return Err(UpstreamFailure::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamFailure::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::mappers::gemini::models::Content;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(base_url: &str) -> UpstreamConfig {
        UpstreamConfig {
            api_key: "test-key".to_string(),
            base_url: base_url.to_string(),
            ..UpstreamConfig::default()
        }
    }

    fn request(model: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            model: model.to_string(),
            contents: vec![Content::user_text("hi")],
            generation_config: None,
            safety_settings: None,
            tools: None,
        }
    }

    #[test]
    fn test_build_url() {
        let base = Url::parse("https://generativelanguage.googleapis.com").unwrap();
        assert_eq!(
            UpstreamClient::build_url(&base, "gemini-pro", "generateContent").as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
        assert_eq!(
            UpstreamClient::build_url(&base, "models/gemini-pro", "generateContent").as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );

        let prefixed = Url::parse("http://localhost:8080/gemini/").unwrap();
        assert_eq!(
            UpstreamClient::build_url(&prefixed, "m", "generateContent").as_str(),
            "http://localhost:8080/gemini/v1beta/models/m:generateContent"
        );
    }

    #[test]
    fn test_build_url_keeps_model_in_one_segment() {
        let base = Url::parse("http://localhost").unwrap();
        let url = UpstreamClient::build_url(&base, "../../v1/cachedContents?x=", "generateContent");

        assert!(url.path().starts_with("/v1beta/models/"));
        assert_eq!(url.path_segments().unwrap().count(), 3);
        assert!(url.query().is_none());
        assert!(url.path().ends_with(":generateContent"));
    }

    #[test]
    fn test_is_valid_model_name() {
        assert!(is_valid_model_name("gemini-1.5-flash-latest"));
        assert!(is_valid_model_name("models/gemini-pro"));
        assert!(!is_valid_model_name("../../v1/cachedContents?x="));
        assert!(!is_valid_model_name("gemini pro"));
        assert!(!is_valid_model_name("models/"));
    }

    #[test]
    fn test_invalid_base_url_fails_construction() {
        let err = UpstreamClient::new(&config_for("not a url")).err().unwrap();
        assert!(err.contains("GEMINI_API_BASE_URL"));
    }

    #[test]
    fn test_missing_api_key_fails_construction() {
        let err = UpstreamClient::new(&UpstreamConfig::default()).err().unwrap();
        assert!(err.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"error":{"code":400,"message":"API key not valid"}}"#),
            "API key not valid"
        );
        assert_eq!(extract_error_message(" upstream down "), "upstream down");
    }

    #[tokio::test]
    async fn test_generate_content_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-pro:generateContent"))
            .and(header_eq("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({"contents": [{"role": "user"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = UpstreamClient::new(&config_for(&server.uri())).unwrap();
        let value = client.generate_content(&request("gemini-pro")).await.unwrap();
        assert_eq!(value["text"], "ok");
    }

    #[tokio::test]
    async fn test_generate_content_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "Permission denied"}
            })))
            .mount(&server)
            .await;

        let client = UpstreamClient::new(&config_for(&server.uri())).unwrap();
        match client.generate_content(&request("gemini-pro")).await {
            Err(UpstreamFailure::Api { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "Permission denied");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_content_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = UpstreamClient::new(&config_for(&server.uri())).unwrap();
        assert!(matches!(
            client.generate_content(&request("m")).await,
            Err(UpstreamFailure::Decode(_))
        ));
    }
}
