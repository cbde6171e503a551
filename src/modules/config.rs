use std::fs;
use std::path::Path;

use crate::models::AppConfig;

/// Env var pointing at an optional JSON config file
const CONFIG_FILE_ENV: &str = "GEMINI_PROXY_CONFIG";

/// Load application configuration: defaults, then the optional JSON file, then env overrides
pub fn load_app_config() -> Result<AppConfig, String> {
    let file = std::env::var(CONFIG_FILE_ENV).ok();
    load_app_config_from(file.as_deref().map(Path::new), |key| std::env::var(key).ok())
}

pub fn load_app_config_from<F>(config_path: Option<&Path>, lookup: F) -> Result<AppConfig, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match config_path {
        Some(path) => read_config_file(path)?,
        None => AppConfig::default(),
    };
    apply_env_overrides(&mut config, lookup)?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<AppConfig, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("failed_to_read_config_file: {}", e))?;

    // Parse via Value first to support future migration logic
    let v: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("failed_to_parse_config_file: {}", e))?;

    serde_json::from_value(v).map_err(|e| format!("failed_to_convert_config: {}", e))
}

/// Apply environment variables on top of the loaded config.
/// Blank values are ignored so an empty `.env` entry never clobbers the file.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), String>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(v) = get("HOST") {
        config.server.host = v;
    }
    if let Some(v) = get("PORT") {
        config.server.port = v
            .parse()
            .map_err(|e| format!("invalid_port {:?}: {}", v, e))?;
    }
    if let Some(v) = get("BASE_URL") {
        config.server.base_url = Some(v);
    }
    if let Some(v) = get("MAX_BODY_SIZE") {
        config.server.max_body_size = v
            .parse()
            .map_err(|e| format!("invalid_max_body_size {:?}: {}", v, e))?;
    }

    if let Some(v) = get("GEMINI_API_KEY") {
        config.upstream.api_key = v;
    }
    if let Some(v) = get("GEMINI_API_BASE_URL") {
        config.upstream.base_url = v;
    }
    if let Some(v) = get("GEMINI_REQUEST_TIMEOUT") {
        config.upstream.request_timeout = v
            .parse()
            .map_err(|e| format!("invalid_request_timeout {:?}: {}", v, e))?;
    }

    if let Some(v) = get("API_TOKEN") {
        config.auth.api_token = v;
    }

    if let Some(v) = get("IMAGES_DIR") {
        config.images.output_dir = v;
    }
    if let Some(v) = get("CONTENT_LANGUAGE") {
        config.prompts.content_language = v;
    }

    if let Some(v) = get("DIRECTUS_URL") {
        config.audit.directus_url = Some(v);
    }
    if let Some(v) = get("DIRECTUS_LOGSADMIN_TOKEN") {
        config.audit.directus_token = Some(v);
    }

    if let Some(v) = get("LOG_DIR") {
        config.logging.log_dir = Some(v);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_apply() {
        let config = load_app_config_from(
            None,
            lookup_from(&[
                ("PORT", "8081"),
                ("API_TOKEN", "secret"),
                ("GEMINI_API_KEY", "g-key"),
                ("BASE_URL", "https://api.example.com"),
                ("DIRECTUS_URL", "https://cms.example.com"),
                ("DIRECTUS_LOGSADMIN_TOKEN", "cms-token"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.auth.api_token, "secret");
        assert_eq!(config.upstream.api_key, "g-key");
        assert_eq!(config.server.public_base_url(), "https://api.example.com");
        assert!(config.audit.is_enabled());
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = load_app_config_from(None, lookup_from(&[("PORT", "  "), ("API_TOKEN", "")]))
            .unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.auth.api_token.is_empty());
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = load_app_config_from(None, lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.starts_with("invalid_port"));
    }

    #[test]
    fn test_file_then_env_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "server": { "port": 9000 }, "images": { "output_dir": "/srv/images" } }"#,
        )
        .unwrap();

        let config =
            load_app_config_from(Some(&path), lookup_from(&[("PORT", "9100")])).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.images.output_dir, "/srv/images");
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let err = load_app_config_from(Some(Path::new("/nonexistent/config.json")), |_| None)
            .unwrap_err();
        assert!(err.starts_with("failed_to_read_config_file"));
    }
}
