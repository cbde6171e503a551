// Gateway security configuration: a single static bearer secret plus the public path list

use crate::models::AuthConfig;

/// Paths reachable without a token
const PUBLIC_PATHS: [&str; 4] = ["/api/health", "/doc", "/doc.json", "/doc.md"];
const PUBLIC_PREFIXES: [&str; 1] = ["/images/"];

#[derive(Debug, Clone)]
pub struct ProxySecurityConfig {
    pub api_token: String,
}

/// Outcome of checking a request's bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCheck {
    Authorized,
    Missing,
    Invalid,
}

impl ProxySecurityConfig {
    pub fn from_auth_config(config: &AuthConfig) -> Self {
        Self {
            api_token: config.api_token.trim().to_string(),
        }
    }

    /// Exact match against the configured secret. An empty secret accepts nothing.
    pub fn validate_api_key(&self, key: &str) -> bool {
        !self.api_token.is_empty() && key == self.api_token
    }

    /// Check whether `path` requires a token
    pub fn requires_auth(&self, path: &str) -> bool {
        let is_public = PUBLIC_PATHS.contains(&path)
            || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix));
        !is_public
    }

    /// Classify the token extracted from the request (None when absent)
    pub fn check_token(&self, token: Option<&str>) -> TokenCheck {
        match token {
            None => TokenCheck::Missing,
            Some(t) if self.validate_api_key(t) => TokenCheck::Authorized,
            Some(_) => TokenCheck::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_config(token: &str) -> ProxySecurityConfig {
        ProxySecurityConfig {
            api_token: token.to_string(),
        }
    }

    #[test]
    fn test_from_auth_config_trims() {
        let sec = ProxySecurityConfig::from_auth_config(&AuthConfig {
            api_token: "  secret \n".to_string(),
        });
        assert_eq!(sec.api_token, "secret");
    }

    // ---- validate_api_key tests ----

    #[test]
    fn test_validate_api_key_correct() {
        assert!(make_config("sk-test-key").validate_api_key("sk-test-key"));
    }

    #[test]
    fn test_validate_api_key_wrong() {
        assert!(!make_config("sk-test-key").validate_api_key("wrong-key"));
    }

    #[test]
    fn test_validate_api_key_empty_config() {
        let s = make_config("");
        assert!(!s.validate_api_key(""));
        assert!(!s.validate_api_key("any-key"));
    }

    // ---- check_token tests ----

    #[test]
    fn test_check_token() {
        let s = make_config("secret");
        assert_eq!(s.check_token(None), TokenCheck::Missing);
        assert_eq!(s.check_token(Some("nope")), TokenCheck::Invalid);
        assert_eq!(s.check_token(Some("secret")), TokenCheck::Authorized);
    }

    // ---- requires_auth tests ----

    #[test]
    fn test_public_paths() {
        let s = make_config("secret");
        assert!(!s.requires_auth("/api/health"));
        assert!(!s.requires_auth("/doc"));
        assert!(!s.requires_auth("/doc.json"));
        assert!(!s.requires_auth("/doc.md"));
        assert!(!s.requires_auth("/images/generated_1_m.png"));
    }

    #[test]
    fn test_protected_paths() {
        let s = make_config("secret");
        assert!(s.requires_auth("/api/gemini/models"));
        assert!(s.requires_auth("/api/gemini/generate"));
        assert!(s.requires_auth("/api/gemini/generate-image"));
        assert!(s.requires_auth("/api/gemini/generate-lesson-content"));
        assert!(s.requires_auth("/api/healthz"));
        assert!(s.requires_auth("/images"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Every path under /api/gemini requires a token, whatever follows the prefix
        #[test]
        fn prop_gemini_routes_always_protected(suffix in "[a-z0-9/_-]{0,40}") {
            let s = make_config("secret");
            let path = format!("/api/gemini/{}", suffix);
            prop_assert!(s.requires_auth(&path));
        }

        /// Only the exact secret is accepted
        #[test]
        fn prop_only_exact_token_authorized(candidate in "[ -~]{0,32}") {
            let s = make_config("the-one-token");
            let expected = if candidate == "the-one-token" {
                TokenCheck::Authorized
            } else {
                TokenCheck::Invalid
            };
            prop_assert_eq!(s.check_token(Some(&candidate)), expected);
        }
    }
}
