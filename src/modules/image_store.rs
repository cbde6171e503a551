// Persists generated images under the served images directory

use std::path::{Path, PathBuf};

use base64::Engine;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Route prefix the images directory is served under
pub const IMAGES_ROUTE: &str = "/images";

#[derive(Debug, Clone, PartialEq)]
pub struct SavedImage {
    pub file_name: String,
    pub path: PathBuf,
    pub url: String,
    pub bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    public_base_url: String,
}

/// Replace everything outside `[A-Za-z0-9._-]` so model ids are safe in file names
pub fn sanitize_model(model: &str) -> String {
    let cleaned: String = model
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "model".to_string()
    } else {
        cleaned
    }
}

pub fn image_file_name(model: &str, timestamp_ms: i64) -> String {
    format!("generated_{}_{}.png", timestamp_ms, sanitize_model(model))
}

/// Fallback name when `image_file_name` is already taken
fn suffixed_image_file_name(model: &str, timestamp_ms: i64) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "generated_{}_{}_{}.png",
        timestamp_ms,
        sanitize_model(model),
        &id[..8]
    )
}

/// Create `path` exclusively, never replacing an existing file
async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Public URL under which `file_name` is served
    pub fn public_url(&self, file_name: &str) -> String {
        let base = self.public_base_url.trim_end_matches('/');
        Url::parse(&format!("{}/", base))
            .and_then(|u| u.join(&format!("{}/{}", IMAGES_ROUTE.trim_start_matches('/'), file_name)))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}{}/{}", base, IMAGES_ROUTE, file_name))
    }

    /// Decode `data_b64` and write it to disk
    pub async fn save_base64(&self, model: &str, data_b64: &str) -> Result<SavedImage, String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data_b64.trim())
            .map_err(|e| format!("invalid base64 image data: {}", e))?;

        self.save_bytes(model, &bytes, chrono::Utc::now().timestamp_millis())
            .await
    }

    async fn save_bytes(
        &self,
        model: &str,
        bytes: &[u8],
        timestamp_ms: i64,
    ) -> Result<SavedImage, String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| format!("failed to create {}: {}", self.dir.display(), e))?;

        let mut file_name = image_file_name(model, timestamp_ms);
        let mut path = self.dir.join(&file_name);
        match write_new(&path, bytes).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                file_name = suffixed_image_file_name(model, timestamp_ms);
                path = self.dir.join(&file_name);
                write_new(&path, bytes)
                    .await
                    .map_err(|e| format!("failed to write {}: {}", path.display(), e))?;
            }
            Err(e) => return Err(format!("failed to write {}: {}", path.display(), e)),
        }

        Ok(SavedImage {
            url: self.public_url(&file_name),
            file_name,
            path,
            bytes: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_model() {
        assert_eq!(
            sanitize_model("gemini-2.0-flash-preview-image-generation"),
            "gemini-2.0-flash-preview-image-generation"
        );
        assert_eq!(sanitize_model("models/gemini pro"), "models_gemini_pro");
        assert_eq!(sanitize_model("../../etc"), ".._.._etc");
        assert_eq!(sanitize_model(""), "model");
    }

    #[test]
    fn test_image_file_name() {
        assert_eq!(
            image_file_name("gemini/x", 1700000000000),
            "generated_1700000000000_gemini_x.png"
        );
    }

    #[test]
    fn test_public_url() {
        let store = ImageStore::new("/tmp", "https://api.example.com/");
        assert_eq!(
            store.public_url("generated_1_m.png"),
            "https://api.example.com/images/generated_1_m.png"
        );

        let nested = ImageStore::new("/tmp", "https://example.com/proxy");
        assert_eq!(
            nested.public_url("a.png"),
            "https://example.com/proxy/images/a.png"
        );
    }

    #[tokio::test]
    async fn test_save_base64_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("images"), "http://localhost:3000");
        let payload = base64::engine::general_purpose::STANDARD.encode(b"\x89PNG fake image");

        let saved = store.save_base64("gemini-img", &payload).await.unwrap();
        assert_eq!(saved.bytes, 15);
        assert!(saved.file_name.starts_with("generated_"));
        assert!(saved.file_name.ends_with("_gemini-img.png"));
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"\x89PNG fake image");
        assert!(saved.url.ends_with(&format!("/images/{}", saved.file_name)));
    }

    #[tokio::test]
    async fn test_same_millisecond_saves_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), "http://localhost:3000");

        let first = store.save_bytes("m", b"first", 1_700_000_000_000).await.unwrap();
        let second = store.save_bytes("m", b"second", 1_700_000_000_000).await.unwrap();

        assert_eq!(first.file_name, "generated_1700000000000_m.png");
        assert_ne!(first.file_name, second.file_name);
        assert!(second.file_name.starts_with("generated_1700000000000_m_"));
        assert_eq!(std::fs::read(&first.path).unwrap(), b"first");
        assert_eq!(std::fs::read(&second.path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_base64() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), "http://localhost:3000");
        let err = store.save_base64("m", "not base64 !!!").await.unwrap_err();
        assert!(err.starts_with("invalid base64"));
    }
}
