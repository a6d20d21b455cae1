use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Multipart field names accepted by PUT /users/:id, one file each.
pub const UPLOAD_FIELDS: [&str; 2] = ["cover", "avatar"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("upload rejected: {0}")]
    Rejected(String),
}

/// A file received through a multipart form, fully buffered in memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// UploadService
///
/// Where avatar and cover images end up. The handler only needs the reference string
/// returned by `store`, which is persisted on the user row.
#[async_trait]
pub trait UploadService: Send + Sync {
    /// Creates whatever the backend needs before the first upload. No-op by default.
    async fn prepare(&self) -> Result<(), UploadError> {
        Ok(())
    }

    async fn store(&self, file: UploadedFile) -> Result<String, UploadError>;
}

/// LocalUploadService
///
/// Writes uploads under a local directory as `<uuid>.<ext>` and returns the relative path.
#[derive(Clone)]
pub struct LocalUploadService {
    root: PathBuf,
}

impl LocalUploadService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl UploadService for LocalUploadService {
    async fn prepare(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    async fn store(&self, file: UploadedFile) -> Result<String, UploadError> {
        if file.bytes.is_empty() {
            return Err(UploadError::Rejected(format!("{} is empty", file.field)));
        }
        let name = object_name(file.file_name.as_deref(), file.content_type.as_deref());
        let path = self.root.join(&name);
        tokio::fs::write(&path, &file.bytes).await?;
        tracing::debug!(
            field = %file.field,
            path = %path.display(),
            size = file.bytes.len(),
            "stored upload"
        );
        Ok(path.to_string_lossy().into_owned())
    }
}

/// object_name
///
/// Random file name that keeps only a sanitized extension, taken from the client's file
/// name or else from the MIME subtype, so nothing the client sends can reach the
/// directory part of the path.
fn object_name(original: Option<&str>, content_type: Option<&str>) -> String {
    let from_name = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(clean_extension)
        .filter(|ext| !ext.is_empty());
    let extension = from_name
        .or_else(|| {
            content_type
                .and_then(|mime| mime.split_once('/'))
                .map(|(_, subtype)| clean_extension(subtype))
                .filter(|ext| !ext.is_empty())
        })
        .unwrap_or_else(|| "bin".to_string());
    format!("{}.{}", Uuid::new_v4(), extension)
}

fn clean_extension(raw: &str) -> String {
    raw.chars()
        .take_while(|c| *c != ';' && *c != '+')
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect::<String>()
        .to_ascii_lowercase()
}

/// MockUploadService
///
/// In-memory `UploadService` for tests: returns a deterministic reference per field and
/// can simulate a failing backend.
#[derive(Clone, Default)]
pub struct MockUploadService {
    /// When true, every `store` call fails.
    pub should_fail: bool,
}

impl MockUploadService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl UploadService for MockUploadService {
    async fn store(&self, file: UploadedFile) -> Result<String, UploadError> {
        if self.should_fail {
            return Err(UploadError::Io(std::io::Error::other("mock upload failure")));
        }
        let name = object_name(file.file_name.as_deref(), file.content_type.as_deref());
        Ok(format!("mock://{}/{}", file.field, name))
    }
}

/// UploadState
///
/// The shared handle to the upload backend stored in `AppState`.
pub type UploadState = Arc<dyn UploadService>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_keeps_a_clean_extension() {
        let name = object_name(Some("../../etc/avatar.PNG"), None);
        assert!(name.ends_with(".png"));
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
    }

    #[test]
    fn object_name_defaults_to_bin() {
        assert!(object_name(None, None).ends_with(".bin"));
        assert!(object_name(Some("noext"), None).ends_with(".bin"));
        assert!(object_name(Some("weird.$$$"), None).ends_with(".bin"));
    }

    #[test]
    fn object_name_falls_back_to_the_mime_subtype() {
        assert!(object_name(Some("blob"), Some("image/jpeg")).ends_with(".jpeg"));
        assert!(object_name(None, Some("image/svg+xml")).ends_with(".svg"));
        // The file name wins over the declared type.
        assert!(object_name(Some("a.gif"), Some("image/png")).ends_with(".gif"));
        assert!(object_name(None, Some("garbage")).ends_with(".bin"));
    }

    #[tokio::test]
    async fn local_service_writes_under_its_root() {
        let root = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        let service = LocalUploadService::new(&root);
        service.prepare().await.unwrap();

        let stored = service
            .store(UploadedFile {
                field: "avatar".to_string(),
                file_name: Some("me.jpg".to_string()),
                content_type: Some("image/jpeg".to_string()),
                bytes: vec![1, 2, 3],
            })
            .await
            .unwrap();

        let path = PathBuf::from(&stored);
        assert!(path.starts_with(&root));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), vec![1, 2, 3]);
        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn local_service_rejects_empty_files() {
        let service = LocalUploadService::new(std::env::temp_dir());
        let result = service
            .store(UploadedFile {
                field: "cover".to_string(),
                file_name: None,
                content_type: None,
                bytes: vec![],
            })
            .await;
        assert!(matches!(result, Err(UploadError::Rejected(_))));
    }
}
