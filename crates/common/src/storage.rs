//! Blob storage for complaint attachments and profile avatars.
//!
//! Files are written under a bucket prefix and served back through a public
//! URL; the database only ever stores that URL.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Logical bucket a blob belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Files attached to complaints and chat messages.
    ComplaintAttachments,
    /// Profile pictures.
    Avatars,
}

impl Bucket {
    /// Directory name of the bucket.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ComplaintAttachments => "complaint-attachments",
            Self::Avatars => "avatars",
        }
    }

    /// Parse the bucket name used by upload requests.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "complaint-attachments" => Some(Self::ComplaintAttachments),
            "avatars" => Some(Self::Avatars),
            _ => None,
        }
    }
}

/// Uploaded file metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Storage key (bucket-relative path).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
    /// MD5 hash of the file.
    pub md5: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload a file into a bucket.
    async fn upload(
        &self,
        bucket: Bucket,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile>;

    /// Delete a file.
    async fn delete(&self, bucket: Bucket, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, bucket: Bucket, key: &str) -> String;

    /// Check if a file exists.
    async fn exists(&self, bucket: Bucket, key: &str) -> AppResult<bool>;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self { base_path, base_url }
    }

    fn path_for(&self, bucket: Bucket, key: &str) -> AppResult<PathBuf> {
        if key.split('/').any(|part| part == ".." || part.is_empty()) {
            return Err(AppError::Validation(format!("invalid storage key: {key}")));
        }
        Ok(self.base_path.join(bucket.as_str()).join(key))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(
        &self,
        bucket: Bucket,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        let path = self.path_for(bucket, key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(bucket, key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5: format!("{:x}", md5::compute(data)),
        })
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> AppResult<()> {
        let path = self.path_for(bucket, key)?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            bucket.as_str(),
            key
        )
    }

    async fn exists(&self, bucket: Bucket, key: &str) -> AppResult<bool> {
        let path = self.path_for(bucket, key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to stat file: {e}")))
    }
}

/// Generate a unique storage key for a file owned by `user_id`.
///
/// Keys look like `{user_id}-{millis}-{uuid}.{ext}`; the extension falls back
/// to `bin` when the original name has none.
#[must_use]
pub fn generate_storage_key(user_id: &str, original_name: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();

    let extension = original_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < original_name.len() - 1)
        .map(|pos| &original_name[pos + 1..])
        .filter(|ext| ext.len() <= 10 && ext.chars().all(char::is_alphanumeric))
        .map_or_else(|| "bin".to_string(), str::to_ascii_lowercase);

    format!(
        "{user_id}-{timestamp}-{}.{extension}",
        uuid::Uuid::new_v4().simple()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_storage_key() {
        let key = generate_storage_key("user123", "Screenshot.PNG");
        assert!(key.starts_with("user123-"));
        assert!(key.ends_with(".png"));
        assert!(!key.contains('/'));
    }

    #[test]
    fn test_generate_storage_key_no_extension() {
        let key = generate_storage_key("user123", "file");
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn test_bucket_parse() {
        assert_eq!(
            Bucket::parse("complaint-attachments"),
            Some(Bucket::ComplaintAttachments)
        );
        assert_eq!(Bucket::parse("avatars"), Some(Bucket::Avatars));
        assert_eq!(Bucket::parse("secrets"), None);
    }

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!("connect-storage-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(dir.clone(), "http://cdn.local/files/".to_string());

        let uploaded = storage
            .upload(Bucket::Avatars, "u1-1.png", b"png-bytes", "image/png")
            .await
            .unwrap();
        assert_eq!(uploaded.url, "http://cdn.local/files/avatars/u1-1.png");
        assert_eq!(uploaded.size, 9);
        assert!(storage.exists(Bucket::Avatars, "u1-1.png").await.unwrap());

        storage.delete(Bucket::Avatars, "u1-1.png").await.unwrap();
        assert!(!storage.exists(Bucket::Avatars, "u1-1.png").await.unwrap());

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_local_storage_rejects_traversal() {
        let storage = LocalStorage::new(PathBuf::from("/tmp/connect"), "/files".to_string());
        let result = storage
            .upload(Bucket::Avatars, "../etc/passwd", b"x", "text/plain")
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
