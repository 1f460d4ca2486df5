use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::{
    alternative_name, ensure_relative, no_room_error, truncate_name, MediaStorage,
    MAX_NAME_ATTEMPTS,
};
use crate::core::error::AppError;

/// Filesystem-backed media storage rooted at `MEDIA_ROOT`
pub struct LocalMediaStorage {
    root: PathBuf,
    /// Absolute URL prefix of `root`, e.g. `http://127.0.0.1:8000/media/`
    base_url: String,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: format!("{}/", base_url.trim_end_matches('/')),
        }
    }

    /// Create the root directory if needed
    pub async fn ensure_root_exists(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to create media root '{}': {}",
                self.root.display(),
                e
            ))
        })?;
        info!("Media root ready at {}", self.root.display());
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, AppError> {
        ensure_relative(name)?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn save(
        &self,
        name: &str,
        data: Bytes,
        _content_type: &str,
        max_length: usize,
    ) -> Result<String, AppError> {
        let mut candidate =
            truncate_name(name, max_length).ok_or_else(|| no_room_error(name, max_length))?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = self.resolve(&candidate)?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::Internal(format!("mkdir {}: {}", parent.display(), e))
                })?;
            }

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(&data).await.map_err(|e| {
                        AppError::Internal(format!("write {}: {}", path.display(), e))
                    })?;
                    file.flush().await.map_err(|e| {
                        AppError::Internal(format!("flush {}: {}", path.display(), e))
                    })?;
                    debug!("Saved media file '{}' ({} bytes)", candidate, data.len());
                    return Ok(candidate);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!("Media name '{}' taken, picking another", candidate);
                    candidate = alternative_name(name, max_length)
                        .ok_or_else(|| no_room_error(name, max_length))?;
                }
                Err(e) => {
                    return Err(AppError::Internal(format!(
                        "create {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }

        Err(AppError::Internal(format!(
            "No available name for '{}' after {} attempts",
            name, MAX_NAME_ATTEMPTS
        )))
    }

    async fn delete(&self, name: &str) -> Result<(), AppError> {
        let path = self.resolve(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted media file '{}'", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!(
                "delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn url(&self, name: &str) -> String {
        format!("{}{}", self.base_url, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage(dir: &Path) -> LocalMediaStorage {
        LocalMediaStorage::new(dir, "http://localhost:8000/media/")
    }

    #[tokio::test]
    async fn test_save_writes_bytes_under_requested_name() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = test_storage(tmp.path());

        let name = storage
            .save(
                "attendance_images/photo.jpg",
                Bytes::from_static(b"jpeg-bytes"),
                "image/jpeg",
                100,
            )
            .await
            .unwrap();

        assert_eq!(name, "attendance_images/photo.jpg");
        let written = std::fs::read(tmp.path().join(&name)).unwrap();
        assert_eq!(written, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_save_never_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = test_storage(tmp.path());

        let first = storage
            .save("attendance_images/photo.jpg", Bytes::from_static(b"one"), "image/jpeg", 100)
            .await
            .unwrap();
        let second = storage
            .save("attendance_images/photo.jpg", Bytes::from_static(b"two"), "image/jpeg", 100)
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(second.starts_with("attendance_images/photo_"));
        assert!(second.ends_with(".jpg"));
        assert_eq!(std::fs::read(tmp.path().join(&first)).unwrap(), b"one");
        assert_eq!(std::fs::read(tmp.path().join(&second)).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_save_keeps_names_within_max_length() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = test_storage(tmp.path());
        let long = format!("attendance_images/{}.jpg", "a".repeat(90));

        let first = storage
            .save(&long, Bytes::from_static(b"one"), "image/jpeg", 100)
            .await
            .unwrap();
        let second = storage
            .save(&long, Bytes::from_static(b"two"), "image/jpeg", 100)
            .await
            .unwrap();

        assert_eq!(first, format!("attendance_images/{}.jpg", "a".repeat(78)));
        assert_ne!(first, second);
        assert_eq!(second.chars().count(), 100);
        assert_eq!(std::fs::read(tmp.path().join(&second)).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_delete_removes_and_tolerates_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = test_storage(tmp.path());

        let name = storage
            .save("attendance_images/a.png", Bytes::from_static(b"png"), "image/png", 100)
            .await
            .unwrap();
        storage.delete(&name).await.unwrap();
        assert!(!tmp.path().join(&name).exists());

        storage.delete(&name).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_rejects_escaping_names() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = test_storage(tmp.path());

        let err = storage
            .save("../outside.jpg", Bytes::from_static(b"x"), "image/jpeg", 100)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_ensure_root_exists_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = test_storage(&tmp.path().join("nested/media"));

        storage.ensure_root_exists().await.unwrap();
        assert!(storage.root().is_dir());
    }

    #[test]
    fn test_url_joins_base_and_name() {
        let storage = LocalMediaStorage::new("/tmp/media", "http://localhost:8000/media");
        assert_eq!(
            storage.url("attendance_images/photo.jpg"),
            "http://localhost:8000/media/attendance_images/photo.jpg"
        );
    }
}
