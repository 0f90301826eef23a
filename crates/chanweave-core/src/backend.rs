//! Persistence backends for graph files

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Storage for serialized graphs, addressed by key
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Read the bytes stored under `key`
    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Replace the bytes stored under `key`; readers never see a partial write
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Whether anything is stored under `key`
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// Graph files on the local filesystem, keyed by path relative to a root
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Backend rooted at `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Filesystem path for a key.
    ///
    /// Keys are relative paths that stay below the root.
    pub fn path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if key.is_empty() || escapes {
            return Err(Error::InvalidName {
                name: key.to_string(),
                reason: "must be a relative path below the graphs directory".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Persistence for FileBackend {
    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.path(key)?).await?)
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidName {
                name: key.to_string(),
                reason: "not a file path".to_string(),
            })?;
        let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tracing::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path(key)?).await?)
    }
}

/// In-memory backend, for tests and ephemeral graphs
#[derive(Debug, Default)]
pub struct MemoryBackend {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Empty backend
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Persistence for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        self.files.lock().await.get(key).cloned().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such key: {}", key),
            ))
        })
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.files
            .lock()
            .await
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.files.lock().await.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        assert!(!backend.exists("graphs/a.json").await.unwrap());
        backend.write("graphs/a.json", b"{}").await.unwrap();
        assert!(backend.exists("graphs/a.json").await.unwrap());
        assert_eq!(backend.read("graphs/a.json").await.unwrap(), b"{}");

        backend.write("graphs/a.json", b"[]").await.unwrap();
        assert_eq!(backend.read("graphs/a.json").await.unwrap(), b"[]");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("graphs"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_memory_backend_missing_key() {
        let backend = MemoryBackend::new();
        let err = backend.read("nope").await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        backend.write("yes", b"1").await.unwrap();
        assert!(backend.exists("yes").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_backend_keys_stay_below_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("graphs");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(dir.path().join("outside.json"), b"{}").unwrap();
        let backend = FileBackend::new(&root);

        for key in ["../outside.json", "nested/../../outside.json", "/etc/passwd", ""] {
            let err = backend.read(key).await.unwrap_err();
            assert_eq!(err.code(), crate::error::ErrorCode::InvalidArgument, "{key}");
            assert!(backend.exists(key).await.is_err(), "{key}");
            assert!(backend.write(key, b"[]").await.is_err(), "{key}");
        }
        assert_eq!(std::fs::read(dir.path().join("outside.json")).unwrap(), b"{}");
        assert_eq!(
            backend.path("nested/a.json").unwrap(),
            root.join("nested/a.json")
        );
    }
}
