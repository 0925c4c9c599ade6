//! Binary payload storage.
//!
//! Patient photos are the only binary payloads in the system. They are kept
//! out of the relational store; a row records only the blob's path. The
//! [`BlobStore`] trait mirrors that contract: write/read/exists/delete at a
//! caller-derived path.
//!
//! Paths are relative, `/`-separated, and validated before use — no `..`
//! components and no absolute paths — so a hostile `photo_url` read back
//! from a row cannot escape the storage root.

use crate::{StoreError, StoreResult};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tokio::sync::RwLock;

/// Binary payload storage keyed by relative path.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn write(&self, path: &str, bytes: &[u8]) -> StoreResult<()>;
    async fn read(&self, path: &str) -> StoreResult<Vec<u8>>;
    async fn exists(&self, path: &str) -> StoreResult<bool>;
    async fn delete(&self, path: &str) -> StoreResult<()>;
}

/// Normalises a blob path: strips the leading `/`, rejects traversal.
fn normalise(path: &str) -> StoreResult<String> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidBlobPath(path.to_string()));
    }
    let candidate = Path::new(trimmed);
    let safe = candidate
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(StoreError::InvalidBlobPath(path.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Filesystem-backed blob storage rooted at a directory.
///
/// The root must exist when the service is constructed; blob subdirectories
/// are created on first write.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Creates a blob store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidBlobPath`] if `root` is not an existing
    /// directory.
    pub fn new(root: PathBuf) -> StoreResult<Self> {
        if !root.is_dir() {
            return Err(StoreError::InvalidBlobPath(format!(
                "blob root is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    fn resolve(&self, path: &str) -> StoreResult<PathBuf> {
        Ok(self.root.join(normalise(path)?))
    }
}

#[async_trait::async_trait]
impl BlobStore for FsBlobStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> StoreResult<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, bytes)?;
        Ok(())
    }

    async fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        let target = self.resolve(path)?;
        match std::fs::read(&target) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::BlobNotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> StoreResult<bool> {
        Ok(self.resolve(path)?.is_file())
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        let target = self.resolve(path)?;
        match std::fs::remove_file(&target) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::BlobNotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory blob storage for tests and the default server wiring.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> StoreResult<()> {
        self.blobs
            .write()
            .await
            .insert(normalise(path)?, bytes.to_vec());
        Ok(())
    }

    async fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(&normalise(path)?)
            .cloned()
            .ok_or_else(|| StoreError::BlobNotFound(path.to_string()))
    }

    async fn exists(&self, path: &str) -> StoreResult<bool> {
        Ok(self.blobs.read().await.contains_key(&normalise(path)?))
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        self.blobs
            .write()
            .await
            .remove(&normalise(path)?)
            .map(|_| ())
            .ok_or_else(|| StoreError::BlobNotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_round_trip() {
        let blobs = MemoryBlobStore::new();
        blobs
            .write("/patient/a.jpg", b"bytes")
            .await
            .expect("write");
        assert!(blobs.exists("/patient/a.jpg").await.expect("exists"));
        assert_eq!(blobs.read("patient/a.jpg").await.expect("read"), b"bytes");
        blobs.delete("/patient/a.jpg").await.expect("delete");
        assert!(!blobs.exists("/patient/a.jpg").await.expect("exists"));
    }

    #[tokio::test]
    async fn missing_blob_is_not_found() {
        let blobs = MemoryBlobStore::new();
        let err = blobs.read("/patient/none.jpg").await.expect_err("missing");
        assert!(matches!(err, StoreError::BlobNotFound(_)));
    }

    #[tokio::test]
    async fn traversal_paths_are_rejected() {
        let blobs = MemoryBlobStore::new();
        let err = blobs
            .write("/patient/../../etc/passwd", b"x")
            .await
            .expect_err("traversal");
        assert!(matches!(err, StoreError::InvalidBlobPath(_)));
    }

    #[tokio::test]
    async fn filesystem_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blobs = FsBlobStore::new(dir.path().to_path_buf()).expect("blob store");
        blobs
            .write("/patient/photo.png", b"\x89PNG")
            .await
            .expect("write");
        assert!(blobs.exists("patient/photo.png").await.expect("exists"));
        assert_eq!(
            blobs.read("/patient/photo.png").await.expect("read"),
            b"\x89PNG"
        );
        blobs.delete("/patient/photo.png").await.expect("delete");
        assert!(!blobs.exists("/patient/photo.png").await.expect("exists"));
    }

    #[test]
    fn root_must_exist() {
        let err = FsBlobStore::new(PathBuf::from("/definitely/not/here")).expect_err("bad root");
        assert!(matches!(err, StoreError::InvalidBlobPath(_)));
    }
}
