//! Public media bucket on local disk.
//!
//! Objects live under `{STORAGE_DIR}/{bucket}/{path}` and are served
//! read-only at `/storage/v1/object/public/{bucket}/{path}`.

use async_trait::async_trait;
use casa_engine::{storage, BlobStore, RemoteError, RemoteResult};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Blob store writing to a directory.
#[derive(Debug, Clone)]
pub struct DiskBlobStore {
    root: PathBuf,
    bucket: String,
    base_url: String,
}

impl DiskBlobStore {
    /// Open the bucket directory, creating it if needed.
    pub async fn open(
        root: PathBuf,
        bucket: impl Into<String>,
        base_url: impl Into<String>,
    ) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            bucket: bucket.into(),
            base_url: base_url.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object path inside the bucket directory.
    fn resolve(&self, path: &str) -> RemoteResult<PathBuf> {
        let relative = Path::new(path);
        let inside = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !inside {
            return Err(RemoteError::Storage(format!(
                "object path escapes bucket: {:?}",
                path
            )));
        }
        Ok(self.root.join(relative))
    }
}

fn storage_error(path: &str, e: std::io::Error) -> RemoteError {
    match e.kind() {
        ErrorKind::NotFound => RemoteError::NotFound(path.to_string()),
        _ => RemoteError::Storage(format!("{}: {}", path, e)),
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn public_url(&self, path: &str) -> String {
        storage::public_url(&self.base_url, &self.bucket, path)
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> RemoteResult<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(path, e))?;
        }

        let size = bytes.len();
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| storage_error(path, e))?;

        tracing::debug!(path = %path, size, content_type = ?content_type, "object stored");
        Ok(())
    }

    async fn delete(&self, path: &str) -> RemoteResult<()> {
        let target = self.resolve(path)?;
        tokio::fs::remove_file(&target)
            .await
            .map_err(|e| storage_error(path, e))?;

        tracing::debug!(path = %path, "object removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> DiskBlobStore {
        let root = std::env::temp_dir().join(format!("casa-blobs-{}", uuid::Uuid::new_v4()));
        DiskBlobStore::open(root, "property-media", "http://localhost:3000")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn upload_then_delete() {
        let store = temp_store().await;
        store
            .upload("properties/p1/a.jpg", b"jpeg".to_vec(), Some("image/jpeg"))
            .await
            .unwrap();

        let on_disk = store.root().join("properties/p1/a.jpg");
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"jpeg");
        assert_eq!(
            store.public_url("properties/p1/a.jpg"),
            "http://localhost:3000/storage/v1/object/public/property-media/properties/p1/a.jpg"
        );

        store.delete("properties/p1/a.jpg").await.unwrap();
        assert!(!on_disk.exists());
        assert!(matches!(
            store.delete("properties/p1/a.jpg").await,
            Err(RemoteError::NotFound(_))
        ));

        let _ = tokio::fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn rejects_paths_outside_bucket() {
        let store = temp_store().await;
        for path in ["../escape.jpg", "/etc/passwd", "", "temp/../../x"] {
            assert!(
                matches!(
                    store.upload(path, Vec::new(), None).await,
                    Err(RemoteError::Storage(_))
                ),
                "{}",
                path
            );
        }
        let _ = tokio::fs::remove_dir_all(store.root()).await;
    }
}
