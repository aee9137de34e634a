//! Object store backed by a local directory
//!
//! Objects live at `<root>/<bucket>/<key>` with a `<key>.meta.json` sidecar
//! recording the declared content type. Links are `file://` URLs carrying
//! the expiry as a query parameter; nothing enforces it.

use crate::error::{Result, StoreError};
use crate::{validate_name, ObjectStore, PutObject};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

const META_SUFFIX: &str = ".meta.json";

/// Sidecar metadata written next to every object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Declared content type
    pub content_type: String,
    /// Body length in bytes
    pub content_length: usize,
}

/// Directory-backed object store.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        let root = std::fs::canonicalize(root.as_ref())?;
        debug!(root = %root.display(), "opened filesystem object store");
        Ok(Self { root })
    }

    /// Absolute root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an object is (or would be) stored at.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        validate_name(bucket, StoreError::InvalidBucket)?;
        validate_name(key, StoreError::InvalidKey)?;
        Ok(self.root.join(bucket).join(key))
    }

    /// Read back the sidecar metadata of a stored object.
    pub async fn read_meta(&self, bucket: &str, key: &str) -> Result<ObjectMeta> {
        let path = meta_path(&self.object_path(bucket, key)?);
        let raw = tokio::fs::read(&path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

fn meta_path(object_path: &Path) -> PathBuf {
    let mut name = object_path.as_os_str().to_os_string();
    name.push(META_SUFFIX);
    PathBuf::from(name)
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put_object(&self, request: PutObject) -> Result<()> {
        let path = self.object_path(&request.bucket, &request.key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let meta = ObjectMeta {
            content_type: request.content_type,
            content_length: request.body.len(),
        };
        tokio::fs::write(&path, &request.body).await?;
        tokio::fs::write(meta_path(&path), serde_json::to_vec(&meta)?).await?;
        Ok(())
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(StoreError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            Err(err) => return Err(err.into()),
        }

        let mut url = Url::from_file_path(&path)
            .map_err(|()| StoreError::InvalidLink(path.display().to_string()))?;
        url.set_query(Some(&format!("expires={}", expires_at.timestamp())));
        Ok(url.into())
    }
}
