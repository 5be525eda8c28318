//! File-based Object Store Adapter
//!
//! Stores each object as a file at `{base}/{id}/{name}` with its content
//! type in a `{name}.content-type` sidecar. Writes go through a temporary
//! file and a rename so readers never see a partial object.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::validate_key;
use crate::ports::{ObjectStore, ObjectStoreError, StoredObject};

const CONTENT_TYPE_SUFFIX: &str = ".content-type";
const TEMP_SUFFIX: &str = ".tmp";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// File-based object storage
#[derive(Debug, Clone)]
pub struct FileObjectStore {
    base_path: PathBuf,
}

impl FileObjectStore {
    /// Create a new file store with a base directory
    ///
    /// # Arguments
    /// * `base_path` - The root directory for stored objects
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    fn sidecar_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}{}", key, CONTENT_TYPE_SUFFIX))
    }

    async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ObjectStoreError> {
        let mut temp = path.as_os_str().to_owned();
        temp.push(TEMP_SUFFIX);
        let temp = PathBuf::from(temp);

        fs::write(&temp, bytes).await.map_err(io_error)?;
        fs::rename(&temp, path).await.map_err(io_error)
    }
}

fn io_error(e: std::io::Error) -> ObjectStoreError {
    ObjectStoreError::Io(e.to_string())
}

fn is_object_name(name: &str) -> bool {
    !name.ends_with(CONTENT_TYPE_SUFFIX) && !name.ends_with(TEMP_SUFFIX)
}

#[async_trait]
impl ObjectStore for FileObjectStore {
    async fn write(
        &self,
        id: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        validate_key(Some(id), key)?;
        if !is_object_name(key) {
            return Err(ObjectStoreError::InvalidKey(key.to_string()));
        }

        fs::create_dir_all(self.base_path.join(id))
            .await
            .map_err(io_error)?;

        // Every visible object has its sidecar.
        Self::write_atomic(&self.sidecar_path(key), content_type.as_bytes()).await?;
        Self::write_atomic(&self.object_path(key), &body).await
    }

    async fn read(&self, key: &str) -> Result<Option<StoredObject>, ObjectStoreError> {
        validate_key(None, key)?;

        let body = match fs::read(self.object_path(key)).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(e)),
        };

        let content_type = match fs::read_to_string(self.sidecar_path(key)).await {
            Ok(content_type) => content_type.trim().to_string(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FALLBACK_CONTENT_TYPE.to_string(),
            Err(e) => return Err(io_error(e)),
        };

        Ok(Some(StoredObject { body, content_type }))
    }

    async fn get_latest_key_for_id(&self, id: &str) -> Result<Option<String>, ObjectStoreError> {
        let dir = self.base_path.join(id);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(e)),
        };

        let mut latest: Option<String> = None;
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !is_object_name(&name) {
                continue;
            }
            if latest.as_deref().map_or(true, |current| name.as_str() > current) {
                latest = Some(name);
            }
        }

        Ok(latest.map(|name| format!("{}/{}", id, name)))
    }
}
