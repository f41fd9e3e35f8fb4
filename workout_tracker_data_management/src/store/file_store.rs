use std::path::{Path, PathBuf};

use tokio::{fs, sync::Mutex};

use crate::{DataManagerError, BLOB_EXTENSION};

use super::BlobStore;

/**
 * Stores each key as its own file in a directory.
 * Writes go to a temporary file first and are renamed into place.
 */
pub struct FileBlobStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBlobStore {
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, DataManagerError> {
        let dir = dir.as_ref().to_path_buf();

        // Create dir if it doesn't exist
        if !dir.exists() {
            fs::create_dir_all(&dir).await
                .map_err(|_| DataManagerError::Storage(format!("Failed to create data directory: {:?}", dir)))?;
        }

        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DataManagerError> {
        if key.is_empty() || key.contains(|c: char| matches!(c, '/' | '\\' | '.')) {
            return Err(DataManagerError::Storage(format!("Illegal key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{key}{BLOB_EXTENSION}")))
    }
}

#[async_trait::async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DataManagerError> {
        let path = self.path_for(key)?;

        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(DataManagerError::Storage(format!("Failed to read {:?}: {}", path, err))),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), DataManagerError> {
        let path = self.path_for(key)?;
        let tmp_path = path.with_extension("tmp");

        let _guard = self.write_lock.lock().await;

        fs::write(&tmp_path, value).await
            .map_err(|err| DataManagerError::Storage(format!("Failed to write {:?}: {}", tmp_path, err)))?;
        fs::rename(&tmp_path, &path).await
            .map_err(|err| DataManagerError::Storage(format!("Failed to replace {:?}: {}", path, err)))?;

        tracing::trace!("Wrote blob {}", key);
        Ok(())
    }
}
