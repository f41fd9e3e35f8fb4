use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::DataManagerError;

use super::BlobStore;

/// Lives as long as the process does.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DataManagerError> {
        Ok(self.blobs.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), DataManagerError> {
        self.blobs.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}
