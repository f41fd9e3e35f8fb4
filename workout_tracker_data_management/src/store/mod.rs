mod file_store;
mod memory_store;

pub use file_store::FileBlobStore;
pub use memory_store::MemoryBlobStore;

use crate::DataManagerError;

/// A key-value store of text blobs.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, DataManagerError>;

    async fn set(&self, key: &str, value: String) -> Result<(), DataManagerError>;
}
