use std::{path::{Path, PathBuf}, sync::Arc};

use tokio::sync::Mutex;
use workout_tracker_lib::workout::WorkoutRecord;

use crate::{store::{BlobStore, FileBlobStore, MemoryBlobStore}, DataManagerError, DATA_DIR, WORKOUTS_KEY};

#[derive(Clone)]
pub struct DataManager {
    pub(crate) store: Arc<dyn BlobStore>,
    // Serializes read-modify-write of the workout list
    append_lock: Arc<Mutex<()>>,
}

/// The public interface for all workout data management.
impl DataManager {
    /// Opens the file store in `data_dir`, creating it if needed.
    pub async fn start(data_dir: impl AsRef<Path>) -> Result<Self, DataManagerError> {
        let store = FileBlobStore::open(data_dir).await?;
        tracing::info!("Workout data stored in {:?}", store.dir());
        Ok(Self::with_store(Arc::new(store)))
    }

    /// `data/` under the project root.
    pub fn default_data_dir() -> Result<PathBuf, DataManagerError> {
        let root = project_root::get_project_root()
            .map_err(|err| DataManagerError::Storage(format!("Failed to locate project root: {}", err)))?;
        Ok(root.join(DATA_DIR))
    }

    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryBlobStore::new()))
    }

    pub fn with_store(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get_workouts(&self) -> Result<Vec<WorkoutRecord>, DataManagerError> {
        let Some(blob) = self.store.get(WORKOUTS_KEY).await? else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&blob)
            .map_err(|err| DataManagerError::Serialization(format!("Failed to parse saved workouts: {}", err)))
    }

    pub async fn get_workout(&self, index: usize) -> Result<WorkoutRecord, DataManagerError> {
        let mut workouts = self.get_workouts().await?;
        if index >= workouts.len() {
            return Err(DataManagerError::Storage(format!("No workout with index {}, {} saved", index, workouts.len())));
        }
        Ok(workouts.swap_remove(index))
    }

    /// Appends to the saved workouts. Returns the new workout's index.
    pub async fn append_workout(&self, record: &WorkoutRecord) -> Result<usize, DataManagerError> {
        let _guard = self.append_lock.lock().await;

        let mut workouts = self.get_workouts().await?;
        workouts.push(record.clone());

        let blob = serde_json::to_string(&workouts)
            .map_err(|err| DataManagerError::Serialization(format!("Failed to serialize workouts: {}", err)))?;
        self.store.set(WORKOUTS_KEY, blob).await?;

        tracing::info!("Saved workout {} ({:.0} m, {} points)", workouts.len() - 1, record.distance_meters, record.route.len());
        Ok(workouts.len() - 1)
    }
}
