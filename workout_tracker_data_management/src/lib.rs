use const_format::concatcp;
use thiserror::Error;

pub mod store;
pub mod gpx_util;
mod data_manager;

pub use data_manager::*;

pub const DATA_DIR: &str = "data/";
pub const WORKOUTS_KEY: &str = "workouts";
pub const BLOB_EXTENSION: &str = ".json";
pub const WORKOUTS_FILE: &str = concatcp!(WORKOUTS_KEY, BLOB_EXTENSION);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataManagerError {
    #[error("storage: {0}")]
    Storage(String),
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("gpx: {0}")]
    Gpx(String),
}
