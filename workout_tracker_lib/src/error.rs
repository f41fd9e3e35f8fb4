use thiserror::Error;

/// Failures reported by a sample source. None of them are fatal, they end the session.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("timeout")]
    Timeout,
    #[error("unknown sample error")]
    Unknown,
}

impl SampleError {
    /// Text shown to the user when tracking stops because of this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            SampleError::PermissionDenied => "Permission denied for Geolocation. Please enable location access.",
            SampleError::PositionUnavailable => "Location information is unavailable. Try again later.",
            SampleError::Timeout => "The request to get user location timed out. Check your GPS signal.",
            SampleError::Unknown => "An unknown error occurred while fetching location.",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackerError {
    #[error("no sample source is available")]
    SampleSourceUnavailable,
    #[error("sample source failed: {0}")]
    Sample(#[from] SampleError),
    #[error("failed to persist workout: {0}")]
    Persistence(String),
}
