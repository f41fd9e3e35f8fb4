//! Running state of a single tracking session.

use crate::{
    geo_point::{GeoPoint, TimestampedGeoPoint},
    speed_window::{SpeedWindow, DEFAULT_SPEED_WINDOW},
    workout::{WorkoutRecord, DEFAULT_KCAL_PER_KM},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub speed_window_capacity: usize,
    pub kcal_per_km: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            speed_window_capacity: DEFAULT_SPEED_WINDOW,
            kcal_per_km: DEFAULT_KCAL_PER_KM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Idle,
    Tracking,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub is_active: bool,
    pub start_time: Option<i64>,
    pub total_distance_meters: f64,
    pub current_speed_kmh: f64,
    pub route: Vec<GeoPoint>,
    pub last_sample: Option<TimestampedGeoPoint>,
    pub speed_window: SpeedWindow,
}

impl SessionState {
    fn new(speed_window_capacity: usize) -> Self {
        Self {
            is_active: false,
            start_time: None,
            total_distance_meters: 0.,
            current_speed_kmh: 0.,
            route: Vec::new(),
            last_sample: None,
            speed_window: SpeedWindow::new(speed_window_capacity),
        }
    }
}

/// Live statistics for the periodic display refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSnapshot {
    pub total_distance_meters: f64,
    pub current_speed_kmh: f64,
    pub sample_count: usize,
    pub elapsed_ms: i64,
}

/// Owns and mutates a [`SessionState`].
///
/// Samples are accepted only between `start` and `stop`. After `stop` the frozen
/// state stays readable until the next `start`.
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    config: SessionConfig,
    state: SessionState,
}

impl Default for SessionAggregator {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl SessionAggregator {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            state: SessionState::new(config.speed_window_capacity),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn tracking_state(&self) -> TrackingState {
        if self.state.is_active {
            TrackingState::Tracking
        } else {
            TrackingState::Idle
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.state.is_active
    }

    pub fn route(&self) -> &[GeoPoint] {
        &self.state.route
    }

    /// Starts a fresh session, discarding whatever was recorded before.
    pub fn start(&mut self, now_ms: i64) {
        if self.state.is_active {
            tracing::warn!("Restarting a session that was still tracking");
        }

        self.state = SessionState::new(self.config.speed_window_capacity);
        self.state.is_active = true;
        self.state.start_time = Some(now_ms);
    }

    /// Feeds one sample. Returns false if it was ignored because no session is running.
    pub fn on_sample(&mut self, sample: TimestampedGeoPoint) -> bool {
        if !self.state.is_active {
            return false;
        }

        self.state.route.push(sample.position);

        let Some(last) = self.state.last_sample.replace(sample) else {
            return true;
        };

        let distance = last.position.distance_to(&sample.position);
        self.state.total_distance_meters += distance;

        let elapsed_secs = sample.timestamp_ms.saturating_sub(last.timestamp_ms) as f64 / 1000.;
        if elapsed_secs > 0. {
            let speed_kmh = distance / elapsed_secs * 3.6;
            self.state.current_speed_kmh = speed_kmh;
            self.state.speed_window.push(speed_kmh);
        } else {
            tracing::debug!("Sample without forward time step ({elapsed_secs}s), speed not updated");
        }

        true
    }

    /// Ends the session. Returns `None` if no session was running.
    pub fn stop(&mut self, now_ms: i64) -> Option<WorkoutRecord> {
        if !self.state.is_active {
            return None;
        }
        self.state.is_active = false;

        Some(WorkoutRecord::new(
            now_ms,
            self.state.total_distance_meters,
            self.elapsed_ms(now_ms),
            self.average_speed_kmh(),
            self.state.route.clone(),
        ))
    }

    pub fn average_speed_kmh(&self) -> f64 {
        self.state.speed_window.mean()
    }

    /// Milliseconds since start, never negative. Zero if never started.
    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        self.state.start_time.map(|start| now_ms.saturating_sub(start).max(0)).unwrap_or(0)
    }

    pub fn snapshot(&self, now_ms: i64) -> SessionSnapshot {
        SessionSnapshot {
            total_distance_meters: self.state.total_distance_meters,
            current_speed_kmh: self.state.current_speed_kmh,
            sample_count: self.state.route.len(),
            elapsed_ms: self.elapsed_ms(now_ms),
        }
    }
}
