use std::{sync::Arc, time::Duration};

use workout_tracker_data_management::DataManager;
use workout_tracker_lib::{clock::Clock, projection::ProjectionConfig, render::RouteStyle, session::SessionConfig};

use crate::notifier::Notifier;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    pub session: SessionConfig,
    pub projection: ProjectionConfig,
    pub style: RouteStyle,
    /// How often the duration display refreshes. `None` disables the timer.
    pub tick_interval: Option<Duration>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            projection: ProjectionConfig::default(),
            style: RouteStyle::default(),
            tick_interval: Some(DEFAULT_TICK_INTERVAL),
        }
    }
}

pub struct TrackerState {
    pub data_manager: DataManager,
    pub clock: Arc<dyn Clock>,
    pub notifier: Arc<dyn Notifier>,
    pub config: TrackerConfig,
}
