use std::{collections::HashMap, f64::consts::TAU, sync::Arc, time::Duration};

use tokio::{sync::Notify, task::JoinHandle};
use workout_tracker_lib::{
    error::TrackerError,
    geo_point::{GeoPoint, TimestampedGeoPoint},
    projection::METERS_PER_DEGREE_LAT,
    sample::{SampleEvent, SampleSink, SampleSource, SubscriptionHandle},
};

/// Plays back a recorded track on a tokio task, paced by the sample timestamps.
///
/// Timestamps are delivered unchanged. `speedup` only shortens the waits between them.
pub struct ReplaySource {
    samples: Arc<Vec<TimestampedGeoPoint>>,
    speedup: f64,
    next_handle: u64,
    tasks: HashMap<SubscriptionHandle, JoinHandle<()>>,
    finished: Arc<Notify>,
}

impl ReplaySource {
    pub fn new(samples: Vec<TimestampedGeoPoint>, speedup: f64) -> Self {
        let speedup = if speedup > 0. { speedup } else { 1. };
        Self {
            samples: Arc::new(samples),
            speedup,
            next_handle: 0,
            tasks: HashMap::new(),
            finished: Arc::new(Notify::new()),
        }
    }

    /// Signalled once a subscription has delivered every sample.
    pub fn finished(&self) -> Arc<Notify> {
        self.finished.clone()
    }
}

impl SampleSource for ReplaySource {
    fn subscribe(&mut self, sink: SampleSink) -> Result<SubscriptionHandle, TrackerError> {
        let handle = SubscriptionHandle(self.next_handle);
        self.next_handle += 1;

        let samples = self.samples.clone();
        let speedup = self.speedup;
        let finished = self.finished.clone();

        let task = tokio::spawn(async move {
            let mut sink = sink;
            let mut previous: Option<i64> = None;

            for sample in samples.iter() {
                if let Some(previous) = previous {
                    let delay = replay_delay(previous, sample.timestamp_ms, speedup);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                previous = Some(sample.timestamp_ms);
                sink(SampleEvent::Sample(*sample));
            }

            tracing::debug!("Replay delivered {} samples", samples.len());
            finished.notify_one();
        });

        self.tasks.insert(handle, task);
        Ok(handle)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

/// Real time to wait between two recorded samples. Saturates instead of overflowing.
fn replay_delay(previous_ms: i64, current_ms: i64, speedup: f64) -> Duration {
    let gap_ms = current_ms.saturating_sub(previous_ms).max(0) as f64 / speedup;
    Duration::try_from_secs_f64(gap_ms / 1000.).unwrap_or(Duration::MAX)
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedWalk {
    pub center: GeoPoint,
    pub radius_m: f64,
    pub speed_kmh: f64,
    pub interval_ms: i64,
    pub sample_count: usize,
    pub start_ms: i64,
}

impl SimulatedWalk {
    /// Walks counter-clockwise around a circle, starting due east of the center.
    pub fn samples(&self) -> Vec<TimestampedGeoPoint> {
        let step_m = self.speed_kmh / 3.6 * self.interval_ms as f64 / 1000.;
        let step_angle = if self.radius_m > 0. { step_m / self.radius_m } else { 0. };
        let meters_per_degree_lon = METERS_PER_DEGREE_LAT * self.center.latitude.to_radians().cos();

        (0..self.sample_count)
            .map(|i| {
                let angle = (step_angle * i as f64) % TAU;
                let north_m = self.radius_m * angle.sin();
                let east_m = self.radius_m * angle.cos();
                TimestampedGeoPoint::new(
                    self.center.latitude + north_m / METERS_PER_DEGREE_LAT,
                    self.center.longitude + east_m / meters_per_degree_lon,
                    self.start_ms + self.interval_ms * i as i64,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use workout_tracker_lib::session::SessionAggregator;

    use super::*;

    fn walk(sample_count: usize) -> SimulatedWalk {
        SimulatedWalk {
            center: GeoPoint::new(56.1572, 10.2107),
            radius_m: 200.,
            speed_kmh: 10.,
            interval_ms: 1000,
            sample_count,
            start_ms: 0,
        }
    }

    #[test]
    fn simulated_walk_moves_at_the_requested_speed() {
        let mut aggregator = SessionAggregator::default();
        aggregator.start(0);
        for sample in walk(60).samples() {
            aggregator.on_sample(sample);
        }

        let record = aggregator.stop(59_000).unwrap();
        assert!((record.avg_speed_kmh - 10.).abs() < 0.1, "{}", record.avg_speed_kmh);
        assert!((record.distance_meters - 59. * 10. / 3.6).abs() < 1., "{}", record.distance_meters);
    }

    #[test]
    fn simulated_walk_stays_on_the_circle() {
        let center = walk(1).center;
        for sample in walk(400).samples() {
            let distance = center.distance_to(&sample.position);
            assert!((distance - 200.).abs() < 1., "{}", distance);
        }
    }

    #[test]
    fn replay_delay_scales_and_saturates() {
        assert_eq!(replay_delay(0, 1000, 2.), Duration::from_millis(500));
        assert_eq!(replay_delay(1000, 0, 10.), Duration::ZERO);
        assert_eq!(replay_delay(0, 1000, 1e-300), Duration::MAX);
        assert!(replay_delay(i64::MIN, i64::MAX, 1.) > Duration::from_secs(u32::MAX as u64));
    }

    #[tokio::test]
    async fn replays_every_sample_in_order() {
        let samples = walk(5).samples();
        let mut source = ReplaySource::new(samples.clone(), 1000.);
        let finished = source.finished();

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink_received = received.clone();
        source
            .subscribe(Box::new(move |event| {
                if let SampleEvent::Sample(sample) = event {
                    sink_received.lock().unwrap().push(sample);
                }
            }))
            .unwrap();

        finished.notified().await;
        assert_eq!(*received.lock().unwrap(), samples);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let samples = walk(3).samples();
        // A full second between samples at normal speed
        let mut source = ReplaySource::new(samples, 1.);

        let received = Arc::new(Mutex::new(0));
        let sink_received = received.clone();
        let handle = source.subscribe(Box::new(move |_| *sink_received.lock().unwrap() += 1)).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        source.unsubscribe(handle);
        tokio::time::sleep(Duration::from_millis(1200)).await;

        assert_eq!(*received.lock().unwrap(), 1);
    }
}
