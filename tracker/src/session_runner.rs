use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};
use workout_tracker_lib::{
    error::{SampleError, TrackerError},
    geo_point::TimestampedGeoPoint,
    projection::ProjectionEngine,
    render::{render_route, DrawingSurface},
    sample::{SampleEvent, SampleSource, SubscriptionHandle},
    session::{SessionAggregator, SessionSnapshot},
    workout::{format_duration, WorkoutRecord, WorkoutSummary},
};

use crate::tracker_state::TrackerState;

/// Everything the owning task reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerEvent {
    Sample(TimestampedGeoPoint),
    SampleFailed(SampleError),
    Resize { width: f64, height: f64 },
    Tick,
    Stop,
}

impl From<SampleEvent> for TrackerEvent {
    fn from(event: SampleEvent) -> Self {
        match event {
            SampleEvent::Sample(sample) => TrackerEvent::Sample(sample),
            SampleEvent::Error(err) => TrackerEvent::SampleFailed(err),
        }
    }
}

/// Lets other tasks talk to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<TrackerEvent>,
}

impl SessionHandle {
    pub fn stop(&self) {
        // The session may already be gone, which is fine
        let _ = self.tx.send(TrackerEvent::Stop);
    }

    pub fn resize(&self, width: f64, height: f64) {
        let _ = self.tx.send(TrackerEvent::Resize { width, height });
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopReason {
    Requested,
    SampleFailed(SampleError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub record: WorkoutRecord,
    pub summary: WorkoutSummary,
    /// Index in the saved workouts, `None` if saving failed.
    pub saved_index: Option<usize>,
    pub reason: StopReason,
}

/// Owns the session state. Every mutation happens on the task that drives [`SessionRunner::run`].
pub struct SessionRunner<S: SampleSource, D: DrawingSurface> {
    state: Arc<TrackerState>,
    aggregator: SessionAggregator,
    engine: ProjectionEngine,
    source: S,
    surface: D,
    // Stop and resize from handles, kept for the runner's lifetime
    tx: mpsc::UnboundedSender<TrackerEvent>,
    rx: mpsc::UnboundedReceiver<TrackerEvent>,
    // Samples and ticks of the current session only, replaced on every start
    session_rx: Option<mpsc::UnboundedReceiver<TrackerEvent>>,
    subscription: Option<SubscriptionHandle>,
    timer: Option<JoinHandle<()>>,
    status: Option<SessionSnapshot>,
}

impl<S: SampleSource, D: DrawingSurface> SessionRunner<S, D> {
    pub fn new(state: Arc<TrackerState>, source: S, surface: D) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = state.config;

        Self {
            state,
            aggregator: SessionAggregator::new(config.session),
            engine: ProjectionEngine::new(config.projection),
            source,
            surface,
            tx,
            rx,
            session_rx: None,
            subscription: None,
            timer: None,
            status: None,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle { tx: self.tx.clone() }
    }

    pub fn aggregator(&self) -> &SessionAggregator {
        &self.aggregator
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    /// What the refresh timer showed last, `None` before its first tick.
    pub fn status(&self) -> Option<SessionSnapshot> {
        self.status
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.aggregator.snapshot(self.state.clock.now_ms())
    }

    /// Begins tracking: subscribes to the source and starts the display timer.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<(), TrackerError> {
        if self.aggregator.is_tracking() {
            return Ok(());
        }

        if !self.source.is_available() {
            self.state.notifier.notify("Geolocation not supported by your browser.");
            return Err(TrackerError::SampleSourceUnavailable);
        }

        self.aggregator.start(self.state.clock.now_ms());
        self.status = None;

        let (session_tx, session_rx) = mpsc::unbounded_channel();
        let tx = session_tx.clone();
        let subscription = self.source.subscribe(Box::new(move |event: SampleEvent| {
            let _ = tx.send(event.into());
        }));
        match subscription {
            Ok(handle) => {
                self.subscription = Some(handle);
                self.session_rx = Some(session_rx);
            },
            Err(err) => {
                self.aggregator.stop(self.state.clock.now_ms());
                self.state.notifier.notify(&err.to_string());
                return Err(err);
            },
        }

        if let Some(interval) = self.state.config.tick_interval {
            let tx = session_tx;
            self.timer = Some(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                // The first tick completes immediately
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if tx.send(TrackerEvent::Tick).is_err() {
                        break;
                    }
                }
            }));
        }

        self.redraw();
        tracing::info!("Tracking started");
        self.state.notifier.notify("Tracking started!");
        Ok(())
    }

    /// Processes events until the session is stopped, then saves the workout.
    /// Returns `None` if there was nothing to stop.
    pub async fn run(&mut self) -> Result<Option<SessionOutcome>, TrackerError> {
        self.start()?;

        let reason = loop {
            let Some(event) = self.next_event().await else {
                break StopReason::Requested;
            };

            match event {
                TrackerEvent::Sample(sample) => self.on_sample(sample),
                TrackerEvent::Resize { width, height } => {
                    tracing::debug!("Resized to {}x{}", width, height);
                    self.surface.resize(width, height);
                    self.redraw();
                },
                TrackerEvent::Tick => self.on_tick(),
                TrackerEvent::SampleFailed(err) => {
                    tracing::warn!("Sample source failed: {}", err);
                    self.state.notifier.notify(err.user_message());
                    break StopReason::SampleFailed(err);
                },
                TrackerEvent::Stop => break StopReason::Requested,
            }
        };

        Ok(self.stop(reason).await)
    }

    /// Unsubscribes, cancels the timer and saves the workout. A no-op when not tracking.
    pub async fn stop(&mut self, reason: StopReason) -> Option<SessionOutcome> {
        if let Some(handle) = self.subscription.take() {
            self.source.unsubscribe(handle);
        }
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        // Whatever the old subscription still delivers goes nowhere
        self.session_rx = None;
        self.discard_pending_controls();

        let record = self.aggregator.stop(self.state.clock.now_ms())?;
        let summary = record.summary(self.state.config.session.kcal_per_km);
        tracing::info!("Tracking stopped ({:?}): {}", reason, summary);
        self.state.notifier.notify(&summary.to_string());

        let saved_index = match self.state.data_manager.append_workout(&record).await {
            Ok(index) => {
                self.state.notifier.notify("Workout completed! Data saved offline.");
                Some(index)
            },
            Err(err) => {
                let err = TrackerError::Persistence(err.to_string());
                tracing::error!("{}", err);
                self.state.notifier.notify("Error saving workout data offline.");
                None
            },
        };

        Some(SessionOutcome {
            record,
            summary,
            saved_index,
            reason,
        })
    }

    /// Pending samples and ticks come before control events, so a stop sees every sample sent ahead of it.
    async fn next_event(&mut self) -> Option<TrackerEvent> {
        let Some(session_rx) = self.session_rx.as_mut() else {
            return self.rx.recv().await;
        };

        tokio::select! {
            biased;
            Some(event) = session_rx.recv() => Some(event),
            event = self.rx.recv() => event,
        }
    }

    /// Drops stop requests meant for the session that just ended. Resizes still apply.
    fn discard_pending_controls(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            if let TrackerEvent::Resize { width, height } = event {
                self.surface.resize(width, height);
            }
        }
    }

    fn on_sample(&mut self, sample: TimestampedGeoPoint) {
        if !self.aggregator.on_sample(sample) {
            return;
        }

        let state = self.aggregator.state();
        tracing::debug!(
            "Sample {:.6},{:.6} -> {:.1} m, {:.1} km/h",
            sample.latitude(),
            sample.longitude(),
            state.total_distance_meters,
            state.current_speed_kmh
        );
        self.redraw();
    }

    fn on_tick(&mut self) {
        let snapshot = self.snapshot();
        self.status = Some(snapshot);
        tracing::info!(
            "{} | {:.2} km | {:.1} km/h | {} points",
            format_duration(snapshot.elapsed_ms),
            snapshot.total_distance_meters / 1000.,
            snapshot.current_speed_kmh,
            snapshot.sample_count
        );
    }

    fn redraw(&mut self) {
        render_route(&mut self.surface, self.aggregator.route(), &self.engine, &self.state.config.style);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use workout_tracker_data_management::{store::BlobStore, DataManager, DataManagerError};
    use workout_tracker_lib::{
        clock::ManualClock,
        render::{DrawCommand, RecordingSurface},
        sample::ScriptedSource,
        session::TrackingState,
    };

    use super::*;
    use crate::{notifier::RecordingNotifier, tracker_state::TrackerConfig};

    struct Fixture {
        clock: Arc<ManualClock>,
        notifier: Arc<RecordingNotifier>,
        state: Arc<TrackerState>,
    }

    fn fixture(data_manager: DataManager) -> Fixture {
        let clock = Arc::new(ManualClock::new(0));
        let notifier = Arc::new(RecordingNotifier::default());
        let state = Arc::new(TrackerState {
            data_manager,
            clock: clock.clone(),
            notifier: notifier.clone(),
            config: TrackerConfig {
                tick_interval: None,
                ..Default::default()
            },
        });
        Fixture { clock, notifier, state }
    }

    fn samples() -> Vec<SampleEvent> {
        vec![
            SampleEvent::Sample(TimestampedGeoPoint::new(0., 0., 0)),
            SampleEvent::Sample(TimestampedGeoPoint::new(0., 0.001, 1000)),
        ]
    }

    #[tokio::test]
    async fn end_to_end_session_is_saved() {
        let data_manager = DataManager::in_memory();
        let f = fixture(data_manager.clone());
        let mut runner = SessionRunner::new(f.state.clone(), ScriptedSource::new(samples()), RecordingSurface::new(300., 200.));

        runner.start().unwrap();
        f.clock.set(1000);
        runner.handle().stop();
        let outcome = runner.run().await.unwrap().unwrap();

        assert_eq!(outcome.reason, StopReason::Requested);
        assert!((outcome.record.distance_meters - 111.19).abs() < 0.01);
        assert_eq!(outcome.record.duration_ms, 1000);
        assert!((outcome.record.avg_speed_kmh - 400.3).abs() < 0.05);
        assert_eq!(outcome.saved_index, Some(0));
        assert_eq!(data_manager.get_workouts().await.unwrap(), vec![outcome.record.clone()]);

        assert_eq!(runner.aggregator().tracking_state(), TrackingState::Idle);
        assert_eq!(runner.source().unsubscribe_calls().len(), 1);
        assert!(runner.source().active_subscriptions().is_empty());

        let messages = f.notifier.messages();
        assert_eq!(messages.first().map(String::as_str), Some("Tracking started!"));
        assert_eq!(messages.last().map(String::as_str), Some("Workout completed! Data saved offline."));
    }

    #[tokio::test]
    async fn every_sample_redraws_the_route() {
        let f = fixture(DataManager::in_memory());
        let mut runner = SessionRunner::new(f.state.clone(), ScriptedSource::new(samples()), RecordingSurface::new(300., 200.));

        runner.start().unwrap();
        runner.handle().stop();
        runner.run().await.unwrap();

        let surface = runner.surface();
        // One clear on start and one per sample
        assert_eq!(surface.clear_count, 3);
        assert_eq!(surface.commands.len(), 3);
        assert!(matches!(&surface.commands[0], DrawCommand::Polyline(points, _) if points.len() == 2));
    }

    #[tokio::test]
    async fn resize_reprojects_at_the_new_size() {
        let f = fixture(DataManager::in_memory());
        let mut runner = SessionRunner::new(f.state.clone(), ScriptedSource::new(samples()), RecordingSurface::new(300., 200.));

        runner.start().unwrap();
        let handle = runner.handle();
        handle.resize(600., 600.);
        handle.stop();
        runner.run().await.unwrap();

        let surface = runner.surface();
        assert_eq!((surface.width, surface.height), (600., 600.));
        let expected = ProjectionEngine::default().project(runner.aggregator().route(), 600., 600.);
        assert_eq!(surface.commands[0], DrawCommand::Polyline(expected, f.state.config.style.line));
    }

    #[tokio::test]
    async fn sample_error_stops_the_session() {
        let data_manager = DataManager::in_memory();
        let f = fixture(data_manager.clone());
        let script = vec![
            SampleEvent::Sample(TimestampedGeoPoint::new(0., 0., 0)),
            SampleEvent::Error(SampleError::PermissionDenied),
            SampleEvent::Sample(TimestampedGeoPoint::new(0., 0.001, 1000)),
        ];
        let mut runner = SessionRunner::new(f.state.clone(), ScriptedSource::new(script), RecordingSurface::new(100., 100.));

        let outcome = runner.run().await.unwrap().unwrap();

        assert_eq!(outcome.reason, StopReason::SampleFailed(SampleError::PermissionDenied));
        assert_eq!(outcome.record.route.len(), 1);
        assert_eq!(outcome.record.distance_meters, 0.);
        assert_eq!(runner.source().unsubscribe_calls().len(), 1);
        assert!(f.notifier.messages().contains(&SampleError::PermissionDenied.user_message().to_string()));
        assert_eq!(data_manager.get_workouts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stopping_twice_is_a_noop() {
        let data_manager = DataManager::in_memory();
        let f = fixture(data_manager.clone());
        let mut runner = SessionRunner::new(f.state.clone(), ScriptedSource::new(samples()), RecordingSurface::new(100., 100.));

        runner.start().unwrap();
        runner.handle().stop();
        runner.handle().stop();
        assert!(runner.run().await.unwrap().is_some());
        assert!(runner.stop(StopReason::Requested).await.is_none());
        // The extra stop must not end the next session
        assert!(runner.rx.try_recv().is_err());

        assert_eq!(runner.source().unsubscribe_calls().len(), 1);
        assert_eq!(data_manager.get_workouts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn next_session_starts_without_leftover_samples() {
        let data_manager = DataManager::in_memory();
        let f = fixture(data_manager.clone());
        let script = vec![
            SampleEvent::Sample(TimestampedGeoPoint::new(0., 0., 0)),
            SampleEvent::Error(SampleError::Timeout),
            SampleEvent::Sample(TimestampedGeoPoint::new(0., 0.001, 1000)),
        ];
        let mut runner = SessionRunner::new(f.state.clone(), ScriptedSource::new(script), RecordingSurface::new(100., 100.));

        let first = runner.run().await.unwrap().unwrap();
        let second = runner.run().await.unwrap().unwrap();

        for outcome in [&first, &second] {
            assert_eq!(outcome.reason, StopReason::SampleFailed(SampleError::Timeout));
            assert_eq!(outcome.record.route.len(), 1);
            assert_eq!(outcome.record.distance_meters, 0.);
        }
        assert_eq!(runner.source().unsubscribe_calls().len(), 2);
        assert_eq!(data_manager.get_workouts().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unavailable_source_is_reported() {
        let f = fixture(DataManager::in_memory());
        let mut runner = SessionRunner::new(f.state.clone(), ScriptedSource::unavailable(), RecordingSurface::new(100., 100.));

        assert_eq!(runner.run().await, Err(TrackerError::SampleSourceUnavailable));
        assert_eq!(runner.aggregator().tracking_state(), TrackingState::Idle);
        assert_eq!(f.notifier.messages(), vec!["Geolocation not supported by your browser.".to_string()]);
    }

    struct FailingStore;

    #[async_trait::async_trait]
    impl BlobStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, DataManagerError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: String) -> Result<(), DataManagerError> {
            Err(DataManagerError::Storage("disk full".into()))
        }
    }

    #[tokio::test]
    async fn persistence_failure_still_yields_a_summary() {
        let f = fixture(DataManager::with_store(Arc::new(FailingStore)));
        let mut runner = SessionRunner::new(f.state.clone(), ScriptedSource::new(samples()), RecordingSurface::new(100., 100.));

        runner.start().unwrap();
        f.clock.advance(1000);
        runner.handle().stop();
        let outcome = runner.run().await.unwrap().unwrap();

        assert_eq!(outcome.saved_index, None);
        assert_eq!(outcome.summary.calories, 7);
        assert_eq!(f.notifier.messages().last().map(String::as_str), Some("Error saving workout data offline."));
    }

    #[tokio::test]
    async fn timer_ticks_while_tracking() {
        let clock = Arc::new(ManualClock::new(0));
        let state = Arc::new(TrackerState {
            data_manager: DataManager::in_memory(),
            clock: clock.clone(),
            notifier: Arc::new(RecordingNotifier::default()),
            config: TrackerConfig {
                tick_interval: Some(Duration::from_millis(5)),
                ..Default::default()
            },
        });
        let mut runner = SessionRunner::new(state, ScriptedSource::new(samples()), RecordingSurface::new(100., 100.));

        let handle = runner.handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.stop();
        });

        assert_eq!(runner.status(), None);
        let outcome = runner.run().await.unwrap().unwrap();
        assert_eq!(outcome.record.route.len(), 2);
        assert!(runner.timer.is_none());

        let status = runner.status().unwrap();
        assert_eq!(status.sample_count, 2);
        assert!((status.total_distance_meters - outcome.record.distance_meters).abs() < 1e-9);
    }
}
