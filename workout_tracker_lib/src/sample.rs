use crate::{
    error::{SampleError, TrackerError},
    geo_point::TimestampedGeoPoint,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleEvent {
    Sample(TimestampedGeoPoint),
    Error(SampleError),
}

/// Receives every event of one subscription, in delivery order.
pub type SampleSink = Box<dyn FnMut(SampleEvent) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

/// Something that produces location samples, such as a GPS receiver or a recorded track.
///
/// Events of one subscription are delivered sequentially, never concurrently.
pub trait SampleSource {
    /// False when the capability does not exist at all on this system.
    fn is_available(&self) -> bool {
        true
    }

    fn subscribe(&mut self, sink: SampleSink) -> Result<SubscriptionHandle, TrackerError>;

    /// Unknown or already removed handles are ignored.
    fn unsubscribe(&mut self, handle: SubscriptionHandle);
}

/// Delivers a fixed list of events synchronously, as soon as someone subscribes.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Vec<SampleEvent>,
    available: bool,
    next_handle: u64,
    subscribed: Vec<SubscriptionHandle>,
    unsubscribed: Vec<SubscriptionHandle>,
}

impl ScriptedSource {
    pub fn new(script: Vec<SampleEvent>) -> Self {
        Self {
            script,
            available: true,
            ..Default::default()
        }
    }

    pub fn from_samples(samples: impl IntoIterator<Item = TimestampedGeoPoint>) -> Self {
        Self::new(samples.into_iter().map(SampleEvent::Sample).collect())
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Default::default()
        }
    }

    pub fn active_subscriptions(&self) -> &[SubscriptionHandle] {
        &self.subscribed
    }

    pub fn unsubscribe_calls(&self) -> &[SubscriptionHandle] {
        &self.unsubscribed
    }
}

impl SampleSource for ScriptedSource {
    fn is_available(&self) -> bool {
        self.available
    }

    fn subscribe(&mut self, mut sink: SampleSink) -> Result<SubscriptionHandle, TrackerError> {
        if !self.available {
            return Err(TrackerError::SampleSourceUnavailable);
        }

        let handle = SubscriptionHandle(self.next_handle);
        self.next_handle += 1;
        self.subscribed.push(handle);

        for event in &self.script {
            sink(*event);
        }

        Ok(handle)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        self.unsubscribed.push(handle);
        self.subscribed.retain(|active| *active != handle);
    }
}
