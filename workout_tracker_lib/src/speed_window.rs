use std::collections::VecDeque;

pub const DEFAULT_SPEED_WINDOW: usize = 10;

/// The most recent instantaneous speeds, oldest first.
/// Pushing into a full window evicts the oldest entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedWindow {
    speeds: VecDeque<f64>,
    capacity: usize,
}

impl SpeedWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            speeds: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, speed_kmh: f64) {
        if self.speeds.len() == self.capacity {
            self.speeds.pop_front();
        }
        self.speeds.push_back(speed_kmh);
    }

    /// Arithmetic mean, 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.speeds.is_empty() {
            return 0.;
        }
        self.speeds.iter().sum::<f64>() / self.speeds.len() as f64
    }

    pub fn clear(&mut self) {
        self.speeds.clear();
    }

    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.speeds.iter()
    }
}

impl Default for SpeedWindow {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED_WINDOW)
    }
}
