use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use workout_tracker_lib::clock::Clock;

/// Wall clock that never reports a time earlier than one it already reported.
#[derive(Debug, Default)]
pub struct SystemClock {
    latest_ms: AtomicI64,
}

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self.latest_ms.fetch_max(now, Ordering::SeqCst);
        previous.max(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_goes_backwards() {
        let clock = SystemClock::default();
        let mut previous = clock.now_ms();
        for _ in 0..1000 {
            let now = clock.now_ms();
            assert!(now >= previous);
            previous = now;
        }
    }
}
