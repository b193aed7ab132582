//! Wall-clock listening time for the playing track.

use std::time::{Duration, Instant};

/// Accumulates time spent in the playing state, excluding pauses.
#[derive(Debug, Clone, Default)]
pub struct ListenTimer {
    running_since: Option<Instant>,
    accumulated: Duration,
}

impl ListenTimer {
    /// Reset and start counting.
    pub fn start(&mut self, now: Instant) {
        self.accumulated = Duration::ZERO;
        self.running_since = Some(now);
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += now.saturating_duration_since(since);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.accumulated
            + self
                .running_since
                .map_or(Duration::ZERO, |since| now.saturating_duration_since(since))
    }

    /// Total listened so far; the timer is left stopped and empty.
    pub fn take(&mut self, now: Instant) -> Duration {
        let total = self.elapsed(now);
        self.accumulated = Duration::ZERO;
        self.running_since = None;
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pauses_are_excluded() {
        let t0 = Instant::now();
        let s = |n: u64| t0 + Duration::from_secs(n);

        let mut timer = ListenTimer::default();
        timer.start(s(0));
        timer.pause(s(10));
        timer.resume(s(25));
        timer.pause(s(30));
        timer.pause(s(40));
        timer.resume(s(50));
        timer.resume(s(55));
        assert_eq!(timer.take(s(60)), Duration::from_secs(25));
        assert_eq!(timer.take(s(90)), Duration::ZERO);
    }

    #[test]
    fn start_discards_previous_time() {
        let t0 = Instant::now();
        let mut timer = ListenTimer::default();
        timer.start(t0);
        timer.start(t0 + Duration::from_secs(5));
        assert_eq!(
            timer.elapsed(t0 + Duration::from_secs(7)),
            Duration::from_secs(2)
        );
    }
}
