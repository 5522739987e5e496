use std::time::{Duration, Instant};

pub const ANIMATION_INTERVAL: Duration = Duration::from_millis(850);

/// Fixed-period clock polled from the host event loop.
#[derive(Debug, Clone, Copy)]
pub struct AnimationClock {
    interval: Duration,
    last_tick: Option<Instant>,
}

impl AnimationClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            last_tick: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true when a tick is due at `now`. The first poll only arms the
    /// clock.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_tick {
            None => {
                self.last_tick = Some(now);
                false
            }
            Some(last) if now.saturating_duration_since(last) >= self.interval => {
                self.last_tick = Some(now);
                true
            }
            Some(_) => false,
        }
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new(ANIMATION_INTERVAL)
    }
}
