use std::time::{Duration, Instant};

/// Paces an arbitrarily fast frame source down to a target rate.
///
/// Frames that arrive too early are dropped by the caller, never queued. The only state is
/// the time of the last admitted frame.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval: Duration,
    last_admitted: Option<Instant>,
}

impl FrameThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Admit the frame seen at `now` if a full interval has passed since the last admitted one.
    /// The first frame is always admitted.
    pub fn admit(&mut self, now: Instant) -> bool {
        match self.last_admitted {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_admitted = Some(now);
                true
            }
        }
    }
}
