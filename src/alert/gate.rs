use std::time::{Duration, Instant};

/// Time of the last permitted alert. `None` stands for "never", which every `now` is past.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertGateState {
    last_alert_time: Option<Instant>,
}

impl AlertGateState {
    /// Instant of the last permitted alert, `None` before the first one.
    pub fn last_alert_time(&self) -> Option<Instant> {
        self.last_alert_time
    }
}

/// Minimum spacing between dispatched alerts, independent of how long a class stays confirmed.
///
/// [`try_acquire`](Self::try_acquire) is the only mutator: it checks and records in one call, so
/// one check can never schedule two alerts.
#[derive(Debug, Clone)]
pub struct AlertGate {
    cooldown: Duration,
    state: AlertGateState,
}

impl AlertGate {
    /// Gate that has never alerted, so the first confirmed event always passes.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            state: AlertGateState::default(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn state(&self) -> AlertGateState {
        self.state
    }

    /// Permit an alert at `now` iff more than the cooldown has passed since the last one.
    ///
    /// # Arguments
    /// * `now` - monotonic time of the frame that would alert
    ///
    /// # Returns
    /// `true` if the alert may go out. On success `now` becomes the last alert time; on refusal
    /// nothing changes.
    ///
    /// # Examples
    /// ```
    /// use emberwatch::AlertGate;
    /// use std::time::{Duration, Instant};
    ///
    /// let mut gate = AlertGate::new(Duration::from_secs(300));
    /// let start = Instant::now();
    ///
    /// assert!(gate.try_acquire(start));
    /// assert!(!gate.try_acquire(start + Duration::from_secs(300)));
    /// assert!(gate.try_acquire(start + Duration::from_secs(301)));
    /// ```
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        let permitted = match self.state.last_alert_time {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.cooldown,
        };
        if permitted {
            self.state.last_alert_time = Some(now);
        }
        permitted
    }
}
