use crate::config::{DEFAULT_COUNTER_MAX, DEFAULT_COUNTER_THRESHOLD};

/// Step sizes and bounds for the hysteresis counters.
///
/// Silence decays fastest, a disagreeing validation a bit slower, and agreement climbs one
/// step at a time up to a ceiling well above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterPolicy {
    /// A counter strictly above this is confirmed.
    pub threshold: u8,
    pub max: u8,
    pub quiet_decay: u8,
    pub disagreement_decay: u8,
    pub reinforcement: u8,
}

impl CounterPolicy {
    pub const QUIET_DECAY: u8 = 3;
    pub const DISAGREEMENT_DECAY: u8 = 2;
    pub const REINFORCEMENT: u8 = 1;

    pub fn new(threshold: u8, max: u8) -> Self {
        Self {
            threshold,
            max,
            quiet_decay: Self::QUIET_DECAY,
            disagreement_decay: Self::DISAGREEMENT_DECAY,
            reinforcement: Self::REINFORCEMENT,
        }
    }
}

impl Default for CounterPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTER_THRESHOLD, DEFAULT_COUNTER_MAX)
    }
}

/// Bounded accumulator for one monitored class. Always within `[0, policy.max]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounter {
    value: u8,
}

impl ClassCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter preset to `value`, capped at `policy.max`.
    pub fn with_value(value: u8, policy: &CounterPolicy) -> Self {
        Self {
            value: value.min(policy.max),
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn reinforce(&mut self, policy: &CounterPolicy) {
        self.value = self.value.saturating_add(policy.reinforcement).min(policy.max);
    }

    pub fn penalize(&mut self, policy: &CounterPolicy) {
        self.value = self.value.saturating_sub(policy.disagreement_decay);
    }

    pub fn decay(&mut self, policy: &CounterPolicy) {
        self.value = self.value.saturating_sub(policy.quiet_decay);
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }

    pub fn is_confirmed(&self, policy: &CounterPolicy) -> bool {
        self.value > policy.threshold
    }

    /// Disagreeing validations still needed to drive the counter to zero.
    pub fn failures_to_suppress(&self, policy: &CounterPolicy) -> u8 {
        self.value / policy.disagreement_decay.max(1) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reinforce_caps_at_max() {
        let policy = CounterPolicy::default();
        let mut counter = ClassCounter::with_value(19, &policy);
        counter.reinforce(&policy);
        counter.reinforce(&policy);
        assert_eq!(counter.value(), 20);
    }

    #[test]
    fn decay_and_penalty_floor_at_zero() {
        let policy = CounterPolicy::default();
        let mut counter = ClassCounter::with_value(2, &policy);
        counter.decay(&policy);
        assert_eq!(counter.value(), 0);

        let mut counter = ClassCounter::with_value(1, &policy);
        counter.penalize(&policy);
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn confirmation_is_strictly_above_threshold() {
        let policy = CounterPolicy::default();
        assert!(!ClassCounter::with_value(5, &policy).is_confirmed(&policy));
        assert!(ClassCounter::with_value(6, &policy).is_confirmed(&policy));
    }

    #[test]
    fn failures_to_suppress_message_count() {
        let policy = CounterPolicy::default();
        assert_eq!(ClassCounter::with_value(8, &policy).failures_to_suppress(&policy), 5);
        assert_eq!(ClassCounter::with_value(7, &policy).failures_to_suppress(&policy), 4);
        assert_eq!(ClassCounter::with_value(0, &policy).failures_to_suppress(&policy), 1);
    }

    #[test]
    fn preset_value_is_capped() {
        let policy = CounterPolicy::new(5, 10);
        assert_eq!(ClassCounter::with_value(42, &policy).value(), 10);
    }
}
