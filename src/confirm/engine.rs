use crate::confirm::class::{ClassSet, MonitoredClass};
use crate::confirm::counter::{ClassCounter, CounterPolicy};

/// What the engine saw in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Primary detector returned nothing.
    Quiet,
    /// Primary detector fired, but on no monitored class.
    PrimaryOnly,
    /// Primary detector fired on a monitored class and the secondary detector was consulted.
    Validating,
}

/// How one counter moved during a validating frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterChange {
    /// The secondary detector agreed; `value` is the counter after the step.
    Reinforced { class: MonitoredClass, value: u8 },
    /// The secondary detector disagreed. `failures_to_suppress` is how many more disagreements
    /// bring the counter to zero, as quoted in the warning log.
    Penalized { class: MonitoredClass, value: u8, failures_to_suppress: u8 },
}

impl CounterChange {
    pub fn class(&self) -> MonitoredClass {
        match self {
            Self::Reinforced { class, .. } | Self::Penalized { class, .. } => *class,
        }
    }

    /// Counter value after the change.
    pub fn value(&self) -> u8 {
        match self {
            Self::Reinforced { value, .. } | Self::Penalized { value, .. } => *value,
        }
    }
}

/// Outcome of one observed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    pub state: EngineState,
    /// One entry per class the primary detector raised. Empty unless `state` is `Validating`.
    pub changes: Vec<CounterChange>,
    /// Classes whose counter is above the threshold after this frame.
    pub confirmed: ClassSet,
}

/// Per-class hysteresis counters driven once per admitted frame.
///
/// Counters are mutated only here and stay within `[0, policy.max]`. Exactly one `observe_*`
/// call is made per admitted frame, chosen by what the primary detector returned:
///
/// | primary output | call |
/// |---|---|
/// | nothing | [`observe_quiet`](Self::observe_quiet) |
/// | only non-wildfire labels | [`observe_unmonitored`](Self::observe_unmonitored) |
/// | smoke and/or fire | [`observe_validation`](Self::observe_validation) |
///
/// # Examples
/// ```
/// use emberwatch::confirm::{ClassSet, ConfirmationEngine, MonitoredClass};
///
/// let mut engine = ConfirmationEngine::default();
/// let smoke: ClassSet = [MonitoredClass::Smoke].into_iter().collect();
///
/// for _ in 0..5 {
///     assert!(engine.observe_validation(smoke, smoke).confirmed.is_empty());
/// }
/// // sixth agreement lifts the counter above the threshold of 5
/// let report = engine.observe_validation(smoke, smoke);
/// assert!(report.confirmed.contains(MonitoredClass::Smoke));
///
/// // one quiet frame decays it by 3 and the class is no longer confirmed
/// assert!(engine.observe_quiet().confirmed.is_empty());
/// assert_eq!(engine.counter(MonitoredClass::Smoke), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ConfirmationEngine {
    policy: CounterPolicy,
    counters: [ClassCounter; 2],
}

impl ConfirmationEngine {
    /// Engine with every counter at zero.
    pub fn new(policy: CounterPolicy) -> Self {
        Self {
            policy,
            counters: [ClassCounter::new(); 2],
        }
    }

    pub fn policy(&self) -> &CounterPolicy {
        &self.policy
    }

    /// Current value of `class`'s counter, its "danger level".
    pub fn counter(&self, class: MonitoredClass) -> u8 {
        self.counters[class.index()].value()
    }

    /// Preset a counter, capped at the policy maximum.
    pub fn set_counter(&mut self, class: MonitoredClass, value: u8) {
        self.counters[class.index()] = ClassCounter::with_value(value, &self.policy);
    }

    /// Primary detector returned no detections: every counter decays.
    pub fn observe_quiet(&mut self) -> FrameReport {
        for counter in &mut self.counters {
            counter.decay(&self.policy);
        }
        self.report(EngineState::Quiet, Vec::new())
    }

    /// Primary detector fired only on non-wildfire classes: every counter resets.
    pub fn observe_unmonitored(&mut self) -> FrameReport {
        for counter in &mut self.counters {
            counter.reset();
        }
        self.report(EngineState::PrimaryOnly, Vec::new())
    }

    /// Primary detector flagged `primary`; the secondary detector reported `secondary`.
    ///
    /// Only classes raised by the primary detector move. Classes absent from `primary` keep
    /// their value this frame.
    ///
    /// # Arguments
    /// * `primary` - monitored classes in the primary output, never empty in practice
    /// * `secondary` - monitored classes in the secondary output on the same frame
    ///
    /// # Returns
    /// A `Validating` report with one [`CounterChange`] per class in `primary`.
    ///
    /// # Examples
    /// ```
    /// use emberwatch::confirm::{ClassSet, ConfirmationEngine, CounterChange, MonitoredClass};
    ///
    /// let mut engine = ConfirmationEngine::default();
    /// engine.set_counter(MonitoredClass::Fire, 8);
    /// let fire: ClassSet = [MonitoredClass::Fire].into_iter().collect();
    ///
    /// let report = engine.observe_validation(fire, ClassSet::empty());
    /// assert_eq!(
    ///     report.changes,
    ///     vec![CounterChange::Penalized { class: MonitoredClass::Fire, value: 6, failures_to_suppress: 4 }]
    /// );
    /// ```
    pub fn observe_validation(&mut self, primary: ClassSet, secondary: ClassSet) -> FrameReport {
        let mut changes = Vec::with_capacity(primary.len());
        for class in primary.iter() {
            let counter = &mut self.counters[class.index()];
            if secondary.contains(class) {
                counter.reinforce(&self.policy);
                changes.push(CounterChange::Reinforced {
                    class,
                    value: counter.value(),
                });
            } else {
                counter.penalize(&self.policy);
                changes.push(CounterChange::Penalized {
                    class,
                    value: counter.value(),
                    failures_to_suppress: counter.failures_to_suppress(&self.policy),
                });
            }
        }
        self.report(EngineState::Validating, changes)
    }

    /// Classes whose counter is strictly above the policy threshold.
    pub fn confirmed(&self) -> ClassSet {
        MonitoredClass::ALL
            .into_iter()
            .filter(|c| self.counters[c.index()].is_confirmed(&self.policy))
            .collect()
    }

    fn report(&self, state: EngineState, changes: Vec<CounterChange>) -> FrameReport {
        FrameReport {
            state,
            changes,
            confirmed: self.confirmed(),
        }
    }
}

impl Default for ConfirmationEngine {
    fn default() -> Self {
        Self::new(CounterPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMOKE: MonitoredClass = MonitoredClass::Smoke;
    const FIRE: MonitoredClass = MonitoredClass::Fire;

    fn set(classes: &[MonitoredClass]) -> ClassSet {
        classes.iter().copied().collect()
    }

    #[test]
    fn quiet_frames_drain_a_full_counter_within_seven_frames() {
        let mut engine = ConfirmationEngine::default();
        engine.set_counter(SMOKE, 20);

        let mut history = Vec::new();
        for _ in 0..10 {
            let report = engine.observe_quiet();
            assert_eq!(report.state, EngineState::Quiet);
            history.push(engine.counter(SMOKE));
        }

        assert_eq!(&history[..7], &[17u8, 14, 11, 8, 5, 2, 0]);
        assert!(history[7..].iter().all(|v| *v == 0));
    }

    #[test]
    fn agreement_confirms_after_six_frames() {
        let mut engine = ConfirmationEngine::default();
        for frame in 1..=6 {
            let report = engine.observe_validation(set(&[SMOKE]), set(&[SMOKE]));
            assert_eq!(engine.counter(SMOKE), frame);
            assert_eq!(report.confirmed.contains(SMOKE), frame == 6);
        }
    }

    #[test]
    fn disagreement_drains_ten_within_five_frames() {
        let mut engine = ConfirmationEngine::default();
        engine.set_counter(SMOKE, 10);

        let mut values = Vec::new();
        for _ in 0..7 {
            let report = engine.observe_validation(set(&[SMOKE]), ClassSet::empty());
            values.push(engine.counter(SMOKE));
            if engine.counter(SMOKE) == 0 {
                assert!(report.confirmed.is_empty());
            }
        }

        assert_eq!(values, vec![8u8, 6, 4, 2, 0, 0, 0]);
    }

    #[test]
    fn penalty_reports_remaining_failures() {
        let mut engine = ConfirmationEngine::default();
        engine.set_counter(FIRE, 10);

        let report = engine.observe_validation(set(&[FIRE]), set(&[SMOKE]));

        assert_eq!(
            report.changes,
            vec![CounterChange::Penalized {
                class: FIRE,
                value: 8,
                failures_to_suppress: 5
            }]
        );
    }

    #[test]
    fn unmonitored_detection_resets_everything() {
        let mut engine = ConfirmationEngine::default();
        engine.set_counter(SMOKE, 20);
        engine.set_counter(FIRE, 7);

        let report = engine.observe_unmonitored();

        assert_eq!(report.state, EngineState::PrimaryOnly);
        assert_eq!(engine.counter(SMOKE), 0);
        assert_eq!(engine.counter(FIRE), 0);
        assert!(report.confirmed.is_empty());
    }

    #[test]
    fn classes_absent_from_primary_are_untouched() {
        let mut engine = ConfirmationEngine::default();
        engine.set_counter(FIRE, 9);

        let report = engine.observe_validation(set(&[SMOKE]), set(&[SMOKE, FIRE]));

        assert_eq!(engine.counter(SMOKE), 1);
        assert_eq!(engine.counter(FIRE), 9);
        assert_eq!(report.changes.len(), 1);
        assert!(report.confirmed.contains(FIRE));
    }

    #[test]
    fn both_classes_can_be_confirmed_together() {
        let mut engine = ConfirmationEngine::default();
        for _ in 0..6 {
            engine.observe_validation(set(&[SMOKE, FIRE]), set(&[SMOKE, FIRE]));
        }
        let confirmed = engine.confirmed();
        assert_eq!(confirmed.iter().collect::<Vec<_>>(), vec![SMOKE, FIRE]);
    }
}
