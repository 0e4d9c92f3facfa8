//! Temporal confirmation of primary detections.
//!
//! Each monitored class owns a bounded hysteresis counter. Agreement between the primary and
//! secondary detectors pushes it up by one, a disagreeing validation pulls it down by two, a
//! frame with no detections at all decays it by three, and any non-wildfire detection resets it.
//! A class whose counter exceeds the threshold is confirmed for that frame.

pub mod class;
pub mod counter;
pub mod engine;

pub use class::{ClassSet, MonitoredClass};
pub use counter::{ClassCounter, CounterPolicy};
pub use engine::{ConfirmationEngine, CounterChange, EngineState, FrameReport};
