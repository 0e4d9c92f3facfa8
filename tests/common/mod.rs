#![allow(dead_code)]

use emberwatch::alert::{AlertDispatcher, AlertMessage, Notifier};
use emberwatch::confirm::CounterPolicy;
use emberwatch::detect::{BoundingBox, DetectParams, Detection, Detector};
use emberwatch::monitor::{Monitor, MonitorSettings};
use emberwatch::source::VideoSource;
use emberwatch::utils::ManualClock;
use emberwatch::{Result, WatchError};
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn det(label: &str, confidence: f32, bbox: (f32, f32, f32, f32)) -> Detection {
    Detection::new(BoundingBox::new(bbox.0, bbox.1, bbox.2, bbox.3), 0, label, confidence)
}

pub fn smoke() -> Detection {
    det("Smoke", 0.82, (10.0, 12.0, 60.0, 48.0))
}

pub fn fire() -> Detection {
    det("Fire", 0.77, (70.0, 40.0, 110.0, 80.0))
}

pub fn frame() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(160, 120, Rgb([30, 60, 30])))
}

/// Replays one output per call; returns nothing once exhausted. Counts calls.
#[derive(Clone)]
pub struct ScriptedDetector {
    outputs: Arc<Mutex<VecDeque<Result<Vec<Detection>>>>>,
    calls: Arc<Mutex<usize>>,
}

impl ScriptedDetector {
    pub fn new(outputs: Vec<Vec<Detection>>) -> Self {
        Self::with_results(outputs.into_iter().map(Ok).collect())
    }

    pub fn with_results(outputs: Vec<Result<Vec<Detection>>>) -> Self {
        Self {
            outputs: Arc::new(Mutex::new(outputs.into())),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, _frame: &DynamicImage, _params: &DetectParams) -> Result<Vec<Detection>> {
        *self.calls.lock().unwrap() += 1;
        self.outputs.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Source yielding scripted reads, each one `spacing` apart on the manual clock.
/// Sets `shutdown` once the script is exhausted.
pub struct ScriptedSource {
    reads: VecDeque<bool>,
    clock: Arc<ManualClock>,
    spacing: Duration,
    shutdown: Arc<AtomicBool>,
}

impl ScriptedSource {
    /// `true` is a good frame, `false` a read failure.
    pub fn new(reads: Vec<bool>, clock: Arc<ManualClock>, spacing: Duration, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            reads: reads.into(),
            clock,
            spacing,
            shutdown,
        }
    }
}

impl VideoSource for ScriptedSource {
    fn read(&mut self) -> Result<DynamicImage> {
        self.clock.advance(self.spacing);
        let next = self.reads.pop_front();
        if self.reads.is_empty() {
            self.shutdown.store(true, Ordering::Relaxed);
        }
        match next {
            Some(true) => Ok(frame()),
            _ => Err(WatchError::SourceRead("scripted failure".to_string())),
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<AlertMessage>>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<AlertMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, message: &AlertMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            Err(WatchError::notify("smtp relay unreachable"))
        } else {
            Ok(())
        }
    }
}

pub fn settings(cooldown: Duration) -> MonitorSettings {
    let params = DetectParams::new(0.25, 0.45);
    MonitorSettings {
        frame_interval: Duration::from_millis(200),
        primary_params: params.with_img_size(640),
        secondary_params: params,
        policy: CounterPolicy::default(),
        alert_cooldown: cooldown,
    }
}

pub struct Harness {
    pub monitor: Monitor,
    pub primary: ScriptedDetector,
    pub secondary: ScriptedDetector,
    pub notifier: RecordingNotifier,
    pub clock: Arc<ManualClock>,
    pub shutdown: Arc<AtomicBool>,
}

pub fn harness(
    dir: &Path,
    primary: ScriptedDetector,
    secondary: ScriptedDetector,
    notifier: RecordingNotifier,
    reads: Vec<bool>,
    cooldown: Duration,
) -> Harness {
    let clock = Arc::new(ManualClock::new());
    let shutdown = Arc::new(AtomicBool::new(false));
    let source = ScriptedSource::new(reads, clock.clone(), Duration::from_millis(100), shutdown.clone());
    let dispatcher = AlertDispatcher::new(dir).with_notifier(Box::new(notifier.clone()));
    let monitor = Monitor::new(
        Box::new(source),
        Box::new(primary.clone()),
        Box::new(secondary.clone()),
        dispatcher,
        settings(cooldown),
        clock.clone(),
    );
    Harness {
        monitor,
        primary,
        secondary,
        notifier,
        clock,
        shutdown,
    }
}
