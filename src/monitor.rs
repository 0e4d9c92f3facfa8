//! The frame loop: throttle, primary detection, confirmation, validation and alerting.
//!
//! One frame is processed completely before the next is read. There is a single consumer,
//! so counters and gate state change strictly in frame-arrival order.

pub mod status;

use image::DynamicImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::alert::{AlertDispatcher, AlertGate, DispatchReport, SmtpNotifier, load_font};
use crate::config::{Config, SourceSelection};
use crate::confirm::{ClassSet, ConfirmationEngine, CounterChange, CounterPolicy, FrameReport};
use crate::detect::{DetectParams, Detection, Detector, YoloDetector};
use crate::error::Result;
use crate::source::{FfmpegSource, ToolPaths, VideoSource};
use crate::utils::{Clock, FrameThrottle, SystemClock};

pub use status::ValidationStatus;

/// Backoff after a failed read.
pub const READ_RETRY_DELAY: Duration = Duration::from_secs(1);
/// Pause after a frame the throttle dropped.
pub const THROTTLE_POLL_DELAY: Duration = Duration::from_millis(1);

/// Loop parameters derived from the config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSettings {
    pub frame_interval: Duration,
    pub primary_params: DetectParams,
    pub secondary_params: DetectParams,
    pub policy: CounterPolicy,
    pub alert_cooldown: Duration,
}

impl MonitorSettings {
    /// Derive loop parameters from a validated config. The primary detector runs at
    /// `img_size`; the secondary one at its native input size.
    pub fn from_config(config: &Config) -> Self {
        let params = DetectParams::new(config.confidence_threshold, config.iou_threshold);
        Self {
            frame_interval: config.frame_interval(),
            primary_params: params.with_img_size(config.img_size),
            secondary_params: params,
            policy: CounterPolicy::new(config.counter_threshold, config.counter_max),
            alert_cooldown: config.alert_cooldown(),
        }
    }
}

/// Result of processing one admitted frame.
#[derive(Debug, Clone)]
pub struct FrameSummary {
    pub report: FrameReport,
    /// Set when this frame produced an alert.
    pub dispatch: Option<DispatchReport>,
}

/// Counters kept across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub frames_read: u64,
    pub frames_admitted: u64,
    pub read_failures: u64,
    pub frame_errors: u64,
    pub alerts: u64,
}

/// Single-consumer frame loop tying source, detectors, engine, gate and dispatcher together.
///
/// Build it with [`from_config`](Self::from_config) for production, or [`new`](Self::new) with
/// any [`VideoSource`], [`Detector`] and [`Clock`] implementations.
pub struct Monitor {
    source: Box<dyn VideoSource>,
    primary: Box<dyn Detector>,
    secondary: Box<dyn Detector>,
    settings: MonitorSettings,
    engine: ConfirmationEngine,
    gate: AlertGate,
    dispatcher: AlertDispatcher,
    status: ValidationStatus,
    throttle: FrameThrottle,
    clock: Arc<dyn Clock>,
}

impl Monitor {
    /// Assemble a monitor from its parts. Counters start at zero and the gate has never alerted.
    pub fn new(
        source: Box<dyn VideoSource>,
        primary: Box<dyn Detector>,
        secondary: Box<dyn Detector>,
        dispatcher: AlertDispatcher,
        settings: MonitorSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            primary,
            secondary,
            engine: ConfirmationEngine::new(settings.policy),
            gate: AlertGate::new(settings.alert_cooldown),
            dispatcher,
            status: ValidationStatus::default(),
            throttle: FrameThrottle::new(settings.frame_interval),
            settings,
            clock,
        }
    }

    /// Build the production monitor: models, notifier, font and video source.
    ///
    /// Every failure here is fatal for startup.
    pub fn from_config(config: &Config) -> Result<Self> {
        let primary = YoloDetector::from_config(&config.models.primary)?;
        info!(path = %config.models.primary.path.display(), "Loaded primary model");
        let secondary = YoloDetector::from_config(&config.models.secondary)?;
        info!(path = %config.models.secondary.path.display(), "Loaded secondary model");

        let mut dispatcher = AlertDispatcher::new(&config.output_dir);
        if let Some(email) = &config.email {
            dispatcher = dispatcher.with_notifier(Box::new(SmtpNotifier::from_config(email)?));
        } else {
            warn!("No `email` block configured; alerts will only be saved and logged");
        }
        if let Some(path) = &config.annotation_font {
            dispatcher = dispatcher.with_font(load_font(path)?);
            info!(path = %path.display(), "Using configured caption font");
        }

        // opened last so nothing above can leave a decoder running
        let tools = ToolPaths::from_config(config);
        let source = match config.source() {
            SourceSelection::TestVideo(path) => {
                info!(path = %path.display(), "Using test video");
                FfmpegSource::open(path.to_string_lossy(), true, tools)?
            }
            SourceSelection::Stream(url) => FfmpegSource::open(url, false, tools)?,
        };

        Ok(Self::new(
            Box::new(source),
            Box::new(primary),
            Box::new(secondary),
            dispatcher,
            MonitorSettings::from_config(config),
            Arc::new(SystemClock),
        ))
    }

    /// Counter state, for inspection.
    pub fn engine(&self) -> &ConfirmationEngine {
        &self.engine
    }

    pub fn gate(&self) -> &AlertGate {
        &self.gate
    }

    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    /// Poll the source until `shutdown` is set.
    ///
    /// Read failures back off for [`READ_RETRY_DELAY`] and never touch the counters. Frames that
    /// arrive faster than the target rate are dropped. Per-frame errors are logged and skipped.
    pub fn run(&mut self, shutdown: &AtomicBool) -> RunStats {
        let mut stats = RunStats::default();
        info!(interval = ?self.settings.frame_interval, "Watching for smoke and fire");

        while !shutdown.load(Ordering::Relaxed) {
            let frame = match self.source.read() {
                Ok(frame) => frame,
                Err(e) => {
                    stats.read_failures += 1;
                    warn!(error = %e, "Stream read failure.");
                    self.clock.sleep(READ_RETRY_DELAY);
                    continue;
                }
            };
            stats.frames_read += 1;

            let now = self.clock.now();
            if !self.throttle.admit(now) {
                self.clock.sleep(THROTTLE_POLL_DELAY);
                continue;
            }
            stats.frames_admitted += 1;

            match self.process_frame(&frame, now) {
                Ok(summary) => {
                    if summary.dispatch.is_some() {
                        stats.alerts += 1;
                    }
                }
                Err(e) => {
                    stats.frame_errors += 1;
                    warn!(error = %e, "Skipping frame");
                }
            }
        }

        info!(?stats, "Monitor stopped");
        stats
    }

    /// Run one admitted frame through detection, confirmation and alerting.
    ///
    /// The secondary detector is consulted only when the primary one reports smoke or fire.
    /// An alert goes out when a class is confirmed on such a frame and the gate permits it.
    ///
    /// # Arguments
    /// * `frame` - the admitted frame
    /// * `now` - monotonic time the frame was admitted at, used by the gate
    ///
    /// # Returns
    /// The engine's report for the frame and, if one was sent, the dispatch.
    ///
    /// # Errors
    /// A detector failure. Counters, gate and validation status are left untouched in that case.
    pub fn process_frame(&mut self, frame: &DynamicImage, now: Instant) -> Result<FrameSummary> {
        let primary = self.primary.detect(frame, &self.settings.primary_params)?;

        if primary.is_empty() {
            self.status.clear();
            return Ok(FrameSummary {
                report: self.engine.observe_quiet(),
                dispatch: None,
            });
        }

        let primary_classes = ClassSet::from_detections(&primary);
        if primary_classes.is_empty() {
            info!("Detections found, but no smoke or fire.");
            self.status.clear();
            return Ok(FrameSummary {
                report: self.engine.observe_unmonitored(),
                dispatch: None,
            });
        }

        let secondary = self.secondary.detect(frame, &self.settings.secondary_params)?;
        if self.status.begin() {
            info!("Potential wildfire detected. Running validation tests...");
        }
        let report = self
            .engine
            .observe_validation(primary_classes, ClassSet::from_detections(&secondary));
        self.log_changes(&report);

        let dispatch = if !report.confirmed.is_empty() && self.gate.try_acquire(now) {
            self.dispatch(frame, &secondary, &report)
        } else {
            None
        };

        Ok(FrameSummary { report, dispatch })
    }

    fn dispatch(&mut self, frame: &DynamicImage, secondary: &[Detection], report: &FrameReport) -> Option<DispatchReport> {
        let levels: Vec<_> = report
            .confirmed
            .iter()
            .map(|class| (class, self.engine.counter(class)))
            .collect();
        info!(?levels, "Wildfire confirmed; dispatching alert");

        let result = self
            .dispatcher
            .dispatch(frame, secondary, report.confirmed, &levels, self.clock.wall());
        self.status.clear();
        match result {
            Ok(dispatch) => Some(dispatch),
            Err(e) => {
                error!(error = %e, "Failed to persist alert frame");
                None
            }
        }
    }

    fn log_changes(&self, report: &FrameReport) {
        let max = self.engine.policy().max;
        for change in &report.changes {
            if let CounterChange::Penalized { class, value, failures_to_suppress } = change {
                warn!(
                    "Secondary validation for '{class}' returned negative; possible false positive from the primary model. \
                     Current {} danger level: {value}/{max}. Requires {failures_to_suppress} more failed validations to fully suppress the alert.",
                    class.as_str().to_lowercase()
                );
            }
        }
    }
}
