use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, WatchError};

pub const DEFAULT_TARGET_FPS: f64 = 5.0;
pub const DEFAULT_COUNTER_THRESHOLD: u8 = 5;
pub const DEFAULT_COUNTER_MAX: u8 = 20;
pub const DEFAULT_OUTPUT_DIR: &str = "detections";
pub const DEFAULT_TEST_VIDEO_DIR: &str = "testvideo";
/// Slowest accepted frame pace, i.e. the lowest `target_fps` is one frame per hour.
pub const MAX_FRAME_INTERVAL: Duration = Duration::from_secs(3600);

// Detector defaults
pub const DEFAULT_INPUT_WIDTH: usize = 640;
pub const DEFAULT_INPUT_HEIGHT: usize = 640;
pub const MODEL_INPUT_NAME: &str = "images";

/// Session configuration, loaded once from YAML and never mutated.
///
/// Every block denies unknown keys so a typo fails startup instead of silently
/// falling back to a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub stream_url: Option<String>,
    /// Test fixture name, resolved under `test_video_dir`. Takes precedence over `stream_url`.
    #[serde(default)]
    pub test_video: Option<String>,
    #[serde(default = "default_test_video_dir")]
    pub test_video_dir: PathBuf,

    /// Decoder executables; unset means environment override or `PATH`.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    #[serde(default = "default_target_fps")]
    pub target_fps: f64,
    pub img_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub alert_cooldown_seconds: u64,

    #[serde(default = "default_counter_threshold")]
    pub counter_threshold: u8,
    #[serde(default = "default_counter_max")]
    pub counter_max: u8,

    pub models: ModelsConfig,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// TTF/OTF font for box captions, replacing the bundled DejaVu Sans Mono.
    #[serde(default)]
    pub annotation_font: Option<PathBuf>,

    #[serde(default)]
    pub email: Option<EmailConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelsConfig {
    pub primary: ModelConfig,
    pub secondary: ModelConfig,
}

/// One ONNX export plus the class names in output order.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub classes: Vec<String>,
}

/// Notification destination. The password never appears here, only the name of the
/// environment variable holding it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender: String,
    pub recipient: String,
    pub password_env: String,
}

/// Where frames come from, after precedence has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    TestVideo(PathBuf),
    Stream(String),
}

fn default_test_video_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TEST_VIDEO_DIR)
}

fn default_target_fps() -> f64 {
    DEFAULT_TARGET_FPS
}

fn default_counter_threshold() -> u8 {
    DEFAULT_COUNTER_THRESHOLD
}

fn default_counter_max() -> u8 {
    DEFAULT_COUNTER_MAX
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

impl Config {
    /// Read and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WatchError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.test_video.is_none() && self.stream_url.is_none() {
            return Err(WatchError::config(
                "one of `stream_url` or `test_video` is required",
            ));
        }
        frame_interval_for(self.target_fps)?;
        if self.img_size == 0 || self.img_size % 32 != 0 {
            return Err(WatchError::config(format!(
                "`img_size` must be a positive multiple of 32, got {}",
                self.img_size
            )));
        }
        check_unit("confidence_threshold", self.confidence_threshold)?;
        check_unit("iou_threshold", self.iou_threshold)?;
        if self.counter_threshold >= self.counter_max {
            return Err(WatchError::config(format!(
                "`counter_threshold` ({}) must be below `counter_max` ({})",
                self.counter_threshold, self.counter_max
            )));
        }
        for (name, model) in [("primary", &self.models.primary), ("secondary", &self.models.secondary)] {
            if model.classes.is_empty() {
                return Err(WatchError::config(format!(
                    "`models.{name}.classes` must list the model's class names"
                )));
            }
        }
        Ok(())
    }

    /// Apply source precedence: a configured test video wins over the live stream.
    pub fn source(&self) -> SourceSelection {
        match (&self.test_video, &self.stream_url) {
            (Some(name), _) => {
                let name = Path::new(name);
                if name.is_absolute() {
                    SourceSelection::TestVideo(name.to_path_buf())
                } else {
                    SourceSelection::TestVideo(self.test_video_dir.join(name))
                }
            }
            (None, Some(url)) => SourceSelection::Stream(url.clone()),
            // validate() rules this out; treat an empty stream url as unopenable
            (None, None) => SourceSelection::Stream(String::new()),
        }
    }

    /// Minimum spacing between admitted frames. Falls back to [`MAX_FRAME_INTERVAL`] for a
    /// config that skipped [`validate`](Self::validate).
    pub fn frame_interval(&self) -> Duration {
        frame_interval_for(self.target_fps).unwrap_or(MAX_FRAME_INTERVAL)
    }

    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_secs(self.alert_cooldown_seconds)
    }
}

/// Convert a frame rate into the interval between admitted frames.
///
/// # Errors
/// A config error for a rate that is not finite and positive, or one slower than
/// [`MAX_FRAME_INTERVAL`].
pub fn frame_interval_for(target_fps: f64) -> Result<Duration> {
    if !target_fps.is_finite() || target_fps <= 0.0 {
        return Err(WatchError::config(format!(
            "`target_fps` must be positive, got {target_fps}"
        )));
    }
    match Duration::try_from_secs_f64(1.0 / target_fps) {
        Ok(interval) if interval <= MAX_FRAME_INTERVAL => Ok(interval),
        _ => Err(WatchError::config(format!(
            "`target_fps` {target_fps} is slower than one frame per {}s",
            MAX_FRAME_INTERVAL.as_secs()
        ))),
    }
}

fn check_unit(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(WatchError::config(format!("`{name}` must be within [0, 1], got {value}")))
    }
}
