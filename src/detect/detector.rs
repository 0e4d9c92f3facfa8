use image::{DynamicImage, GenericImageView};
use ort::session::Session;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

use crate::config::{DEFAULT_INPUT_HEIGHT, DEFAULT_INPUT_WIDTH, ModelConfig};
use crate::detect::bounds::Detection;
use crate::detect::infer::run_inference;
use crate::detect::model::load_model;
use crate::detect::posts::decode_detections;
use crate::detect::prevs::{image_to_tensor, resize_image};
use crate::error::Result;

/// Per-call detection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectParams {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// Square inference size. `None` runs at the model's native input size.
    pub img_size: Option<u32>,
}

impl DetectParams {
    pub fn new(confidence_threshold: f32, iou_threshold: f32) -> Self {
        Self {
            confidence_threshold,
            iou_threshold,
            img_size: None,
        }
    }

    pub fn with_img_size(mut self, img_size: u32) -> Self {
        self.img_size = Some(img_size);
        self
    }
}

/// Anything that classifies a frame into detections.
///
/// Implementations must be deterministic for a given frame and parameters so a primary hit
/// can be re-validated.
pub trait Detector: Send {
    fn detect(&mut self, frame: &DynamicImage, params: &DetectParams) -> Result<Vec<Detection>>;
}

/// YOLO detector backed by an ONNX Runtime session.
pub struct YoloDetector {
    model: Session,
    classes: Vec<String>,
    input_width: usize,
    input_height: usize,
}

impl YoloDetector {
    /// Wrap an already loaded session.
    pub fn new(model: Session, classes: Vec<String>) -> Self {
        Self {
            model,
            classes,
            input_width: DEFAULT_INPUT_WIDTH,
            input_height: DEFAULT_INPUT_HEIGHT,
        }
    }

    pub fn from_file(path: impl AsRef<Path>, classes: Vec<String>) -> Result<Self> {
        Ok(Self::new(load_model(path)?, classes))
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        Self::from_file(&config.path, config.classes.clone())
    }

    /// Native input size used when the caller passes no `img_size`.
    pub fn with_input_size(mut self, width: usize, height: usize) -> Self {
        self.input_width = width;
        self.input_height = height;
        self
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl Detector for YoloDetector {
    fn detect(&mut self, frame: &DynamicImage, params: &DetectParams) -> Result<Vec<Detection>> {
        let (input_width, input_height) = match params.img_size {
            Some(size) => (size as usize, size as usize),
            None => (self.input_width, self.input_height),
        };
        let (frame_width, frame_height) = frame.dimensions();

        let resized = resize_image(frame, input_width as u32, input_height as u32);
        let tensor = image_to_tensor(&resized, input_height, input_width);

        let start = Instant::now();
        let output = run_inference(&mut self.model, &tensor)?;
        debug!(elapsed = ?start.elapsed(), candidates = output.nrows(), "inference finished");

        Ok(decode_detections(
            &output,
            (frame_width as f32, frame_height as f32),
            (input_width, input_height),
            &self.classes,
            params.confidence_threshold,
            params.iou_threshold,
        ))
    }
}
