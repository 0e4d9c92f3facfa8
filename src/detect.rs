//! Detection module - YOLO inference over ONNX Runtime.
//!
//! Turns a frame into a list of classified detections. The monitor only sees the
//! [`Detector`] trait; [`YoloDetector`] is the production implementation used for both the
//! primary (fast) and secondary (validation) models.
//!
//! # Workflow
//!
//! 1. [`load_model`] opens the ONNX export
//! 2. [`resize_image`] and [`image_to_tensor`] build the NCHW input
//! 3. [`run_inference`] executes the session and lays candidates out one per row
//! 4. [`decode_detections`] filters by confidence, rescales boxes and applies NMS
//!
//! # Example
//!
//! ```no_run
//! use emberwatch::detect::{DetectParams, Detector, YoloDetector};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut detector = YoloDetector::from_file("model/yolos.onnx", vec!["smoke".into(), "fire".into()])?;
//! let frame = image::open("frame.jpg")?;
//! let params = DetectParams::new(0.25, 0.45).with_img_size(640);
//! let detections = detector.detect(&frame, &params)?;
//! # Ok(())
//! # }
//! ```

pub mod bounds;
pub mod detector;
pub mod infer;
pub mod model;
pub mod posts;
pub mod prevs;

pub use bounds::{BoundingBox, Detection};
pub use detector::{DetectParams, Detector, YoloDetector};
pub use infer::run_inference;
pub use model::load_model;
pub use posts::{apply_nms, decode_detections};
pub use prevs::{image_to_tensor, resize_image};
