//! Frame sources.
//!
//! The monitor polls a [`VideoSource`] once per loop iteration. [`FfmpegSource`] decodes files
//! and live streams (RTSP, HTTP, ...) through an `ffmpeg` child process.

pub mod ffmpeg;
pub mod tools;

use image::DynamicImage;

use crate::error::Result;

pub use ffmpeg::FfmpegSource;
pub use tools::ToolPaths;

/// A poll-based frame source. An `Err` from [`read`](Self::read) is a transient failure: the
/// caller backs off and polls again.
pub trait VideoSource: Send {
    fn read(&mut self) -> Result<DynamicImage>;
}
