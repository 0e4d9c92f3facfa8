//! Locating the `ffmpeg` and `ffprobe` executables.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::Config;

pub const FFMPEG_ENV: &str = "EMBERWATCH_FFMPEG";
pub const FFPROBE_ENV: &str = "EMBERWATCH_FFPROBE";

/// Decoder executables used by [`FfmpegSource`](crate::source::FfmpegSource).
///
/// Each tool resolves from the config (`ffmpeg_path` / `ffprobe_path`), then the
/// `EMBERWATCH_FFMPEG` / `EMBERWATCH_FFPROBE` environment variables, then the bare name
/// looked up on `PATH`. Paths are not checked here; a wrong one fails when the source opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl ToolPaths {
    pub fn resolve(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> Self {
        Self {
            ffmpeg: locate(ffmpeg, env::var_os(FFMPEG_ENV), "ffmpeg"),
            ffprobe: locate(ffprobe, env::var_os(FFPROBE_ENV), "ffprobe"),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::resolve(config.ffmpeg_path.as_deref(), config.ffprobe_path.as_deref())
    }
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self::resolve(None, None)
    }
}

fn locate(configured: Option<&Path>, from_env: Option<OsString>, name: &str) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .or_else(|| from_env.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(name))
}
