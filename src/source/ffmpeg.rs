use image::{DynamicImage, RgbImage};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use tracing::{debug, info, warn};

use crate::error::{Result, WatchError};
use crate::source::VideoSource;
use crate::source::tools::ToolPaths;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Frame size of the first video stream, from `ffprobe -of json` output.
fn parse_probe(json: &str) -> Result<(u32, u32)> {
    let probe: ProbeOutput = serde_json::from_str(json)?;
    probe
        .streams
        .iter()
        .find_map(|s| match (s.width, s.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        })
        .ok_or_else(|| WatchError::SourceRead("no video stream with a frame size".to_string()))
}

/// Decodes a file or stream into RGB frames through an `ffmpeg` child process.
///
/// The child is killed and reaped on drop. A dead child (end of file, dropped connection) is
/// respawned on the next poll, so live streams reconnect and test videos replay.
pub struct FfmpegSource {
    input: String,
    tools: ToolPaths,
    realtime: bool,
    width: u32,
    height: u32,
    child: Option<(Child, ChildStdout)>,
    buffer: Vec<u8>,
}

impl FfmpegSource {
    /// Probe `input` and start decoding.
    ///
    /// `realtime` reads the input at its native frame rate (`-re`), for files standing in for a
    /// live stream. `tools` names the executables to run.
    ///
    /// # Errors
    /// `SourceOpen` when the input cannot be probed or ffmpeg cannot be started. This is a
    /// startup failure and is not retried.
    pub fn open(input: impl Into<String>, realtime: bool, tools: ToolPaths) -> Result<Self> {
        let input = input.into();
        let (width, height) = probe_size(&tools.ffprobe, &input).map_err(|e| WatchError::SourceOpen {
            input: input.clone(),
            message: e.to_string(),
        })?;
        info!(%input, width, height, "Opened video source");

        let mut source = Self {
            input,
            tools,
            realtime,
            width,
            height,
            child: None,
            buffer: vec![0; width as usize * height as usize * 3],
        };
        source.spawn().map_err(|e| WatchError::SourceOpen {
            input: source.input.clone(),
            message: e.to_string(),
        })?;
        Ok(source)
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn spawn(&mut self) -> Result<()> {
        let mut cmd = Command::new(&self.tools.ffmpeg);
        cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin"]);
        if self.realtime {
            cmd.arg("-re");
        }
        cmd.args(["-i", self.input.as_str()]);
        cmd.args(["-an", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"]);
        cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::null());

        let mut child = cmd.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| WatchError::SourceRead("ffmpeg stdout not captured".to_string()))?;
        debug!(pid = child.id(), input = %self.input, "Spawned ffmpeg decoder");
        self.child = Some((child, stdout));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some((mut child, _stdout)) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl VideoSource for FfmpegSource {
    fn read(&mut self) -> Result<DynamicImage> {
        if self.child.is_none() {
            warn!(input = %self.input, "Restarting video decoder");
            self.spawn()?;
        }
        let Some((_, stdout)) = self.child.as_mut() else {
            return Err(WatchError::SourceRead("decoder not running".to_string()));
        };

        if let Err(e) = stdout.read_exact(&mut self.buffer) {
            self.stop();
            return Err(WatchError::SourceRead(e.to_string()));
        }

        RgbImage::from_raw(self.width, self.height, self.buffer.clone())
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| WatchError::SourceRead("short frame".to_string()))
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.stop();
        debug!(input = %self.input, "Released video source");
    }
}

fn probe_size(ffprobe: &Path, input: &str) -> Result<(u32, u32)> {
    let output = Command::new(ffprobe)
        .args([
            "-v", "error",
            "-select_streams", "v:0",
            "-show_entries", "stream=width,height",
            "-of", "json",
            input,
        ])
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(WatchError::SourceRead(format!("ffprobe failed: {}", stderr.trim())));
    }
    parse_probe(&String::from_utf8_lossy(&output.stdout))
}
