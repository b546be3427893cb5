//! Clip encoding, concatenation and muxing using ffmpeg external process

use super::{find_tool, run_tool, CancelFlag, ClipEncoder, StreamAssembler, ToolPath};
use crate::plan::{ClipJob, ConcatManifest, MuxJob};
use crate::{Error, Result};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

const TOOL: &str = "ffmpeg";
const CANDIDATES: &[&str] = &["ffmpeg", "/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg"];

/// FFmpeg-backed clip encoder and stream assembler
///
/// The executable is looked up on first use.
#[derive(Debug)]
pub struct FfmpegTools {
    ffmpeg: ToolPath,
    timeout: Option<Duration>,
}

impl FfmpegTools {
    pub fn new(ffmpeg_path: Option<&Path>, timeout: Option<Duration>) -> Self {
        Self {
            ffmpeg: ToolPath::new(TOOL, ffmpeg_path, CANDIDATES, "-version"),
            timeout,
        }
    }

    fn command(&self) -> Result<Command> {
        let mut command = Command::new(self.ffmpeg.get()?);
        command.args(["-nostdin", "-hide_banner", "-loglevel", "error", "-y"]);
        Ok(command)
    }

    fn run(&self, command: Command, cancel: &CancelFlag) -> Result<()> {
        run_tool(TOOL, command, self.timeout, cancel)
    }
}

impl ClipEncoder for FfmpegTools {
    fn encode_clip(&self, job: &ClipJob, cancel: &CancelFlag) -> Result<()> {
        let mut command = self.command()?;
        command
            .args(["-loop", "1", "-i"])
            .arg(&job.source_image)
            // libx264 with yuv420p needs even dimensions
            .args(["-vf", "scale=trunc(iw/2)*2:trunc(ih/2)*2"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-t"])
            .arg(job.clip_duration.to_string())
            .arg(&job.output);
        self.run(command, cancel)
    }
}

impl StreamAssembler for FfmpegTools {
    fn concat(&self, manifest: &ConcatManifest, cancel: &CancelFlag) -> Result<()> {
        let mut command = self.command()?;
        command
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(&manifest.list_path)
            .args(["-c", "copy"])
            .arg(&manifest.output);
        self.run(command, cancel)
    }

    fn mux(&self, job: &MuxJob, cancel: &CancelFlag) -> Result<()> {
        let mut command = self.command()?;
        command
            .arg("-i")
            .arg(&job.video)
            .arg("-i")
            .arg(&job.audio)
            .args(["-map", "0:v", "-map", "1:a", "-codec", "copy", "-shortest"])
            .arg(&job.output);
        self.run(command, cancel)
    }
}

/// Find ffmpeg executable
pub fn find_ffmpeg(custom_path: Option<&Path>) -> Result<String> {
    find_tool(TOOL, custom_path, CANDIDATES, "-version")
}

/// Check if ffmpeg with H.264 support is available
pub fn check_available(ffmpeg_path: Option<&Path>) -> Result<()> {
    let ffmpeg = find_ffmpeg(ffmpeg_path)?;

    // Check if ffmpeg has libx264 support
    let output = Command::new(&ffmpeg)
        .args(["-hide_banner", "-encoders"])
        .output()
        .map_err(|e| Error::external(TOOL, format!("failed to run: {}", e)))?;

    let encoders = String::from_utf8_lossy(&output.stdout);
    if encoders.contains("libx264") {
        Ok(())
    } else {
        Err(Error::ToolUnavailable(
            "FFmpeg does not have libx264 support".to_string(),
        ))
    }
}
