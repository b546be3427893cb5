//! MP3 decoding and encoding using lame external process

use super::{find_tool, run_tool, AudioTranscoder, CancelFlag, ToolPath};
use crate::plan::AudioEncodeJob;
use crate::Result;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

const TOOL: &str = "lame";
const CANDIDATES: &[&str] = &["lame", "/usr/bin/lame", "/usr/local/bin/lame"];

/// Lame-backed audio transcoder
///
/// The executable is looked up on first use.
#[derive(Debug)]
pub struct LameTranscoder {
    lame: ToolPath,
    timeout: Option<Duration>,
}

impl LameTranscoder {
    pub fn new(lame_path: Option<&Path>, timeout: Option<Duration>) -> Self {
        Self {
            lame: ToolPath::new(TOOL, lame_path, CANDIDATES, "--version"),
            timeout,
        }
    }

    fn command(&self) -> Result<Command> {
        let mut command = Command::new(self.lame.get()?);
        command.arg("--quiet");
        Ok(command)
    }
}

impl AudioTranscoder for LameTranscoder {
    fn decode_to_pcm(&self, lossy: &Path, pcm: &Path, cancel: &CancelFlag) -> Result<()> {
        let mut command = self.command()?;
        command.arg("--decode").arg(lossy).arg(pcm);
        run_tool(TOOL, command, self.timeout, cancel)
    }

    fn encode_lossy(&self, job: &AudioEncodeJob, cancel: &CancelFlag) -> Result<()> {
        let mut command = self.command()?;
        command
            .arg("-b")
            .arg(job.bitrate_kbps.to_string())
            .arg(&job.pcm)
            .arg(&job.lossy);
        run_tool(TOOL, command, self.timeout, cancel)
    }
}

/// Find lame executable
pub fn find_lame(custom_path: Option<&Path>) -> Result<String> {
    find_tool(TOOL, custom_path, CANDIDATES, "--version")
}

/// Check if lame is available
pub fn check_available(lame_path: Option<&Path>) -> Result<()> {
    find_lame(lame_path).map(|_| ())
}
