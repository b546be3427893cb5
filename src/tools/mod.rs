//! External collaborators: encoders, transcoders, probes and extraction

pub mod extract;
pub mod ffmpeg;
pub mod lame;
pub mod wav;

use crate::plan::{AudioEncodeJob, ClipJob, ConcatManifest, MuxJob};
use crate::{Error, Result};
use log::debug;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

pub use ffmpeg::FfmpegTools;
pub use lame::LameTranscoder;
pub use wav::WavDurationProbe;

/// How often a running tool is polled for exit, cancellation and timeout
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Shared flag requesting that running and queued work stop
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    own: Arc<AtomicBool>,
    ancestors: Vec<Arc<AtomicBool>>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag that is also raised whenever `self` is, but can be raised alone
    pub fn child(&self) -> Self {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(Arc::clone(&self.own));
        Self {
            own: Arc::new(AtomicBool::new(false)),
            ancestors,
        }
    }

    pub fn cancel(&self) {
        self.own.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.own.load(Ordering::SeqCst)
            || self.ancestors.iter().any(|a| a.load(Ordering::SeqCst))
    }
}

/// Clip-encode collaborator
pub trait ClipEncoder: Send + Sync {
    /// Produce `job.output` holding `job.source_image` for `job.clip_duration`
    fn encode_clip(&self, job: &ClipJob, cancel: &CancelFlag) -> Result<()>;
}

/// Concat/mux collaborator
pub trait StreamAssembler: Send + Sync {
    /// Concatenate the manifest's clips into `manifest.output`
    fn concat(&self, manifest: &ConcatManifest, cancel: &CancelFlag) -> Result<()>;

    /// Mux video and audio into `job.output`, trimmed to the shorter stream
    fn mux(&self, job: &MuxJob, cancel: &CancelFlag) -> Result<()>;
}

/// Audio transcode collaborator
pub trait AudioTranscoder: Send + Sync {
    /// Decode lossy audio at `lossy` into PCM at `pcm`
    fn decode_to_pcm(&self, lossy: &Path, pcm: &Path, cancel: &CancelFlag) -> Result<()>;

    /// Encode PCM audio into lossy audio
    fn encode_lossy(&self, job: &AudioEncodeJob, cancel: &CancelFlag) -> Result<()>;
}

/// Audio duration collaborator
pub trait AudioDurationProbe: Send + Sync {
    /// Exact playable duration of the PCM audio at `path`
    fn duration(&self, path: &Path) -> Result<Duration>;
}

/// Locate an executable, either at an explicit path or among `candidates`
pub(crate) fn find_tool(
    name: &str,
    custom_path: Option<&Path>,
    candidates: &[&str],
    version_arg: &str,
) -> Result<String> {
    if let Some(path) = custom_path {
        if path.exists() {
            return Ok(path.to_string_lossy().into_owned());
        }
        return Err(Error::ToolUnavailable(format!(
            "{} not found at: {}",
            name,
            path.display()
        )));
    }

    for path in candidates {
        if Command::new(path)
            .arg(version_arg)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
        {
            return Ok(path.to_string());
        }
    }

    Err(Error::ToolUnavailable(format!("{} not found in PATH", name)))
}

/// Executable location, resolved on first use
#[derive(Debug)]
pub(crate) struct ToolPath {
    name: &'static str,
    custom_path: Option<PathBuf>,
    candidates: &'static [&'static str],
    version_arg: &'static str,
    resolved: OnceLock<String>,
}

impl ToolPath {
    pub(crate) fn new(
        name: &'static str,
        custom_path: Option<&Path>,
        candidates: &'static [&'static str],
        version_arg: &'static str,
    ) -> Self {
        Self {
            name,
            custom_path: custom_path.map(Path::to_path_buf),
            candidates,
            version_arg,
            resolved: OnceLock::new(),
        }
    }

    pub(crate) fn get(&self) -> Result<&str> {
        if let Some(path) = self.resolved.get() {
            return Ok(path);
        }
        let path = find_tool(
            self.name,
            self.custom_path.as_deref(),
            self.candidates,
            self.version_arg,
        )?;
        Ok(self.resolved.get_or_init(|| path))
    }
}

/// Run a tool to completion
///
/// The process is killed when `cancel` is raised or `timeout` elapses. A
/// non-zero exit status becomes [`Error::ExternalTool`] carrying the last
/// line the tool wrote to stderr.
pub(crate) fn run_tool(
    tool: &str,
    mut command: Command,
    timeout: Option<Duration>,
    cancel: &CancelFlag,
) -> Result<()> {
    debug!("Running {:?}", command);

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::external(tool, format!("failed to start: {}", e)))?;

    let stderr = child.stderr.take();
    let reader = std::thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_string(&mut text);
        }
        text
    });

    let started = Instant::now();
    let status: ExitStatus = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Cancelled);
        }
        if timeout.is_some_and(|limit| started.elapsed() > limit) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::external(
                tool,
                format!("timed out after {:?}", started.elapsed()),
            ));
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let stderr = reader.join().unwrap_or_default();
    if status.success() {
        return Ok(());
    }

    let detail = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(|l| format!("{}: {}", status, l.trim()))
        .unwrap_or_else(|| status.to_string());
    Err(Error::external(tool, detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_child_flag() {
        let parent = CancelFlag::new();
        let child = parent.child();
        child.cancel();
        assert!(!parent.is_cancelled());

        let grandchild = parent.child().child();
        parent.cancel();
        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn test_find_tool_missing_custom_path() {
        let err = find_tool("ffmpeg", Some(Path::new("/nonexistent/ffmpeg")), &[], "-version")
            .unwrap_err();
        assert!(matches!(err, Error::ToolUnavailable(_)));
    }

    #[test]
    fn test_tool_path_resolves_lazily() {
        let tool = ToolPath::new("lame", Some(Path::new("/nonexistent/lame")), &[], "--version");
        assert!(tool.get().is_err());

        let temp_dir = tempfile::TempDir::new().unwrap();
        let fake = temp_dir.path().join("lame");
        std::fs::write(&fake, b"").unwrap();
        let tool = ToolPath::new("lame", Some(&fake), &[], "--version");
        assert_eq!(tool.get().unwrap(), fake.to_string_lossy());
    }

    #[test]
    fn test_run_tool_missing_binary() {
        let command = Command::new("/nonexistent/slidesync-tool");
        let err = run_tool("missing", command, None, &CancelFlag::new()).unwrap_err();
        assert!(matches!(err, Error::ExternalTool { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_tool_reports_stderr() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo first >&2; echo 'bad input' >&2; exit 3"]);
        let err = run_tool("sh", command, None, &CancelFlag::new()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bad input"), "{}", message);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_tool_cancelled() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut command = Command::new("sh");
        command.args(["-c", "sleep 5"]);
        let err = run_tool("sh", command, None, &cancel).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_tool_timeout() {
        let mut command = Command::new("sh");
        command.args(["-c", "sleep 5"]);
        let err = run_tool(
            "sh",
            command,
            Some(Duration::from_millis(100)),
            &CancelFlag::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
