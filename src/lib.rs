//! slidesync - Timecode-synchronized slideshow assembly
//!
//! An input archive holds numbered stills (`img/img<N>.jpg`), a narration
//! track (`audio.mp3` or `audio.wav`) and `timecodes.txt`. The library
//! validates the archive, reconciles the timecodes with the audio length and
//! drives ffmpeg to produce one video whose slide changes follow the
//! timecodes.
//!
//! The main entry points are:
//! - [`convert`]: convert an archive with the system tools
//! - [`Pipeline`]: the same conversion with substitutable collaborators

pub mod archive;
pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod ffi;
pub mod image_loader;
pub mod image_sequence;
pub mod plan;
pub mod reconcile;
pub mod timecode;
pub mod tools;

mod pipeline;

pub use archive::{ArchiveLayout, AudioSourceKind};
pub use error::{Error, ErrorKind, Result};
pub use image_sequence::{ImageFrame, ImageSequence};
pub use pipeline::{convert, Collaborators, Conversion, ConversionReport, Pipeline};
pub use plan::{AssemblyPlan, ClipDuration};
pub use reconcile::DurationSchedule;
pub use timecode::TimecodeSchedule;
pub use tools::CancelFlag;

use std::path::PathBuf;
use std::time::Duration;

/// Options for a conversion
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Output file path (defaults to `<archive base>.mp4` in the working directory)
    pub output_path: Option<PathBuf>,
    /// Path to ffmpeg executable
    pub ffmpeg_path: Option<PathBuf>,
    /// Path to lame executable
    pub lame_path: Option<PathBuf>,
    /// Number of clips encoded concurrently (1 encodes in frame order)
    pub jobs: usize,
    /// Upper bound on any single external tool invocation
    pub tool_timeout: Option<Duration>,
    /// Bitrate used when the narration has to be encoded to MP3
    pub audio_bitrate_kbps: u32,
    /// Validate and plan without encoding
    pub dry_run: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_path: None,
            ffmpeg_path: None,
            lame_path: None,
            jobs: 1,
            tool_timeout: None,
            audio_bitrate_kbps: plan::DEFAULT_AUDIO_BITRATE_KBPS,
            dry_run: false,
        }
    }
}

impl ConvertOptions {
    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(Error::InvalidInput("jobs must be at least 1".to_string()));
        }
        if self.audio_bitrate_kbps == 0 {
            return Err(Error::InvalidInput(
                "audio bitrate must be positive".to_string(),
            ));
        }
        if self.tool_timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidInput(
                "tool timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Check that ffmpeg (with libx264) and lame are available
pub fn available(ffmpeg_path: Option<&std::path::Path>, lame_path: Option<&std::path::Path>) -> Result<()> {
    tools::ffmpeg::check_available(ffmpeg_path)?;
    tools::lame::check_available(lame_path)
}
