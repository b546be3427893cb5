//! Video assembly planning
//!
//! The plan is a deterministic description of the encoder work: one clip per
//! frame, a concatenation manifest in frame-index order, an optional audio
//! encode and the final mux.

use crate::image_sequence::ImageSequence;
use crate::reconcile::DurationSchedule;
use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default bitrate for re-encoded lossy audio, in kbps
pub const DEFAULT_AUDIO_BITRATE_KBPS: u32 = 192;

const HOUR: Duration = Duration::from_secs(3600);
const MINUTE: Duration = Duration::from_secs(60);
const SECOND: Duration = Duration::from_secs(1);
const MILLISECOND: Duration = Duration::from_millis(1);

/// Clip duration split into clock components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipDuration {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub millis: u64,
}

impl ClipDuration {
    /// Decompose by successive division, truncating below one millisecond
    pub fn from_duration(duration: Duration) -> Self {
        let (hours, rest) = div_rem(duration, HOUR);
        let (minutes, rest) = div_rem(rest, MINUTE);
        let (seconds, rest) = div_rem(rest, SECOND);
        let (millis, _) = div_rem(rest, MILLISECOND);
        Self {
            hours,
            minutes,
            seconds,
            millis,
        }
    }

    /// Recombine the components
    pub fn to_duration(self) -> Duration {
        Duration::from_secs(self.hours * 3600 + self.minutes * 60 + self.seconds)
            + Duration::from_millis(self.millis)
    }
}

fn div_rem(value: Duration, unit: Duration) -> (u64, Duration) {
    let (value, unit) = (value.as_nanos(), unit.as_nanos());
    let rest = Duration::from_nanos((value % unit) as u64);
    ((value / unit) as u64, rest)
}

impl fmt::Display for ClipDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:03}",
            self.hours, self.minutes, self.seconds, self.millis
        )
    }
}

/// Encode one still image into a fixed-duration clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipJob {
    pub frame_index: usize,
    pub source_image: PathBuf,
    pub clip_duration: ClipDuration,
    pub output: PathBuf,
}

/// Ordered list of clips to concatenate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatManifest {
    /// Clip paths in ascending frame-index order
    pub clips: Vec<PathBuf>,
    /// Where the manifest file is written
    pub list_path: PathBuf,
    /// Concatenated video output
    pub output: PathBuf,
}

impl ConcatManifest {
    /// Render in ffmpeg concat demuxer syntax
    pub fn render(&self) -> String {
        let mut out = String::new();
        for clip in &self.clips {
            let path = clip.to_string_lossy().replace('\'', r"'\''");
            out.push_str(&format!("file '{}'\n", path));
        }
        out
    }

    /// Write the rendered manifest to `list_path`
    pub fn write(&self) -> Result<()> {
        std::fs::write(&self.list_path, self.render())?;
        Ok(())
    }
}

/// Encode PCM audio to lossy audio for muxing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEncodeJob {
    pub pcm: PathBuf,
    pub lossy: PathBuf,
    pub bitrate_kbps: u32,
}

/// Combine the concatenated video with the audio, trimmed to the shorter stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxJob {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
}

/// Complete encoder work list for one conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyPlan {
    /// Clip jobs in ascending frame-index order
    pub clips: Vec<ClipJob>,
    pub manifest: ConcatManifest,
    pub audio_encode: Option<AudioEncodeJob>,
    pub mux: MuxJob,
}

/// Filesystem locations the plan refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanLayout {
    /// Directory receiving clips, the manifest and the concatenated video
    pub clip_dir: PathBuf,
    /// PCM audio track
    pub pcm_audio: PathBuf,
    /// Lossy audio track used for muxing
    pub lossy_audio: PathBuf,
    /// Whether the lossy track must be produced from the PCM one
    pub encode_lossy_audio: bool,
    pub audio_bitrate_kbps: u32,
    /// Final muxed output
    pub output: PathBuf,
}

/// Clip file name for a frame, padded like the source images
pub fn clip_file_name(index: usize, digit_width: usize) -> String {
    format!("vid{:0width$}.mp4", index, width = digit_width)
}

/// Build the assembly plan
pub fn plan_assembly(
    sequence: &ImageSequence,
    schedule: &DurationSchedule,
    layout: &PlanLayout,
) -> Result<AssemblyPlan> {
    if schedule.len() != sequence.len() {
        return Err(Error::FrameTimecodeCountMismatch {
            timecodes: schedule.len().saturating_sub(1),
            images: sequence.len(),
        });
    }

    let clips: Vec<ClipJob> = sequence
        .frames
        .iter()
        .zip(schedule.as_slice())
        .map(|(frame, duration)| ClipJob {
            frame_index: frame.index,
            source_image: sequence.frame_path(frame),
            clip_duration: ClipDuration::from_duration(*duration),
            output: layout
                .clip_dir
                .join(clip_file_name(frame.index, sequence.digit_width)),
        })
        .collect();

    let manifest = ConcatManifest {
        clips: clips.iter().map(|c| c.output.clone()).collect(),
        list_path: layout.clip_dir.join("list.txt"),
        output: layout.clip_dir.join("vid.mp4"),
    };

    let audio_encode = layout.encode_lossy_audio.then(|| AudioEncodeJob {
        pcm: layout.pcm_audio.clone(),
        lossy: layout.lossy_audio.clone(),
        bitrate_kbps: layout.audio_bitrate_kbps,
    });

    let mux = MuxJob {
        video: manifest.output.clone(),
        audio: layout.lossy_audio.clone(),
        output: layout.output.clone(),
    };

    Ok(AssemblyPlan {
        clips,
        manifest,
        audio_encode,
        mux,
    })
}

impl AssemblyPlan {
    /// Directories that must exist before the plan runs
    pub fn work_dirs(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = self
            .manifest
            .list_path
            .parent()
            .into_iter()
            .collect();
        if let Some(parent) = self.mux.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            dirs.push(parent);
        }
        dirs
    }
}

impl fmt::Display for AssemblyPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for clip in &self.clips {
            writeln!(
                f,
                "clip {:>4}  {}  {} -> {}",
                clip.frame_index,
                clip.clip_duration,
                clip.source_image.display(),
                clip.output.display()
            )?;
        }
        writeln!(
            f,
            "concat {} clips -> {}",
            self.manifest.clips.len(),
            self.manifest.output.display()
        )?;
        if let Some(job) = &self.audio_encode {
            writeln!(
                f,
                "audio  {} -> {} @ {} kbps",
                job.pcm.display(),
                job.lossy.display(),
                job.bitrate_kbps
            )?;
        }
        write!(
            f,
            "mux    {} + {} -> {} (shortest)",
            self.mux.video.display(),
            self.mux.audio.display(),
            self.mux.output.display()
        )
    }
}
