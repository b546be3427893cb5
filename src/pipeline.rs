//! Archive-to-slideshow conversion

use crate::archive::{list_dir, ArchiveLayout, AudioSourceKind};
use crate::diagnostics::{DiagnosticHook, LogDirectoryDump};
use crate::executor::{execute_plan, PlanTools};
use crate::image_loader::{DecodingProbe, ImageProbe};
use crate::image_sequence::{validate_sequence, ImageSequence};
use crate::plan::{plan_assembly, AssemblyPlan, PlanLayout};
use crate::reconcile::{reconcile, DurationSchedule};
use crate::timecode::{parse_timecodes, TimecodeSchedule};
use crate::tools::extract::{archive_base_name, extract_archive};
use crate::tools::{
    AudioDurationProbe, AudioTranscoder, CancelFlag, ClipEncoder, FfmpegTools, LameTranscoder,
    StreamAssembler, WavDurationProbe,
};
use crate::{ConvertOptions, Error, Result};
use log::{info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// External collaborators used by a [`Pipeline`]
pub struct Collaborators {
    pub image_probe: Box<dyn ImageProbe>,
    pub duration_probe: Box<dyn AudioDurationProbe>,
    pub transcoder: Box<dyn AudioTranscoder>,
    pub clip_encoder: Arc<dyn ClipEncoder>,
    pub assembler: Arc<dyn StreamAssembler>,
    pub diagnostics: Box<dyn DiagnosticHook>,
}

impl Collaborators {
    /// `image` decoding, `hound` duration, `lame` transcoding and `ffmpeg` encoding
    pub fn system(options: &ConvertOptions) -> Self {
        let ffmpeg = Arc::new(FfmpegTools::new(
            options.ffmpeg_path.as_deref(),
            options.tool_timeout,
        ));
        Self {
            image_probe: Box::new(DecodingProbe),
            duration_probe: Box::new(WavDurationProbe),
            transcoder: Box::new(LameTranscoder::new(
                options.lame_path.as_deref(),
                options.tool_timeout,
            )),
            clip_encoder: ffmpeg.clone(),
            assembler: ffmpeg,
            diagnostics: Box::new(LogDirectoryDump),
        }
    }
}

/// Everything validation produced for one archive
#[derive(Debug, Clone)]
pub struct Conversion {
    pub layout: ArchiveLayout,
    pub sequence: ImageSequence,
    pub timecodes: TimecodeSchedule,
    pub schedule: DurationSchedule,
    pub plan: AssemblyPlan,
}

/// Outcome of a conversion
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// Final video path
    pub output: PathBuf,
    /// Number of frames in the slideshow
    pub frame_count: usize,
    /// The plan that was (or, on a dry run, would have been) executed
    pub plan: AssemblyPlan,
    /// Whether encoding was skipped
    pub dry_run: bool,
}

/// Validate-then-assemble pipeline
pub struct Pipeline {
    tools: Collaborators,
    cancel: CancelFlag,
}

impl Pipeline {
    pub fn new(tools: Collaborators) -> Self {
        Self {
            tools,
            cancel: CancelFlag::new(),
        }
    }

    /// Abort the conversion when `cancel` is raised
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Convert a `.tar.gz` archive
    ///
    /// The archive is unpacked into a temporary directory that is removed when
    /// the conversion ends.
    pub fn convert_archive(
        &self,
        archive_path: &Path,
        options: &ConvertOptions,
    ) -> Result<ConversionReport> {
        options.validate()?;
        let base = archive_base_name(archive_path)?;
        if !archive_path.is_file() {
            return Err(Error::InvalidInput(format!(
                "no such file: {}",
                archive_path.display()
            )));
        }
        let output = match &options.output_path {
            Some(path) => path.clone(),
            None => std::env::current_dir()?.join(format!("{}.mp4", base)),
        };

        let work_dir = tempfile::Builder::new().prefix("slidesync-").tempdir()?;
        info!(
            "Unpacking {} into {}",
            archive_path.display(),
            work_dir.path().display()
        );
        let root = extract_archive(archive_path, work_dir.path())
            .map_err(|e| self.diagnose(e, work_dir.path()))?;

        self.convert_directory(&root, &output, options)
    }

    /// Convert an already unpacked archive directory
    pub fn convert_directory(
        &self,
        root: &Path,
        output: &Path,
        options: &ConvertOptions,
    ) -> Result<ConversionReport> {
        options.validate()?;
        let conversion = self.prepare(root, output, options)?;
        let frame_count = conversion.sequence.len();

        if options.dry_run {
            info!("Dry run: skipping encoding");
        } else {
            let tools = PlanTools {
                clip_encoder: self.tools.clip_encoder.as_ref(),
                assembler: self.tools.assembler.as_ref(),
                transcoder: self.tools.transcoder.as_ref(),
            };
            execute_plan(&conversion.plan, &tools, options.jobs, &self.cancel)?;
            info!("Wrote {}", output.display());
        }

        Ok(ConversionReport {
            output: output.to_path_buf(),
            frame_count,
            plan: conversion.plan,
            dry_run: options.dry_run,
        })
    }

    /// Run every validation stage and build the assembly plan
    pub fn prepare(
        &self,
        root: &Path,
        output: &Path,
        options: &ConvertOptions,
    ) -> Result<Conversion> {
        let layout = ArchiveLayout::inspect(root).map_err(|e| self.diagnose(e, root))?;
        info!("Archive audio is {:?}", layout.audio_kind);
        let has_lossy_audio = layout.lossy_audio_path().is_file();
        if layout.audio_kind == AudioSourceKind::RawPcm && has_lossy_audio {
            warn!("Archive has both audio tracks: timing from WAV, muxing the existing MP3");
        }

        let image_dir = layout.image_dir();
        let names: Vec<String> = list_dir(&image_dir)?
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        let sequence = validate_sequence(&image_dir, &names, self.tools.image_probe.as_ref())
            .map_err(|e| self.diagnose(e, &image_dir))?;
        info!(
            "Validated {} images ({} digits)",
            sequence.len(),
            sequence.digit_width
        );

        let timecodes = parse_timecodes(BufReader::new(File::open(layout.timecode_path())?))?;
        info!("Parsed {} timecodes", timecodes.len());

        if layout.audio_kind == AudioSourceKind::CompressedLossy {
            self.check_cancelled()?;
            info!("Decoding audio to PCM");
            self.tools.transcoder.decode_to_pcm(
                &layout.lossy_audio_path(),
                &layout.pcm_audio_path(),
                &self.cancel,
            )?;
        }
        let audio_duration = self.tools.duration_probe.duration(&layout.pcm_audio_path())?;
        info!("Audio lasts {:?}", audio_duration);

        let schedule = reconcile(sequence.len(), &timecodes, audio_duration)?;

        let plan_layout = PlanLayout {
            clip_dir: layout.clip_dir(),
            pcm_audio: layout.pcm_audio_path(),
            lossy_audio: layout.lossy_audio_path(),
            encode_lossy_audio: !has_lossy_audio,
            audio_bitrate_kbps: options.audio_bitrate_kbps,
            output: output.to_path_buf(),
        };
        let plan = plan_assembly(&sequence, &schedule, &plan_layout)?;

        Ok(Conversion {
            layout,
            sequence,
            timecodes,
            schedule,
            plan,
        })
    }

    fn diagnose(&self, err: Error, dir: &Path) -> Error {
        if err.wants_directory_dump() {
            self.tools.diagnostics.dump_directory(dir);
        }
        err
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

/// Convert a `.tar.gz` archive with the system tools
pub fn convert<P: AsRef<Path>>(archive_path: P, options: &ConvertOptions) -> Result<ConversionReport> {
    Pipeline::new(Collaborators::system(options)).convert_archive(archive_path.as_ref(), options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_rejects_non_archive() {
        let options = ConvertOptions::default();
        let err = convert("slides.zip", &options).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_convert_missing_archive() {
        let options = ConvertOptions::default();
        let err = convert("/nonexistent/slides.tar.gz", &options).unwrap_err();
        assert!(err.to_string().contains("no such file"));
    }
}
