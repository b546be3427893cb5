//! Reconciliation of timecodes, images and audio length

use crate::timecode::TimecodeSchedule;
use crate::{Error, Result};
use std::time::Duration;

/// Display duration of every frame, in frame-index order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationSchedule {
    durations: Vec<Duration>,
}

impl DurationSchedule {
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Duration> {
        self.durations.get(index).copied()
    }

    pub fn as_slice(&self) -> &[Duration] {
        &self.durations
    }

    /// Display time of the final frame, implied by the audio length
    pub fn trailing(&self) -> Option<Duration> {
        self.durations.last().copied()
    }

    /// Sum of all durations; equals the audio duration
    pub fn total(&self) -> Duration {
        self.durations.iter().sum()
    }
}

/// Build the per-frame schedule
///
/// Every timecoded segment keeps its duration and the last frame is stretched
/// over whatever audio remains after the last timecode.
pub fn reconcile(
    image_count: usize,
    timecodes: &TimecodeSchedule,
    audio_duration: Duration,
) -> Result<DurationSchedule> {
    if timecodes.len() + 1 != image_count {
        return Err(Error::FrameTimecodeCountMismatch {
            timecodes: timecodes.len(),
            images: image_count,
        });
    }
    if audio_duration <= timecodes.total {
        return Err(Error::AudioShorterThanTimecodes {
            audio: audio_duration,
            last_timecode: timecodes.total,
        });
    }

    let mut durations = Vec::with_capacity(image_count);
    durations.extend_from_slice(&timecodes.segments);
    durations.push(audio_duration - timecodes.total);

    Ok(DurationSchedule { durations })
}
