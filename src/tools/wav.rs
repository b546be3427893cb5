//! PCM duration measurement

use super::AudioDurationProbe;
use crate::{Error, Result};
use std::path::Path;
use std::time::Duration;

/// Duration probe reading the WAV header with `hound`
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDurationProbe;

impl AudioDurationProbe for WavDurationProbe {
    fn duration(&self, path: &Path) -> Result<Duration> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(Error::external("wav", "sample rate is zero"));
        }
        Ok(frames_to_duration(reader.duration(), spec.sample_rate))
    }
}

/// Exact duration of `frames` samples per channel, to the nanosecond
fn frames_to_duration(frames: u32, sample_rate: u32) -> Duration {
    let nanos = frames as u128 * 1_000_000_000 / sample_rate as u128;
    Duration::from_nanos(nanos as u64)
}
