//! Timecode parsing
//!
//! A timecode file holds one cumulative end-time per line, `hh:mm:ss` or
//! `hh:mm:ss.fff`. The fractional part is a literal count of milliseconds:
//! `.5` is 5 ms and `.500` is 500 ms.

use crate::{Error, Result};
use std::io::BufRead;
use std::time::Duration;

/// Segment durations parsed from a timecode file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimecodeSchedule {
    /// Display duration of each timecoded segment, in order
    pub segments: Vec<Duration>,
    /// Cumulative end-time of the last segment
    pub total: Duration,
}

impl TimecodeSchedule {
    /// Number of timecodes parsed
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Cumulative end-time of every segment
    pub fn cumulative_ends(&self) -> Vec<Duration> {
        self.segments
            .iter()
            .scan(Duration::ZERO, |acc, d| {
                *acc += *d;
                Some(*acc)
            })
            .collect()
    }

    fn push(&mut self, line: &str, end_time: Duration) -> Result<()> {
        if end_time <= self.total {
            return Err(Error::TimecodeOutOfOrder {
                line: line.to_string(),
                end_time,
                elapsed: self.total,
            });
        }
        let segment = end_time - self.total;
        self.segments.push(segment);
        self.total += segment;
        Ok(())
    }
}

/// Parse timecodes from a buffered reader
///
/// Read failures other than end of input propagate as [`Error::Io`]; a line
/// that is not UTF-8 is a malformed timecode.
pub fn parse_timecodes<R: BufRead>(reader: R) -> Result<TimecodeSchedule> {
    let mut schedule = TimecodeSchedule::default();
    for raw in reader.split(b'\n') {
        let raw = raw?;
        let raw = raw.strip_suffix(b"\r").unwrap_or(&raw);
        let line = std::str::from_utf8(raw).map_err(|_| Error::MalformedTimecode {
            line: String::from_utf8_lossy(raw).into_owned(),
            reason: "not valid UTF-8".to_string(),
        })?;
        schedule.push(line, parse_timecode(line)?)?;
    }
    Ok(schedule)
}

/// Parse timecodes from an in-memory string
pub fn parse_timecodes_str(text: &str) -> Result<TimecodeSchedule> {
    parse_timecodes(text.as_bytes())
}

/// Parse a single `hh:mm:ss[.fff]` timecode into an offset from playback start
pub fn parse_timecode(line: &str) -> Result<Duration> {
    let malformed = |reason: &str| Error::MalformedTimecode {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = line.split('.');
    let clock = parts.next().unwrap_or_default();
    let millis = parts.next();
    if parts.next().is_some() {
        return Err(malformed("expected format hh:mm:ss[.xxx]"));
    }

    let millis = match millis {
        None => 0,
        Some(digits) => parse_digits(digits).ok_or_else(|| malformed("invalid milliseconds"))?,
    };

    let fields: Vec<&str> = clock.split(':').collect();
    let [hours, minutes, seconds] = fields.as_slice() else {
        return Err(malformed("expected format hh:mm:ss[.xxx]"));
    };

    let hours = parse_clock_field(hours, 1..=2, 23).ok_or_else(|| malformed("hour out of range"))?;
    let minutes =
        parse_clock_field(minutes, 2..=2, 59).ok_or_else(|| malformed("minute out of range"))?;
    let seconds =
        parse_clock_field(seconds, 2..=2, 59).ok_or_else(|| malformed("second out of range"))?;

    Ok(Duration::from_secs(hours * 3600 + minutes * 60 + seconds) + Duration::from_millis(millis))
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_clock_field(s: &str, width: std::ops::RangeInclusive<usize>, max: u64) -> Option<u64> {
    if !width.contains(&s.len()) {
        return None;
    }
    parse_digits(s).filter(|v| *v <= max)
}
