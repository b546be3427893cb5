//! Error types for slidesync

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for slidesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for slidesync operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Extraction did not produce exactly one top-level directory
    #[error("Can't find archive output: expected one top-level directory, found {entries} entries")]
    NoTopLevelDirectory { entries: usize },

    /// Neither `audio.mp3` nor `audio.wav` is present
    #[error("No audio found")]
    NoAudioFound,

    /// No `img` member is present
    #[error("No img directory found")]
    NoImageDirectory,

    /// `img` is present but is not a directory
    #[error("Expected img to be a directory")]
    ImageDirIsNotADirectory,

    /// No `timecodes.txt` is present
    #[error("No timecodes found")]
    NoTimecodeFile,

    /// Image suffix has a different zero-padding width than the first image
    #[error("Found bad image {name}: expected {expected} index digits, got {found}")]
    InconsistentDigitWidth {
        name: String,
        expected: usize,
        found: usize,
    },

    /// Image suffix is empty or not a decimal number
    #[error("Found bad image {name}: index is not a number")]
    InvalidImageIndex { name: String },

    /// Image index is not the next one in sequence
    #[error("Found image out of order: expected {expected} got {found} in {name}")]
    OutOfOrderImage {
        name: String,
        expected: usize,
        found: u64,
    },

    /// Image could not be decoded
    #[error("Malformed image {name}: {reason}")]
    MalformedImage { name: String, reason: String },

    /// Image geometry differs from the first image
    #[error("Image {name} is of unexpected size: expected {expected:?}, got {found:?}")]
    SizeMismatch {
        name: String,
        expected: (u32, u32),
        found: (u32, u32),
    },

    /// Timecode line does not match `hh:mm:ss[.fff]`
    #[error("Malformatted timecode {line:?}: {reason}")]
    MalformedTimecode { line: String, reason: String },

    /// Timecode does not advance past the time already elapsed
    #[error("Got timecode out of order: {line} ({end_time:?}) but only {elapsed:?} time has passed")]
    TimecodeOutOfOrder {
        line: String,
        end_time: Duration,
        elapsed: Duration,
    },

    /// Timecode count is not one less than the image count
    #[error("Mismatched timecode ({timecodes}) and image counts ({images})")]
    FrameTimecodeCountMismatch { timecodes: usize, images: usize },

    /// Audio ends at or before the last timecode
    #[error("Audio ends before last image is displayed: audio {audio:?}, last timecode {last_timecode:?}")]
    AudioShorterThanTimecodes {
        audio: Duration,
        last_timecode: Duration,
    },

    /// External tool is not installed or lacks a required capability
    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    /// External tool invocation failed
    #[error("{tool} returned error: {message}")]
    ExternalTool { tool: String, message: String },

    /// Output file is missing after the final mux
    #[error("Output file was not produced: {0}")]
    MissingOutput(PathBuf),

    /// Conversion was aborted through a cancel flag
    #[error("Conversion cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// WAV reading error
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or misnamed archive members
    Structural,
    /// Image indexing, size or format violations
    Sequence,
    /// Malformed timecode lines
    TimecodeFormat,
    /// Non-increasing timecodes
    TimecodeOrder,
    /// Count mismatch or audio too short
    Reconciliation,
    /// Any collaborator invocation failing
    ExternalTool,
    /// Bad caller-supplied parameters
    InvalidInput,
    /// Filesystem errors outside of a collaborator
    Io,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::NoTopLevelDirectory { .. }
            | Error::NoAudioFound
            | Error::NoImageDirectory
            | Error::ImageDirIsNotADirectory
            | Error::NoTimecodeFile => ErrorKind::Structural,
            Error::InconsistentDigitWidth { .. }
            | Error::InvalidImageIndex { .. }
            | Error::OutOfOrderImage { .. }
            | Error::MalformedImage { .. }
            | Error::SizeMismatch { .. } => ErrorKind::Sequence,
            Error::MalformedTimecode { .. } => ErrorKind::TimecodeFormat,
            Error::TimecodeOutOfOrder { .. } => ErrorKind::TimecodeOrder,
            Error::FrameTimecodeCountMismatch { .. } | Error::AudioShorterThanTimecodes { .. } => {
                ErrorKind::Reconciliation
            }
            Error::ToolUnavailable(_)
            | Error::ExternalTool { .. }
            | Error::MissingOutput(_)
            | Error::Cancelled
            | Error::Image(_)
            | Error::Wav(_) => ErrorKind::ExternalTool,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether the pipeline should dump the inspected directory for this error
    pub fn wants_directory_dump(&self) -> bool {
        matches!(self.kind(), ErrorKind::Structural | ErrorKind::Sequence)
    }

    pub(crate) fn external(tool: &str, message: impl Into<String>) -> Self {
        Error::ExternalTool {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

/// Error code for FFI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub enum ErrorCode {
    /// Success
    Ok = 0,
    /// Invalid input parameter
    InvalidInput = 1,
    /// Archive structure error
    StructuralError = 2,
    /// Image sequence error
    SequenceError = 3,
    /// Timecode format error
    TimecodeFormatError = 4,
    /// Timecode order error
    TimecodeOrderError = 5,
    /// Reconciliation error
    ReconciliationError = 6,
    /// External tool error
    ExternalToolError = 7,
    /// I/O error
    IoError = 8,
}

impl From<&Error> for ErrorCode {
    fn from(err: &Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidInput => ErrorCode::InvalidInput,
            ErrorKind::Structural => ErrorCode::StructuralError,
            ErrorKind::Sequence => ErrorCode::SequenceError,
            ErrorKind::TimecodeFormat => ErrorCode::TimecodeFormatError,
            ErrorKind::TimecodeOrder => ErrorCode::TimecodeOrderError,
            ErrorKind::Reconciliation => ErrorCode::ReconciliationError,
            ErrorKind::ExternalTool => ErrorCode::ExternalToolError,
            ErrorKind::Io => ErrorCode::IoError,
        }
    }
}
