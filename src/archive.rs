//! Archive structure validation

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Lossy audio member name
pub const LOSSY_AUDIO_NAME: &str = "audio.mp3";

/// PCM audio member name
pub const PCM_AUDIO_NAME: &str = "audio.wav";

/// Image directory member name
pub const IMAGE_DIR_NAME: &str = "img";

/// Timecode member name
pub const TIMECODE_FILE_NAME: &str = "timecodes.txt";

/// Encoding of the audio shipped in the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSourceKind {
    /// `audio.mp3`; must be decoded to PCM before its duration can be measured
    CompressedLossy,
    /// `audio.wav`; must be encoded to lossy audio before muxing
    RawPcm,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntryInfo {
    pub fn file(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_dir: false,
        }
    }

    pub fn dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_dir: true,
        }
    }
}

/// List a directory, sorted by name
pub fn list_dir(dir: &Path) -> Result<Vec<DirEntryInfo>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        entries.push(DirEntryInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: entry.file_type()?.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Validated top-level layout of an extracted archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    /// Archive root directory
    pub root: PathBuf,
    /// Encoding of the shipped audio
    pub audio_kind: AudioSourceKind,
}

impl ArchiveLayout {
    /// Validate a top-level listing of `root`
    ///
    /// When both audio members are present the PCM one is used as the source
    /// and the lossy one is reused for muxing.
    pub fn from_listing(root: &Path, entries: &[DirEntryInfo]) -> Result<Self> {
        let mut audio_kind = None;
        let mut image_dir = Err(Error::NoImageDirectory);
        let mut timecodes = Err(Error::NoTimecodeFile);

        for entry in entries {
            match entry.name.as_str() {
                LOSSY_AUDIO_NAME if !entry.is_dir => {
                    audio_kind.get_or_insert(AudioSourceKind::CompressedLossy);
                }
                PCM_AUDIO_NAME if !entry.is_dir => audio_kind = Some(AudioSourceKind::RawPcm),
                IMAGE_DIR_NAME if entry.is_dir => image_dir = Ok(()),
                IMAGE_DIR_NAME => image_dir = Err(Error::ImageDirIsNotADirectory),
                TIMECODE_FILE_NAME => timecodes = Ok(()),
                _ => {}
            }
        }

        let audio_kind = audio_kind.ok_or(Error::NoAudioFound)?;
        image_dir?;
        timecodes?;

        Ok(Self {
            root: root.to_path_buf(),
            audio_kind,
        })
    }

    /// List `root` and validate it
    pub fn inspect(root: &Path) -> Result<Self> {
        Self::from_listing(root, &list_dir(root)?)
    }

    pub fn image_dir(&self) -> PathBuf {
        self.root.join(IMAGE_DIR_NAME)
    }

    pub fn timecode_path(&self) -> PathBuf {
        self.root.join(TIMECODE_FILE_NAME)
    }

    /// PCM audio path (present in the archive or produced by transcoding)
    pub fn pcm_audio_path(&self) -> PathBuf {
        self.root.join(PCM_AUDIO_NAME)
    }

    /// Lossy audio path (present in the archive or produced by transcoding)
    pub fn lossy_audio_path(&self) -> PathBuf {
        self.root.join(LOSSY_AUDIO_NAME)
    }

    /// Directory receiving per-frame clips and the concatenated video
    pub fn clip_dir(&self) -> PathBuf {
        self.root.join("vid")
    }
}
