//! Image sequence validation
//!
//! Frames are named `img<index>.jpg` where every index is zero-padded to the
//! same width. Indices must run from zero with no gaps or repeats, in name
//! order, and every frame must decode to the same pixel size.

use crate::image_loader::{ImageProbe, PixelSize};
use crate::{Error, Result};
use log::debug;
use std::path::{Path, PathBuf};

/// File name prefix of sequence frames
pub const IMAGE_PREFIX: &str = "img";

/// File name extension of sequence frames
pub const IMAGE_EXTENSION: &str = ".jpg";

/// A validated frame of the sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFrame {
    /// Position in the slideshow, starting at zero
    pub index: usize,
    /// File name inside the image directory
    pub file_name: String,
    /// Decoded pixel dimensions
    pub pixel_size: PixelSize,
}

/// A contiguous, uniformly sized sequence of frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSequence {
    /// Directory the frames live in
    pub dir: PathBuf,
    /// Frames in index order
    pub frames: Vec<ImageFrame>,
    /// Zero-padding width of the index suffix (zero when the sequence is empty)
    pub digit_width: usize,
    /// Common pixel size (absent when the sequence is empty)
    pub pixel_size: Option<PixelSize>,
}

impl ImageSequence {
    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Full path of a frame
    pub fn frame_path(&self, frame: &ImageFrame) -> PathBuf {
        self.dir.join(&frame.file_name)
    }
}

/// Extract the index suffix of a sequence file name
///
/// Returns `None` for names that are not part of the sequence at all.
fn index_suffix(name: &str) -> Option<&str> {
    name.strip_prefix(IMAGE_PREFIX)?
        .strip_suffix(IMAGE_EXTENSION)
}

/// Validate the image directory listing
///
/// `names` are the entries of `dir`; they are scanned in ascending name
/// order. Entries that are not `img*.jpg` are skipped.
pub fn validate_sequence<S: AsRef<str>>(
    dir: &Path,
    names: &[S],
    probe: &dyn ImageProbe,
) -> Result<ImageSequence> {
    let mut names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    names.sort_unstable();

    let mut frames: Vec<ImageFrame> = Vec::new();
    let mut digit_width = 0;
    let mut pixel_size: Option<PixelSize> = None;

    for name in names {
        let Some(digits) = index_suffix(name) else {
            debug!("Skipping non-sequence entry {}", name);
            continue;
        };

        if frames.is_empty() {
            digit_width = digits.len();
        }
        if digits.len() != digit_width {
            return Err(Error::InconsistentDigitWidth {
                name: name.to_string(),
                expected: digit_width,
                found: digits.len(),
            });
        }

        let index = parse_index(digits).ok_or_else(|| Error::InvalidImageIndex {
            name: name.to_string(),
        })?;
        let expected = frames.len();
        if index != expected as u64 {
            return Err(Error::OutOfOrderImage {
                name: name.to_string(),
                expected,
                found: index,
            });
        }

        let size = probe
            .probe(&dir.join(name))
            .map_err(|e| Error::MalformedImage {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let first = *pixel_size.get_or_insert(size);
        if size != first {
            return Err(Error::SizeMismatch {
                name: name.to_string(),
                expected: first.as_tuple(),
                found: size.as_tuple(),
            });
        }

        frames.push(ImageFrame {
            index: expected,
            file_name: name.to_string(),
            pixel_size: size,
        });
    }

    Ok(ImageSequence {
        dir: dir.to_path_buf(),
        frames,
        digit_width,
        pixel_size,
    })
}

fn parse_index(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::collections::HashMap;

    /// Probe answering from a fixed table; unknown files fail to decode
    struct TableProbe(HashMap<String, PixelSize>);

    impl TableProbe {
        fn uniform(names: &[&str]) -> Self {
            Self(
                names
                    .iter()
                    .map(|n| (n.to_string(), PixelSize::new(640, 480)))
                    .collect(),
            )
        }
    }

    impl ImageProbe for TableProbe {
        fn probe(&self, path: &Path) -> Result<PixelSize> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.0
                .get(&name)
                .copied()
                .ok_or_else(|| Error::InvalidInput(format!("cannot decode {}", name)))
        }
    }

    fn validate(names: &[&str], probe: &TableProbe) -> Result<ImageSequence> {
        validate_sequence(Path::new("/archive/img"), names, probe)
    }

    #[test]
    fn test_contiguous_sequence() {
        let names = ["img0.jpg", "img1.jpg", "img2.jpg"];
        let seq = validate(&names, &TableProbe::uniform(&names)).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.digit_width, 1);
        assert_eq!(seq.pixel_size, Some(PixelSize::new(640, 480)));
        assert_eq!(
            seq.frame_path(&seq.frames[2]),
            PathBuf::from("/archive/img/img2.jpg")
        );
    }

    #[test]
    fn test_listing_order_is_name_order() {
        let names = ["img02.jpg", "img00.jpg", "img01.jpg"];
        let seq = validate(&names, &TableProbe::uniform(&names)).unwrap();
        let order: Vec<_> = seq.frames.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(order, ["img00.jpg", "img01.jpg", "img02.jpg"]);
        assert_eq!(seq.digit_width, 2);
    }

    #[test]
    fn test_duplicate_index() {
        let names = ["img0.jpg", "img1.jpg", "img1.jpg", "img2.jpg"];
        let err = validate(&names, &TableProbe::uniform(&names)).unwrap_err();
        assert!(matches!(err, Error::OutOfOrderImage { expected: 2, found: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::Sequence);
    }

    #[test]
    fn test_gap_in_sequence() {
        let names = ["img0.jpg", "img1.jpg", "img3.jpg"];
        let err = validate(&names, &TableProbe::uniform(&names)).unwrap_err();
        assert!(matches!(err, Error::OutOfOrderImage { expected: 2, found: 3, .. }));
    }

    #[test]
    fn test_sequence_must_start_at_zero() {
        let names = ["img1.jpg", "img2.jpg"];
        let err = validate(&names, &TableProbe::uniform(&names)).unwrap_err();
        assert!(matches!(err, Error::OutOfOrderImage { expected: 0, .. }));
    }

    #[test]
    fn test_inconsistent_digit_width() {
        let names = ["img00.jpg", "img01.jpg", "img2.jpg"];
        let err = validate(&names, &TableProbe::uniform(&names)).unwrap_err();
        assert!(matches!(
            err,
            Error::InconsistentDigitWidth {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_non_numeric_index() {
        let names = ["img0.jpg", "imgx.jpg"];
        let err = validate(&names, &TableProbe::uniform(&names)).unwrap_err();
        assert!(matches!(err, Error::InvalidImageIndex { .. }));

        let names = ["img.jpg"];
        let err = validate(&names, &TableProbe::uniform(&names)).unwrap_err();
        assert!(matches!(err, Error::InvalidImageIndex { .. }));
    }

    #[test]
    fn test_unrelated_entries_are_skipped() {
        let names = ["img0.jpg", "notes.txt", "img1.png", "cover.jpg", "img1.jpg"];
        let seq = validate(&names, &TableProbe::uniform(&names)).unwrap();
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn test_size_mismatch() {
        let mut probe = TableProbe::uniform(&["img0.jpg", "img1.jpg"]);
        probe
            .0
            .insert("img1.jpg".to_string(), PixelSize::new(320, 240));
        let err = validate(&["img0.jpg", "img1.jpg"], &probe).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected: (640, 480),
                found: (320, 240),
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_image() {
        let probe = TableProbe::uniform(&["img0.jpg"]);
        let err = validate(&["img0.jpg", "img1.jpg"], &probe).unwrap_err();
        assert!(matches!(err, Error::MalformedImage { ref name, .. } if name == "img1.jpg"));
        assert_eq!(err.kind(), ErrorKind::Sequence);
    }

    #[test]
    fn test_empty_directory() {
        let names: [&str; 0] = [];
        let seq = validate(&names, &TableProbe::uniform(&[])).unwrap();
        assert!(seq.is_empty());
        assert_eq!(seq.pixel_size, None);
    }
}
