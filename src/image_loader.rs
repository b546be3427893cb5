//! Image decoding utilities

use crate::Result;
use image::{GenericImageView, ImageReader};
use std::path::Path;

/// Pixel dimensions of a decoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelSize {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub(crate) fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl std::fmt::Display for PixelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Image decode collaborator
///
/// Implementations must fully decode the file, so that a truncated or corrupt
/// image is reported as an error rather than a size.
pub trait ImageProbe: Send + Sync {
    /// Decode the image at `path` and report its pixel dimensions
    fn probe(&self, path: &Path) -> Result<PixelSize>;
}

/// Image probe backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodingProbe;

impl ImageProbe for DecodingProbe {
    fn probe(&self, path: &Path) -> Result<PixelSize> {
        let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        let (width, height) = img.dimensions();
        Ok(PixelSize { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_size_display() {
        assert_eq!(PixelSize::new(640, 480).to_string(), "640x480");
        assert_eq!(PixelSize::new(2, 3).as_tuple(), (2, 3));
    }

    #[test]
    fn test_probe_missing_file() {
        let result = DecodingProbe.probe(Path::new("/nonexistent/path/img0.jpg"));
        assert!(result.is_err());
    }
}
