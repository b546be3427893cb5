//! Common test utilities

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use image::{ImageBuffer, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

/// Generate a test image with a solid color and optional gradient
pub fn generate_test_image(width: u32, height: u32, base_color: [u8; 4]) -> RgbaImage {
    let mut img = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        // Add subtle gradient to make frames distinguishable
        let r = base_color[0].saturating_add((x % 50) as u8);
        let g = base_color[1].saturating_add((y % 50) as u8);
        let b = base_color[2];
        let a = base_color[3];
        *pixel = Rgba([r, g, b, a]);
    }

    img
}

/// Generate a numbered slide
pub fn generate_numbered_image(width: u32, height: u32, number: u32) -> RgbaImage {
    let colors = [
        [255, 100, 100, 255], // Red-ish
        [100, 255, 100, 255], // Green-ish
        [100, 100, 255, 255], // Blue-ish
        [255, 255, 100, 255], // Yellow-ish
    ];

    let color = colors[(number as usize) % colors.len()];
    generate_test_image(width, height, color)
}

/// Save a test image as JPEG
pub fn save_jpeg<P: AsRef<Path>>(img: &RgbaImage, path: P, quality: u8) -> std::io::Result<()> {
    // Convert RGBA to RGB for JPEG
    let rgb_img: image::RgbImage = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();

    let file = std::fs::File::create(path)?;
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, quality);
    encoder
        .encode_image(&rgb_img)
        .map_err(std::io::Error::other)?;

    Ok(())
}

/// Write a silent 16-bit mono WAV of the given length in milliseconds
pub fn write_wav<P: AsRef<Path>>(path: P, duration_ms: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..(duration_ms * 8) {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Description of an archive directory to lay out on disk
pub struct ArchiveFixture {
    pub image_count: u32,
    pub digit_width: usize,
    pub timecodes: String,
    pub audio_ms: Option<u32>,
    pub size: (u32, u32),
}

impl Default for ArchiveFixture {
    fn default() -> Self {
        Self {
            image_count: 3,
            digit_width: 2,
            timecodes: "00:00:01\n00:00:02.500\n".to_string(),
            audio_ms: Some(4_000),
            size: (64, 48),
        }
    }
}

impl ArchiveFixture {
    /// Create `<parent>/<name>` with `img/`, `audio.wav` and `timecodes.txt`
    pub fn write(&self, parent: &Path, name: &str) -> PathBuf {
        let root = parent.join(name);
        let img_dir = root.join("img");
        std::fs::create_dir_all(&img_dir).unwrap();

        for i in 0..self.image_count {
            let path = img_dir.join(format!("img{:0width$}.jpg", i, width = self.digit_width));
            let img = generate_numbered_image(self.size.0, self.size.1, i);
            save_jpeg(&img, &path, 85).unwrap();
        }
        std::fs::write(root.join("timecodes.txt"), &self.timecodes).unwrap();
        if let Some(ms) = self.audio_ms {
            write_wav(root.join("audio.wav"), ms);
        }
        root
    }
}

/// Pack `dir` (and everything under it) into `<dest>` as a gzipped tarball
pub fn pack_tar_gz(dir: &Path, dest: &Path) {
    let file = std::fs::File::create(dest).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let name = dir.file_name().unwrap();
    builder.append_dir_all(name, dir).unwrap();
    builder.into_inner().unwrap().finish().unwrap();
}

/// Verify that a file exists and has non-zero size
pub fn verify_file_exists_with_size<P: AsRef<Path>>(path: P) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len() > 0,
        Err(_) => false,
    }
}

/// Parse MP4 header to verify it's a valid MP4 file
pub fn verify_mp4_header<P: AsRef<Path>>(path: P) -> bool {
    use std::io::Read;

    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut header = [0u8; 12];
    if file.read_exact(&mut header).is_err() {
        return false;
    }

    // MP4 files have 'ftyp' box at offset 4
    &header[4..8] == b"ftyp"
}
