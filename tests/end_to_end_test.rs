//! End-to-end conversion with the system ffmpeg and lame
//!
//! Skipped when either tool is missing.

mod common;

use common::*;
use slidesync::{convert, ConvertOptions, Error};
use tempfile::TempDir;

fn tools_available() -> bool {
    match slidesync::available(None, None) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Skipping: {}", e);
            false
        }
    }
}

#[test]
fn test_convert_wav_archive() {
    if !tools_available() {
        return;
    }

    let temp_dir = TempDir::new().unwrap();
    let root = ArchiveFixture::default().write(&temp_dir.path().join("staging"), "talk");
    let archive = temp_dir.path().join("talk.tar.gz");
    pack_tar_gz(&root, &archive);
    let output = temp_dir.path().join("talk.mp4");

    let options = ConvertOptions {
        output_path: Some(output.clone()),
        jobs: 2,
        ..Default::default()
    };
    let report = convert(&archive, &options).unwrap();

    assert_eq!(report.output, output);
    assert_eq!(report.frame_count, 3);
    assert!(verify_file_exists_with_size(&output));
    assert!(verify_mp4_header(&output));
}

#[test]
fn test_dry_run_needs_no_encoding() {
    if !tools_available() {
        return;
    }

    let temp_dir = TempDir::new().unwrap();
    let root = ArchiveFixture::default().write(&temp_dir.path().join("staging"), "talk");
    let archive = temp_dir.path().join("talk.tar.gz");
    pack_tar_gz(&root, &archive);
    let output = temp_dir.path().join("talk.mp4");

    let options = ConvertOptions {
        output_path: Some(output.clone()),
        dry_run: true,
        ..Default::default()
    };
    let report = convert(&archive, &options).unwrap();

    assert!(report.dry_run);
    assert!(!output.exists());
    assert!(report.plan.to_string().contains("talk.mp4"));
}

#[test]
fn test_missing_ffmpeg_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let root = ArchiveFixture::default().write(&temp_dir.path().join("staging"), "talk");
    let archive = temp_dir.path().join("talk.tar.gz");
    pack_tar_gz(&root, &archive);

    let options = ConvertOptions {
        output_path: Some(temp_dir.path().join("talk.mp4")),
        ffmpeg_path: Some(temp_dir.path().join("no-such-ffmpeg")),
        ..Default::default()
    };
    let err = convert(&archive, &options).unwrap_err();

    assert!(matches!(err, Error::ToolUnavailable(_)));
}
