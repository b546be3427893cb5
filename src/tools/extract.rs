//! Archive extraction

use crate::archive::list_dir;
use crate::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::path::{Path, PathBuf};
use tar::Archive;

const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Base name of a `.tar.gz` archive path (`talk.tar.gz` -> `talk`)
pub fn archive_base_name(archive_path: &Path) -> Result<String> {
    let not_an_archive =
        || Error::InvalidInput("expected path to lead to a .tar.gz archive".to_string());

    let name = archive_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(not_an_archive)?;
    match name.strip_suffix(ARCHIVE_SUFFIX) {
        Some(base) if !base.is_empty() => Ok(base.to_string()),
        _ => Err(not_an_archive()),
    }
}

/// Unpack `archive_path` into `dest` and return its single top-level directory
///
/// On failure the caller is expected to dump `dest` for diagnosis.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<PathBuf> {
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive
        .unpack(dest)
        .map_err(|e| Error::external("tar", e.to_string()))?;

    match list_dir(dest)?.as_slice() {
        [entry] if entry.is_dir => Ok(dest.join(&entry.name)),
        entries => Err(Error::NoTopLevelDirectory {
            entries: entries.len(),
        }),
    }
}
