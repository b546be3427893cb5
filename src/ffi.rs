//! FFI (Foreign Function Interface) for C/Go interoperability

use crate::error::ErrorCode;
use crate::{available, convert, ConvertOptions};
use libc::{c_char, c_uint};
use std::ffi::{CStr, CString};
use std::path::PathBuf;
use std::ptr;
use std::time::Duration;

/// FFI result structure
#[repr(C)]
pub struct FfiResult {
    pub code: ErrorCode,
    pub message: *mut c_char,
}

impl FfiResult {
    fn ok() -> Self {
        Self {
            code: ErrorCode::Ok,
            message: ptr::null_mut(),
        }
    }

    fn error(code: ErrorCode, message: &str) -> Self {
        let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
        Self {
            code,
            message: message.into_raw(),
        }
    }
}

/// Convert a nullable C string into an optional path
///
/// # Safety
/// - `s` must be a valid null-terminated string or null
unsafe fn optional_path(s: *const c_char, what: &str) -> Result<Option<PathBuf>, FfiResult> {
    if s.is_null() {
        return Ok(None);
    }
    match CStr::from_ptr(s).to_str() {
        Ok(s) => Ok(Some(PathBuf::from(s))),
        Err(_) => Err(FfiResult::error(
            ErrorCode::InvalidInput,
            &format!("Invalid {}", what),
        )),
    }
}

/// Check if ffmpeg and lame are available
///
/// # Safety
/// - `ffmpeg_path` and `lame_path` must be valid null-terminated strings or null
#[no_mangle]
pub unsafe extern "C" fn slidesync_available(
    ffmpeg_path: *const c_char,
    lame_path: *const c_char,
) -> FfiResult {
    let ffmpeg_path = match optional_path(ffmpeg_path, "ffmpeg path") {
        Ok(p) => p,
        Err(e) => return e,
    };
    let lame_path = match optional_path(lame_path, "lame path") {
        Ok(p) => p,
        Err(e) => return e,
    };

    match available(ffmpeg_path.as_deref(), lame_path.as_deref()) {
        Ok(_) => FfiResult::ok(),
        Err(e) => FfiResult::error(ErrorCode::from(&e), &e.to_string()),
    }
}

/// Convert a `.tar.gz` archive into a slideshow video
///
/// # Safety
/// - `archive_path` must be a valid null-terminated string
/// - `output_path`, `ffmpeg_path` and `lame_path` must be valid null-terminated strings or null
#[no_mangle]
pub unsafe extern "C" fn slidesync_convert(
    archive_path: *const c_char,
    output_path: *const c_char,
    ffmpeg_path: *const c_char,
    lame_path: *const c_char,
    jobs: c_uint,
    timeout_secs: c_uint,
) -> FfiResult {
    if archive_path.is_null() {
        return FfiResult::error(ErrorCode::InvalidInput, "Archive path is null");
    }
    let archive_path = match CStr::from_ptr(archive_path).to_str() {
        Ok(s) => PathBuf::from(s),
        Err(_) => return FfiResult::error(ErrorCode::InvalidInput, "Invalid archive path"),
    };

    let output_path = match optional_path(output_path, "output path") {
        Ok(p) => p,
        Err(e) => return e,
    };
    let ffmpeg_path = match optional_path(ffmpeg_path, "ffmpeg path") {
        Ok(p) => p,
        Err(e) => return e,
    };
    let lame_path = match optional_path(lame_path, "lame path") {
        Ok(p) => p,
        Err(e) => return e,
    };

    let options = ConvertOptions {
        output_path,
        ffmpeg_path,
        lame_path,
        jobs: jobs.max(1) as usize,
        tool_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs as u64)),
        ..Default::default()
    };

    match convert(&archive_path, &options) {
        Ok(_) => FfiResult::ok(),
        Err(e) => FfiResult::error(ErrorCode::from(&e), &e.to_string()),
    }
}

/// Free a result's message string
///
/// # Safety
/// - `result` must point to a valid `FfiResult` that was returned by a slidesync function
#[no_mangle]
pub unsafe extern "C" fn slidesync_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }

    let result = &mut *result;
    if !result.message.is_null() {
        // Reclaim the CString and let it drop
        let _ = CString::from_raw(result.message);
        result.message = ptr::null_mut();
    }
}

/// Get version string
#[no_mangle]
pub extern "C" fn slidesync_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_archive_path() {
        let mut result = unsafe {
            slidesync_convert(
                ptr::null(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                1,
                0,
            )
        };
        assert_eq!(result.code, ErrorCode::InvalidInput);
        assert!(!result.message.is_null());
        unsafe { slidesync_free_result(&mut result) };
        assert!(result.message.is_null());
    }

    #[test]
    fn test_convert_reports_error_code() {
        let archive = CString::new("/nonexistent/talk.tar.gz").unwrap();
        let mut result = unsafe {
            slidesync_convert(
                archive.as_ptr(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                0,
                0,
            )
        };
        assert_eq!(result.code, ErrorCode::InvalidInput);
        let message = unsafe { CStr::from_ptr(result.message) }.to_str().unwrap();
        assert!(message.contains("no such file"));
        unsafe { slidesync_free_result(&mut result) };
    }

    #[test]
    fn test_version() {
        let version = unsafe { CStr::from_ptr(slidesync_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }
}
