//! Operator diagnostics for validation failures

use crate::archive::list_dir;
use log::error;
use std::path::Path;

/// Hook invoked with the directory under inspection when validation fails
pub trait DiagnosticHook: Send + Sync {
    fn dump_directory(&self, dir: &Path);
}

/// Logs the directory listing at error level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDirectoryDump;

impl DiagnosticHook for LogDirectoryDump {
    fn dump_directory(&self, dir: &Path) {
        match list_dir(dir) {
            Ok(entries) => {
                error!("Dumping directory contents: {}", dir.display());
                for entry in entries {
                    if entry.is_dir {
                        error!("{}/", entry.name);
                    } else {
                        error!("{}", entry.name);
                    }
                }
            }
            Err(e) => error!("Can't list {}: {}", dir.display(), e),
        }
    }
}

/// Discards diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

impl DiagnosticHook for NoDiagnostics {
    fn dump_directory(&self, _dir: &Path) {}
}
