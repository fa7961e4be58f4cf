//! Run Log Sink
//!
//! Append-only text sink for the run transcript, mirrored to the live
//! console. One line per event: parse summary, per-command echoes, block
//! boundary markers, and the terminal success/failure line.
//!
//! Write failures on the file side are reported once via tracing and do
//! not interrupt the run; the console copy always goes out.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::Result;

/// Tee sink: console always, file when configured
pub struct LogSink {
    file: Option<File>,
    path: Option<PathBuf>,
    file_error_reported: bool,
}

impl LogSink {
    /// Sink that only mirrors to the console
    pub fn console_only() -> Self {
        Self {
            file: None,
            path: None,
            file_error_reported: false,
        }
    }

    /// Sink that appends to `path` (parent directories are created)
    pub fn to_file(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Some(file),
            path: Some(path.to_path_buf()),
            file_error_reported: false,
        })
    }

    /// Path of the file copy, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one line to the transcript
    pub fn write(&mut self, line: &str) {
        println!("{}", line);
        if let Some(file) = &mut self.file {
            if let Err(e) = writeln!(file, "{}", line).and_then(|_| file.flush()) {
                if !self.file_error_reported {
                    self.file_error_reported = true;
                    warn!("Log file write failed, continuing console-only: {}", e);
                }
            }
        }
    }
}

/// Derive the log file path for a run.
///
/// An explicit path wins over a directory; with only a directory the file
/// is named `<timestamp>_<template-stem>.cfg`. Returns `None` when neither
/// is configured (console-only run).
pub fn build_log_path(
    log_dir: Option<&Path>,
    log_path: Option<&Path>,
    template_path: &Path,
) -> Option<PathBuf> {
    if let Some(path) = log_path {
        return Some(path.to_path_buf());
    }
    let dir = log_dir?;
    let ts = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let stem = template_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "template".to_string());
    Some(dir.join(format!("{}_{}.cfg", ts, stem)))
}
