//! Size-rotated log file.
//!
//! # Responsibilities
//! - Map the configured size in megabytes to a byte limit
//! - Open the active file, surfacing permission and path errors up front
//! - Hand rotation and backup retention to `file-rotate`
//!
//! # Design Decisions
//! - Backups are `<file>.<YYYYMMDDTHHMMSS>`; only names of that shape are
//!   counted or pruned, so neighbouring files are never touched
//! - The limit is checked between writes, so a record is never split
//!   across two files

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use file_rotate::compression::Compression;
use file_rotate::suffix::{AppendTimestamp, FileLimit};
use file_rotate::{ContentLimit, FileRotate};

use crate::config::FileLogConfig;
use crate::observability::error::LoggingError;

/// Cap used when the configured size is zero.
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;

const MEGABYTE: u64 = 1024 * 1024;

/// Active log file plus its timestamped backups.
pub type LogFile = FileRotate<AppendTimestamp>;

/// Convert a configured size in megabytes to bytes.
pub fn max_size_bytes(max_size_mb: u64) -> u64 {
    let mb = if max_size_mb == 0 { DEFAULT_MAX_SIZE_MB } else { max_size_mb };
    mb.saturating_mul(MEGABYTE)
}

/// Open the file sink described by `config`, ready to hand to a fmt layer.
pub fn open_log_file(config: &FileLogConfig) -> Result<Mutex<LogFile>, LoggingError> {
    let path = Path::new(&config.path);
    let max_bytes = usize::try_from(max_size_bytes(config.max_size_mb)).unwrap_or(usize::MAX);

    rotating_file(path, max_bytes, config.max_backups)
        .map(Mutex::new)
        .map_err(|source| LoggingError::SinkInit {
            path: path.to_path_buf(),
            source,
        })
}

/// Open `path` for appending, rotating once it passes `max_bytes`.
///
/// `max_backups == 0` keeps every backup.
pub fn rotating_file(path: &Path, max_bytes: usize, max_backups: usize) -> io::Result<LogFile> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    // FileRotate swallows open errors and drops every later write.
    OpenOptions::new().create(true).append(true).open(path)?;

    let keep = if max_backups == 0 { usize::MAX } else { max_backups };
    Ok(FileRotate::new(
        path,
        AppendTimestamp::default(FileLimit::MaxFiles(keep)),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    ))
}
