//! Append-only record of every move performed by a sort run.
//!
//! The log lives inside the target directory and holds one JSON object per
//! line:
//!
//! ```text
//! {"timestamp":"2025-11-09T14:30:52.123+01:00","action":"move","src":"/d/a.jpg","dst":"/d/Images/a.jpg"}
//! {"timestamp":"2025-11-09T14:30:52.124+01:00","action":"duplicate","src":"/d/b.jpg","dst":"/d/Duplicates/b.jpg"}
//! ```
//!
//! Each [`ActionLog::append`] opens the file in append mode, writes one line
//! and syncs it, so a crash after N moves leaves N readable records. A
//! trailing line cut short by a crash fails to parse and is skipped.

use crate::error::{SortError, SortResult};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// File name of the action log inside the target directory.
pub const LOG_FILE_NAME: &str = "quicksortbox.log";

/// What kind of placement a log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// File moved into its category directory.
    Move,
    /// File moved into the duplicates quarantine.
    Duplicate,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Move => f.write_str("move"),
            ActionKind::Duplicate => f.write_str("duplicate"),
        }
    }
}

/// One performed move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub timestamp: DateTime<Local>,
    pub action: ActionKind,
    pub src: PathBuf,
    pub dst: PathBuf,
}

impl ActionLogEntry {
    /// Creates an entry stamped with the current local time.
    pub fn now(action: ActionKind, src: PathBuf, dst: PathBuf) -> Self {
        Self {
            timestamp: Local::now(),
            action,
            src,
            dst,
        }
    }
}

/// Entries recovered from a log, in write order.
#[derive(Debug, Default)]
pub struct LogContents {
    pub entries: Vec<ActionLogEntry>,
    /// Lines that could not be parsed and were skipped.
    pub corrupt_lines: usize,
}

/// Handle to the action log of one target directory.
#[derive(Debug, Clone)]
pub struct ActionLog {
    path: PathBuf,
}

impl ActionLog {
    /// Returns the log handle for `target_dir`. Nothing is touched on disk.
    pub fn for_directory(target_dir: &Path) -> Self {
        Self {
            path: target_dir.join(LOG_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Durably appends a single entry.
    pub fn append(&self, entry: &ActionLogEntry) -> SortResult<()> {
        let write_failed = |source| SortError::LogWrite {
            path: self.path.clone(),
            source,
        };

        let mut line = serde_json::to_string(entry).map_err(|e| {
            write_failed(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_failed)?;
        file.write_all(line.as_bytes()).map_err(write_failed)?;
        file.sync_data().map_err(write_failed)?;

        Ok(())
    }

    /// Reads every parseable entry in write order.
    ///
    /// Returns `Ok(None)` when there is no log. Lines that fail to parse
    /// are logged, counted, and skipped.
    pub fn read_all(&self) -> SortResult<Option<LogContents>> {
        if !self.exists() {
            return Ok(None);
        }

        let read_failed = |source| SortError::LogRead {
            path: self.path.clone(),
            source,
        };

        let file = fs::File::open(&self.path).map_err(read_failed)?;
        let mut contents = LogContents::default();

        // Split on raw bytes: a record cut mid-character is corrupt, not unreadable.
        for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line.map_err(read_failed)?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match Self::parse_line(index + 1, &line) {
                Ok(entry) => contents.entries.push(entry),
                Err(e) => {
                    warn!(log = %self.path.display(), "{}", e);
                    contents.corrupt_lines += 1;
                }
            }
        }

        Ok(Some(contents))
    }

    /// Deletes the log file if present.
    pub fn clear(&self) -> SortResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| SortError::LogWrite {
                path: self.path.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    fn parse_line(line_number: usize, line: &[u8]) -> SortResult<ActionLogEntry> {
        serde_json::from_slice(line).map_err(|e| SortError::LogCorruption {
            line: line_number,
            reason: e.to_string(),
        })
    }
}
