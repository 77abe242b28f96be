/// Undo functionality for reverting a sort run.
///
/// This module replays the action log of a target directory backwards,
/// moving every file from where it landed back to where it came from.
/// Undo is best-effort: entries whose file has gone missing are skipped,
/// corrupt log lines are skipped, and a failed restore does not stop the
/// remaining ones.
use crate::action_log::{ActionLog, ActionLogEntry};
use crate::error::{SortError, SortResult};
use crate::mover::Mover;
use crate::progress::ProgressSink;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files successfully restored.
    pub restored_files: usize,
    /// Restores that failed, with the reason.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Entries whose file was no longer at its recorded destination.
    pub skipped_files: Vec<PathBuf>,
    /// Log lines that could not be parsed.
    pub corrupt_entries: usize,
    /// Whether the action log was deleted afterwards.
    pub log_cleared: bool,
}

impl UndoReport {
    /// Returns the total number of log entries processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    /// Returns true if every recorded file was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

/// Reverses sort runs from their action log.
pub struct UndoEngine;

impl UndoEngine {
    /// Undoes everything recorded in the action log of `target_dir`.
    ///
    /// Entries are replayed last-first. Directories created by the sort are
    /// left in place, even when empty.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when there is no log, meaning there is nothing to undo.
    /// Otherwise an [`UndoReport`]. The log is deleted unless a restore
    /// failed, so that a retry after fixing permissions can finish the job.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use quicksortbox::progress::NoProgress;
    /// use quicksortbox::undo::UndoEngine;
    /// use std::path::Path;
    ///
    /// match UndoEngine::undo(Path::new("/path/to/directory"), &mut NoProgress) {
    ///     Ok(Some(report)) => println!("Restored {} files", report.restored_files),
    ///     Ok(None) => println!("Nothing to undo"),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(
        target_dir: &Path,
        progress: &mut dyn ProgressSink,
    ) -> SortResult<Option<UndoReport>> {
        let target_dir = fs::canonicalize(target_dir).map_err(|e| {
            SortError::InvalidTargetDirectory {
                path: target_dir.to_path_buf(),
                source: e,
            }
        })?;

        let log = ActionLog::for_directory(&target_dir);
        let Some(contents) = log.read_all()? else {
            info!(dir = %target_dir.display(), "no action log, nothing to undo");
            return Ok(None);
        };

        let mut report = UndoReport {
            corrupt_entries: contents.corrupt_lines,
            ..Default::default()
        };
        let total = contents.entries.len();

        for (index, entry) in contents.entries.iter().rev().enumerate() {
            let name = entry
                .dst
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            progress.report(index + 1, total, &format!("Undoing {}...", name));

            match Self::restore_entry(entry) {
                Ok(true) => report.restored_files += 1,
                Ok(false) => report.skipped_files.push(entry.dst.clone()),
                Err(e) => {
                    warn!("{}", e);
                    report.failed_restores.push((entry.dst.clone(), e.to_string()));
                }
            }
        }

        if report.failed_restores.is_empty() {
            match log.clear() {
                Ok(()) => report.log_cleared = true,
                Err(e) => warn!("Could not delete action log: {}", e),
            }
        } else {
            warn!(
                failed = report.failed_restores.len(),
                "keeping action log so the undo can be retried"
            );
        }

        info!(
            restored = report.restored_files,
            skipped = report.skipped_files.len(),
            failed = report.failed_restores.len(),
            "undo finished"
        );
        Ok(Some(report))
    }

    /// Moves one file back. `Ok(false)` means it was no longer there.
    fn restore_entry(entry: &ActionLogEntry) -> SortResult<bool> {
        if !entry.dst.exists() {
            return Ok(false);
        }
        Mover::restore(&entry.dst, &entry.src)?;
        Ok(true)
    }
}
