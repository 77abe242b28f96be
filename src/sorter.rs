//! The sort pass: scan, deduplicate, classify, move, log.
//!
//! A run works over a file list fixed up front, one file at a time. The
//! first file seen with a given content is the original. Later files with
//! the same digest go to the `Duplicates` quarantine. Everything else goes
//! to the category named by its extension. A failure on one file is logged
//! and recorded in the report, and the run moves on to the next file.

use crate::action_log::{ActionKind, ActionLog, ActionLogEntry, LOG_FILE_NAME};
use crate::classifier::{CategoryTable, DUPLICATES, OTHERS, categorize};
use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};
use crate::error::{SortError, SortResult};
use crate::hasher::{ContentDigest, digest};
use crate::mover::Mover;
use crate::progress::ProgressSink;
use glob::Pattern;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Per-category counts for one run, in category table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    counts: Vec<(String, usize)>,
}

impl RunStats {
    /// Seeds every category of `table`, then `Others` and `Duplicates`, at zero.
    fn seeded(table: &CategoryTable) -> Self {
        let counts = table
            .names()
            .chain([OTHERS, DUPLICATES])
            .map(|name| (name.to_string(), 0))
            .collect();
        Self { counts }
    }

    fn increment(&mut self, category: &str) {
        match self.counts.iter_mut().find(|(name, _)| name == category) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((category.to_string(), 1)),
        }
    }

    /// Count for `category`, zero when it is unknown.
    pub fn get(&self, category: &str) -> usize {
        self.counts
            .iter()
            .find(|(name, _)| name == category)
            .map_or(0, |(_, count)| *count)
    }

    /// All categories with their counts, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Only the categories that received files.
    pub fn non_zero(&self) -> impl Iterator<Item = (&str, usize)> {
        self.iter().filter(|(_, count)| *count > 0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}

/// One file's placement, performed or planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: ActionKind,
}

/// Everything a sort run produced.
#[derive(Debug, Default)]
pub struct SortReport {
    pub actions: Vec<PlannedAction>,
    pub stats: RunStats,
    /// Files that were skipped, with the reason.
    pub failures: Vec<(PathBuf, String)>,
    pub simulated: bool,
}

/// Sorts the direct file entries of a directory.
#[derive(Debug, Clone)]
pub struct SortEngine {
    table: CategoryTable,
    exclude: Vec<Pattern>,
    excluded_names: Vec<String>,
}

impl SortEngine {
    /// Creates an engine for an explicit category table.
    ///
    /// The action log and `config.json` are always excluded from scans.
    /// A config file under another name can be added with
    /// [`SortEngine::exclude_file_name`].
    pub fn new(table: CategoryTable) -> Self {
        Self {
            table,
            exclude: Vec::new(),
            excluded_names: vec![LOG_FILE_NAME.to_string(), DEFAULT_CONFIG_FILE.to_string()],
        }
    }

    /// Creates an engine from a loaded configuration, including its exclusion globs.
    pub fn from_config(config: &AppConfig) -> SortResult<Self> {
        let mut engine = Self::new(config.extensions.clone());
        engine.exclude = config.exclude_patterns()?;
        Ok(engine)
    }

    /// Never scan files with this exact name.
    pub fn exclude_file_name(mut self, name: &str) -> Self {
        if !self.excluded_names.iter().any(|n| n == name) {
            self.excluded_names.push(name.to_string());
        }
        self
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Runs one pass over `target_dir`.
    ///
    /// With `simulate` set nothing on disk changes and no log entries are
    /// written, but the returned actions and stats match what a real run
    /// would plan.
    ///
    /// # Errors
    ///
    /// Only a missing or unreadable target directory is an error. Per-file
    /// problems end up in [`SortReport::failures`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use quicksortbox::classifier::CategoryTable;
    /// use quicksortbox::progress::NoProgress;
    /// use quicksortbox::sorter::SortEngine;
    /// use std::path::Path;
    ///
    /// let engine = SortEngine::new(CategoryTable::default());
    /// let report = engine.run(Path::new("/home/me/Downloads"), true, &mut NoProgress)?;
    /// for (category, count) in report.stats.non_zero() {
    ///     println!("{}: {}", category, count);
    /// }
    /// # Ok::<(), quicksortbox::SortError>(())
    /// ```
    pub fn run(
        &self,
        target_dir: &Path,
        simulate: bool,
        progress: &mut dyn ProgressSink,
    ) -> SortResult<SortReport> {
        let target_dir = fs::canonicalize(target_dir).map_err(|e| {
            SortError::InvalidTargetDirectory {
                path: target_dir.to_path_buf(),
                source: e,
            }
        })?;

        let files = self.scan(&target_dir)?;
        let total = files.len();
        info!(dir = %target_dir.display(), files = total, simulate, "starting sort");

        let log = ActionLog::for_directory(&target_dir);
        let duplicates_dir = target_dir.join(DUPLICATES);
        let mut seen: HashMap<ContentDigest, PathBuf> = HashMap::new();
        let mut report = SortReport {
            stats: RunStats::seeded(&self.table),
            simulated: simulate,
            ..Default::default()
        };

        for (index, file) in files.iter().enumerate() {
            let display_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            progress.report(index + 1, total, &format!("Processing {}...", display_name));

            // The log stores UTF-8 paths only; anything else could not be undone.
            let file_name = match file.file_name().and_then(|n| n.to_str()) {
                Some(name) if file.to_str().is_some() => name,
                _ => {
                    let e = SortError::NonUtf8Path { path: file.clone() };
                    warn!("{}; skipping", e);
                    report.failures.push((file.clone(), e.to_string()));
                    continue;
                }
            };

            let is_duplicate = match digest(file) {
                Ok(content) => match seen.get(&content) {
                    Some(original) => {
                        debug!(file = %file.display(), original = %original.display(), "duplicate content");
                        true
                    }
                    None => {
                        seen.insert(content, file.clone());
                        false
                    }
                },
                Err(e) => {
                    warn!("{}; classifying without deduplication", e);
                    false
                }
            };

            let (kind, category, dest_dir) = if is_duplicate {
                (ActionKind::Duplicate, DUPLICATES, duplicates_dir.clone())
            } else {
                let category = categorize(file_name, &self.table);
                (ActionKind::Move, category, target_dir.join(category))
            };

            let destination = if simulate {
                dest_dir.join(file_name)
            } else {
                match Self::place(&log, file, &dest_dir, file_name, kind) {
                    Ok(landed) => landed,
                    Err(e) => {
                        warn!("{}; skipping", e);
                        report.failures.push((file.clone(), e.to_string()));
                        continue;
                    }
                }
            };

            debug!(src = %file.display(), dst = %destination.display(), %kind, "placed");
            report.stats.increment(category);
            report.actions.push(PlannedAction {
                source: file.clone(),
                destination,
                kind,
            });
        }

        info!(
            placed = report.actions.len(),
            failed = report.failures.len(),
            "sort finished"
        );
        Ok(report)
    }

    /// Moves one file and records where it actually landed.
    ///
    /// A move that cannot be logged is moved back, so every file on disk
    /// outside its original place has a log entry.
    fn place(
        log: &ActionLog,
        file: &Path,
        dest_dir: &Path,
        file_name: &str,
        kind: ActionKind,
    ) -> SortResult<PathBuf> {
        let landed = Mover::move_safely(file, dest_dir, file_name)?;
        if let Err(e) = log.append(&ActionLogEntry::now(kind, file.to_path_buf(), landed.clone())) {
            match fs::rename(&landed, file) {
                Ok(()) => debug!(file = %file.display(), "rolled back unlogged move"),
                Err(rollback) => error!(
                    src = %file.display(),
                    dst = %landed.display(),
                    "could not roll back unlogged move: {}",
                    rollback
                ),
            }
            return Err(e);
        }
        Ok(landed)
    }

    /// Lists the regular files directly inside `target_dir`, sorted by name.
    fn scan(&self, target_dir: &Path) -> SortResult<Vec<PathBuf>> {
        let entries = fs::read_dir(target_dir).map_err(|e| SortError::InvalidTargetDirectory {
            path: target_dir.to_path_buf(),
            source: e,
        })?;

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                !self.is_excluded(&name)
            })
            .map(|entry| entry.path())
            .collect();

        files.sort();
        Ok(files)
    }

    fn is_excluded(&self, file_name: &str) -> bool {
        self.excluded_names.iter().any(|n| n == file_name)
            || self.exclude.iter().any(|p| p.matches(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use tempfile::TempDir;

    fn engine() -> SortEngine {
        SortEngine::new(CategoryTable::default())
    }

    #[test]
    fn test_stats_seeded_with_all_categories() {
        let stats = RunStats::seeded(&CategoryTable::default());
        let names: Vec<_> = stats.iter().map(|(n, _)| n).collect();

        assert_eq!(names.first(), Some(&"Images"));
        assert_eq!(&names[names.len() - 2..], &[OTHERS, DUPLICATES]);
        assert_eq!(stats.total(), 0);
        assert_eq!(stats.non_zero().count(), 0);
    }

    #[test]
    fn test_scan_skips_dirs_log_and_excluded_names() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::write(base.join("b.txt"), "b").unwrap();
        fs::write(base.join("a.txt"), "a").unwrap();
        fs::write(base.join(LOG_FILE_NAME), "").unwrap();
        fs::write(base.join("config.json"), "{}").unwrap();
        fs::write(base.join("rules.json"), "{}").unwrap();
        fs::create_dir(base.join("Images")).unwrap();

        let files = engine().exclude_file_name("rules.json").scan(base).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_default_config_file_is_never_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::write(base.join("config.json"), r#"{"EXTENSIONS": {}}"#).unwrap();
        fs::write(base.join("data.json"), "[]").unwrap();

        let report = engine().run(base, false, &mut NoProgress).unwrap();

        assert_eq!(report.actions.len(), 1);
        assert_eq!(report.stats.get("Code"), 1);
        assert!(base.join("config.json").is_file());
        assert!(base.join("Code").join("data.json").is_file());
        assert!(!base.join("Code").join("config.json").exists());
    }

    #[test]
    fn test_unloggable_move_is_rolled_back() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::write(base.join("a.txt"), "a").unwrap();
        // A directory where the log file should be makes every append fail.
        fs::create_dir(base.join(LOG_FILE_NAME)).unwrap();

        let report = engine().run(base, false, &mut NoProgress).unwrap();

        assert!(report.actions.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.stats.total(), 0);
        assert_eq!(fs::read_to_string(base.join("a.txt")).unwrap(), "a");
        assert!(!base.join("Documents").join("a.txt").exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_is_left_in_place() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let odd = base.join(OsStr::from_bytes(b"caf\xE9.txt"));
        fs::write(&odd, "latin-1 name").unwrap();

        let report = engine().run(base, false, &mut NoProgress).unwrap();

        assert!(report.actions.is_empty());
        assert!(matches!(
            report.failures.as_slice(),
            [(path, _)] if path.file_name() == odd.file_name()
        ));
        assert!(odd.is_file());
        assert!(!base.join("Documents").exists());
    }

    #[test]
    fn test_exclude_globs_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::write(base.join("movie.mp4.part"), "partial").unwrap();
        fs::write(base.join("keep.txt"), "keep").unwrap();

        let config = AppConfig {
            exclude: vec!["*.part".to_string()],
            ..Default::default()
        };
        let report = SortEngine::from_config(&config)
            .unwrap()
            .run(base, false, &mut NoProgress)
            .unwrap();

        assert_eq!(report.actions.len(), 1);
        assert!(base.join("movie.mp4.part").exists());
    }

    #[test]
    fn test_missing_target_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let result = engine().run(&temp_dir.path().join("nope"), false, &mut NoProgress);
        assert!(matches!(
            result,
            Err(SortError::InvalidTargetDirectory { .. })
        ));
    }

    #[test]
    fn test_progress_reports_each_file() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::write(base.join("a.txt"), "a").unwrap();
        fs::write(base.join("b.txt"), "b").unwrap();

        let mut events = Vec::new();
        let mut sink = |current: usize, total: usize, message: &str| {
            events.push((current, total, message.to_string()));
        };
        engine().run(base, true, &mut sink).unwrap();

        assert_eq!(
            events,
            vec![
                (1, 2, "Processing a.txt...".to_string()),
                (2, 2, "Processing b.txt...".to_string()),
            ]
        );
    }

    #[test]
    fn test_collision_with_existing_category_file() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::create_dir(base.join("Documents")).unwrap();
        fs::write(base.join("Documents").join("notes.txt"), "old notes").unwrap();
        fs::write(base.join("notes.txt"), "new notes").unwrap();

        let report = engine().run(base, false, &mut NoProgress).unwrap();

        let canonical = fs::canonicalize(base).unwrap();
        assert_eq!(
            report.actions[0].destination,
            canonical.join("Documents").join("notes_1.txt")
        );
        assert_eq!(
            fs::read_to_string(base.join("Documents").join("notes.txt")).unwrap(),
            "old notes"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_still_classified() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let locked = base.join("locked.txt");
        fs::write(&locked, "secret").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let report = engine().run(base, false, &mut NoProgress).unwrap();

        // Moving only needs write access to the directory, not the file.
        assert!(report.failures.is_empty());
        assert_eq!(report.stats.get("Documents"), 1);
        assert!(base.join("Documents").join("locked.txt").exists());
    }
}
