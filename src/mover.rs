/// Collision-safe file moves.
///
/// Every move is a single `rename`, so a crash can never leave a truncated
/// destination or two copies of the same content. When the destination
/// name is taken, `_1`, `_2`, ... is inserted before the extension until a
/// free name turns up.
use crate::error::{SortError, SortResult};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// Moves files into place without overwriting anything.
pub struct Mover;

impl Mover {
    /// Moves `source` into `destination_dir` under `base_name`, renaming on collision.
    ///
    /// The destination directory is created if it does not exist yet.
    ///
    /// # Returns
    ///
    /// The path the file actually landed at, which differs from
    /// `destination_dir/base_name` when that name was already taken.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use quicksortbox::mover::Mover;
    /// use std::path::Path;
    ///
    /// let landed = Mover::move_safely(
    ///     Path::new("/downloads/photo.jpg"),
    ///     Path::new("/downloads/Images"),
    ///     "photo.jpg",
    /// );
    /// match landed {
    ///     Ok(path) => println!("Moved to {}", path.display()),
    ///     Err(e) => eprintln!("Move failed: {}", e),
    /// }
    /// ```
    pub fn move_safely(
        source: &Path,
        destination_dir: &Path,
        base_name: impl AsRef<OsStr>,
    ) -> SortResult<PathBuf> {
        Self::ensure_dir(destination_dir)?;

        let destination = Self::free_destination(&destination_dir.join(base_name.as_ref()));

        fs::rename(source, &destination).map_err(|e| SortError::FileMoveFailure {
            source_path: source.to_path_buf(),
            destination: destination.clone(),
            source: e,
        })?;

        Ok(destination)
    }

    /// Moves `current` back to `original`, recreating the original parent directory.
    ///
    /// Anything already sitting at `original` is first renamed to a
    /// timestamped `.bak` name so it is never overwritten.
    pub fn restore(current: &Path, original: &Path) -> SortResult<()> {
        if let Some(parent) = original.parent() {
            Self::ensure_dir(parent)?;
        }

        if original.exists() {
            let backup = Self::backup_path(original);
            fs::rename(original, &backup).map_err(|e| SortError::FileMoveFailure {
                source_path: original.to_path_buf(),
                destination: backup,
                source: e,
            })?;
        }

        fs::rename(current, original).map_err(|e| SortError::FileMoveFailure {
            source_path: current.to_path_buf(),
            destination: original.to_path_buf(),
            source: e,
        })
    }

    /// Returns `path` if it is free, otherwise the first free `stem_N.ext` sibling.
    pub fn free_destination(path: &Path) -> PathBuf {
        if !path.exists() {
            return path.to_path_buf();
        }

        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let stem = path.file_stem().unwrap_or_default();
        let extension = path.extension();

        (1u64..)
            .map(|counter| {
                let mut name = OsString::from(stem);
                name.push(format!("_{}", counter));
                if let Some(ext) = extension {
                    name.push(".");
                    name.push(ext);
                }
                parent.join(name)
            })
            .find(|candidate| !candidate.exists())
            .unwrap_or_else(|| path.to_path_buf())
    }

    fn ensure_dir(dir: &Path) -> SortResult<()> {
        if dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|e| SortError::DirectoryCreationFailed {
            path: dir.to_path_buf(),
            source: e,
        })
    }

    /// Example: `file.txt` becomes `file.txt.bak.20251109-143052`
    fn backup_path(original_path: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let mut backup_name = original_path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("file"));
        backup_name.push(format!(".bak.{}", timestamp));

        let backup = original_path.with_file_name(backup_name);
        Self::free_destination(&backup)
    }
}
