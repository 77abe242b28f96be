//! quicksortbox - sort a directory into category folders, reversibly
//!
//! This library scans the direct files of a directory, quarantines byte-identical
//! duplicates, moves everything else into category subfolders chosen by extension,
//! and records each move in an append-only action log so the whole run can be undone.

pub mod action_log;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod hasher;
pub mod mover;
pub mod output;
pub mod progress;
pub mod sorter;
pub mod undo;

pub use action_log::{ActionKind, ActionLog, ActionLogEntry};
pub use classifier::{CategoryTable, categorize};
pub use config::AppConfig;
pub use error::{SortError, SortResult};
pub use progress::{ChannelSink, NoProgress, ProgressEvent, ProgressSink};
pub use sorter::{PlannedAction, RunStats, SortEngine, SortReport};
pub use undo::{UndoEngine, UndoReport};

pub use cli::{SortCommand, run_cli};
