//! Command-line front-end for quicksortbox.
//!
//! This module handles:
//! - Dispatching sort, dry-run and undo commands to the engines
//! - Loading the category configuration and surfacing config warnings
//! - Showing and initializing the configuration file
//! - Logging setup for the binary

use crate::action_log::ActionKind;
use crate::config::{AppConfig, config_path};
use crate::output::{OutputFormatter, ProgressBarSink};
use crate::sorter::{SortEngine, SortReport};
use crate::undo::UndoEngine;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the `tracing` filter directives.
pub const LOG_ENV_VAR: &str = "QUICKSORTBOX_LOG";

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCommand {
    /// Sort files in a directory.
    Sort {
        /// If true, only preview the moves.
        dry_run: bool,
    },
    /// Undo the previous sort.
    Undo,
    /// Print the effective configuration.
    ShowConfig,
    /// Write the built-in configuration to the config file.
    InitConfig {
        /// Overwrite an existing config file.
        force: bool,
    },
}

/// Installs the stderr `tracing` subscriber, filtered by [`LOG_ENV_VAR`] (default `warn`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed by an embedding or a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Runs the CLI application with the given command.
///
/// # Arguments
///
/// * `command` - The command to execute
/// * `dir_path` - The directory to sort or restore
/// * `config` - Optional configuration file, `config.json` in the working directory otherwise
///
/// # Examples
///
/// ```no_run
/// use quicksortbox::cli::{run_cli, SortCommand};
/// use std::path::Path;
///
/// let result = run_cli(SortCommand::Sort { dry_run: true }, Path::new("/path/to/directory"), None);
/// match result {
///     Ok(()) => println!("Operation completed successfully"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(command: SortCommand, dir_path: &Path, config: Option<&Path>) -> Result<(), String> {
    match command {
        SortCommand::Sort { dry_run } => sort_directory(dir_path, config, dry_run),
        SortCommand::Undo => undo_sort(dir_path),
        SortCommand::ShowConfig => show_config(config),
        SortCommand::InitConfig { force } => init_config(config, force),
    }
}

/// Loads the config, warning (not failing) when it has to fall back to defaults.
fn load_config(config: Option<&Path>) -> (AppConfig, String) {
    let path = config_path(config);
    let loaded = AppConfig::load(&path);
    if let Some(warning) = &loaded.warning {
        OutputFormatter::warning(&format!("{}. Using built-in categories.", warning));
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (loaded.config, file_name)
}

/// Sorts (or previews sorting) `base_path` and prints what happened.
fn sort_directory(base_path: &Path, config: Option<&Path>, dry_run: bool) -> Result<(), String> {
    if !base_path.is_dir() {
        return Err(format!("Path '{}' does not exist.", base_path.display()));
    }

    let (config, config_file_name) = load_config(config);
    let mut engine = SortEngine::from_config(&config).map_err(|e| e.to_string())?;
    if !config_file_name.is_empty() {
        engine = engine.exclude_file_name(&config_file_name);
    }

    if dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing {}", base_path.display()));
    } else {
        OutputFormatter::info(&format!("Sorting {}", base_path.display()));
    }

    let mut sink = ProgressBarSink::new(OutputFormatter::create_progress_bar());
    let report = engine
        .run(base_path, dry_run, &mut sink)
        .map_err(|e| e.to_string())?;
    sink.finish("done");

    print_sort_report(&report);
    Ok(())
}

fn print_sort_report(report: &SortReport) {
    if report.simulated && !report.actions.is_empty() {
        OutputFormatter::header("Files would be sorted as follows:");
        for action in &report.actions {
            let verb = match action.kind {
                ActionKind::Move => "move",
                ActionKind::Duplicate => "quarantine",
            };
            OutputFormatter::plain(&format!(
                " - {} → would {} to {}",
                action.source.display(),
                verb,
                action.destination.display()
            ));
        }
    }

    for (path, reason) in &report.failures {
        OutputFormatter::warning(&format!("Skipped {}: {}", path.display(), reason));
    }

    let title = if report.simulated {
        "DRY RUN SUMMARY"
    } else {
        "SORT SUMMARY"
    };
    OutputFormatter::summary_table(title, &report.stats);

    if report.simulated {
        OutputFormatter::success("Dry run complete. No files were modified.");
    } else if report.failures.is_empty() {
        OutputFormatter::success("Sort complete. Use --undo to revert.");
    } else {
        OutputFormatter::warning("Some files could not be sorted. Please review the warnings above.");
    }
}

/// Reverts the last sort of `base_path` from its action log.
fn undo_sort(base_path: &Path) -> Result<(), String> {
    if !base_path.is_dir() {
        return Err(format!("Path '{}' does not exist.", base_path.display()));
    }

    OutputFormatter::info("Undoing previous sort...");
    let mut sink = ProgressBarSink::new(OutputFormatter::create_progress_bar());
    let outcome = UndoEngine::undo(base_path, &mut sink).map_err(|e| e.to_string())?;
    sink.finish("done");

    let Some(report) = outcome else {
        OutputFormatter::plain("Nothing to undo or log file missing.");
        return Ok(());
    };

    OutputFormatter::success(&format!("Restored {} files.", report.restored_files));

    if !report.skipped_files.is_empty() {
        OutputFormatter::warning(&format!(
            "Skipped {} entries whose files were no longer in place:",
            report.skipped_files.len()
        ));
        for path in &report.skipped_files {
            OutputFormatter::plain(&format!("    - {}", path.display()));
        }
    }

    if report.corrupt_entries > 0 {
        OutputFormatter::warning(&format!(
            "Ignored {} unreadable log entries.",
            report.corrupt_entries
        ));
    }

    if !report.failed_restores.is_empty() {
        OutputFormatter::error(&format!("Failed: {}", report.failed_restores.len()));
        for (path, reason) in &report.failed_restores {
            OutputFormatter::error(&format!("    - {}: {}", path.display(), reason));
        }
        OutputFormatter::warning("The action log was kept. Fix the issues above and undo again.");
    }

    Ok(())
}

fn show_config(config: Option<&Path>) -> Result<(), String> {
    let (config, _) = load_config(config);
    let json = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
    OutputFormatter::plain(&json);
    Ok(())
}

fn init_config(config: Option<&Path>, force: bool) -> Result<(), String> {
    let path = config_path(config);
    if path.exists() && !force {
        return Err(format!(
            "{} already exists. Pass --force to overwrite it.",
            path.display()
        ));
    }
    AppConfig::default().save(&path).map_err(|e| e.to_string())?;
    OutputFormatter::success(&format!("Wrote default configuration to {}", path.display()));
    Ok(())
}
