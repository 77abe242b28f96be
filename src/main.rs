use clap::{Parser, Subcommand};
use quicksortbox::cli::{SortCommand, init_logging, run_cli};
use quicksortbox::output::OutputFormatter;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "quicksortbox",
    version,
    about = "Sort a folder into category subfolders, quarantine duplicates, and undo it."
)]
struct Cli {
    /// Directory to sort. Defaults to ~/Downloads.
    #[arg(long, value_name = "DIR", global = true)]
    path: Option<PathBuf>,

    /// Show what would happen without moving any files.
    #[arg(long, conflicts_with = "undo")]
    dry_run: bool,

    /// Undo the last sort using the directory's action log.
    #[arg(long)]
    undo: bool,

    /// Category configuration file.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect or create the category configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the configuration that a sort would use.
    Show,
    /// Write the built-in categories to the configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn default_target() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join("Downloads"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let command = match cli.command {
        Some(Commands::Config {
            action: ConfigAction::Show,
        }) => SortCommand::ShowConfig,
        Some(Commands::Config {
            action: ConfigAction::Init { force },
        }) => SortCommand::InitConfig { force },
        None if cli.undo => SortCommand::Undo,
        None => SortCommand::Sort {
            dry_run: cli.dry_run,
        },
    };

    let target = cli.path.unwrap_or_else(default_target);

    match run_cli(command, &target, cli.config.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
