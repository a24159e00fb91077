//! CLI argument parsing for the step runner.
//!
//! The CLI is the control surface: it holds the current queue value through a
//! session, starts runs, and renders their events.
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "stepq",
    version,
    about = "Run an ordered queue of build and analysis steps against an Android project",
    after_help = "Examples:\n  stepq config set-project ~/src/my-app\n  stepq steps list\n  stepq steps move 3 up\n  stepq run\n  stepq baseline\n  stepq report",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Config file (defaults to $STEPQ_CONFIG, then the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit debug logs to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect and rearrange the step queue
    #[command(subcommand)]
    Steps(StepsCommand),
    /// Show or change persisted settings
    #[command(subcommand)]
    Config(ConfigCommand),
    Run(RunArgs),
    Baseline(BaselineArgs),
    Report(ReportArgs),
}

#[derive(Subcommand, Debug)]
pub enum StepsCommand {
    /// Show the queue and the steps that can be added
    List,
    /// Append a catalog step to the queue
    Add {
        /// Step name, e.g. "Run Lint"
        name: String,
    },
    /// Remove the step at a 1-based queue position
    Remove {
        #[arg(value_name = "INDEX")]
        index: usize,
    },
    /// Move the step at a 1-based queue position one slot
    Move {
        #[arg(value_name = "INDEX")]
        index: usize,
        #[arg(value_enum)]
        direction: MoveDirection,
    },
    /// Restore the full catalog order
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the persisted settings
    Show,
    /// Select the project directory and re-check step availability
    SetProject {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
    /// Report file path, relative to the project directory
    SetReport {
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// Analysis tool command line; an empty value clears it
    SetTool {
        #[arg(value_name = "CMD")]
        command: String,
    },
}

/// Run the queue.
#[derive(Parser, Debug)]
#[command(about = "Run every queued step in order and summarize the results")]
pub struct RunArgs {
    /// Project directory for this run (saved as the new project)
    #[arg(long, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Analysis tool command line for this run only
    #[arg(long, value_name = "CMD")]
    pub tool: Option<String>,
}

/// Create the lint baseline.
#[derive(Parser, Debug)]
#[command(about = "Create a lint baseline after a lint failure that offered one")]
pub struct BaselineArgs {
    /// Run even if the last run did not offer a baseline
    #[arg(long)]
    pub force: bool,
}

/// Open the generated report.
#[derive(Parser, Debug)]
#[command(about = "Open the generated report with the platform's default handler")]
pub struct ReportArgs {
    /// Print the report path instead of opening it
    #[arg(long)]
    pub print: bool,
}
