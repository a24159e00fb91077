//! Command handlers behind the CLI.
//!
//! Handlers map core decisions (gate removals, follow-up offers, report
//! availability) to console output. Persistence failures are printed as
//! warnings and never discard the in-memory queue.
use crate::catalog;
use crate::classify::LineClass;
use crate::cli::{
    BaselineArgs, Command, ConfigCommand, MoveDirection, ReportArgs, RootArgs, RunArgs,
    StepsCommand,
};
use crate::config;
use crate::console::{self, Console};
use crate::executor::{self, RunContext, RunState};
use crate::followup;
use crate::gate;
use crate::lock::{self, RunLock};
use crate::process;
use crate::queue::Direction;
use crate::record::{self, RunRecord};
use crate::report;
use crate::session::Session;
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

pub fn dispatch(args: RootArgs) -> Result<ExitCode> {
    let config_path = config::config_path(args.config.as_deref())?;
    let console = Console::new();
    let mut session = Session::load(config_path);

    match args.command {
        Command::Steps(command) => cmd_steps(&mut session, &console, command),
        Command::Config(command) => cmd_config(&mut session, &console, command),
        Command::Run(run_args) => cmd_run(&mut session, console, run_args),
        Command::Baseline(baseline_args) => cmd_baseline(&session, &console, baseline_args),
        Command::Report(report_args) => cmd_report(&session, report_args),
    }
}

fn warn_on_save_error(console: &Console, saved: Result<()>) {
    if let Err(err) = saved {
        console.warn(&format!("failed to save: {err:#}"));
    }
}

fn warn_removed(console: &Console, removed: &BTreeSet<&'static str>, project_dir: &Path) {
    for name in removed {
        console.warn(&format!(
            "removed \"{name}\": {} not found in {}",
            gate::wrapper_script_name(),
            project_dir.display()
        ));
    }
}

/// Switch to `dir` and drop steps it cannot run.
fn select_project(session: &mut Session, console: &Console, dir: PathBuf) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(anyhow!("{} is not a directory", dir.display()));
    }
    let dir = dir.canonicalize().unwrap_or(dir);
    let (removed, saved) = session.set_project(dir.clone());
    warn_removed(console, &removed, &dir);
    warn_on_save_error(console, saved);
    Ok(dir)
}

/// Convert a 1-based position to a queue index.
fn queue_index(session: &Session, position: usize) -> Result<usize> {
    let len = session.queue().len();
    if position == 0 || position > len {
        return Err(anyhow!("no step at position {position} (queue has {len})"));
    }
    Ok(position - 1)
}

fn print_queue(session: &Session) {
    let queue = session.queue();
    if queue.is_empty() {
        println!("Queue is empty.");
    } else {
        println!("Queue:");
        for (index, name) in queue.names().iter().enumerate() {
            println!("  {}. {}", index + 1, name);
        }
    }
    let addable = session.addable();
    if !addable.is_empty() {
        println!("Available to add: {}", addable.join(", "));
    }
    let unavailable: Vec<&str> = queue
        .available_to_add()
        .into_iter()
        .filter(|name| !addable.contains(name))
        .collect();
    if !unavailable.is_empty() {
        println!(
            "Unavailable without {}: {}",
            gate::wrapper_script_name(),
            unavailable.join(", ")
        );
    }
}

fn cmd_steps(
    session: &mut Session,
    console: &Console,
    command: StepsCommand,
) -> Result<ExitCode> {
    match command {
        StepsCommand::List => {
            let (removed, saved) = session.apply_gate();
            warn_removed(console, &removed, &session.config().project_dir);
            warn_on_save_error(console, saved);
        }
        StepsCommand::Add { name } => {
            let step = catalog::lookup_name(&name)
                .and_then(catalog::find)
                .ok_or_else(|| {
                    anyhow!(
                        "unknown step {name:?}; known steps: {}",
                        catalog::names().join(", ")
                    )
                })?;
            if session.queue().contains(step.name) {
                println!("\"{}\" is already queued.", step.name);
            } else if session.config().has_project()
                && !gate::is_runnable(step, &session.config().project_dir)
            {
                return Err(anyhow!(
                    "\"{}\" needs {} in {}",
                    step.name,
                    gate::wrapper_script_name(),
                    session.config().project_dir.display()
                ));
            } else {
                warn_on_save_error(console, session.add_step(step.name));
            }
        }
        StepsCommand::Remove { index } => {
            let index = queue_index(session, index)?;
            warn_on_save_error(console, session.remove_step(index));
        }
        StepsCommand::Move { index, direction } => {
            let index = queue_index(session, index)?;
            let direction = match direction {
                MoveDirection::Up => Direction::Up,
                MoveDirection::Down => Direction::Down,
            };
            warn_on_save_error(console, session.move_step(index, direction));
        }
        StepsCommand::Reset => {
            warn_on_save_error(console, session.reset_steps());
            let (removed, saved) = session.apply_gate();
            warn_removed(console, &removed, &session.config().project_dir);
            warn_on_save_error(console, saved);
        }
    }
    print_queue(session);
    Ok(ExitCode::SUCCESS)
}

fn cmd_config(
    session: &mut Session,
    console: &Console,
    command: ConfigCommand,
) -> Result<ExitCode> {
    match command {
        ConfigCommand::Show => {
            println!("# {}", session.config_path().display());
            let text = serde_json::to_string_pretty(&session.config().to_file())?;
            println!("{text}");
        }
        ConfigCommand::SetProject { dir } => {
            let dir = select_project(session, console, dir)?;
            println!("Project directory: {}", dir.display());
            print_queue(session);
        }
        ConfigCommand::SetReport { file } => {
            if file.trim().is_empty() || Path::new(&file).is_absolute() {
                return Err(anyhow!("report file must be a path relative to the project"));
            }
            warn_on_save_error(console, session.set_report_file(file.clone()));
            println!("Report file: {file}");
        }
        ConfigCommand::SetTool { command } => {
            let tool = if command.trim().is_empty() {
                None
            } else {
                shell_words::split(&command)
                    .with_context(|| format!("parse tool command {command:?}"))?;
                Some(command)
            };
            warn_on_save_error(console, session.set_analysis_tool(tool));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_run(session: &mut Session, mut console: Console, args: RunArgs) -> Result<ExitCode> {
    if let Some(dir) = args.project {
        select_project(session, &console, dir)?;
    } else {
        let (removed, saved) = session.apply_gate();
        warn_removed(&console, &removed, &session.config().project_dir);
        warn_on_save_error(&console, saved);
    }

    let project_dir = executor::project_root(&session.config().project_dir)?;
    let analysis_tool = process::resolve_analysis_tool(
        args.tool.as_deref(),
        session.config().analysis_tool.as_deref(),
    )?;
    let steps = session.queue().definitions();
    if steps.is_empty() {
        console.warn("the step queue is empty; add steps with `stepq steps add`");
    }
    tracing::info!(
        project_dir = %project_dir.display(),
        queue = %session.queue(),
        "starting run"
    );

    let handle = executor::spawn_run(
        steps,
        RunContext {
            project_dir: project_dir.clone(),
            analysis_tool,
            lock_dir: lock::lock_dir(session.config_path()),
        },
    )?;
    for event in handle.events.iter() {
        console.render(&event);
    }
    let summary = handle.join()?;
    if console.state() != RunState::Completed {
        console.warn("run ended before its summary was received");
    }

    let report_file = session.config().report_file.clone();
    let report_present = report::report_exists(&project_dir, &report_file);
    for hint in console::summary_hints(&summary, report_present) {
        println!("{hint}");
    }

    let exit = if summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    };
    let record_path = record::record_path(session.config_path());
    let saved = RunRecord::new(&project_dir, &report_file, summary)
        .and_then(|record| record::write(&record_path, &record));
    warn_on_save_error(&console, saved);
    warn_on_save_error(&console, session.persist());
    Ok(exit)
}

fn cmd_baseline(session: &Session, console: &Console, args: BaselineArgs) -> Result<ExitCode> {
    let project_dir = executor::project_root(&session.config().project_dir)?;
    let record_path = record::record_path(session.config_path());
    let mut last_run = record::load(&record_path);
    let offered = last_run
        .as_ref()
        .map(|record| record.followup_offered_for(&project_dir))
        .unwrap_or(false);
    if !offered && !args.force {
        return Err(anyhow!(
            "the last run of {} did not offer a lint baseline; run `stepq run` or pass --force",
            project_dir.display()
        ));
    }

    let _lock = RunLock::acquire(&lock::lock_dir(session.config_path()), &project_dir)?;
    console.section("Creating Lint Baseline");
    let created =
        followup::run_baseline(&project_dir, |line| console.line(LineClass::Info, &line))?;
    if !created {
        console.line(LineClass::Error, "❌ Baseline failed.");
        return Ok(ExitCode::from(1));
    }

    console.line(LineClass::Success, "✅ Baseline created successfully.");
    if let Some(record) = last_run.as_mut().filter(|record| record.project_dir == project_dir) {
        record.summary.followup_offered = false;
        warn_on_save_error(console, record::write(&record_path, record));
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_report(session: &Session, args: ReportArgs) -> Result<ExitCode> {
    let config = session.config();
    if !config.has_project() {
        return Err(anyhow!("no project directory configured"));
    }
    let path = report::report_path(&config.project_dir, &config.report_file);
    if !path.is_file() {
        return Err(anyhow!("report not found: {}", path.display()));
    }
    if args.print {
        println!("{}", path.display());
    } else {
        report::open_report(&path)?;
    }
    Ok(ExitCode::SUCCESS)
}
