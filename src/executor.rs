//! Sequential queue execution.
//!
//! One worker runs every queued step in order, each to completion. A failing
//! step never stops the queue. Progress is published as typed events over a
//! channel so the consumer can render output while the worker is blocked on a
//! child process.
use crate::catalog::{self, StepDefinition};
use crate::classify::{classify_line, LineClass};
use crate::followup;
use crate::lock::RunLock;
use crate::process;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Outcome of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub step_name: String,
    pub succeeded: bool,
    /// `None` when the step could not be launched or ended by signal.
    pub exit_code: Option<i32>,
    pub captured_output: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub results: Vec<RunResult>,
    pub report_available: bool,
    pub followup_offered: bool,
}

impl RunSummary {
    pub fn from_results(results: Vec<RunResult>) -> Self {
        let report_available = results
            .iter()
            .any(|result| result.step_name == catalog::REPORT_STEP && result.succeeded);
        let followup_offered = results.iter().any(followup::evaluate);
        Self {
            results,
            report_available,
            followup_offered,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|result| result.succeeded)
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|result| !result.succeeded).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    StepStarted {
        index: usize,
        total: usize,
        name: &'static str,
        command: String,
    },
    Line {
        step: &'static str,
        class: LineClass,
        text: String,
    },
    StepFinished(RunResult),
    RunFinished(RunSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running { index: usize, total: usize },
    Completed,
}

impl RunState {
    /// State after observing `event`.
    pub fn advance(self, event: &RunEvent) -> RunState {
        match event {
            RunEvent::StepStarted { index, total, .. } => RunState::Running {
                index: *index,
                total: *total,
            },
            RunEvent::RunFinished(_) => RunState::Completed,
            RunEvent::Line { .. } | RunEvent::StepFinished(_) => self,
        }
    }
}

/// Inputs shared by every step of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub project_dir: PathBuf,
    /// Analysis tool argv prefix.
    pub analysis_tool: Vec<String>,
    /// Where the project's run lock lives.
    pub lock_dir: PathBuf,
}

fn emit(events: &Sender<RunEvent>, event: RunEvent) {
    // A consumer that stopped listening does not stop the run.
    let _ = events.send(event);
}

/// Run `steps` in order on the current thread.
pub fn execute(
    steps: &[&'static StepDefinition],
    context: &RunContext,
    events: &Sender<RunEvent>,
) -> RunSummary {
    let total = steps.len();
    let mut results = Vec::with_capacity(total);
    for (index, step) in steps.iter().copied().enumerate() {
        let result = execute_step(step, index, total, context, events);
        if followup::evaluate(&result) {
            tracing::info!(step = step.name, "lint baseline follow-up offered");
        }
        emit(events, RunEvent::StepFinished(result.clone()));
        results.push(result);
    }
    let summary = RunSummary::from_results(results);
    tracing::info!(
        steps = total,
        failed = summary.failed_count(),
        report_available = summary.report_available,
        followup_offered = summary.followup_offered,
        "run finished"
    );
    emit(events, RunEvent::RunFinished(summary.clone()));
    summary
}

fn execute_step(
    step: &'static StepDefinition,
    index: usize,
    total: usize,
    context: &RunContext,
    events: &Sender<RunEvent>,
) -> RunResult {
    let started = |command: String| RunEvent::StepStarted {
        index,
        total,
        name: step.name,
        command,
    };
    let spec = match process::resolve(step, &context.project_dir, &context.analysis_tool) {
        Ok(spec) => spec,
        Err(err) => {
            emit(events, started(String::new()));
            return launch_failure(step, String::new(), &err, events);
        }
    };
    emit(events, started(spec.display()));

    let mut captured = String::new();
    let outcome = process::run_streaming(&spec, &context.project_dir, |text| {
        captured.push_str(&text);
        captured.push('\n');
        let class = classify_line(&text);
        emit(
            events,
            RunEvent::Line {
                step: step.name,
                class,
                text,
            },
        );
    });

    match outcome {
        Ok(exit_code) => RunResult {
            step_name: step.name.to_string(),
            succeeded: exit_code == Some(0),
            exit_code,
            captured_output: captured,
        },
        Err(err) => launch_failure(step, captured, &err, events),
    }
}

/// Record a step that could not be launched or waited on.
fn launch_failure(
    step: &StepDefinition,
    mut captured: String,
    err: &anyhow::Error,
    events: &Sender<RunEvent>,
) -> RunResult {
    tracing::warn!(step = step.name, error = %format!("{err:#}"), "step launch failed");
    let text = format!("failed to launch {}: {err:#}", step.name);
    captured.push_str(&text);
    captured.push('\n');
    emit(
        events,
        RunEvent::Line {
            step: step.name,
            class: LineClass::Error,
            text,
        },
    );
    RunResult {
        step_name: step.name.to_string(),
        succeeded: false,
        exit_code: None,
        captured_output: captured,
    }
}

/// A queue run executing on a background worker.
pub struct RunHandle {
    pub events: Receiver<RunEvent>,
    worker: JoinHandle<RunSummary>,
}

impl RunHandle {
    /// Wait for the worker and return its summary.
    pub fn join(self) -> Result<RunSummary> {
        self.worker
            .join()
            .map_err(|_| anyhow!("queue worker panicked"))
    }
}

/// Lock the project directory and run `steps` on a worker thread.
///
/// Fails immediately when another run holds the project's lock.
pub fn spawn_run(
    steps: Vec<&'static StepDefinition>,
    context: RunContext,
) -> Result<RunHandle> {
    let lock = RunLock::acquire(&context.lock_dir, &context.project_dir)?;
    tracing::debug!(lock = %lock.path().display(), steps = steps.len(), "starting queue worker");
    let (tx, rx) = mpsc::channel();
    let worker = thread::Builder::new()
        .name("stepq-run".to_string())
        .spawn(move || {
            let _lock = lock;
            execute(&steps, &context, &tx)
        })?;
    Ok(RunHandle { events: rx, worker })
}

/// Canonical project directory for a run; relative wrapper paths would
/// otherwise resolve against the child's working directory.
pub fn project_root(project_dir: &Path) -> Result<PathBuf> {
    if project_dir.as_os_str().is_empty() {
        return Err(anyhow!("no project directory configured"));
    }
    let root = project_dir
        .canonicalize()
        .with_context(|| format!("resolve project directory {}", project_dir.display()))?;
    if !root.is_dir() {
        return Err(anyhow!("{} is not a directory", root.display()));
    }
    Ok(root)
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
