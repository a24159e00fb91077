//! External command launching with merged, line-streamed output.
//!
//! The child's stdout and stderr share one pipe. A reader thread forwards a
//! line as soon as its terminator arrives, so callers can echo output live in
//! the order the child wrote it.
use crate::catalog::{Invocation, StepDefinition, BASELINE_TASK};
use crate::gate;
use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

pub const ANALYSIS_TOOL_ENV: &str = "STEPQ_ANALYSIS_TOOL";
pub const DEFAULT_ANALYSIS_TOOL: &str = "android_health_check";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Shell-quoted command line for logs and console output.
    pub fn display(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.display().to_string());
        words.extend(self.args.iter().cloned());
        shell_words::join(words)
    }
}

/// Pick the analysis tool command line: explicit value, config value, env,
/// then a `PATH` lookup of the default tool name.
///
/// An unresolvable tool still yields the bare default name; launching it fails
/// per step and is recorded like any other step failure.
pub fn resolve_analysis_tool(
    explicit: Option<&str>,
    configured: Option<&str>,
) -> Result<Vec<String>> {
    let env_value = std::env::var(ANALYSIS_TOOL_ENV).ok();
    let candidates = [explicit, configured, env_value.as_deref()];
    for value in candidates.into_iter().flatten() {
        if value.trim().is_empty() {
            continue;
        }
        let parts = shell_words::split(value)
            .with_context(|| format!("parse analysis tool command: {value}"))?;
        if !parts.is_empty() {
            return Ok(parts);
        }
    }
    let program = which::which(DEFAULT_ANALYSIS_TOOL)
        .map(|path| path.display().to_string())
        .unwrap_or_else(|_| DEFAULT_ANALYSIS_TOOL.to_string());
    Ok(vec![program])
}

/// Build the command for one step.
pub fn resolve(
    step: &StepDefinition,
    project_dir: &Path,
    tool: &[String],
) -> Result<CommandSpec> {
    match step.invocation {
        Invocation::AnalysisTool { flags } => {
            let (program, prefix) = tool
                .split_first()
                .ok_or_else(|| anyhow!("analysis tool command is empty"))?;
            let mut args = prefix.to_vec();
            args.push("--project-dir".to_string());
            args.push(project_dir.display().to_string());
            args.extend(flags.iter().map(|flag| flag.to_string()));
            Ok(CommandSpec::new(program, args))
        }
        Invocation::BuildWrapper { task } => Ok(wrapper_command(project_dir, task)),
    }
}

pub fn wrapper_command(project_dir: &Path, task: &str) -> CommandSpec {
    CommandSpec::new(gate::wrapper_path(project_dir), vec![task.to_string()])
}

/// Command for the lint baseline follow-up.
pub fn follow_up_command(project_dir: &Path) -> CommandSpec {
    wrapper_command(project_dir, BASELINE_TASK)
}

/// A launched process whose output has not been fully consumed yet.
pub struct RunningProcess {
    child: Child,
    lines: Receiver<String>,
    reader: Option<JoinHandle<()>>,
    started: Instant,
    label: String,
}

/// Launch `spec` in `working_dir` with stdout and stderr sharing one pipe.
///
/// Both descriptors point at the same pipe, so lines arrive in the order the
/// child wrote them.
pub fn spawn(spec: &CommandSpec, working_dir: &Path) -> Result<RunningProcess> {
    let label = spec.display();
    tracing::debug!(command = %label, cwd = %working_dir.display(), "spawn");
    let (reader, writer) = std::io::pipe().context("create output pipe")?;
    let stdout_writer = writer.try_clone().context("clone output pipe")?;
    let child = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(stdout_writer)
        .stderr(writer)
        .spawn()
        .with_context(|| format!("spawn {}", spec.program.display()))?;

    let (tx, rx) = mpsc::channel();
    let reader = spawn_reader(reader, tx);

    Ok(RunningProcess {
        child,
        lines: rx,
        reader: Some(reader),
        started: Instant::now(),
        label,
    })
}

fn spawn_reader<R: Read + Send + 'static>(pipe: R, tx: Sender<String>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(decode_line(&buf)).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::debug!(error = %err, "output pipe read failed");
                    break;
                }
            }
        }
    })
}

fn decode_line(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.trim_end_matches('\n').trim_end_matches('\r').to_string()
}

impl RunningProcess {
    /// Output lines in the order written; ends once the pipe closes.
    pub fn lines(&mut self) -> mpsc::Iter<'_, String> {
        self.lines.iter()
    }

    /// Drain remaining output, then wait for exit.
    ///
    /// Returns the exit code, or `None` when the process ended by signal.
    pub fn wait(mut self) -> Result<Option<i32>> {
        for _ in self.lines.iter() {}
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                tracing::warn!(command = %self.label, "output reader panicked");
            }
        }
        let status = self
            .child
            .wait()
            .with_context(|| format!("wait for {}", self.label))?;
        tracing::info!(
            command = %self.label,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            code = ?status.code(),
            "process exited"
        );
        Ok(status.code())
    }
}

/// Run `spec` to completion, handing each line to `on_line` as it arrives.
pub fn run_streaming<F>(
    spec: &CommandSpec,
    working_dir: &Path,
    mut on_line: F,
) -> Result<Option<i32>>
where
    F: FnMut(String),
{
    let mut process = spawn(spec, working_dir)?;
    for line in process.lines() {
        on_line(line);
    }
    process.wait()
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
