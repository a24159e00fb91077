//! Lint baseline follow-up.
//!
//! A failed lint run whose output points at a baseline file can be fixed by
//! regenerating the baseline. The decision is a pure function of the lint
//! step's result; running the corrective task is separate.
use crate::catalog::LINT_STEP;
use crate::executor::RunResult;
use crate::gate;
use crate::process;
use anyhow::{anyhow, Result};
use std::path::Path;

/// Output fragment lint prints when a baseline would suppress the failures.
pub const BASELINE_SIGNATURE: &str = "baseline = file";

/// Whether `result` warrants offering the baseline task.
pub fn evaluate(result: &RunResult) -> bool {
    result.step_name == LINT_STEP
        && !result.succeeded
        && result.captured_output.contains(BASELINE_SIGNATURE)
}

/// Run the baseline task, forwarding output lines to `on_line`.
///
/// Returns whether the task succeeded. Only launch failures are errors.
pub fn run_baseline<F>(project_dir: &Path, on_line: F) -> Result<bool>
where
    F: FnMut(String),
{
    if !gate::wrapper_available(project_dir) {
        return Err(anyhow!(
            "{} not found in {}",
            gate::wrapper_script_name(),
            project_dir.display()
        ));
    }
    let spec = process::follow_up_command(project_dir);
    let code = process::run_streaming(&spec, project_dir, on_line)?;
    tracing::info!(code = ?code, "lint baseline task finished");
    Ok(code == Some(0))
}
