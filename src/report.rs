//! Report lookup and hand-off to the platform opener.
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const OPENER_ENV: &str = "STEPQ_OPENER";

pub fn report_path(project_dir: &Path, report_file: &str) -> PathBuf {
    project_dir.join(report_file)
}

pub fn report_exists(project_dir: &Path, report_file: &str) -> bool {
    report_path(project_dir, report_file).is_file()
}

/// Command that opens a file with the default handler for its type.
fn opener_command() -> Result<Vec<String>> {
    if let Ok(value) = std::env::var(OPENER_ENV) {
        if !value.trim().is_empty() {
            let parts = shell_words::split(&value)
                .with_context(|| format!("parse {OPENER_ENV}: {value}"))?;
            if !parts.is_empty() {
                return Ok(parts);
            }
        }
    }
    let parts: &[&str] = if cfg!(target_os = "macos") {
        &["open"]
    } else if cfg!(windows) {
        &["cmd", "/C", "start", ""]
    } else {
        &["xdg-open"]
    };
    Ok(parts.iter().map(|part| part.to_string()).collect())
}

/// Open the report at `path`.
pub fn open_report(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(anyhow!("report not found: {}", path.display()));
    }
    let mut cmd = opener_command()?;
    if cmd.is_empty() {
        return Err(anyhow!("missing opener command"));
    }
    let program = cmd.remove(0);
    let program = which::which(&program)
        .with_context(|| format!("locate report opener {program}"))?;
    tracing::debug!(opener = %program.display(), report = %path.display(), "open report");
    let status = Command::new(&program)
        .args(&cmd)
        .arg(path)
        .status()
        .with_context(|| format!("run {}", program.display()))?;
    if !status.success() {
        return Err(anyhow!("report opener exited with {status}"));
    }
    Ok(())
}
