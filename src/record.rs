//! Last-run record kept next to the config.
//!
//! The record carries the follow-up and report decisions of the most recent
//! run so later commands can act on them.
use crate::executor::RunSummary;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const RECORD_FILE_NAME: &str = "last_run.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub project_dir: PathBuf,
    pub report_file: String,
    pub finished_at_epoch_ms: u128,
    pub summary: RunSummary,
}

impl RunRecord {
    pub fn new(project_dir: &Path, report_file: &str, summary: RunSummary) -> Result<Self> {
        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            report_file: report_file.to_string(),
            finished_at_epoch_ms: now_epoch_ms()?,
            summary,
        })
    }

    /// Whether the baseline follow-up is still on offer for `project_dir`.
    pub fn followup_offered_for(&self, project_dir: &Path) -> bool {
        self.summary.followup_offered && self.project_dir == project_dir
    }
}

pub fn now_epoch_ms() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before unix epoch")?
        .as_millis())
}

/// Record path for a given config file.
pub fn record_path(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) => parent.join(RECORD_FILE_NAME),
        None => PathBuf::from(RECORD_FILE_NAME),
    }
}

/// Load the last record; a missing or unreadable record reads as no run.
pub fn load(path: &Path) -> Option<RunRecord> {
    let bytes = fs::read(path).ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(record) => Some(record),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable run record");
            None
        }
    }
}

pub fn write(path: &Path, record: &RunRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(record).context("serialize run record")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
