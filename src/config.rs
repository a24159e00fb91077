//! Persisted runner configuration.
//!
//! The config is a single JSON object at a user-scoped path. Loading never
//! fails: unreadable or malformed files fall back to defaults so a broken
//! config cannot lock the user out of the runner.
use crate::catalog;
use crate::queue::StepQueue;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "STEPQ_CONFIG";
pub const DEFAULT_REPORT_FILE: &str = "issues.html";
const CONFIG_DIR_NAME: &str = "stepq";
const CONFIG_FILE_NAME: &str = "config.json";

/// On-disk shape of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub project_dir: String,
    #[serde(default)]
    pub report_file: Option<String>,
    #[serde(default)]
    pub steps_order: Option<Vec<String>>,
    /// Catalog names known when the file was written. Lets load tell a step the
    /// user removed apart from a step kind introduced after the save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_steps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_tool: Option<String>,
}

/// Normalized session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedConfig {
    pub project_dir: PathBuf,
    pub report_file: String,
    pub queue: StepQueue,
    pub analysis_tool: Option<String>,
}

impl Default for PersistedConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::new(),
            report_file: DEFAULT_REPORT_FILE.to_string(),
            queue: StepQueue::catalog_order(),
            analysis_tool: None,
        }
    }
}

impl PersistedConfig {
    pub fn from_file(file: ConfigFile) -> Self {
        let queue = match file.steps_order {
            Some(order) => normalize_order(&order, file.known_steps.as_deref()),
            None => StepQueue::catalog_order(),
        };
        let report_file = file
            .report_file
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REPORT_FILE.to_string());
        Self {
            project_dir: PathBuf::from(file.project_dir),
            report_file,
            queue,
            analysis_tool: file.analysis_tool.filter(|value| !value.trim().is_empty()),
        }
    }

    pub fn to_file(&self) -> ConfigFile {
        ConfigFile {
            project_dir: self.project_dir.display().to_string(),
            report_file: Some(self.report_file.clone()),
            steps_order: Some(self.queue.to_strings()),
            known_steps: Some(catalog::names()),
            analysis_tool: self.analysis_tool.clone(),
        }
    }

    pub fn has_project(&self) -> bool {
        !self.project_dir.as_os_str().is_empty()
    }
}

/// Drop unknown names, then append catalog steps the saved order never knew.
///
/// Files written before `known_steps` existed keep the older rule and get
/// every missing catalog step appended. An order that keeps nothing usable
/// falls back to catalog order.
fn normalize_order(order: &[String], known: Option<&[String]>) -> StepQueue {
    let mut queue = StepQueue::from_names(order);
    for step in catalog::CATALOG {
        let known_at_save = known
            .map(|known| known.iter().any(|name| name == step.name))
            .unwrap_or(false);
        if !known_at_save {
            queue = queue.add(step.name);
        }
    }
    if queue.is_empty() {
        return StepQueue::catalog_order();
    }
    queue
}

/// Resolve the config path: explicit flag, then `$STEPQ_CONFIG`, then the
/// platform config directory.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(value) = std::env::var(CONFIG_ENV) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    let base = dirs::config_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("cannot determine a config directory; pass --config"))?;
    Ok(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load config from `path`, falling back to defaults on any failure.
pub fn load(path: &Path) -> PersistedConfig {
    match read_config_file(path) {
        Ok(Some(file)) => PersistedConfig::from_file(file),
        Ok(None) => PersistedConfig::default(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %format!("{err:#}"), "ignoring unreadable config");
            PersistedConfig::default()
        }
    }
}

fn read_config_file(path: &Path) -> Result<Option<ConfigFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let file: ConfigFile = serde_json::from_slice(&bytes).context("parse config JSON")?;
    Ok(Some(file))
}

/// Replace the config file with the current settings.
pub fn save(config: &PersistedConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(&config.to_file()).context("serialize config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
