//! Write-through session over the persisted config.
//!
//! Every mutation replaces the in-memory value first and then saves the whole
//! file. A failed save is returned to the caller but never rolls the value
//! back; the next successful save catches the file up.
use crate::config::{self, PersistedConfig};
use crate::gate;
use crate::queue::{Direction, StepQueue};
use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub struct Session {
    config_path: PathBuf,
    config: PersistedConfig,
}

impl Session {
    pub fn load(config_path: PathBuf) -> Self {
        let config = config::load(&config_path);
        Self {
            config_path,
            config,
        }
    }

    pub fn config(&self) -> &PersistedConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn queue(&self) -> &StepQueue {
        &self.config.queue
    }

    pub fn persist(&self) -> Result<()> {
        config::save(&self.config, &self.config_path)
    }

    fn replace_queue(&mut self, queue: StepQueue) -> Result<()> {
        self.config.queue = queue;
        self.persist()
    }

    pub fn move_step(&mut self, index: usize, direction: Direction) -> Result<()> {
        let next = self.config.queue.reorder(index, direction);
        self.replace_queue(next)
    }

    pub fn remove_step(&mut self, index: usize) -> Result<()> {
        let next = self.config.queue.remove(index);
        self.replace_queue(next)
    }

    pub fn add_step(&mut self, name: &str) -> Result<()> {
        let next = self.config.queue.add(name);
        self.replace_queue(next)
    }

    pub fn reset_steps(&mut self) -> Result<()> {
        self.replace_queue(StepQueue::catalog_order())
    }

    /// Drop queued steps the current project cannot run.
    ///
    /// Returns the removed names and, separately, a save failure if the queue
    /// changed but could not be written.
    pub fn apply_gate(&mut self) -> (BTreeSet<&'static str>, Result<()>) {
        if !self.config.has_project() {
            return (BTreeSet::new(), Ok(()));
        }
        let outcome = gate::filter(&self.config.queue, &self.config.project_dir);
        if outcome.removed.is_empty() {
            return (outcome.removed, Ok(()));
        }
        let saved = self.replace_queue(outcome.queue);
        (outcome.removed, saved)
    }

    /// Switch projects and re-run the availability gate.
    pub fn set_project(&mut self, project_dir: PathBuf) -> (BTreeSet<&'static str>, Result<()>) {
        self.config.project_dir = project_dir;
        let saved = self.persist();
        let (removed, gated) = self.apply_gate();
        (removed, saved.and(gated))
    }

    pub fn set_report_file(&mut self, report_file: String) -> Result<()> {
        self.config.report_file = report_file;
        self.persist()
    }

    pub fn set_analysis_tool(&mut self, tool: Option<String>) -> Result<()> {
        self.config.analysis_tool = tool;
        self.persist()
    }

    /// Steps the user may add for the current project.
    pub fn addable(&self) -> Vec<&'static str> {
        if self.config.has_project() {
            gate::addable(&self.config.queue, &self.config.project_dir)
        } else {
            self.config.queue.available_to_add()
        }
    }
}
