//! Step availability checks against the selected project directory.
use crate::catalog::{self, StepDefinition};
use crate::queue::StepQueue;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// File name of the build wrapper script for the current platform.
pub fn wrapper_script_name() -> &'static str {
    if cfg!(windows) {
        "gradlew.bat"
    } else {
        "gradlew"
    }
}

pub fn wrapper_path(project_dir: &Path) -> PathBuf {
    project_dir.join(wrapper_script_name())
}

pub fn wrapper_available(project_dir: &Path) -> bool {
    wrapper_path(project_dir).is_file()
}

pub fn is_runnable(step: &StepDefinition, project_dir: &Path) -> bool {
    !step.invocation.requires_wrapper() || wrapper_available(project_dir)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub queue: StepQueue,
    pub removed: BTreeSet<&'static str>,
}

/// Remove queued steps that cannot run in `project_dir`.
pub fn filter(queue: &StepQueue, project_dir: &Path) -> GateOutcome {
    let mut next = queue.clone();
    let mut removed = BTreeSet::new();
    for step in queue.definitions() {
        if is_runnable(step, project_dir) {
            continue;
        }
        if let Some(index) = next.position(step.name) {
            next = next.remove(index);
            removed.insert(step.name);
        }
    }
    if !removed.is_empty() {
        tracing::info!(
            project_dir = %project_dir.display(),
            removed = ?removed,
            "removed steps that need {}",
            wrapper_script_name()
        );
    }
    GateOutcome {
        queue: next,
        removed,
    }
}

/// Steps the user may add right now: not queued and runnable.
pub fn addable(queue: &StepQueue, project_dir: &Path) -> Vec<&'static str> {
    queue
        .available_to_add()
        .into_iter()
        .filter(|name| {
            catalog::find(name)
                .map(|step| is_runnable(step, project_dir))
                .unwrap_or(false)
        })
        .collect()
}
