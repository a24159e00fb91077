//! User-ordered step queue.
//!
//! Every operation takes the current queue by reference and returns the next
//! value; callers own the value and decide when to persist it. Entries are
//! always unique catalog members, so they are stored as catalog names.
use crate::catalog::{self, StepDefinition};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepQueue {
    steps: Vec<&'static str>,
}

impl StepQueue {
    /// Queue holding every catalog step in natural order.
    pub fn catalog_order() -> Self {
        Self {
            steps: catalog::CATALOG.iter().map(|step| step.name).collect(),
        }
    }

    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Build a queue from saved names, keeping only known, first-seen entries.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut queue = Self::empty();
        for name in names {
            queue = queue.add(name.as_ref());
        }
        queue
    }

    pub fn names(&self) -> &[&'static str] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.iter().any(|step| *step == name)
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.steps.iter().map(|name| name.to_string()).collect()
    }

    /// Catalog definitions in queue order.
    pub fn definitions(&self) -> Vec<&'static StepDefinition> {
        self.steps
            .iter()
            .filter_map(|name| catalog::find(name))
            .collect()
    }

    /// Move the step at `index` one slot; boundaries and bad indices are no-ops.
    pub fn reorder(&self, index: usize, direction: Direction) -> Self {
        let mut steps = self.steps.clone();
        match direction {
            Direction::Up if index > 0 && index < steps.len() => steps.swap(index, index - 1),
            Direction::Down if index + 1 < steps.len() => steps.swap(index, index + 1),
            _ => {}
        }
        Self { steps }
    }

    pub fn remove(&self, index: usize) -> Self {
        let mut steps = self.steps.clone();
        if index < steps.len() {
            steps.remove(index);
        }
        Self { steps }
    }

    /// Append a catalog step that is not queued yet; anything else is a no-op.
    pub fn add(&self, name: &str) -> Self {
        let mut steps = self.steps.clone();
        if let Some(step) = catalog::find(name) {
            if !steps.contains(&step.name) {
                steps.push(step.name);
            }
        }
        Self { steps }
    }

    /// Catalog names not currently queued, in catalog order.
    pub fn available_to_add(&self) -> Vec<&'static str> {
        catalog::CATALOG
            .iter()
            .map(|step| step.name)
            .filter(|name| !self.contains(name))
            .collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|step| *step == name)
    }
}

impl Default for StepQueue {
    fn default() -> Self {
        Self::catalog_order()
    }
}

impl fmt::Display for StepQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.steps.join(" -> "))
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
