//! Static registry of every step kind the runner knows how to invoke.
//!
//! Catalog order is the natural queue order used when no saved arrangement
//! exists, and the order in which addable steps are offered.

/// How a step is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// Flags appended to the shared analysis tool after `--project-dir <dir>`.
    AnalysisTool { flags: &'static [&'static str] },
    /// The project's build wrapper script invoked with a single task name.
    BuildWrapper { task: &'static str },
}

impl Invocation {
    pub fn requires_wrapper(&self) -> bool {
        matches!(self, Invocation::BuildWrapper { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefinition {
    pub name: &'static str,
    pub invocation: Invocation,
}

pub const LINT_STEP: &str = "Run Lint";
pub const REPORT_STEP: &str = "HTML Report";
pub const BASELINE_TASK: &str = "updateLintBaseline";

pub const CATALOG: &[StepDefinition] = &[
    StepDefinition {
        name: "Scan XML",
        invocation: Invocation::AnalysisTool {
            flags: &["--html-resources", "xml_report.html"],
        },
    },
    StepDefinition {
        name: "Scan Resources",
        invocation: Invocation::AnalysisTool { flags: &["--scan"] },
    },
    StepDefinition {
        name: "Generate Stubs",
        invocation: Invocation::AnalysisTool { flags: &["--stubs"] },
    },
    StepDefinition {
        name: "Check Syntax",
        invocation: Invocation::AnalysisTool {
            flags: &["--check-syntax"],
        },
    },
    StepDefinition {
        name: LINT_STEP,
        invocation: Invocation::BuildWrapper { task: "lintDebug" },
    },
    StepDefinition {
        name: "Build APK",
        invocation: Invocation::BuildWrapper {
            task: "assembleDebug",
        },
    },
    StepDefinition {
        name: REPORT_STEP,
        invocation: Invocation::AnalysisTool {
            flags: &["--html-report", "issues.html"],
        },
    },
];

/// Look up a step by its exact display name.
pub fn find(name: &str) -> Option<&'static StepDefinition> {
    CATALOG.iter().find(|step| step.name == name)
}

/// Catalog names in natural order.
pub fn names() -> Vec<String> {
    CATALOG.iter().map(|step| step.name.to_string()).collect()
}

/// Resolve a user-typed name, accepting any letter case.
///
/// Exact matches win so a future catalog with case-colliding names stays
/// unambiguous.
pub fn lookup_name(input: &str) -> Option<&'static str> {
    let input = input.trim();
    if let Some(step) = find(input) {
        return Some(step.name);
    }
    CATALOG
        .iter()
        .find(|step| step.name.eq_ignore_ascii_case(input))
        .map(|step| step.name)
}
