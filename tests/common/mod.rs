//! Shared test infrastructure for integration tests.
//!
//! Each fixture owns a temp directory holding an Android-like project, a fake
//! analysis tool, and an isolated config file, so tests never touch the real
//! user config.
#![allow(dead_code)]

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Fake analysis tool: dispatches on the step flag it receives.
pub const TOOL_SCRIPT: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --scan) echo "scanned 12 resources"; exit 0 ;;
    --html-report) echo "<html>report</html>" > issues.html; echo "report written"; exit 0 ;;
  esac
done
echo "unsupported flags: $*" 1>&2
exit 64
"#;

/// Fake build wrapper. Lint fails with the baseline hint until a baseline
/// file exists.
pub const WRAPPER_SCRIPT: &str = r#"#!/bin/sh
case "$1" in
  lintDebug)
    if [ -f lint-baseline.xml ]; then echo "lint clean"; exit 0; fi
    echo "Lint found errors in the project; aborting build."
    echo "  lintOptions { baseline = file(\"lint-baseline.xml\") }"
    exit 1 ;;
  updateLintBaseline) echo "<issues/>" > lint-baseline.xml; echo "baseline written"; exit 0 ;;
  assembleDebug) echo "BUILD SUCCESSFUL"; exit 0 ;;
esac
echo "BUILD FAILURE: unknown task $1"
exit 1
"#;

pub struct TestFixture {
    _root: TempDir,
    pub project: PathBuf,
    pub config_path: PathBuf,
    pub tool_path: PathBuf,
}

impl TestFixture {
    /// Project with the analysis tool and, optionally, the build wrapper.
    pub fn new(with_wrapper: bool) -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let base = root.path().canonicalize().expect("canonical tempdir");
        let project = base.join("app");
        std::fs::create_dir_all(&project).expect("create project");
        let tool_path = base.join("tool.sh");
        std::fs::write(&tool_path, TOOL_SCRIPT).expect("write tool");
        let fixture = Self {
            _root: root,
            project,
            config_path: base.join("config").join("config.json"),
            tool_path,
        };
        if with_wrapper {
            fixture.install_wrapper();
        }
        fixture
    }

    #[cfg(unix)]
    pub fn install_wrapper(&self) {
        use std::os::unix::fs::PermissionsExt;
        let path = self.project.join("gradlew");
        std::fs::write(&path, WRAPPER_SCRIPT).expect("write wrapper");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod wrapper");
    }

    #[cfg(not(unix))]
    pub fn install_wrapper(&self) {
        std::fs::write(self.project.join("gradlew.bat"), "@echo off\r\n").expect("write wrapper");
    }

    pub fn tool_command(&self) -> String {
        format!("sh {}", self.tool_path.display())
    }

    /// Write a config selecting `steps` for this project.
    pub fn write_config(&self, steps: &[&str]) {
        let known = [
            "Scan XML",
            "Scan Resources",
            "Generate Stubs",
            "Check Syntax",
            "Run Lint",
            "Build APK",
            "HTML Report",
        ];
        let config = serde_json::json!({
            "project_dir": self.project.display().to_string(),
            "report_file": "issues.html",
            "steps_order": steps,
            "known_steps": known,
            "analysis_tool": self.tool_command(),
        });
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).expect("create config dir");
        }
        std::fs::write(
            &self.config_path,
            serde_json::to_vec_pretty(&config).expect("serialize config"),
        )
        .expect("write config");
    }

    /// Command for the binary with an isolated environment.
    pub fn stepq_command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_stepq"));
        command
            .args(args)
            .env("STEPQ_CONFIG", &self.config_path)
            .env("NO_COLOR", "1")
            .env_remove("STEPQ_ANALYSIS_TOOL")
            .env_remove("STEPQ_LOG")
            .env_remove("RUST_LOG");
        command
    }

    pub fn stepq(&self, args: &[&str]) -> Output {
        self.stepq_command(args).output().expect("run stepq")
    }

    pub fn lock_dir(&self) -> PathBuf {
        self.config_path.with_file_name("locks")
    }

    pub fn config_json(&self) -> Value {
        read_json(&self.config_path)
    }

    pub fn last_run(&self) -> Value {
        read_json(&self.config_path.with_file_name("last_run.json"))
    }

    pub fn queue(&self) -> Vec<String> {
        self.config_json()["steps_order"]
            .as_array()
            .expect("steps_order array")
            .iter()
            .map(|value| value.as_str().expect("step name").to_string())
            .collect()
    }
}

fn read_json(path: &Path) -> Value {
    let bytes = std::fs::read(path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()));
    serde_json::from_slice(&bytes).expect("parse json")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
