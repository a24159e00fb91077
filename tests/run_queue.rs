//! End-to-end runs of the step queue against a fake Android project.
#![cfg(unix)]

mod common;

use common::{stderr, stdout, TestFixture};
use std::process::Stdio;
use std::time::{Duration, Instant};

#[test]
fn failing_lint_offers_baseline_and_queue_continues() {
    let fixture = TestFixture::new(true);
    fixture.write_config(&["Scan Resources", "Run Lint", "Build APK"]);

    let output = fixture.stepq(&["run"]);
    let out = stdout(&output);
    assert_eq!(output.status.code(), Some(1), "stdout:\n{out}\nstderr:\n{}", stderr(&output));

    let scan = out.find("=== [1/3] Scan Resources ===").expect("scan marker");
    let lint = out.find("=== [2/3] Run Lint ===").expect("lint marker");
    let build = out.find("=== [3/3] Build APK ===").expect("build marker");
    assert!(scan < lint && lint < build);
    assert!(out.contains("scanned 12 resources"));
    assert!(out.contains("BUILD SUCCESSFUL"));
    assert!(out.contains("  Scan Resources: ✅\n  Run Lint: ❌ (exit 1)\n  Build APK: ✅\n"));
    assert!(out.contains("stepq baseline"));

    let record = fixture.last_run();
    let summary = &record["summary"];
    assert_eq!(summary["followup_offered"], true);
    assert_eq!(summary["report_available"], false);
    let results = summary["results"].as_array().expect("results");
    let outcomes: Vec<(&str, bool)> = results
        .iter()
        .map(|result| {
            (
                result["step_name"].as_str().expect("name"),
                result["succeeded"].as_bool().expect("succeeded"),
            )
        })
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("Scan Resources", true),
            ("Run Lint", false),
            ("Build APK", true)
        ]
    );
}

#[test]
fn baseline_follow_up_clears_offer_once_created() {
    let fixture = TestFixture::new(true);
    fixture.write_config(&["Run Lint"]);

    let refused = fixture.stepq(&["baseline"]);
    assert_eq!(refused.status.code(), Some(2));
    assert!(stderr(&refused).contains("did not offer a lint baseline"));

    assert_eq!(fixture.stepq(&["run"]).status.code(), Some(1));
    let created = fixture.stepq(&["baseline"]);
    assert_eq!(created.status.code(), Some(0), "stderr:\n{}", stderr(&created));
    assert!(stdout(&created).contains("=== Creating Lint Baseline ==="));
    assert!(stdout(&created).contains("Baseline created successfully"));
    assert!(fixture.project.join("lint-baseline.xml").is_file());
    assert_eq!(fixture.last_run()["summary"]["followup_offered"], false);

    let rerun = fixture.stepq(&["run"]);
    assert_eq!(rerun.status.code(), Some(0));
    assert!(!stdout(&rerun).contains("stepq baseline"));
}

#[test]
fn report_step_enables_report_view() {
    let fixture = TestFixture::new(true);
    fixture.write_config(&["HTML Report"]);

    let missing = fixture.stepq(&["report", "--print"]);
    assert_eq!(missing.status.code(), Some(2));
    assert!(stderr(&missing).contains("report not found"));

    let output = fixture.stepq(&["run"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("report ready"));
    assert_eq!(fixture.last_run()["summary"]["report_available"], true);

    let printed = fixture.stepq(&["report", "--print"]);
    assert_eq!(printed.status.code(), Some(0));
    assert_eq!(
        stdout(&printed).trim(),
        fixture.project.join("issues.html").display().to_string()
    );
}

#[test]
fn run_without_wrapper_drops_wrapper_steps() {
    let fixture = TestFixture::new(false);
    fixture.write_config(&["Scan Resources", "Run Lint", "Build APK"]);

    let output = fixture.stepq(&["run"]);
    assert_eq!(output.status.code(), Some(0));
    let err = stderr(&output);
    assert!(err.contains("removed \"Run Lint\": gradlew not found"));
    assert!(err.contains("removed \"Build APK\": gradlew not found"));
    assert!(stdout(&output).contains("=== [1/1] Scan Resources ==="));
    assert_eq!(fixture.queue(), vec!["Scan Resources"]);
}

#[test]
fn tool_override_applies_to_single_run() {
    let fixture = TestFixture::new(true);
    fixture.write_config(&["Scan Resources"]);

    let output = fixture.stepq(&["run", "--tool", "sh -c 'exit 7' tool"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Scan Resources: ❌ (exit 7)"));
    assert_eq!(
        fixture.config_json()["analysis_tool"],
        fixture.tool_command().as_str()
    );
}

#[test]
fn missing_tool_is_a_step_failure_not_a_crash() {
    let fixture = TestFixture::new(true);
    fixture.write_config(&["Scan Resources", "Build APK"]);

    let output = fixture.stepq(&["run", "--tool", "/nonexistent/analysis-tool"]);
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("failed to launch Scan Resources"));
    assert!(out.contains("Scan Resources: ❌ (not run to completion)"));
    assert!(out.contains("Build APK: ✅"));
}

#[test]
fn killed_run_does_not_block_the_next_run() {
    let fixture = TestFixture::new(true);
    fixture.write_config(&["Scan Resources"]);

    let mut child = fixture
        .stepq_command(&["run", "--tool", "sh -c 'sleep 5' tool"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn stepq");
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        let locked = std::fs::read_dir(fixture.lock_dir())
            .map(|entries| entries.count() > 0)
            .unwrap_or(false);
        if locked {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    std::thread::sleep(Duration::from_millis(300));
    child.kill().expect("kill stepq");
    child.wait().expect("reap stepq");

    let output = fixture.stepq(&["run"]);
    assert_eq!(output.status.code(), Some(0), "stderr:\n{}", stderr(&output));
    assert!(stdout(&output).contains("scanned 12 resources"));
    let project_entries: Vec<String> = std::fs::read_dir(&fixture.project)
        .expect("read project")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().to_string())
        .collect();
    assert!(
        project_entries.iter().all(|name| !name.ends_with(".lock")),
        "lock file leaked into project: {project_entries:?}"
    );
}
