//! Queue management through the CLI: every change is persisted immediately.

mod common;

use common::{stderr, stdout, TestFixture};

#[test]
fn fresh_config_starts_from_catalog_order() {
    let fixture = TestFixture::new(true);
    let output = fixture.stepq(&["steps", "list"]);
    assert_eq!(output.status.code(), Some(0), "stderr:\n{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("  1. Scan XML"));
    assert!(out.contains("  7. HTML Report"));
}

#[test]
fn add_remove_and_move_are_written_through() {
    let fixture = TestFixture::new(true);
    fixture.write_config(&["Scan Resources", "Run Lint", "Build APK"]);

    let moved = fixture.stepq(&["steps", "move", "3", "up"]);
    assert_eq!(moved.status.code(), Some(0));
    assert_eq!(fixture.queue(), vec!["Scan Resources", "Build APK", "Run Lint"]);

    let boundary = fixture.stepq(&["steps", "move", "1", "up"]);
    assert_eq!(boundary.status.code(), Some(0));
    assert_eq!(fixture.queue(), vec!["Scan Resources", "Build APK", "Run Lint"]);

    assert_eq!(fixture.stepq(&["steps", "remove", "1"]).status.code(), Some(0));
    assert_eq!(fixture.queue(), vec!["Build APK", "Run Lint"]);

    let added = fixture.stepq(&["steps", "add", "scan resources"]);
    assert_eq!(added.status.code(), Some(0));
    assert_eq!(
        fixture.queue(),
        vec!["Build APK", "Run Lint", "Scan Resources"]
    );

    let again = fixture.stepq(&["steps", "add", "Run Lint"]);
    assert_eq!(again.status.code(), Some(0));
    assert!(stdout(&again).contains("already queued"));
    assert_eq!(fixture.queue().len(), 3);
}

#[test]
fn invalid_positions_and_names_are_rejected() {
    let fixture = TestFixture::new(true);
    fixture.write_config(&["Scan Resources"]);

    let bad_index = fixture.stepq(&["steps", "remove", "5"]);
    assert_eq!(bad_index.status.code(), Some(2));
    assert!(stderr(&bad_index).contains("no step at position 5"));

    let bad_name = fixture.stepq(&["steps", "add", "Deploy"]);
    assert_eq!(bad_name.status.code(), Some(2));
    assert!(stderr(&bad_name).contains("unknown step"));
    assert_eq!(fixture.queue(), vec!["Scan Resources"]);
}

#[test]
fn project_without_wrapper_gates_wrapper_steps() {
    let fixture = TestFixture::new(false);
    fixture.write_config(&["Run Lint", "Scan Resources"]);

    let listed = fixture.stepq(&["steps", "list"]);
    assert_eq!(listed.status.code(), Some(0));
    assert!(stderr(&listed).contains("removed \"Run Lint\""));
    assert!(stdout(&listed).contains("Unavailable without"));
    assert_eq!(fixture.queue(), vec!["Scan Resources"]);

    let refused = fixture.stepq(&["steps", "add", "Build APK"]);
    assert_eq!(refused.status.code(), Some(2));
    assert!(stderr(&refused).contains("needs"));

    fixture.install_wrapper();
    let added = fixture.stepq(&["steps", "add", "Run Lint"]);
    assert_eq!(added.status.code(), Some(0), "stderr:\n{}", stderr(&added));
    assert_eq!(fixture.queue(), vec!["Scan Resources", "Run Lint"]);
}

#[test]
fn config_commands_update_settings() {
    let fixture = TestFixture::new(true);
    let project = fixture.project.display().to_string();

    let set = fixture.stepq(&["config", "set-project", &project]);
    assert_eq!(set.status.code(), Some(0), "stderr:\n{}", stderr(&set));
    assert_eq!(fixture.config_json()["project_dir"], project.as_str());

    assert_eq!(
        fixture
            .stepq(&["config", "set-report", "build/report.html"])
            .status
            .code(),
        Some(0)
    );
    assert_eq!(fixture.config_json()["report_file"], "build/report.html");

    let absolute = fixture.stepq(&["config", "set-report", "/tmp/report.html"]);
    assert_eq!(absolute.status.code(), Some(2));

    let shown = fixture.stepq(&["config", "show"]);
    assert!(stdout(&shown).contains("\"report_file\": \"build/report.html\""));

    let missing = fixture.stepq(&["config", "set-project", "/definitely/not/here"]);
    assert_eq!(missing.status.code(), Some(2));
    assert!(stderr(&missing).contains("is not a directory"));
}

#[test]
fn malformed_config_falls_back_to_defaults() {
    let fixture = TestFixture::new(true);
    std::fs::create_dir_all(fixture.config_path.parent().expect("config dir"))
        .expect("create config dir");
    std::fs::write(&fixture.config_path, "{ nope").expect("write config");

    let output = fixture.stepq(&["steps", "list"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("  1. Scan XML"));
}
