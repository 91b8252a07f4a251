//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mocktest() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("mocktest").unwrap()
}

/// A command isolated from any user-level config.
fn isolated(home: &Path) -> Command {
    let mut cmd = mocktest();
    cmd.env("HOME", home).env_remove("MOCKTEST_API_TOKEN");
    cmd
}

fn report_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// Take the sample exam answering Q1 right and Q2 wrong; returns the report path.
fn take_sample(dir: &TempDir) -> PathBuf {
    let output = dir.path().join("results");

    isolated(dir.path())
        .arg("take")
        .arg("--question-set")
        .arg("../../question-sets/sample.toml")
        .arg("--output")
        .arg(&output)
        .write_stdin("a C\nn\na B\ns\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exam sample: 5 questions"))
        .stdout(predicate::str::contains("Report saved"));

    let files = report_files(&output);
    assert_eq!(files.len(), 1);
    files.into_iter().next().unwrap()
}

#[test]
fn validate_sample_question_set() {
    mocktest()
        .arg("validate")
        .arg("--question-set")
        .arg("../../question-sets/sample.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("5 questions"))
        .stdout(predicate::str::contains("All question sets valid"));
}

#[test]
fn validate_directory() {
    mocktest()
        .arg("validate")
        .arg("--question-set")
        .arg("../../question-sets")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sample Exam"))
        .stdout(predicate::str::contains("Rust Basics"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[question_set]
id = "broken"
title = "Broken"

[[questions]]
id = "q1"
text = "Pick"
correct = "D"
options = { A = "x", B = "y" }
"#,
    )
    .unwrap();

    mocktest()
        .arg("validate")
        .arg("--question-set")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[q1] WARNING"))
        .stdout(predicate::str::contains("expected 4 options, found 2"))
        .stdout(predicate::str::contains("2 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    mocktest()
        .arg("validate")
        .arg("--question-set")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    mocktest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created mocktest.toml"))
        .stdout(predicate::str::contains("Created question-sets/sample.toml"));

    assert!(dir.path().join("mocktest.toml").exists());
    assert!(dir.path().join("question-sets/sample.toml").exists());

    // The generated sample must itself be valid.
    mocktest()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--question-set")
        .arg("question-sets/sample.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All question sets valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    mocktest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    mocktest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn take_writes_scored_report() {
    let dir = TempDir::new().unwrap();
    let path = take_sample(&dir);

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("report-sample-"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(report["total"], 5);
    assert_eq!(report["answered"], 2);
    assert_eq!(report["correct"], 1);
    assert_eq!(report["wrong"], 1);
    assert_eq!(report["skipped"], 3);
    assert_eq!(report["percentage"], 20.0);
    assert_eq!(report["accuracy"], 50.0);
    assert_eq!(report["metadata"]["submission"], "manual");
    assert_eq!(report["breakdown"][1]["submitted"], "B");
}

#[test]
fn take_rejects_invalid_command_and_continues() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .arg("take")
        .arg("--question-set")
        .arg("../../question-sets/sample.toml")
        .arg("--output")
        .arg(dir.path().join("results"))
        .write_stdin("p\nzz\ng 9\ns\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Already at the first question"))
        .stdout(predicate::str::contains("unknown command"))
        .stdout(predicate::str::contains("Not applied"));
}

#[test]
fn take_abandoned_when_input_closes() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .arg("take")
        .arg("--question-set")
        .arg("../../question-sets/sample.toml")
        .arg("--output")
        .arg(dir.path().join("results"))
        .write_stdin("a C\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("abandoned"));

    assert!(!dir.path().join("results").exists());
}

#[test]
fn take_directory_requires_exam() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .arg("take")
        .arg("--question-set")
        .arg("../../question-sets")
        .write_stdin("s\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--exam is required"));
}

#[test]
fn take_unknown_exam_fails_before_starting() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .arg("take")
        .arg("--exam")
        .arg("does-not-exist")
        .arg("--question-set")
        .arg("../../question-sets")
        .write_stdin("s\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist"));
}

#[test]
fn show_report_in_every_format() {
    let dir = TempDir::new().unwrap();
    let report = take_sample(&dir);

    mocktest()
        .arg("show")
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Result: sample"))
        .stdout(predicate::str::contains("20.0%"));

    mocktest()
        .arg("show")
        .arg("--report")
        .arg(&report)
        .arg("--format")
        .arg("markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("## Result: sample"));

    mocktest()
        .arg("show")
        .arg("--report")
        .arg(&report)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"correct\": 1"));

    let html = dir.path().join("report.html");
    mocktest()
        .arg("show")
        .arg("--report")
        .arg(&report)
        .arg("--format")
        .arg("html")
        .arg("--output")
        .arg(&html)
        .assert()
        .success();
    assert!(std::fs::read_to_string(&html).unwrap().contains("<html"));
}

#[test]
fn show_unknown_format() {
    let dir = TempDir::new().unwrap();
    let report = take_sample(&dir);

    mocktest()
        .arg("show")
        .arg("--report")
        .arg(&report)
        .arg("--format")
        .arg("pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn show_nonexistent_report() {
    mocktest()
        .arg("show")
        .arg("--report")
        .arg("no_such_file.json")
        .assert()
        .failure();
}

#[test]
fn help_output() {
    mocktest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Timed mock exam sessions"));
}

#[test]
fn version_output() {
    mocktest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mocktest"));
}
