//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn gradebook() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("gradebook").unwrap()
}

/// A directory holding the sample files written by `gradebook init`.
fn initialised() -> TempDir {
    let dir = TempDir::new().unwrap();
    gradebook()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
    dir
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    gradebook()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created gradebook.toml"))
        .stdout(predicate::str::contains("Created gradebook.json"));

    assert!(dir.path().join("gradebook.toml").exists());
    assert!(dir.path().join("gradebook.json").exists());
}

#[test]
fn init_skips_existing() {
    let dir = initialised();

    gradebook()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn check_sample_gradebook() {
    let dir = initialised();

    gradebook()
        .current_dir(dir.path())
        .args(["check", "--data", "gradebook.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "2 students, 2 categories, 3 evaluations",
        ))
        .stdout(predicate::str::contains("All links consistent"));
}

#[test]
fn check_reports_out_of_bounds_scores() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("gradebook.json");
    std::fs::write(&data, out_of_bounds_gradebook()).unwrap();

    gradebook()
        .args(["check", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("WARNING"))
        .stdout(predicate::str::contains("category 'Quiz'"));

    gradebook()
        .args(["check", "--strict", "--data"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside category bounds"));
}

#[test]
fn check_rejects_dangling_reference() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("gradebook.json");
    std::fs::write(
        &data,
        r#"{
            "saved_at": "2025-01-01T00:00:00Z",
            "evaluations": [{
                "id": "11111111-1111-4111-8111-111111111111",
                "student": "22222222-2222-4222-8222-222222222222"
            }]
        }"#,
    )
    .unwrap();

    gradebook()
        .args(["check", "--data"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn check_nonexistent_file() {
    gradebook()
        .args(["check", "--data", "nonexistent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent.json"));
}

#[test]
fn check_missing_config() {
    let dir = initialised();

    gradebook()
        .current_dir(dir.path())
        .args(["check", "--data", "gradebook.json", "--config", "missing.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn summary_text() {
    let dir = initialised();

    gradebook()
        .current_dir(dir.path())
        .args(["summary", "--data", "gradebook.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ada Lovelace"))
        .stdout(predicate::str::contains("51.5"))
        .stdout(predicate::str::contains("2 of 3 evaluations graded"));
}

#[test]
fn summary_json() {
    let dir = initialised();

    let output = gradebook()
        .current_dir(dir.path())
        .args(["summary", "--data", "gradebook.json", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["evaluations"], 3);
    assert_eq!(summary["graded"], 2);
    assert_eq!(summary["students"].as_array().unwrap().len(), 2);
}

#[test]
fn summary_unknown_format() {
    let dir = initialised();

    gradebook()
        .current_dir(dir.path())
        .args(["summary", "--data", "gradebook.json", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn evaluations_listing() {
    let dir = initialised();

    gradebook()
        .current_dir(dir.path())
        .args(["evaluations", "--data", "gradebook.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Homework: 9.5b (neat proof)"))
        .stdout(predicate::str::contains("Exam: 42b ()"))
        .stdout(predicate::str::contains("Homework: ?b ()"));
}

#[test]
fn help_output() {
    gradebook()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Referentially consistent grading data"));
}

#[test]
fn version_output() {
    gradebook()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gradebook"));
}

fn out_of_bounds_gradebook() -> &'static str {
    r#"{
    "saved_at": "2025-01-01T00:00:00Z",
    "students": [{
        "id": "33333333-3333-4333-8333-333333333333",
        "first_name": "Grace",
        "last_name": "Hopper"
    }],
    "categories": [{
        "id": "44444444-4444-4444-8444-444444444444",
        "name": "Quiz",
        "max_points": 10.0
    }],
    "evaluations": [{
        "id": "55555555-5555-4555-8555-555555555555",
        "points": 11.0,
        "student": "33333333-3333-4333-8333-333333333333",
        "category": "44444444-4444-4444-8444-444444444444"
    }]
}"#
}
