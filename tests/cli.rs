mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

/// The binary, isolated from the caller's environment and any `.env` or config file.
fn customizer(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("resume-customizer").unwrap();
    cmd.current_dir(dir)
        .env_remove("OPENROUTER_API_KEY")
        .env_remove("RESUME_CUSTOMIZER_MODEL")
        .env_remove("RESUME_CUSTOMIZER_BASE_URL")
        .env_remove("RESUME_CUSTOMIZER_RENDERER")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn missing_arguments_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    customizer(dir.path())
        .arg("customize")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<RESUME_FILE>"));
}

#[test]
fn missing_api_key_exits_with_auth_code() {
    let dir = tempfile::tempdir().unwrap();
    let (resume, job) = common::write_inputs(dir.path());

    customizer(dir.path())
        .arg("customize")
        .arg(&resume)
        .arg(&job)
        .assert()
        .code(11)
        .stderr(predicate::str::contains("OPENROUTER_API_KEY"));

    assert!(!dir.path().join("tempresume.pdf").exists());
}

#[test]
fn unreachable_service_exits_with_network_code() {
    let dir = tempfile::tempdir().unwrap();
    let (resume, job) = common::write_inputs(dir.path());

    customizer(dir.path())
        .env("OPENROUTER_API_KEY", "sk-test")
        .env("RESUME_CUSTOMIZER_BASE_URL", "http://127.0.0.1:9")
        .arg("customize")
        .arg(&resume)
        .arg(&job)
        .assert()
        .code(12)
        .stdout(predicate::str::contains("Customizing resume with AI"))
        .stderr(predicate::str::contains("❌ Error"));
}

#[test]
fn unknown_config_key_exits_with_config_code() {
    let dir = tempfile::tempdir().unwrap();
    let (resume, job) = common::write_inputs(dir.path());
    std::fs::write(dir.path().join("settings.yaml"), "api_key: sk-leaked\n").unwrap();

    customizer(dir.path())
        .env("OPENROUTER_API_KEY", "sk-test")
        .arg("customize")
        .arg(&resume)
        .arg(&job)
        .arg("--config")
        .arg("settings.yaml")
        .assert()
        .code(4);
}

#[test]
fn validate_accepts_a_well_formed_resume() {
    let dir = tempfile::tempdir().unwrap();
    let (resume, _) = common::write_inputs(dir.path());

    customizer(dir.path())
        .arg("validate")
        .arg(&resume)
        .assert()
        .success()
        .stdout(predicate::str::contains("valid resume for Jane Doe"))
        .stdout(predicate::str::contains("5 highlights"))
        .stdout(predicate::str::contains("4 details"));
}

#[test]
fn validate_names_the_offending_field() {
    let dir = tempfile::tempdir().unwrap();
    let resume = dir.path().join("broken.yaml");
    std::fs::write(
        &resume,
        "cv:\n  name: Jane\n  sections:\n    experience:\n      - company: Acme\n        position: Engineer\n        highlights: not-a-list\n    technologies: []\n",
    )
    .unwrap();

    customizer(dir.path())
        .arg("validate")
        .arg(&resume)
        .assert()
        .code(10)
        .stderr(predicate::str::contains("highlights"));
}

#[test]
fn validate_missing_file_exits_with_io_code() {
    let dir = tempfile::tempdir().unwrap();

    customizer(dir.path())
        .arg("validate")
        .arg("nowhere.yaml")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("nowhere.yaml"));
}

#[test]
fn unwritable_log_file_exits_with_io_code() {
    let dir = tempfile::tempdir().unwrap();
    let (resume, _) = common::write_inputs(dir.path());

    customizer(dir.path())
        .arg("validate")
        .arg(&resume)
        .arg("--log-file")
        .arg(dir.path().join("no-such-dir").join("run.json"))
        .assert()
        .code(3)
        .stderr(predicate::str::contains("run.json"));
}
