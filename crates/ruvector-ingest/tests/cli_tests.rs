//! Command-line smoke tests. None of these reach the network.

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("ruvector-ingest").unwrap();
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_help_lists_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("rebuild-index"));
}

#[test]
fn test_create_without_matches_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[store]\nendpoint = \"http://127.0.0.1:9\"\n").unwrap();

    cli()
        .arg("--config")
        .arg(&config)
        .arg("--cwd")
        .arg(dir.path())
        .args(["create", "*.missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No files specified"));
}

#[test]
fn test_update_without_matches_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[store]\nendpoint = \"http://127.0.0.1:9\"\n").unwrap();

    cli()
        .arg("--config")
        .arg(&config)
        .arg("--cwd")
        .arg(dir.path())
        .args(["update", "*.missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No files specified"));
}

#[test]
fn test_read_without_ids_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[store]\nendpoint = \"http://127.0.0.1:9\"\n").unwrap();

    cli()
        .arg("--config")
        .arg(&config)
        .arg("read")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Must specify object id(s)"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    cli()
        .args(["--config", "/nonexistent/ruvector-ingest.toml", "ping"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_invalid_page_is_rejected() {
    cli()
        .args(["search", "x", "--page", "later"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a number or 'all'"));
}
