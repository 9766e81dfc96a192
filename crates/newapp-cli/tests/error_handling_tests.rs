//! Tests for error handling, exit codes and suggestions.

use std::fs;

use assert_cmd::Command;
use assert_cmd::cargo;
use predicates::prelude::*;
use tempfile::TempDir;

fn newapp(dir: &TempDir) -> Command {
    let mut cmd = cargo::cargo_bin_cmd!("newapp");
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("NEWAPP_CATALOG_DIR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_no_match_exits_not_found() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["generate", "nothingzzz"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("no match for \"nothingzzz\""))
        .stderr(predicate::str::contains("--allow-missing-images"));
}

#[test]
fn test_allow_missing_images_uses_reference_as_given() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["generate", "--allow-missing-images", "example/unknown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"deployments\""))
        .stdout(predicate::str::contains("unknown"));
}

#[test]
fn test_ambiguous_match_exits_user_error() {
    let dir = TempDir::new().unwrap();
    let catalog = dir.path().join("catalog.toml");
    fs::write(
        &catalog,
        "[[image]]\nreference = \"example/db-one\"\nsupports = [\"db\"]\n\n\
         [[image]]\nreference = \"example/db-two\"\nsupports = [\"db\"]\n",
    )
    .unwrap();

    newapp(&dir)
        .args(["--no-builtin-catalog", "--catalog"])
        .arg(&catalog)
        .args(["generate", "db"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("multiple matches for \"db\""))
        .stderr(predicate::str::contains("newapp search"));
}

#[test]
fn test_dockerfile_without_to_is_circular() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args([
            "--no-builtin-catalog",
            "build",
            "--dockerfile",
            "FROM centos\nRUN yum install -y httpd",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "the input and output image stream tags are identical",
        ));
}

#[test]
fn test_build_rejects_templates() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["build", "--template", "mysql-ephemeral", "-p", "MYSQL_USER=u"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used when only building"));
}

#[test]
fn test_missing_catalog_path_is_configuration_error() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["--catalog", "does-not-exist", "search", "ruby"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("does-not-exist"));
}

#[test]
fn test_missing_explicit_config_file_exits_configuration() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["--config", "nope.toml", "config", "list"])
        .assert()
        .code(4);
}

#[test]
fn test_unknown_config_key() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["config", "get", "defaults.colour"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".newapp.toml"), "").unwrap();

    newapp(&dir)
        .args(["init", "--local"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--force"));

    newapp(&dir).args(["init", "--local", "--force"]).assert().success();
}

#[test]
fn test_invalid_strategy_is_parse_error() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["generate", "--strategy", "custom", "ruby"])
        .assert()
        .code(2);
}

#[test]
fn test_verbose_error_omits_hint() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["-v", "generate", "nothingzzz"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Use -v / --verbose").not());
}
