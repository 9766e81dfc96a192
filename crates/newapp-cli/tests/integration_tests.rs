//! Integration tests for newapp-cli.

use std::fs;

use assert_cmd::Command;
use assert_cmd::cargo;
use predicates::prelude::*;
use tempfile::TempDir;

/// `newapp` running in an isolated directory with no user config.
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
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("search"));
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_generate_help_lists_flags() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["generate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--strategy"))
        .stdout(predicate::str::contains("--allow-missing-images"));
}

#[test]
fn test_no_color_accepts_any_value() {
    let dir = TempDir::new().unwrap();
    for value in ["1", "true", "yes", "", "0"] {
        newapp(&dir)
            .env("NO_COLOR", value)
            .args(["search", "mysql"])
            .assert()
            .success()
            .stdout(predicate::str::contains("mysql"));
    }
}

#[test]
fn test_generate_image_deploys_it() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["generate", "centos/mysql-57-centos7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"deployments\""))
        .stdout(predicate::str::contains("mysql-57-centos7"));
}

#[test]
fn test_new_app_alias_with_compact_output() {
    let dir = TempDir::new().unwrap();
    let out = newapp(&dir)
        .args(["--output-format", "compact", "new-app", "centos/mysql-57-centos7"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.trim_end().lines().count(), 1);
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["name"], "mysql-57-centos7");
}

#[test]
fn test_generate_template_with_parameters() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["generate", "mysql-ephemeral", "-p", "MYSQL_USER=user"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"template_instantiations\""))
        .stdout(predicate::str::contains("mysql-ephemeral"));
}

#[test]
fn test_generate_local_ruby_source() {
    let dir = TempDir::new().unwrap();
    let app = dir.path().join("ruby-app");
    fs::create_dir(&app).unwrap();
    fs::write(app.join("Gemfile"), "source 'https://rubygems.org'\n").unwrap();

    newapp(&dir)
        .args(["generate", "ruby-app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"builds\""))
        .stdout(predicate::str::contains("ruby-app"));
}

#[test]
fn test_build_literal_dockerfile_with_to() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args([
            "build",
            "--dockerfile",
            "FROM centos:7\nRUN yum install -y httpd",
            "--to",
            "custom",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom"));
}

#[test]
fn test_build_dockerfile_from_stdin() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["new-build", "--dockerfile", "-", "--to", "custom"])
        .write_stdin("FROM centos:7\nRUN yum install -y httpd\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("yum install -y httpd"));
}

#[test]
fn test_human_output_lists_artifacts() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["--output-format", "plain", "generate", "centos/mysql-57-centos7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deployment/mysql-57-centos7"))
        .stderr(predicate::str::contains("Generated"));
}

#[test]
fn test_search_lists_matches() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["--output-format", "plain", "search", "ruby"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--image="));
}

#[test]
fn test_search_json_respects_limit() {
    let dir = TempDir::new().unwrap();
    let out = newapp(&dir)
        .args(["--output-format", "json", "search", "ruby", "--limit", "1"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[test]
fn test_custom_catalog_file() {
    let dir = TempDir::new().unwrap();
    let catalog = dir.path().join("extra.toml");
    fs::write(
        &catalog,
        "[[image]]\nreference = \"example/redis\"\nports = [\"6379/tcp\"]\n",
    )
    .unwrap();

    newapp(&dir)
        .args(["--no-builtin-catalog", "--catalog"])
        .arg(&catalog)
        .args(["generate", "example/redis"])
        .assert()
        .success()
        .stdout(predicate::str::contains("6379"));
}

#[test]
fn test_init_local_creates_config() {
    let dir = TempDir::new().unwrap();
    newapp(&dir).args(["init", "--local"]).assert().success();

    let written = fs::read_to_string(dir.path().join(".newapp.toml")).unwrap();
    assert!(written.contains("[catalog]"));
}

#[test]
fn test_config_set_then_get() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("config.toml");
    fs::write(&file, "").unwrap();

    newapp(&dir)
        .arg("--config")
        .arg(&file)
        .args(["config", "set", "defaults.strategy", "docker"])
        .assert()
        .success();

    newapp(&dir)
        .arg("--config")
        .arg(&file)
        .args(["config", "get", "defaults.strategy"])
        .assert()
        .success()
        .stdout(predicate::str::diff("docker\n"));
}

#[test]
fn test_config_path_honours_flag() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("custom.toml");
    fs::write(&file, "").unwrap();

    newapp(&dir)
        .arg("--config")
        .arg(&file)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();
    newapp(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("newapp"));
}

#[test]
fn test_log_file_is_written() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("newapp.log");

    newapp(&dir)
        .arg("-vv")
        .arg("--log-file")
        .arg(&log)
        .args(["generate", "centos/mysql-57-centos7"])
        .assert()
        .success();

    let written = fs::read_to_string(&log).unwrap();
    assert!(written.contains("generation complete"));
}
