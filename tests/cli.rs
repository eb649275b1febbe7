use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::PathBuf;

/// Helper to get a temporary config directory
fn temp_config_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Helper to get config file path in the temp dir
fn config_file_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join(".portfolio-view").join("config.json")
}

const BINARY_NAME: &str = "portfolio-view";

/// Nothing listens on the discard port, so connections are refused at once.
const DEAD_SERVER: &str = "http://127.0.0.1:9";

#[test]
/// Help command should display usage information.
fn cli_help_displays_usage() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(contains("Terminal client for the portfolio management server"))
        .stdout(contains("dashboard"))
        .stdout(contains("watch"));
}

#[test]
/// Without a config file the defaults are shown.
fn config_show_prints_defaults() {
    let tmp = temp_config_dir();
    let config_path = config_file_path(&tmp);

    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.arg("config")
        .arg("show")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(contains("\"refresh_interval_secs\": 300"))
        .stdout(contains("\"settle_delay_ms\": 1000"));
}

#[test]
/// `config set` writes the file, `config reset` deletes it.
fn config_set_then_reset() {
    let tmp = temp_config_dir();
    let config_path = config_file_path(&tmp);

    Command::cargo_bin(BINARY_NAME)
        .unwrap()
        .args(["config", "set", "--server-url", "http://10.0.0.7:5000", "--config"])
        .arg(&config_path)
        .assert()
        .success();
    let written = fs::read_to_string(&config_path).unwrap();
    assert!(written.contains("http://10.0.0.7:5000"));

    Command::cargo_bin(BINARY_NAME)
        .unwrap()
        .args(["config", "reset", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(contains("Removing"));
    assert!(!config_path.exists());
}

#[test]
/// A quantity under the minimum is rejected before any request is made.
fn buy_below_minimum_quantity_fails_locally() {
    let tmp = temp_config_dir();
    let config_path = config_file_path(&tmp);

    Command::cargo_bin(BINARY_NAME)
        .unwrap()
        .args(["buy", "AAPL", "0.0009", "--server-url", DEAD_SERVER, "--config"])
        .arg(&config_path)
        .assert()
        .failure()
        .stdout(contains("Quantity must be at least"));
}

#[test]
/// Ratings outside 1..=5 never reach the server.
fn rate_out_of_range_fails_locally() {
    let tmp = temp_config_dir();
    let config_path = config_file_path(&tmp);

    Command::cargo_bin(BINARY_NAME)
        .unwrap()
        .args([
            "rate",
            "--type",
            "rebalance",
            "--action",
            "Trim tech",
            "--rating",
            "9",
            "--server-url",
            DEAD_SERVER,
            "--config",
        ])
        .arg(&config_path)
        .assert()
        .failure()
        .stdout(contains("Rating"));
}

#[test]
/// An unreachable server puts the section in its error state and fails the command.
fn refresh_against_dead_server_reports_error_state() {
    let tmp = temp_config_dir();
    let config_path = config_file_path(&tmp);

    Command::cargo_bin(BINARY_NAME)
        .unwrap()
        .args(["refresh", "risk", "--server-url", DEAD_SERVER, "--config"])
        .arg(&config_path)
        .assert()
        .failure()
        .stdout(contains("[error]"));
}

#[test]
#[ignore] // This test requires a live portfolio server.
fn refresh_forecasts_against_local_server() {
    Command::cargo_bin(BINARY_NAME)
        .unwrap()
        .args(["refresh", "forecasts", "--env", "local"])
        .assert()
        .success()
        .stdout(contains("Forecasts"));
}
