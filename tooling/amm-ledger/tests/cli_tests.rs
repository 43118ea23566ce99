use assert_cmd::Command;
use predicates::prelude::*;
use std::env;
use std::fs;
use tempfile::TempDir;

fn fixture(name: &str) -> std::path::PathBuf {
    env::current_dir()
        .unwrap()
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("amm-ledger").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: amm-ledger"));
}

#[test]
fn test_replay_lifecycle_text() {
    let mut cmd = Command::cargo_bin("amm-ledger").unwrap();
    cmd.arg("replay")
        .arg(fixture("lifecycle.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("#1 swap -> 90661"))
        .stdout(predicate::str::contains("#2 swap -> 57168"))
        .stdout(predicate::str::contains("#3 redeem -> 800523"))
        .stdout(predicate::str::contains("#4 redeem rejected:"))
        .stdout(predicate::str::contains("InsufficientLiquidity"))
        .stdout(predicate::str::contains("reserve USDC: 842832"))
        .stdout(predicate::str::contains("reserve XLM: 759339"))
        .stdout(predicate::str::contains("total liquidity: 1199477"))
        .stdout(predicate::str::contains("Invariants hold."));
}

#[test]
fn test_replay_lifecycle_json() {
    let mut cmd = Command::cargo_bin("amm-ledger").unwrap();
    let assert = cmd
        .arg("replay")
        .arg(fixture("lifecycle.toml"))
        .arg("--format")
        .arg("json")
        .assert()
        .success();

    assert
        .stdout(predicate::str::starts_with("{"))
        .stdout(predicate::str::contains("\"total_liquidity\": 1199477"))
        .stdout(predicate::str::contains("\"event\": \"swap\""));
}

#[test]
fn test_replay_rejects_identical_assets() {
    let mut cmd = Command::cargo_bin("amm-ledger").unwrap();
    cmd.arg("replay")
        .arg(fixture("identical_assets.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("IdenticalAssets"));
}

#[test]
fn test_replay_missing_script() {
    let temp_dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("amm-ledger").unwrap();
    cmd.arg("replay")
        .arg(temp_dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_replay_malformed_script() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    fs::write(&path, "[pool]\nasset_a = 5\n").unwrap();

    let mut cmd = Command::cargo_bin("amm-ledger").unwrap();
    cmd.arg("replay")
        .arg(path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse configuration"));
}

#[test]
fn test_quote() {
    let mut cmd = Command::cargo_bin("amm-ledger").unwrap();
    cmd.args([
        "quote",
        "--reserve-in",
        "1000000000000000000000",
        "--reserve-out",
        "1000000000000000000000",
        "--amount-in",
        "100000000000000000000",
    ])
    .assert()
    .success()
    .stdout(predicate::str::diff("90661089388014913158\n"));
}

#[test]
fn test_quote_zero_input_fails() {
    let mut cmd = Command::cargo_bin("amm-ledger").unwrap();
    cmd.args([
        "quote",
        "--reserve-in",
        "1000",
        "--reserve-out",
        "1000",
        "--amount-in",
        "0",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("InvalidInput"));
}
