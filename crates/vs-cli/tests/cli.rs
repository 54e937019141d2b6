//! CLI command integration tests.
//! Each test uses a temp directory via VS_DATA_DIR for full isolation.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn vs_cmd(data_dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("vs").unwrap();
    cmd.env("VS_DATA_DIR", data_dir.path());
    cmd.env_remove("VS_CONFIG");
    cmd
}

const SCENARIO: &str = r#"{
    "entityA": "Cats",
    "entityB": "Dogs",
    "regions": {
        "OR": [
            {"segment": "URBAN", "recognitionA": 90, "recognitionB": 60,
             "favorabilityA": 0.5, "favorabilityB": 0.0, "populationSharePct": 60},
            {"segment": "RURAL", "recognitionA": 40, "recognitionB": 50,
             "favorabilityA": -0.1, "favorabilityB": 0.2, "populationSharePct": 40}
        ],
        "VT": [
            {"segment": "ALL", "recognitionA": 0, "recognitionB": 0,
             "favorabilityA": 0, "favorabilityB": 0, "populationSharePct": 100}
        ]
    }
}"#;

fn write_scenario(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("scenario.json");
    std::fs::write(&path, SCENARIO).unwrap();
    path
}

#[test]
fn marginal_full_recognition() {
    let dir = TempDir::new().unwrap();
    vs_cmd(&dir)
        .args(["marginal", "1.0", "-1.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unfavorable: 1.0000"))
        .stdout(predicate::str::contains("favorable:   0.0000"));
}

#[test]
fn bonus_with_explicit_multiplier() {
    let dir = TempDir::new().unwrap();
    vs_cmd(&dir)
        .args(["bonus", "0.8", "0.2", "--multiplier", "0.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bonus_a:    +0.3000"))
        .stdout(predicate::str::contains("bonus_b:    -0.3000"))
        .stdout(predicate::str::contains("leans:      a"));
}

#[test]
fn vote_share_accepts_arrays_and_objects() {
    let dir = TempDir::new().unwrap();
    vs_cmd(&dir)
        .args([
            "vote-share",
            "[1, 0, 0, 0]",
            r#"{"favorable": 0, "neutral": 0, "unfavorable": 1, "unknown": 0}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("vote_share_a: 100.00%"))
        .stdout(predicate::str::contains("turnout:      1.0000"));
}

#[test]
fn vote_share_all_unknown_falls_back() {
    let dir = TempDir::new().unwrap();
    vs_cmd(&dir)
        .args(["vote-share", "[0, 0, 0, 1]", "[0, 0, 0, 1]"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vote_share_a: 50.00%"))
        .stdout(predicate::str::contains("50/50 fallback"));
}

#[test]
fn vote_share_rejects_short_marginal() {
    let dir = TempDir::new().unwrap();
    vs_cmd(&dir)
        .args(["vote-share", "[0.5, 0.5]", "[0, 0, 0, 1]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid marginal A"));
}

#[test]
fn simulate_then_cached() {
    let dir = TempDir::new().unwrap();
    let scenario = write_scenario(&dir);

    vs_cmd(&dir)
        .arg("simulate")
        .arg(&scenario)
        .assert()
        .success()
        .stdout(predicate::str::contains("Cats vs Dogs"))
        .stdout(predicate::str::contains("(low confidence)"))
        .stdout(predicate::str::contains("units: Cats 8, Dogs 0, unallocated 3"))
        .stdout(predicate::str::contains("winner: Cats"))
        .stdout(predicate::str::contains("source: computed"))
        .stderr(predicate::str::contains("region VT"));

    vs_cmd(&dir)
        .arg("simulate")
        .arg(&scenario)
        .assert()
        .success()
        .stdout(predicate::str::contains("source: cached"));

    vs_cmd(&dir)
        .args(["cache", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entries: 1"))
        .stdout(predicate::str::contains("ttl:     86400s"));
}

#[test]
fn simulate_json_output() {
    let dir = TempDir::new().unwrap();
    let scenario = write_scenario(&dir);

    let output = vs_cmd(&dir)
        .args(["simulate", "--json", "--no-cache"])
        .arg(&scenario)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["entityA"], "Cats");
    assert_eq!(json["tally"]["nationalWinner"], "Cats");
    assert_eq!(json["regions"]["VT"]["lowConfidence"], true);

    vs_cmd(&dir)
        .args(["cache", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entries: 0"));
}

#[test]
fn simulate_missing_field_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        r#"{"entityA": "a", "entityB": "b", "regions": {"OH": [{"segment": "X"}]}}"#,
    )
    .unwrap();

    vs_cmd(&dir)
        .arg("simulate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("regions.OH[0]"));
}

#[test]
fn tally_against_stock_units() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("winners.json");
    std::fs::write(&path, r#"{"winners": {"CA": "X", "TX": "Y", "FL": null}}"#).unwrap();

    let output = vs_cmd(&dir).arg("tally").arg(&path).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["perEntity"]["X"], 54);
    assert_eq!(json["perEntity"]["Y"], 40);
    assert_eq!(json["unallocated"], 30);
    assert_eq!(json["nationalWinner"], "X");
}

#[test]
fn tally_matches_region_codes_ignoring_case() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("winners.json");
    std::fs::write(&path, r#"{"winners": {"ca": "X", " tx ": "Y"}}"#).unwrap();

    let output = vs_cmd(&dir).arg("tally").arg(&path).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["perEntity"]["X"], 54);
    assert_eq!(json["perEntity"]["Y"], 40);
    assert_eq!(json["totalUnits"], 94);
}

#[test]
fn tally_tie_respects_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("winners.json");
    std::fs::write(
        &path,
        r#"{"winners": {"R1": "Y", "R2": "X"}, "units": {"R1": 5, "R2": 5}}"#,
    )
    .unwrap();

    let output = vs_cmd(&dir).arg("tally").arg(&path).output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json["nationalWinner"].is_null());

    std::fs::write(dir.path().join("vs.toml"), "tie_break = \"lexicographic\"\n").unwrap();
    let output = vs_cmd(&dir).arg("tally").arg(&path).output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["nationalWinner"], "X");
}

#[test]
fn units_lookup_and_overrides() {
    let dir = TempDir::new().unwrap();
    vs_cmd(&dir)
        .args(["units", "mi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MI 15"));

    vs_cmd(&dir)
        .arg("units")
        .assert()
        .success()
        .stdout(predicate::str::contains("total 538"));

    vs_cmd(&dir)
        .args(["units", "ZZ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown region 'ZZ'"));

    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "[units]\nPR = 2\n").unwrap();
    vs_cmd(&dir)
        .args(["units", "PR", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("PR 2"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("vs.toml"), "bonus_multiplier = 7.0\n").unwrap();
    vs_cmd(&dir)
        .args(["units", "CA"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bonus_multiplier"));
}

#[test]
fn cache_clear_empties_store() {
    let dir = TempDir::new().unwrap();
    let scenario = write_scenario(&dir);
    vs_cmd(&dir).arg("simulate").arg(&scenario).assert().success();

    vs_cmd(&dir)
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1 entries"));

    vs_cmd(&dir)
        .args(["cache", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entries: 0"));
}

#[test]
fn cache_purge_drops_only_expired_entries() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("vs.toml"), "cache_ttl_secs = 2\n").unwrap();
    let scenario = write_scenario(&dir);
    vs_cmd(&dir).arg("simulate").arg(&scenario).assert().success();

    vs_cmd(&dir)
        .args(["cache", "purge"])
        .assert()
        .success()
        .stdout(predicate::str::contains("purged 0 expired entries"));

    std::thread::sleep(std::time::Duration::from_secs(3));
    vs_cmd(&dir)
        .args(["cache", "purge"])
        .assert()
        .success()
        .stdout(predicate::str::contains("purged 1 expired entries"));

    vs_cmd(&dir)
        .args(["cache", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("entries: 0"));
}
