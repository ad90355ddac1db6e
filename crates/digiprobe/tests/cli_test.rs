//! Integration tests for the `digiprobe` CLI binary.
//!
//! These exercise argument parsing, help output, shell completions, the
//! offline classifier commands, config handling, and a full static run
//! against an unreachable probe target (every probe falls back).
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `digiprobe` binary with env isolation.
///
/// Clears all `DIGIPROBE_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn digiprobe_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("digiprobe");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("DIGIPROBE_PROFILE")
        .env_remove("DIGIPROBE_STORE_URL")
        .env_remove("DIGIPROBE_API_KEY")
        .env_remove("DIGIPROBE_PROBE_BASE")
        .env_remove("DIGIPROBE_OUTPUT")
        .env_remove("DIGIPROBE_INSECURE")
        .env_remove("DIGIPROBE_TIMEOUT");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = digiprobe_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("run")
            .and(predicate::str::contains("identity"))
            .and(predicate::str::contains("classify"))
            .and(predicate::str::contains("results")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("digiprobe"));
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_for_packaged_shells() {
    let home = tempfile::tempdir().unwrap();
    for (shell, marker) in [("bash", "_digiprobe()"), ("fish", "complete -c digiprobe")] {
        digiprobe_cmd(home.path())
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains(marker));
    }
}

// ── Classifier ──────────────────────────────────────────────────────

#[test]
fn test_classify_good_not_excellent() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path())
        .args(["-o", "plain", "classify", "--download", "5", "--ping", "20", "--mos", "4"])
        .assert()
        .success()
        .stdout("good\n");
}

#[test]
fn test_classify_fast_but_low_mos_is_poor() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path())
        .args(["-o", "json", "classify", "--download", "3", "--ping", "10", "--mos", "3.5"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""category": "poor""#)
                .and(predicate::str::contains(r##""hex": "#ef4444""##)),
        );
}

#[test]
fn test_glyph_for_known_operator() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path())
        .args(["-o", "json-compact", "glyph", "PT Telkomsel"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r##""letter":"T","color":"#ef4444""##));
}

#[test]
fn test_glyph_for_empty_label() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path())
        .args(["-o", "plain", "glyph", ""])
        .assert()
        .success()
        .stdout("W\n");
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = tempfile::tempdir().unwrap();
    let output = digiprobe_cmd(home.path()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("foobar"));
}

#[test]
fn test_invalid_output_format() {
    let home = tempfile::tempdir().unwrap();
    let output = digiprobe_cmd(home.path())
        .args(["--output", "invalid", "glyph", "x"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_static_run_requires_poi() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path())
        .args(["run", "--operator", "Telkomsel", "--offline"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("require"));
}

#[test]
fn test_results_need_remote_store() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path())
        .args(["results", "some-session"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("store_url"));
}

#[test]
fn test_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path())
        .args(["--profile", "lab", "sessions"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("lab"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_profile"));
}

#[test]
fn test_config_set_then_profiles() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path())
        .args(["config", "set", "ping_url", "http://127.0.0.1:9/generate_204"])
        .assert()
        .success();

    digiprobe_cmd(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout("default *\n");
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path())
        .args(["config", "set", "controller", "x"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

#[test]
fn test_config_subcommands_exist() {
    let home = tempfile::tempdir().unwrap();
    digiprobe_cmd(home.path())
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("set-key")),
        );
}

// ── Full run ────────────────────────────────────────────────────────

#[test]
fn test_static_run_records_five_results() {
    let home = tempfile::tempdir().unwrap();
    let output = digiprobe_cmd(home.path())
        .args([
            "--probe-base",
            "http://127.0.0.1:9",
            "--timeout",
            "2",
            "-o",
            "json",
            "run",
            "--operator",
            "Starlink",
            "--poi",
            "Tugu Jogja",
            "--position",
            "-7.7828,110.3671",
            "--offline",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 5);

    // Position is captured on the first run only in static mode.
    assert!(results[0]["position"].is_object());
    assert!(results[1..].iter().all(|r| r["position"].is_null()));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("closed after 5 run(s)"), "{stderr}");
}
