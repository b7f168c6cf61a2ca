//! CLI integration tests for the Scribe command-line interface.
//!
//! Each test runs against its own temporary database, config directory and
//! working directory, so no user configuration leaks in.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Isolated environment for one test.
struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Env with a `scribe.toml` in the working directory.
    fn with_config(toml: &str) -> Self {
        let env = Self::new();
        std::fs::write(env.dir.path().join("scribe.toml"), toml).unwrap();
        env
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("data").join("sessions.db")
    }

    fn scribe(&self) -> Command {
        let mut cmd = Command::cargo_bin("scribe").unwrap();
        cmd.current_dir(self.dir.path())
            .env("SCRIBE_CONFIG_DIR", self.dir.path().join("config"))
            .env_remove("SCRIBE_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--db")
            .arg(self.db());
        cmd
    }

    fn add(&self, id: &str, audio_secs: u64) {
        self.scribe()
            .args(["add", "--id", id, "--audio-secs", &audio_secs.to_string()])
            .assert()
            .success();
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.scribe().arg("--json").args(args).output().unwrap();
        assert!(
            output.status.success(),
            "scribe {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn session_ids(&self) -> Vec<String> {
        self.json(&["list"])
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap().to_string())
            .collect()
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// One-megabyte budget with no grace window.
const SMALL_BUDGET: &str = r#"
[cache]
max_total_mb = 1
grace_window_secs = 0

[logging]
json = false
"#;

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    Env::new()
        .scribe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("storage budget"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("cleanup"))
        .stdout(predicate::str::contains("background"))
        .stdout(predicate::str::contains("clear"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    Env::new()
        .scribe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("scribe"));
}

#[test]
fn test_unknown_subcommand_rejected() {
    Env::new().scribe().arg("frobnicate").assert().failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Records
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_add_and_list() {
    let env = Env::new();
    env.scribe()
        .args(["add", "--id", "standup", "--title", "Daily standup", "--notes", "ship it"])
        .assert()
        .success()
        .stdout(predicate::str::contains("standup"));

    let list = env.json(&["list"]);
    let entry = &list[0];
    assert_eq!(entry["id"], "standup");
    assert_eq!(entry["title"], "Daily standup");
    assert_eq!(entry["estimated_size"], 1024 + 7);
}

#[test]
fn test_add_reports_estimate() {
    let env = Env::new();
    let output = env.json(&["add", "--id", "call", "--audio-secs", "60"]);
    assert_eq!(output["id"], "call");
    assert_eq!(output["estimated_size"], 61_024);
}

#[test]
fn test_add_transcript_from_file() {
    let env = Env::new();
    let transcript = env.path().join("transcript.txt");
    std::fs::write(&transcript, "hello world").unwrap();

    let output = env.json(&["add", "--transcript-file", transcript.to_str().unwrap()]);
    assert_eq!(output["estimated_size"], 1024 + 11);
}

#[test]
fn test_add_duplicate_id_fails() {
    let env = Env::new();
    env.add("dup", 0);
    env.scribe()
        .args(["add", "--id", "dup"])
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Stats and Cleanup
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_stats_reports_usage() {
    let env = Env::with_config(SMALL_BUDGET);
    env.add("a", 600);
    env.add("b", 600);

    let stats = env.json(&["stats"]);
    assert_eq!(stats["session_count"], 2);
    assert_eq!(stats["current_size"], 2 * 601_024);
    assert_eq!(stats["max_total_size"], 1024 * 1024);
    assert_eq!(stats["pressure"], "critical");
}

#[test]
fn test_cleanup_evicts_oldest_first() {
    let env = Env::with_config(SMALL_BUDGET);
    env.add("first", 600);
    env.add("second", 600);
    env.add("third", 600);

    let report = env.json(&["cleanup"]);

    assert_eq!(report["evicted"], serde_json::json!(["first", "second"]));
    assert_eq!(env.session_ids(), vec!["third"]);
}

#[test]
fn test_cleanup_keep_protects_session() {
    let env = Env::with_config(
        r#"
[cache]
max_total_mb = 1
grace_window_secs = 3600

[logging]
json = false
"#,
    );
    env.add("first", 600);
    env.add("second", 600);
    env.add("third", 600);

    let report = env.json(&["cleanup", "--keep", "first"]);

    assert_eq!(report["protected"], 1);
    assert_eq!(env.session_ids(), vec!["first"]);
}

#[test]
fn test_cleanup_dry_run_deletes_nothing() {
    let env = Env::with_config(SMALL_BUDGET);
    env.add("first", 600);
    env.add("second", 600);

    let plan = env.json(&["cleanup", "--dry-run"]);

    assert_eq!(plan["candidates"][0]["session_id"], "first");
    assert_eq!(env.session_ids().len(), 2);
}

#[test]
fn test_background_within_budget() {
    let env = Env::new();
    env.add("a", 10);

    env.scribe()
        .arg("background")
        .assert()
        .success()
        .stdout(predicate::str::contains("Within budget"));
    assert_eq!(env.session_ids(), vec!["a"]);
}

#[test]
fn test_background_over_budget_evicts() {
    let env = Env::with_config(SMALL_BUDGET);
    env.add("first", 600);
    env.add("second", 600);

    let report = env.json(&["background"]);

    assert_eq!(report["cleanup"]["evicted"], serde_json::json!(["first"]));
    assert_eq!(env.session_ids(), vec!["second"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Clear
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_clear_requires_confirmation() {
    let env = Env::new();
    env.add("a", 0);

    env.scribe()
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    assert_eq!(env.session_ids().len(), 1);
}

#[test]
fn test_clear_then_stats_reports_empty() {
    let env = Env::new();
    env.add("a", 30);
    env.add("b", 30);

    let cleared = env.json(&["clear", "--yes"]);
    assert_eq!(cleared["removed"], 2);

    let stats = env.json(&["stats"]);
    assert_eq!(stats["session_count"], 0);
    assert_eq!(stats["current_size"], 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_includes_project_overrides() {
    let env = Env::with_config(SMALL_BUDGET);
    env.scribe()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[cache]"))
        .stdout(predicate::str::contains("max_total_mb = 1"));
}

#[test]
fn test_config_which_lists_project_file() {
    let env = Env::with_config(SMALL_BUDGET);
    env.scribe()
        .args(["config", "which"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scribe.toml"))
        .stdout(predicate::str::contains("sessions.db"));
}

#[test]
fn test_invalid_config_rejected() {
    let env = Env::with_config("[cache]\ntarget_ratio = 2.0\n");
    env.scribe()
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("target_ratio"));
}
