//! CLI command integration tests.
//! Each test uses a temp directory via QL_DATA_DIR for full isolation.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ql_cmd(data_dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("ql").unwrap();
    cmd.env("QL_DATA_DIR", data_dir.path());
    cmd
}

fn export_state(dir: &TempDir) -> serde_json::Value {
    let out = dir.path().join("state.json");
    ql_cmd(dir).arg("export").arg(&out).assert().success();
    serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap()
}

#[test]
fn status_fresh_state() {
    let dir = TempDir::new().unwrap();
    ql_cmd(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("attempts left: 5"))
        .stdout(predicate::str::contains("unlock streak: 0"))
        .stdout(predicate::str::contains("visits:        1"));

    assert!(dir.path().join("state.db").exists());
    assert!(dir.path().join("cookies.txt").exists());
}

#[test]
fn visits_accumulate_across_runs() {
    let dir = TempDir::new().unwrap();
    ql_cmd(&dir).arg("status").assert().success();
    ql_cmd(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("visits:        2"));
}

#[test]
fn word_shows_hint() {
    let dir = TempDir::new().unwrap();
    ql_cmd(&dir)
        .arg("word")
        .assert()
        .success()
        .stdout(predicate::str::contains("Quantum state:"))
        .stdout(predicate::str::contains("attempts: 0/5"));
}

#[test]
fn wrong_guess_counts_attempt() {
    let dir = TempDir::new().unwrap();
    ql_cmd(&dir)
        .args(["unlock", "zzz-not-a-word"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Incorrect. Attempts remaining: 4"));

    let state = export_state(&dir);
    assert_eq!(state["quantumLock"]["attempts"], 1);
}

#[test]
fn lockout_after_five_misses() {
    let dir = TempDir::new().unwrap();
    for _ in 0..4 {
        ql_cmd(&dir).args(["unlock", "nope"]).assert().success();
    }
    ql_cmd(&dir)
        .args(["unlock", "nope"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Try again tomorrow"));

    let word = export_state(&dir)["quantumLock"]["todaysWord"]
        .as_str()
        .unwrap()
        .to_string();
    ql_cmd(&dir)
        .args(["unlock", &word])
        .assert()
        .success()
        .stdout(predicate::str::contains("Try again tomorrow"));
}

#[test]
fn correct_guess_opens_chamber() {
    let dir = TempDir::new().unwrap();
    let word = export_state(&dir)["quantumLock"]["todaysWord"]
        .as_str()
        .unwrap()
        .to_uppercase();

    ql_cmd(&dir)
        .args(["unlock", &word])
        .assert()
        .success()
        .stdout(predicate::str::contains("Quantum entanglement achieved!"))
        .stdout(predicate::str::contains("emotion match"));

    let state = export_state(&dir);
    assert_eq!(state["quantumLock"]["unlockStreak"], 1);
    let memories = state["memories"]["storage"].as_array().unwrap();
    assert_eq!(memories.len(), 1);
    assert!(
        memories[0]["content"]
            .as_str()
            .unwrap()
            .starts_with("Quantum lock unlocked with")
    );
}

#[test]
fn memory_add_list_search() {
    let dir = TempDir::new().unwrap();
    ql_cmd(&dir)
        .args(["memory", "add", "Sunset on the pier, so happy", "--tag", "pier", "--tag", "sunset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stored"));
    ql_cmd(&dir)
        .args(["memory", "add", "Coffee in the rain"])
        .assert()
        .success();

    ql_cmd(&dir)
        .args(["memory", "list", "--tag", "pier"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sunset on the pier"))
        .stdout(predicate::str::contains("Coffee").not());

    ql_cmd(&dir)
        .args(["memory", "search", "COFFEE"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Coffee in the rain"));

    ql_cmd(&dir)
        .args(["memory", "search", "volcano"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no memories found)"));
}

#[test]
fn memory_add_rejects_blank() {
    let dir = TempDir::new().unwrap();
    ql_cmd(&dir)
        .args(["memory", "add", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn poem_generate_and_favorite() {
    let dir = TempDir::new().unwrap();
    ql_cmd(&dir)
        .args(["poem", "generate", "--emotion", "joy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-- AI-"));
    ql_cmd(&dir)
        .args(["poem", "favorite", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("added to favorites"));
    ql_cmd(&dir)
        .args(["poem", "favorite", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already a favorite"));
    ql_cmd(&dir)
        .args(["poem", "favorite", "7"])
        .assert()
        .failure();
}

#[test]
fn poem_matrix_and_keep() {
    let dir = TempDir::new().unwrap();
    ql_cmd(&dir)
        .args(["poem", "matrix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-- ghalib"))
        .stdout(predicate::str::contains("-- faiz"))
        .stdout(predicate::str::contains("-- quantum"));

    ql_cmd(&dir)
        .args(["poem", "keep", "a verse worth keeping"])
        .assert()
        .success();
    ql_cmd(&dir)
        .args(["memory", "list", "--tag", "classical"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a verse worth keeping"));
}

#[test]
fn chat_without_delay() {
    let dir = TempDir::new().unwrap();
    ql_cmd(&dir)
        .args(["chat", "hello", "--no-delay"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());

    let state = export_state(&dir);
    let history = state["ai"]["conversationHistory"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[1]["role"], "ai");
}

#[test]
fn predict_prints_seven_days() {
    let dir = TempDir::new().unwrap();
    let out = ql_cmd(&dir).arg("predict").assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.lines().count(), 7);
    assert!(stdout.contains('%'));
}

#[test]
fn classify_and_train() {
    let dir = TempDir::new().unwrap();
    ql_cmd(&dir)
        .args(["classify", "my soul and the universe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prediction: spiritual"));
    ql_cmd(&dir)
        .args(["classify", "nothing matches here"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Neutral quantum field"))
        .stdout(predicate::str::contains("prediction: neutral"));
    ql_cmd(&dir)
        .args(["train", "paint the sky", "creative"])
        .assert()
        .success()
        .stdout(predicate::str::contains("predicted creative"));
    ql_cmd(&dir)
        .args(["train", "paint the sky", "grumpy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown category"));
}

#[test]
fn save_export_reset() {
    let dir = TempDir::new().unwrap();
    ql_cmd(&dir)
        .args(["memory", "add", "to be forgotten"])
        .assert()
        .success();
    ql_cmd(&dir)
        .arg("save")
        .assert()
        .success()
        .stdout(predicate::str::contains("saved"));
    assert_eq!(export_state(&dir)["memories"]["total"], 1);

    ql_cmd(&dir)
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("state reset"));
    let state = export_state(&dir);
    assert_eq!(state["memories"]["storage"].as_array().unwrap().len(), 0);
    assert_eq!(state["quantumLock"]["unlockStreak"], 0);
}

#[test]
fn config_file_overrides_max_attempts() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "max_attempts = 3\n").unwrap();
    ql_cmd(&dir)
        .arg("word")
        .assert()
        .success()
        .stdout(predicate::str::contains("attempts: 0/3"));
}

#[test]
fn bad_content_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let content = dir.path().join("content.toml");
    std::fs::write(&content, "words = []\n").unwrap();
    ql_cmd(&dir)
        .arg("--content")
        .arg(&content)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid content"));
}
