//! E2E tests for `sweep classify`, `sweep explain` and `sweep cycles`.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Camera and light on their own nodes, an empty node, a `*_end` leaf under
/// the lamp, a skinned body with one bone, and a component of a kind no
/// rule knows about.
const SCENE: &str = r#"{
  "nodes": [
    {"id": 0, "name": "Root", "transform": 100, "components": [
      {"id": 1, "kind": "Camera"}
    ]},
    {"id": 1, "name": "Lamp", "parent": 0, "transform": 101, "components": [
      {"id": 2, "kind": "Light"}
    ]},
    {"id": 2, "name": "Empty", "parent": 0, "transform": 102},
    {"id": 3, "name": "Lamp_end", "parent": 1, "transform": 103},
    {"id": 4, "name": "Body", "parent": 0, "transform": 104, "components": [
      {"id": 5, "kind": "SkinnedMeshRenderer", "fields": {
        "bones": {"list": [{"node": 5}]}
      }}
    ]},
    {"id": 5, "name": "Hips", "parent": 4, "transform": 105},
    {"id": 6, "name": "Odd", "parent": 0, "transform": 106, "components": [
      {"id": 3, "kind": "Mystery", "fields": {"target": {"component": 2}}}
    ]}
  ]
}"#;

fn sweep_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sweep"));
    cmd.current_dir(dir);
    cmd.env("SWEEP_LOG", "error");
    cmd.env_remove("SWEEP_FORMAT");
    cmd
}

fn write_scene(dir: &Path) -> PathBuf {
    let path = dir.join("scene.json");
    fs::write(&path, SCENE).expect("write scene");
    path
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("sweep should not crash");
    assert!(
        output.status.success(),
        "sweep failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn liveness_of(classified: &Value, id: u64) -> String {
    classified["components"]
        .as_array()
        .expect("components array")
        .iter()
        .find(|row| row["id"] == id)
        .and_then(|row| row["liveness"].as_str())
        .unwrap_or_else(|| panic!("component {id} missing"))
        .to_string()
}

#[test]
fn classify_reports_every_component() {
    let dir = TempDir::new().expect("tempdir");
    let scene = write_scene(dir.path());

    let classified = json_output(sweep_cmd(dir.path()).arg("classify").arg(&scene).arg("--json"));

    assert_eq!(classified["components"].as_array().map(Vec::len), Some(11));
    assert_eq!(classified["summary"]["required"], 9);
    assert_eq!(classified["summary"]["required_while_active"], 0);
    assert_eq!(classified["summary"]["removable"], 2);
    assert!(
        classified["content_hash"]
            .as_str()
            .is_some_and(|h| h.starts_with("blake3:"))
    );

    assert_eq!(liveness_of(&classified, 1), "required");
    assert_eq!(liveness_of(&classified, 100), "required");
    assert_eq!(liveness_of(&classified, 102), "removable");
    assert_eq!(liveness_of(&classified, 103), "removable");
    assert_eq!(liveness_of(&classified, 105), "required");
    // unknown kinds are kept, along with what they reference
    assert_eq!(liveness_of(&classified, 3), "required");
    assert_eq!(classified["unknown_kinds"], serde_json::json!(["Mystery"]));
}

#[test]
fn classify_text_filters_by_level() {
    let dir = TempDir::new().expect("tempdir");
    let scene = write_scene(dir.path());

    sweep_cmd(dir.path())
        .arg("classify")
        .arg(&scene)
        .args(["--only", "removable", "--format", "text"])
        .assert()
        .success()
        .stdout("102\tremovable\tTransform\tEmpty\n103\tremovable\tTransform\tLamp_end\n");
}

#[test]
fn preserve_end_bones_flag_keeps_end_leaves() {
    let dir = TempDir::new().expect("tempdir");
    let scene = write_scene(dir.path());

    let classified = json_output(
        sweep_cmd(dir.path())
            .args(["--preserve-end-bones", "classify"])
            .arg(&scene)
            .arg("--json"),
    );
    assert_eq!(liveness_of(&classified, 103), "required");
    assert_eq!(liveness_of(&classified, 102), "removable");
}

#[test]
fn config_file_in_working_directory_is_honored() {
    let dir = TempDir::new().expect("tempdir");
    let scene = write_scene(dir.path());
    fs::write(dir.path().join("sweep.toml"), "preserve_end_bones = true\n").expect("write config");

    let classified = json_output(sweep_cmd(dir.path()).arg("classify").arg(&scene).arg("--json"));
    assert_eq!(liveness_of(&classified, 103), "required");
}

#[test]
fn explicit_config_path_is_honored() {
    let dir = TempDir::new().expect("tempdir");
    let scene = write_scene(dir.path());
    let config = dir.path().join("strict.toml");
    fs::write(&config, "preserve_end_bones = true\nend_bone_suffix = \"_END\"\n")
        .expect("write config");

    let classified = json_output(
        sweep_cmd(dir.path())
            .arg("--config")
            .arg(&config)
            .arg("classify")
            .arg(&scene)
            .arg("--json"),
    );
    assert_eq!(liveness_of(&classified, 103), "required");
}

#[test]
fn missing_explicit_config_fails_with_path() {
    let dir = TempDir::new().expect("tempdir");
    let scene = write_scene(dir.path());
    fs::write(dir.path().join("sweep.toml"), "preserve_end_bones = true\n").expect("write config");

    sweep_cmd(dir.path())
        .arg("--config")
        .arg(dir.path().join("typo.toml"))
        .arg("classify")
        .arg(&scene)
        .assert()
        .failure()
        .stderr(predicate::str::contains("typo.toml"));
}

#[test]
fn verbose_flag_enables_debug_logs() {
    let dir = TempDir::new().expect("tempdir");
    let scene = write_scene(dir.path());

    sweep_cmd(dir.path())
        .env_remove("SWEEP_LOG")
        .env_remove("DEBUG")
        .args(["-v", "classify"])
        .arg(&scene)
        .assert()
        .success()
        .stderr(predicate::str::contains("loaded snapshot"));

    sweep_cmd(dir.path())
        .env_remove("SWEEP_LOG")
        .env_remove("DEBUG")
        .arg("classify")
        .arg(&scene)
        .assert()
        .success()
        .stderr(predicate::str::contains("loaded snapshot").not());
}

#[test]
fn malformed_config_fails_with_path() {
    let dir = TempDir::new().expect("tempdir");
    let scene = write_scene(dir.path());
    fs::write(dir.path().join("sweep.toml"), "preserve_end_bones = \"maybe\"\n")
        .expect("write config");

    sweep_cmd(dir.path())
        .arg("classify")
        .arg(&scene)
        .assert()
        .failure()
        .stderr(predicate::str::contains("sweep.toml"));
}

#[test]
fn explain_walks_back_to_the_skin() {
    let dir = TempDir::new().expect("tempdir");
    let scene = write_scene(dir.path());

    let explained = json_output(
        sweep_cmd(dir.path())
            .args(["explain"])
            .arg(&scene)
            .args(["105", "--json"]),
    );
    assert_eq!(explained["liveness"], "required");
    assert_eq!(explained["entry_point"], false);

    let chain = explained["chain"].as_array().expect("chain array");
    let ids: Vec<u64> = chain.iter().filter_map(|s| s["id"].as_u64()).collect();
    assert_eq!(ids, vec![5, 105]);
    assert_eq!(chain[0]["kind"], "SkinnedMeshRenderer");
    assert!(chain[0].get("via").is_none());
    assert!(
        chain[1]["via"]
            .as_str()
            .is_some_and(|via| via.starts_with("active, if target enabled"))
    );
}

#[test]
fn explain_pretty_output_names_the_chain() {
    let dir = TempDir::new().expect("tempdir");
    let scene = write_scene(dir.path());

    sweep_cmd(dir.path())
        .args(["explain"])
        .arg(&scene)
        .args(["#101", "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kept by"))
        .stdout(predicate::str::contains("Light"));
}

#[test]
fn explain_unknown_component_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let scene = write_scene(dir.path());

    let output = sweep_cmd(dir.path())
        .args(["explain"])
        .arg(&scene)
        .args(["999", "--json"])
        .output()
        .expect("sweep should not crash");
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let json_end = stderr.find("\n}").map_or(stderr.len(), |i| i + 2);
    let error: Value = serde_json::from_str(&stderr[..json_end]).expect("JSON error on stderr");
    assert_eq!(error["error"]["code"], "unknown_component");
}

#[test]
fn cycles_finds_skin_bone_loop() {
    let dir = TempDir::new().expect("tempdir");
    let scene = write_scene(dir.path());

    let cycles = json_output(sweep_cmd(dir.path()).arg("cycles").arg(&scene).arg("--json"));
    assert_eq!(cycles["cycles"].as_array().map(Vec::len), Some(1));
    assert_eq!(cycles["cycles"][0]["members"], serde_json::json!([5, 105]));
    assert_eq!(cycles["cycles"][0]["back_edges"], serde_json::json!([[105, 5]]));

    sweep_cmd(dir.path())
        .arg("cycles")
        .arg(&scene)
        .args(["--format", "text"])
        .assert()
        .success()
        .stdout("5 105\n");
}

#[test]
fn missing_snapshot_fails_with_context() {
    let dir = TempDir::new().expect("tempdir");

    sweep_cmd(dir.path())
        .args(["classify", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read snapshot"));
}

#[test]
fn malformed_snapshot_fails_with_context() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"nodes\": [").expect("write");

    sweep_cmd(dir.path())
        .arg("classify")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse snapshot"));
}

#[test]
fn invalid_scene_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("dup.json");
    fs::write(
        &path,
        r#"{"nodes": [
            {"id": 0, "name": "A", "transform": 10},
            {"id": 0, "name": "B", "transform": 11}
        ]}"#,
    )
    .expect("write");

    sweep_cmd(dir.path())
        .arg("classify")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid scene"));
}
