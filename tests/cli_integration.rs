//! CLI integration tests.
//!
//! These run the `msm` binary end to end with an isolated home directory so
//! no real configuration is picked up.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// A command for `msm` whose config discovery only sees `home`.
fn msm(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("msm").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("MSM_CONFIG")
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("RUST_LOG")
        .current_dir(home.path());
    cmd
}

/// Parse each stdout line as an envelope.
fn envelopes(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn version_flag_works() {
    let home = TempDir::new().unwrap();
    msm(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("msm"));
}

#[test]
fn tools_lists_every_tool() {
    let home = TempDir::new().unwrap();
    msm(&home)
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("create_metadata_forest"))
        .stdout(predicate::str::contains("get_snippets_by_metadata_intersection"))
        .stdout(predicate::str::contains("verify_forest"));
}

#[test]
fn run_script_emits_one_envelope_per_request() {
    let home = TempDir::new().unwrap();
    let script = home.path().join("setup.jsonl");
    std::fs::write(
        &script,
        r#"# build a small forest
{"tool": "create_metadata_tree", "arguments": {"category": "concept", "root": {"name": "paradigms", "children": [{"name": "oop"}, {"name": "functional"}]}}}
{"tool": "create_snippet", "arguments": {"name": "visitor", "content": "class V: ...", "extension": "py", "category": "concept", "metadataNames": ["oop"]}}

{"tool": "get_snippets_by_metadata_subset", "arguments": {"metadataNames": ["oop"], "category": "concept"}}
{"tool": "get_metadata_siblings", "arguments": {"name": "oop"}}
{"tool": "create_metadata", "arguments": {"name": "oop", "category": "concept"}}
"#,
    )
    .unwrap();

    let output = msm(&home)
        .args(["run", "--verify"])
        .arg(&script)
        .output()
        .unwrap();
    assert!(output.status.success());

    let results = envelopes(&output.stdout);
    assert_eq!(results.len(), 5);
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[2]["content"][0]["name"], "visitor");
    assert_eq!(
        results[3]["content"]["siblings"],
        serde_json::json!(["functional", "oop"])
    );
    assert_eq!(results[4]["success"], false);
    assert_eq!(results[4]["kind"], "conflict");
}

#[test]
fn run_reads_back_a_deep_chain() {
    let home = TempDir::new().unwrap();
    let depth = 3_000;
    let mut script = String::from(
        "{\"tool\": \"create_metadata\", \"arguments\": {\"name\": \"l0\", \"category\": \"concept\"}}\n",
    );
    for i in 1..depth {
        script.push_str(&format!(
            "{{\"tool\": \"create_metadata\", \"arguments\": {{\"name\": \"l{i}\", \"category\": \"concept\", \"parentName\": \"l{}\"}}}}\n",
            i - 1
        ));
    }
    script.push_str("{\"tool\": \"get_metadata_tree\", \"arguments\": {\"name\": \"l0\"}}\n");
    script.push_str(&format!(
        "{{\"tool\": \"get_metadata_path\", \"arguments\": {{\"name\": \"l{}\"}}}}\n",
        depth - 1
    ));

    let output = msm(&home)
        .args(["run", "--fail-fast", "--verify"])
        .write_stdin(script)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), depth + 2);
    // The tree line nests deeper than serde_json reads by default.
    assert!(lines[depth].starts_with(r#"{"success":true"#));
    let path: Value = serde_json::from_str(lines[depth + 1]).unwrap();
    assert_eq!(path["content"]["path"].as_array().unwrap().len(), depth);
}

#[test]
fn run_reports_over_deep_tree_input() {
    let home = TempDir::new().unwrap();
    let mut root = String::from(r#"{"name": "n0"}"#);
    for i in 1..80 {
        root = format!(r#"{{"name": "n{i}", "children": [{root}]}}"#);
    }
    let line = format!(
        r#"{{"tool": "create_metadata_tree", "arguments": {{"category": "concept", "root": {root}}}}}"#
    );
    let output = msm(&home).arg("run").write_stdin(line).output().unwrap();
    assert!(output.status.success());
    let results = envelopes(&output.stdout);
    assert_eq!(results[0]["kind"], "validation");
    assert!(results[0]["error"].as_str().unwrap().contains("levels"));
}

#[test]
fn run_reads_stdin() {
    let home = TempDir::new().unwrap();
    msm(&home)
        .arg("run")
        .write_stdin("{\"tool\": \"ping\"}\n{\"tool\": \"no_such_tool\"}\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""success":true"#))
        .stdout(predicate::str::contains(r#""kind":"validation""#));
}

#[test]
fn run_fail_fast_stops_at_first_failure() {
    let home = TempDir::new().unwrap();
    let output = msm(&home)
        .args(["run", "--fail-fast"])
        .write_stdin("not json\n{\"tool\": \"ping\"}\n")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(envelopes(&output.stdout).len(), 1);
    assert!(String::from_utf8_lossy(&output.stderr).contains("line 1"));
}

#[test]
fn missing_script_is_an_error() {
    let home = TempDir::new().unwrap();
    msm(&home)
        .args(["run", "does-not-exist.jsonl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read script"));
}

#[test]
fn config_show_applies_defaults_and_project_overrides() {
    let home = TempDir::new().unwrap();
    msm(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_connections = 20"))
        .stdout(predicate::str::contains("level = \"warn\""));

    let project = home.path().join(".msm");
    std::fs::create_dir_all(&project).unwrap();
    std::fs::write(project.join("config.toml"), "[pool]\nmax_connections = 3\n").unwrap();
    msm(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_connections = 3"));
}

#[test]
fn invalid_config_fails() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("bad.toml");
    std::fs::write(&path, "[pool]\nmax_connections = 0\n").unwrap();
    msm(&home)
        .arg("--config")
        .arg(&path)
        .arg("tools")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn config_init_writes_once() {
    let home = TempDir::new().unwrap();
    msm(&home).args(["config", "init"]).assert().success();
    let written = home.path().join(".msm/config.toml");
    let text = std::fs::read_to_string(&written).unwrap();
    assert!(text.contains("acquisition_timeout_ms = 20000"));

    msm(&home)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    msm(&home).args(["config", "init", "--force"]).assert().success();
}

#[test]
fn completion_generates_script() {
    let home = TempDir::new().unwrap();
    msm(&home)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("msm"));
}
