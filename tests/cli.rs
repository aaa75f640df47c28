use std::fs;
use std::path::Path;

use assert_cmd::Command;
use chrono::{Duration, Utc};
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::tempdir;

fn minutes_ago(minutes: i64) -> String {
    (Utc::now() - Duration::minutes(minutes)).to_rfc3339()
}

fn write_snapshot(path: &Path) {
    let snapshot = json!({
        "location": "https://x.com/home",
        "items": [
            {
                "labelledBy": "post-a",
                "times": [minutes_ago(60)],
                "groups": ["0 replies, 0 reposts, 1 like, 0 bookmarks, 40 views"]
            },
            {
                "labelledBy": "post-b",
                "times": [minutes_ago(30)],
                "links": ["/someone/status/post-a"],
                "groups": ["1 reply, 2 reposts, 10 likes, 0 bookmarks, 900 views"]
            },
            {
                "labelledBy": "post-c",
                "times": [minutes_ago(240)],
                "groups": ["5 replies, 9 reposts, 1000 likes, 3 bookmarks, 90000 views"],
                "background": "lightgreen"
            }
        ]
    });
    fs::write(path, serde_json::to_string(&snapshot).unwrap()).unwrap();
}

fn xrayfeed() -> Command {
    let mut cmd = Command::cargo_bin("xrayfeed").unwrap();
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn scan_marks_trending_posts_and_their_targets() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("feed.json");
    let config = dir.path().join("config.yaml");
    write_snapshot(&snapshot);

    let output = xrayfeed()
        .arg("scan")
        .arg(&snapshot)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let marked: Value = serde_json::from_slice(&output.stdout).unwrap();
    let backgrounds: Vec<Option<&str>> = marked["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item.get("background").and_then(Value::as_str))
        .collect();
    assert_eq!(
        backgrounds,
        vec![Some("lightgreen"), Some("lightgreen"), None]
    );
}

#[test]
fn scan_uses_stored_highlight_color() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("feed.json");
    let config = dir.path().join("config.yaml");
    write_snapshot(&snapshot);
    fs::write(&config, "highlightColor: '#ffd700'\n").unwrap();

    xrayfeed()
        .arg("scan")
        .arg(&snapshot)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("#ffd700"));
}

#[test]
fn serve_answers_commands_line_by_line() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("feed.json");
    let config = dir.path().join("config.yaml");
    write_snapshot(&snapshot);

    let input = [
        r#"{"type": "GET_STATUS"}"#,
        r#"{"type": "START"}"#,
        r#"{"type": "BOGUS"}"#,
        r#"{"type": "GET_STATUS"}"#,
        r#"{"type": "UPDATE_CONFIG", "config": {"frequency": "abc"}}"#,
        r#"{"navigate": "https://x.com/explore"}"#,
        r#"{"type": "GET_STATUS"}"#,
    ]
    .join("\n");

    let output = xrayfeed()
        .arg("serve")
        .arg(&snapshot)
        .arg("--config")
        .arg(&config)
        .write_stdin(input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"{"isActive":false}"#,
            r#"{"success":true}"#,
            r#"{"isActive":true}"#,
            r#"{"success":true}"#,
            r#"{"isActive":false}"#,
        ]
    );
}

#[test]
fn serve_remembers_start_across_navigation() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("feed.json");
    let config = dir.path().join("config.yaml");
    write_snapshot(&snapshot);

    let input = [
        r#"{"type": "START"}"#,
        r#"{"navigate": "https://x.com/explore"}"#,
        r#"{"navigate": "https://x.com/home"}"#,
        r#"{"type": "GET_STATUS"}"#,
        r#"{"type": "UPDATE_CONFIG", "config": {"highlightColor": "gold"}}"#,
    ]
    .join("\n");

    let output = xrayfeed()
        .arg("serve")
        .arg(&snapshot)
        .arg("--config")
        .arg(&config)
        .write_stdin(input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"{"success":true}"#,
            r#"{"isActive":true}"#,
            r#"{"success":true}"#,
        ]
    );

    let saved = fs::read_to_string(&config).unwrap();
    assert!(saved.contains("isActive: true"), "{saved}");
    assert!(saved.contains("highlightColor: gold"), "{saved}");
}

#[test]
fn stop_is_saved_for_the_next_run() {
    let dir = tempdir().unwrap();
    let snapshot = dir.path().join("feed.json");
    let config = dir.path().join("config.yaml");
    write_snapshot(&snapshot);
    fs::write(&config, "isActive: true\n").unwrap();

    xrayfeed()
        .arg("serve")
        .arg(&snapshot)
        .arg("--config")
        .arg(&config)
        .write_stdin(r#"{"type": "STOP"}"#)
        .assert()
        .success();

    let saved = fs::read_to_string(&config).unwrap();
    assert!(saved.contains("isActive: false"), "{saved}");
}

#[test]
fn reset_restores_default_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    fs::write(&config, "highlightColor: red\nisActive: true\n").unwrap();

    xrayfeed()
        .arg("reset")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("config.yaml"));

    let saved = fs::read_to_string(&config).unwrap();
    assert!(saved.contains("highlightColor: lightgreen"), "{saved}");
    assert!(saved.contains("isActive: false"), "{saved}");
}

#[test]
fn missing_snapshot_fails() {
    xrayfeed()
        .arg("scan")
        .arg("/definitely/not/here.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("snapshot"));
}
