// ABOUTME: End-to-end tests for the reelfeed binary using assert_cmd.
// ABOUTME: Exercises static paging, classification output, and error exits.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

const FEED: &str = r#"{"casts": [
    {"hash": "0x1", "author": {"fid": 1}, "embeds": [{"url": "https://cdn.example.com/a.mp4"}]},
    {"hash": "0x2", "author": {"fid": 2}, "embeds": [{"url": "https://example.com/post"}]},
    {"hash": "0x3", "author": {"fid": 1}, "embeds": [{"url": "https://stream.example.com/b/index.m3u8"}]}
]}"#;

fn reelfeed() -> Command {
    let mut cmd = Command::cargo_bin("reelfeed").unwrap();
    cmd.env_remove("REELFEED_API_KEY").env_remove("RUST_LOG");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn test_page_from_static_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed.json");
    std::fs::write(&path, FEED).unwrap();

    let json = stdout_json(reelfeed().arg("page").arg("--static").arg(&path).args(["--limit", "1"]));
    assert_eq!(json["videos"].as_array().unwrap().len(), 1);
    assert_eq!(json["videos"][0]["id"], "0x1");
    assert_eq!(json["nextCursor"], "1");
    assert_eq!(json["hasMore"], true);
    assert_eq!(json["totalAvailable"], 2);
}

#[test]
fn test_page_second_page_compact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed.json");
    std::fs::write(&path, FEED).unwrap();

    reelfeed()
        .args(["--compact", "page", "--cursor", "1", "--limit", "1", "--static"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""hasMore":false"#))
        .stdout(predicate::str::contains(r#""nextCursor":null"#));
}

#[test]
fn test_page_missing_file_fails() {
    reelfeed()
        .args(["page", "--static", "/nonexistent/reelfeed/feed.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("static feed not found"));
}

#[test]
fn test_page_requires_a_source() {
    reelfeed().arg("page").assert().failure();
}

#[test]
fn test_page_rejects_non_numeric_static_cursor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed.json");
    std::fs::write(&path, FEED).unwrap();

    reelfeed()
        .args(["page", "--cursor", "next", "--static"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid cursor"));
}

#[test]
fn test_classify_reports_kinds() {
    let json = stdout_json(reelfeed().args([
        "classify",
        "https://cdn.example.com/v.MP4?token=1",
        "https://stream.example.com/live.m3u8",
        "https://example.com/page",
    ]));
    assert_eq!(json["total"], 3);
    assert_eq!(json["recognised"], 2);
    assert_eq!(json["results"][0]["descriptor"]["kind"], "mp4");
    assert_eq!(json["results"][1]["descriptor"]["kind"], "hls");
    assert!(json["results"][2]["descriptor"].is_null());
}
