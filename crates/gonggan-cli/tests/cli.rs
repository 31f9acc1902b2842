use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assert_cmd::Command;
use gonggan_models::{Message, Space, Thread};
use gonggan_storage::{read_archive, write_archive};
use predicates::str::{contains, starts_with};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

fn gonggan(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gonggan"));
    cmd.env("GONGGAN_DIR", data_dir)
        .env_remove("GEMINI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn sample_archive(dir: &Path) -> PathBuf {
    let mut space = Space::new("샘플 공간");
    let mut thread = Thread::new("첫 대화");
    thread.messages.push(Arc::new(Message::user("질문")));
    thread.messages.push(Arc::new(Message::ai_text("답변")));
    space.threads.push(Arc::new(thread));

    let path = dir.join("sample.gonggan");
    std::fs::write(&path, write_archive(&space).unwrap()).unwrap();
    path
}

fn only_archive_in(dir: &Path) -> Space {
    let entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1, "expected one archive in {}", dir.display());
    read_archive(&std::fs::read(&entries[0]).unwrap()).unwrap().space
}

#[test]
fn test_cli_help() {
    let temp = TempDir::new().unwrap();
    gonggan(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Gonggan"));
}

#[test]
fn test_cli_version() {
    let temp = TempDir::new().unwrap();
    gonggan(temp.path()).arg("--version").assert().success();
}

#[test]
fn test_cli_completions() {
    let temp = TempDir::new().unwrap();
    gonggan(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(starts_with("_gonggan"));
}

#[test]
fn test_inspect_json_summary() {
    let temp = TempDir::new().unwrap();
    let archive = sample_archive(temp.path());

    gonggan(temp.path())
        .args(["inspect", "--format", "json"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(contains("\"title\": \"샘플 공간\""))
        .stdout(contains("\"messages\": 2"));
}

#[test]
fn test_inspect_rejects_other_extensions() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("space.zip");
    std::fs::write(&path, b"x").unwrap();

    gonggan(temp.path())
        .arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("Error:"));
}

#[test]
fn test_chat_with_mock_saves_reply() {
    let temp = TempDir::new().unwrap();
    let archive = sample_archive(temp.path());
    let out = temp.path().join("out");

    gonggan(temp.path())
        .args(["chat", "--mock", "--out"])
        .arg(&out)
        .arg(&archive)
        .arg("안녕")
        .assert()
        .success()
        .stdout(contains("mock-echo: 안녕"))
        .stdout(contains("completed"));

    let space = only_archive_in(&out);
    assert_eq!(space.threads.len(), 2);
    let thread = &space.threads[0];
    assert_eq!(thread.title, "안녕");
    assert_eq!(thread.messages[1].text(), Some("mock-echo: 안녕"));
    assert!(!thread.has_streaming());
}

#[test]
fn test_chat_without_api_key_fails() {
    let temp = TempDir::new().unwrap();
    let archive = sample_archive(temp.path());

    gonggan(temp.path())
        .arg("chat")
        .arg(&archive)
        .arg("hi")
        .assert()
        .failure()
        .stderr(contains("API key"));
}

#[test]
fn test_repack_migrates_legacy_archive() {
    let temp = TempDir::new().unwrap();
    let legacy = temp.path().join("legacy.gonggan");
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("metadata.json", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(br#"{"title":"old"}"#).unwrap();
    zip.start_file("messages.json", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(
        br#"[{"id":"m1","type":"USER","contentType":"TEXT","content":"hi","timestamp":"2024-05-01T10:00:00.000Z"}]"#,
    )
    .unwrap();
    std::fs::write(&legacy, zip.finish().unwrap().into_inner()).unwrap();
    let out = temp.path().join("out");

    gonggan(temp.path())
        .args(["repack", "--out"])
        .arg(&out)
        .arg(&legacy)
        .assert()
        .success()
        .stdout(contains("Archive written"));

    let space = only_archive_in(&out);
    assert_eq!(space.title, "old");
    assert_eq!(space.threads.len(), 1);
    assert_eq!(space.threads[0].title, "이전 대화");
    assert_eq!(space.threads[0].messages[0].text(), Some("hi"));
}

#[test]
fn test_images_with_mock_record_failures() {
    let temp = TempDir::new().unwrap();
    let archive = sample_archive(temp.path());
    let out = temp.path().join("out");

    gonggan(temp.path())
        .args(["images", "--mock", "--count", "2", "--ratio", "16:9", "--out"])
        .arg(&out)
        .arg(&archive)
        .arg("노을")
        .assert()
        .success()
        .stdout(contains("failed"));

    let space = only_archive_in(&out);
    assert_eq!(space.generated_images.len(), 2);
    assert!(space.generated_images.iter().all(|i| i.image.is_none()));
    assert_eq!(space.generated_images[0].aspect_ratio, "16:9");
}

#[test]
fn test_images_rejects_large_batches() {
    let temp = TempDir::new().unwrap();
    let archive = sample_archive(temp.path());

    gonggan(temp.path())
        .args(["images", "--mock", "--count", "5"])
        .arg(&archive)
        .arg("x")
        .assert()
        .failure()
        .stderr(contains("between 1 and 4"));
}

#[test]
fn test_note_add() {
    let temp = TempDir::new().unwrap();
    let archive = sample_archive(temp.path());
    let out = temp.path().join("out");

    gonggan(temp.path())
        .args(["note", "add", "--out"])
        .arg(&out)
        .arg(&archive)
        .arg("기억할 것")
        .assert()
        .success()
        .stdout(contains("Note added"));

    let space = only_archive_in(&out);
    assert_eq!(space.notes.len(), 1);
    assert_eq!(space.notes[0].content, "기억할 것");
}

#[test]
fn test_config_init_then_show() {
    let temp = TempDir::new().unwrap();

    gonggan(temp.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(contains("Config written"));
    assert!(temp.path().join("config.toml").exists());

    gonggan(temp.path())
        .args(["config", "show"])
        .env("GEMINI_API_KEY", "secret-key-1234")
        .assert()
        .success()
        .stdout(contains("history_limit = 10"))
        .stdout(contains("****1234"));
}
