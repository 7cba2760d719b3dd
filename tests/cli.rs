mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use common::pdf_with_pages;

fn binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("resume-chat");
    path
}

fn setup_test_env(extra: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[document]
path = "{root}/resume.pdf"

[upload]
dir = "{root}/uploads"

[server]
bind = "127.0.0.1:9123"

[answerer]
provider = "disabled"
{extra}
"#,
        root = root.display(),
        extra = extra,
    );

    let config_path = config_dir.join("resume-chat.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RESUME_PATH")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_status_shows_effective_config() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run(&config_path, &["status"]);
    assert!(success, "status failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("resume.pdf (missing)"));
    assert!(stdout.contains("disabled"));
    assert!(stdout.contains("FullDocument"));
    assert!(stdout.contains("127.0.0.1:9123"));
}

#[test]
fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("absent.toml");

    let (stdout, _, success) = run(&config_path, &["status"]);
    assert!(success);
    assert!(stdout.contains("document:   (none)"));
    assert!(stdout.contains("127.0.0.1:8000"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_tmp, config_path) = setup_test_env("timeout_secs = 0");

    let (_, stderr, success) = run(&config_path, &["status"]);
    assert!(!success);
    assert!(stderr.contains("answerer.timeout_secs"), "stderr: {}", stderr);
}

#[test]
fn test_extract_missing_file_fails() {
    let (tmp, config_path) = setup_test_env("");
    let missing = tmp.path().join("nope.pdf");

    let (_, stderr, success) = run(&config_path, &["extract", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("PDF file not found"), "stderr: {}", stderr);
}

#[test]
fn test_extract_prints_normalized_text() {
    let (tmp, config_path) = setup_test_env("");
    let pdf = tmp.path().join("resume.pdf");
    fs::write(&pdf, pdf_with_pages(&["Jane Doe", "", "S E P / 1 5 / 2 0 2 5"])).unwrap();

    let (stdout, stderr, success) = run(&config_path, &["extract", pdf.to_str().unwrap()]);
    assert!(success, "extract failed: stderr={}", stderr);
    let jane = stdout.find("Jane Doe").expect("first page missing");
    let date = stdout.find("SEP/15/2025").expect("normalized date missing");
    assert!(jane < date);
}

#[test]
fn test_extract_rejects_non_pdf() {
    let (tmp, config_path) = setup_test_env("");
    let notes = tmp.path().join("notes.pdf");
    fs::write(&notes, "plain text, not a PDF").unwrap();

    let (_, stderr, success) = run(&config_path, &["extract", notes.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("PDF extraction failed"), "stderr: {}", stderr);
}

#[test]
fn test_ask_reports_load_failure() {
    let (_tmp, config_path) = setup_test_env("");

    let (_, stderr, success) = run(&config_path, &["ask", "What are your skills?"]);
    assert!(!success);
    assert!(stderr.contains("Failed to load resume"), "stderr: {}", stderr);
    assert!(stderr.contains("PDF file not found"), "stderr: {}", stderr);
}

#[test]
fn test_ask_without_document_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("absent.toml");

    let (_, stderr, success) = run(&config_path, &["ask", "What are your skills?"]);
    assert!(!success);
    assert!(stderr.contains("No resume given"), "stderr: {}", stderr);
}
