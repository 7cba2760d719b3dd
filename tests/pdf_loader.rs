//! Runs the production loader against real (generated) PDF files.

mod common;

use std::fs;

use resume_chat::loader::{extract_pages, Loader, PdfLoader};
use tempfile::TempDir;

use common::pdf_with_pages;

fn content_lines(text: &str) -> Vec<&str> {
    text.lines().filter(|l| !l.trim().is_empty()).collect()
}

#[test]
fn test_pages_extracted_in_order() {
    let pages = extract_pages(&pdf_with_pages(&["Jane Doe", "Data Engineer"])).unwrap();
    assert_eq!(pages.len(), 2);
    assert!(pages[0].contains("Jane Doe"));
    assert!(pages[1].contains("Data Engineer"));
}

#[test]
fn test_load_skips_blank_pages_and_normalizes() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("resume.pdf");
    fs::write(
        &path,
        pdf_with_pages(&["Jane Doe", "", "S E P / 1 5 / 2 0 2 5"]),
    )
    .unwrap();

    let text = PdfLoader.load(&path).unwrap();
    assert_eq!(content_lines(&text), vec!["Jane Doe", "SEP/15/2025"]);
    assert!(text.starts_with("Jane Doe"));
    assert!(text.ends_with("SEP/15/2025"));
}

#[test]
fn test_all_blank_pages_load_as_empty() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("blank.pdf");
    fs::write(&path, pdf_with_pages(&["", ""])).unwrap();

    assert_eq!(PdfLoader.load(&path).unwrap(), "");
}
