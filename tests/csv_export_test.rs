mod common;

use opus_invoice::{write_csv, OPUS_CSV_HEADERS};
use serde_json::json;
use std::fs;
use tempfile::tempdir;

fn read_rows(path: &std::path::Path) -> Vec<Vec<String>> {
    let content = fs::read_to_string(path).unwrap();
    content
        .lines()
        .map(|line| line.split(';').map(str::to_string).collect())
        .collect()
}

#[test]
fn test_import_file_layout() {
    let dir = tempdir().unwrap();
    let invoice = common::invoice(&dir);

    write_csv(&invoice).unwrap();

    let raw = fs::read_to_string(dir.path().join("opus.csv")).unwrap();
    assert_eq!(raw.matches("\r\n").count(), 3);

    let rows = read_rows(&dir.path().join("opus.csv"));
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.len() == 25));
    assert_eq!(rows[0], OPUS_CSV_HEADERS);

    assert_eq!(rows[1][0], "40000000");
    assert_eq!(rows[1][2], "XG-0000000204-00001");
    assert_eq!(rows[1][5], "Debet");
    assert_eq!(rows[1][6], "4444.22");
    assert_eq!(rows[1][8], "Test af posterings tekst");

    assert_eq!(rows[2][2], "XG-0000002473-00029");
    assert_eq!(rows[2][5], "Kredit");
    assert_eq!(rows[2][6], "4444.22");
}

#[test]
fn test_existing_content_is_replaced() {
    let dir = tempdir().unwrap();
    let invoice = common::invoice(&dir);
    fs::write(dir.path().join("opus.csv"), "gammelt indhold\n".repeat(20)).unwrap();

    write_csv(&invoice).unwrap();

    let content = fs::read_to_string(dir.path().join("opus.csv")).unwrap();
    assert!(!content.contains("gammelt"));
    assert_eq!(content.lines().count(), 3);
}

#[test]
fn test_whole_amount_keeps_input_form() {
    let dir = tempdir().unwrap();
    let invoice = common::invoice_with(&dir, "Kost", json!(10));

    write_csv(&invoice).unwrap();

    let rows = read_rows(&dir.path().join("opus.csv"));
    assert_eq!(rows[1][6], "10");
    assert_eq!(rows[2][6], "10");
}

#[test]
fn test_empty_psp_columns() {
    let dir = tempdir().unwrap();
    let mut json = common::valid_json(&dir);
    json["Debet_PSP"] = json!("");
    json["Kredit_PSP"] = json!("");
    let invoice = common::parse(json).unwrap();

    write_csv(&invoice).unwrap();

    let rows = read_rows(&dir.path().join("opus.csv"));
    assert_eq!(rows[1][2], "");
    assert_eq!(rows[2][2], "");
}

#[test]
fn test_semicolon_in_text_is_quoted() {
    let dir = tempdir().unwrap();
    let invoice = common::invoice_with(&dir, "Debet_PosteringsTekst", json!("husleje; marts"));

    write_csv(&invoice).unwrap();

    let content = fs::read_to_string(dir.path().join("opus.csv")).unwrap();
    assert!(content.contains("\"husleje; marts\""));
}
