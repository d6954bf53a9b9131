#[path = "../src/scores.rs"]
mod scores;

use scores::{Cell, LoadError, ScoreDir};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn fixture_path(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(rel)
}

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn exts() -> Vec<String> {
    vec!["xlsx".into(), "csv".into()]
}

#[test]
fn xlsx_fixture_skips_metadata_rows() {
    let dir = ScoreDir::new(fixture_path("workspace"), exts());
    let table = dir.load("Adams").expect("load Adams.xlsx");
    assert_eq!(table.rows.len(), 3);

    let first = &table.rows[0];
    assert_eq!(first.subject, Cell::Text("Mathematics".into()));
    assert_eq!(first.display_cells(), ["Mathematics", "15", "12", "50", "", "", ""].map(String::from));
    assert_eq!(table.rows[2].ca2.to_string(), "9");
}

#[test]
fn xlsx_is_preferred_over_csv() {
    let ws = temp_dir("reportcard-scores-prefer");
    std::fs::copy(fixture_path("workspace/Adams.xlsx"), ws.join("Adams.xlsx")).expect("copy");
    std::fs::write(ws.join("Adams.csv"), "not,a,report\n").expect("write csv");

    let dir = ScoreDir::new(&ws, exts());
    assert_eq!(dir.locate("Adams"), Some(ws.join("Adams.xlsx")));
    assert!(dir.load("Adams").is_ok());
}

#[test]
fn short_csv_is_malformed_not_missing() {
    let ws = temp_dir("reportcard-scores-short");
    std::fs::write(ws.join("Bala.csv"), "only,three,lines\nx\ny\n").expect("write csv");

    let dir = ScoreDir::new(&ws, exts());
    match dir.load("Bala") {
        Err(LoadError::Malformed { path, .. }) => assert_eq!(path, ws.join("Bala.csv")),
        other => panic!("expected Malformed, got {:?}", other),
    }
}

#[test]
fn corrupt_workbook_is_malformed() {
    let ws = temp_dir("reportcard-scores-corrupt");
    std::fs::write(ws.join("Deji.xlsx"), b"this is not a zip archive").expect("write xlsx");

    let dir = ScoreDir::new(&ws, exts());
    assert!(matches!(dir.load("Deji"), Err(LoadError::Malformed { .. })));
}
