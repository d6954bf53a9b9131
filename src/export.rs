use crate::scores::{ScoreTable, COLUMNS};
use anyhow::Context;
use std::path::Path;

pub const CSV_FILE_NAME: &str = "report_card.csv";
pub const PDF_FILE_NAME: &str = "report_card.pdf";

/// Graded table as UTF-8 CSV: header row, one line per subject, no index column.
pub fn render_csv(table: &ScoreTable) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(COLUMNS)
        .context("failed to write csv header")?;
    for row in &table.rows {
        writer
            .write_record(row.display_cells())
            .context("failed to write csv row")?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush csv: {}", e.error()))
}

pub fn write_artifact(out_path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    std::fs::write(out_path, bytes)
        .with_context(|| format!("failed to write {}", out_path.to_string_lossy()))
}
