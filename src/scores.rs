use calamine::{open_workbook_auto, Data, Reader};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rows of institution/term metadata above the column header row.
pub const HEADER_ROWS_SKIPPED: usize = 8;

pub const COLUMNS: [&str; 7] = ["Subject", "CA1", "CA2", "Exam", "Final", "Grade", "Remark"];

/// Subject + CA1 + CA2 + Exam must be present for a sheet to be usable.
const MIN_SOURCE_COLUMNS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn from_sheet(value: &Data) -> Cell {
        match value {
            Data::Empty => Cell::Empty,
            Data::Int(v) => Cell::Int(*v),
            Data::Float(v) => Cell::Float(*v),
            Data::String(s) if s.is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }

    fn from_csv_field(field: &str) -> Cell {
        let t = field.trim();
        if t.is_empty() {
            return Cell::Empty;
        }
        if let Ok(v) = t.parse::<i64>() {
            return Cell::Int(v);
        }
        if let Ok(v) = t.parse::<f64>() {
            return Cell::Float(v);
        }
        Cell::Text(field.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Int(v) => write!(f, "{v}"),
            // Spreadsheets store whole marks as floats; show them as integers.
            Cell::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{}", *v as i64)
            }
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    A,
    B,
    C,
    F,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::F => "F",
        }
    }

    pub fn remark(self) -> &'static str {
        match self {
            Grade::A => "Excellent",
            Grade::B => "Very Good",
            Grade::C => "Credit",
            Grade::F => "Failed",
        }
    }
}

/// One subject line of a report card. `final_score` and `grade` stay `None`
/// until the row is graded.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub subject: Cell,
    pub ca1: Cell,
    pub ca2: Cell,
    pub exam: Cell,
    pub final_score: Option<i64>,
    pub grade: Option<Grade>,
}

impl ScoreRow {
    pub fn new(subject: Cell, ca1: Cell, ca2: Cell, exam: Cell) -> Self {
        Self {
            subject,
            ca1,
            ca2,
            exam,
            final_score: None,
            grade: None,
        }
    }

    pub fn remark(&self) -> Option<&'static str> {
        self.grade.map(Grade::remark)
    }

    /// Display strings in `COLUMNS` order; unset derived values are blank.
    pub fn display_cells(&self) -> [String; 7] {
        [
            self.subject.to_string(),
            self.ca1.to_string(),
            self.ca2.to_string(),
            self.exam.to_string(),
            self.final_score.map(|v| v.to_string()).unwrap_or_default(),
            self.grade.map(|g| g.as_str().to_string()).unwrap_or_default(),
            self.remark().map(str::to_string).unwrap_or_default(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    pub rows: Vec<ScoreRow>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no score file for {student_id}")]
    NotFound { student_id: String },
    #[error("unreadable score file {}: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },
}

/// Directory of per-student score files, named `<student-id>.<ext>`.
#[derive(Debug, Clone)]
pub struct ScoreDir {
    root: PathBuf,
    extensions: Vec<String>,
}

impl ScoreDir {
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extensions,
        }
    }

    /// First existing `<student-id>.<ext>`, trying extensions in order.
    pub fn locate(&self, student_id: &str) -> Option<PathBuf> {
        self.extensions
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", student_id, ext.trim_start_matches('.'))))
            .find(|p| p.is_file())
    }

    pub fn load(&self, student_id: &str) -> Result<ScoreTable, LoadError> {
        let Some(path) = self.locate(student_id) else {
            return Err(LoadError::NotFound {
                student_id: student_id.to_string(),
            });
        };
        load_score_file(&path)
    }
}

pub fn load_score_file(path: &Path) -> Result<ScoreTable, LoadError> {
    let is_csv = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    let grid = if is_csv {
        read_csv_grid(path)
    } else {
        read_sheet_grid(path)
    }
    .map_err(|message| LoadError::Malformed {
        path: path.to_path_buf(),
        message,
    })?;
    table_from_grid(grid).map_err(|message| LoadError::Malformed {
        path: path.to_path_buf(),
        message,
    })
}

/// Cells of the first worksheet addressed from A1, so leading blank rows
/// still count towards the skipped metadata block.
fn read_sheet_grid(path: &Path) -> Result<Vec<Vec<Cell>>, String> {
    let mut workbook = open_workbook_auto(path).map_err(|e| e.to_string())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook has no worksheets".to_string())?
        .map_err(|e| e.to_string())?;

    let Some((start_row, start_col)) = range.start() else {
        return Ok(Vec::new());
    };
    let mut grid: Vec<Vec<Cell>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; start_col as usize];
        cells.extend(row.iter().map(Cell::from_sheet));
        grid.push(cells);
    }
    Ok(grid)
}

fn read_csv_grid(path: &Path) -> Result<Vec<Vec<Cell>>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| e.to_string())?;
    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        grid.push(record.iter().map(Cell::from_csv_field).collect());
    }
    Ok(grid)
}

fn table_from_grid(grid: Vec<Vec<Cell>>) -> Result<ScoreTable, String> {
    let mut rows = grid.into_iter().skip(HEADER_ROWS_SKIPPED);
    let Some(header) = rows.next() else {
        return Err(format!(
            "expected a column header after {} metadata rows",
            HEADER_ROWS_SKIPPED
        ));
    };
    let header_width = header.iter().rposition(|c| !c.is_blank()).map_or(0, |i| i + 1);
    if header_width < MIN_SOURCE_COLUMNS {
        return Err(format!(
            "header row has {} columns, need at least {}",
            header_width, MIN_SOURCE_COLUMNS
        ));
    }

    let mut table = ScoreTable::default();
    for raw in rows {
        let mut cells = raw.into_iter().take(MIN_SOURCE_COLUMNS);
        let mut next = || cells.next().unwrap_or(Cell::Empty);
        let row = ScoreRow::new(next(), next(), next(), next());
        if [&row.subject, &row.ca1, &row.ca2, &row.exam]
            .iter()
            .all(|c| c.is_blank())
        {
            continue;
        }
        table.rows.push(row);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn grid_with(rows: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
        let mut grid = vec![vec![text("meta")]; HEADER_ROWS_SKIPPED];
        grid.extend(rows);
        grid
    }

    #[test]
    fn float_cells_display_like_whole_marks() {
        assert_eq!(Cell::Float(15.0).to_string(), "15");
        assert_eq!(Cell::Float(15.5).to_string(), "15.5");
        assert_eq!(Cell::Empty.to_string(), "");
    }

    #[test]
    fn grid_skips_metadata_and_blank_rows() {
        let header = COLUMNS.iter().map(|c| text(c)).collect::<Vec<_>>();
        let grid = grid_with(vec![
            header,
            vec![text("Maths"), Cell::Int(10), Cell::Int(12), Cell::Int(50)],
            vec![Cell::Empty, Cell::Empty],
            vec![text("English"), Cell::Float(8.0)],
        ]);
        let table = table_from_grid(grid).expect("table");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].ca2, Cell::Empty);
        assert_eq!(table.rows[1].exam, Cell::Empty);
        assert_eq!(table.rows[0].final_score, None);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let header = vec![text("Subject"), text("CA1"), text("CA2"), text("Exam"), text("X")];
        let grid = grid_with(vec![
            header,
            vec![
                text("Maths"),
                Cell::Int(1),
                Cell::Int(2),
                Cell::Int(3),
                Cell::Int(4),
                Cell::Int(5),
                Cell::Int(6),
                Cell::Int(7),
                text("ignored"),
            ],
        ]);
        let table = table_from_grid(grid).expect("table");
        assert_eq!(table.rows[0].display_cells()[3], "3");
        assert_eq!(table.rows[0].display_cells()[4], "");
    }

    #[test]
    fn narrow_or_short_sheets_are_malformed() {
        assert!(table_from_grid(vec![vec![text("only")]; 3]).is_err());
        let grid = grid_with(vec![vec![text("Subject"), text("CA1")]]);
        assert!(table_from_grid(grid).is_err());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = ScoreDir::new(
            std::env::temp_dir().join("reportcardd-no-such-dir"),
            vec!["xlsx".into(), "csv".into()],
        );
        match dir.load("Nobody") {
            Err(LoadError::NotFound { student_id }) => assert_eq!(student_id, "Nobody"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
