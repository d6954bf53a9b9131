use crate::scores::{Cell, Grade, ScoreRow, ScoreTable};

/// Grade bands as inclusive lower bounds, highest first.
const GRADE_BANDS: [(i64, Grade); 3] = [(75, Grade::A), (60, Grade::B), (50, Grade::C)];

/// Largest float magnitude that truncates into an `i64` without saturating.
const MAX_FLOAT_SCORE: f64 = 9.0e18;

/// Integer reading of a score cell. Blank counts as 0; whole-number text is
/// accepted; fractional floats truncate toward zero.
pub fn parse_score(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Empty => Some(0),
        Cell::Int(v) => Some(*v),
        Cell::Float(v) if v.is_finite() && v.abs() < MAX_FLOAT_SCORE => Some(v.trunc() as i64),
        Cell::Float(_) => None,
        Cell::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                Some(0)
            } else {
                t.parse::<i64>().ok()
            }
        }
    }
}

pub fn grade_for(final_score: i64) -> Grade {
    GRADE_BANDS
        .iter()
        .find(|(floor, _)| final_score >= *floor)
        .map(|(_, g)| *g)
        .unwrap_or(Grade::F)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Graded { final_score: i64, grade: Grade },
    Skipped,
}

/// CA1 + CA2 + Exam and its grade, or `Skipped` if any input is not an
/// integer or the sum does not fit in an `i64`.
pub fn evaluate_row(row: &ScoreRow) -> RowOutcome {
    let parsed = (
        parse_score(&row.ca1),
        parse_score(&row.ca2),
        parse_score(&row.exam),
    );
    let (Some(ca1), Some(ca2), Some(exam)) = parsed else {
        return RowOutcome::Skipped;
    };
    let Some(final_score) = ca1.checked_add(ca2).and_then(|s| s.checked_add(exam)) else {
        return RowOutcome::Skipped;
    };
    RowOutcome::Graded {
        final_score,
        grade: grade_for(final_score),
    }
}

/// Writes Final/Grade for one row. A skipped row is left exactly as it was.
pub fn grade_row(row: &mut ScoreRow) -> RowOutcome {
    let outcome = evaluate_row(row);
    if let RowOutcome::Graded { final_score, grade } = outcome {
        row.final_score = Some(final_score);
        row.grade = Some(grade);
    }
    outcome
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradeSummary {
    pub graded: usize,
    pub skipped: usize,
}

pub fn grade_table(table: &mut ScoreTable) -> GradeSummary {
    let mut summary = GradeSummary::default();
    for row in table.rows.iter_mut() {
        match grade_row(row) {
            RowOutcome::Graded { .. } => summary.graded += 1,
            RowOutcome::Skipped => summary.skipped += 1,
        }
    }
    summary
}
