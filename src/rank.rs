use crate::scores::{Cell, LoadError, ScoreDir, ScoreTable};
use serde::Serialize;
use tracing::{debug, warn};

pub fn ordinal(n: usize) -> String {
    let suffix = if (11..=13).contains(&(n % 100)) {
        "th"
    } else {
        match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{n}{suffix}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnsummableCell {
    pub row: usize,
    pub value: String,
}

/// Raw CA1 + CA2 + Exam over every row. Unlike grading, fractional marks keep
/// their value; a non-numeric cell or a non-finite sum makes the whole table
/// unsummable.
pub fn raw_total(table: &ScoreTable) -> Result<f64, UnsummableCell> {
    let mut total = 0.0;
    for (idx, row) in table.rows.iter().enumerate() {
        for cell in [&row.ca1, &row.ca2, &row.exam] {
            let value = match cell {
                Cell::Empty => 0.0,
                Cell::Int(v) => *v as f64,
                Cell::Float(v) if v.is_nan() => 0.0,
                Cell::Float(v) => *v,
                Cell::Text(s) if s.trim().is_empty() => 0.0,
                Cell::Text(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
            };
            total += value;
            if value.is_nan() || !total.is_finite() {
                return Err(UnsummableCell {
                    row: idx,
                    value: cell.to_string(),
                });
            }
        }
    }
    Ok(total)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankEntry {
    pub student_id: String,
    pub total_score: f64,
    pub rank: String,
    pub has_data: bool,
}

/// Ranks for a whole roster, kept in roster order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankTable {
    entries: Vec<RankEntry>,
}

impl RankTable {
    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    pub fn get(&self, student_id: &str) -> Option<&RankEntry> {
        self.entries.iter().find(|e| e.student_id == student_id)
    }

    pub fn rank_of(&self, student_id: &str) -> Option<&str> {
        self.get(student_id).map(|e| e.rank.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentTotal {
    pub student_id: String,
    pub total: f64,
    pub has_data: bool,
}

/// Orders by total descending. The sort is stable, so equal totals keep the
/// order they were given in (roster order).
pub fn rank_totals(totals: Vec<StudentTotal>) -> RankTable {
    let mut order: Vec<usize> = (0..totals.len()).collect();
    order.sort_by(|&a, &b| totals[b].total.total_cmp(&totals[a].total));

    let mut ranks = vec![String::new(); totals.len()];
    for (pos, idx) in order.into_iter().enumerate() {
        ranks[idx] = ordinal(pos + 1);
    }

    let entries = totals
        .into_iter()
        .zip(ranks)
        .map(|(t, rank)| RankEntry {
            student_id: t.student_id,
            total_score: t.total,
            rank,
            has_data: t.has_data,
        })
        .collect();
    RankTable { entries }
}

/// Total for one student; missing or unreadable files contribute 0 so a
/// single bad file never blocks ranking the rest of the roster.
pub fn student_total(scores: &ScoreDir, student_id: &str) -> StudentTotal {
    let zero = |has_data| StudentTotal {
        student_id: student_id.to_string(),
        total: 0.0,
        has_data,
    };
    match scores.load(student_id) {
        Ok(table) => match raw_total(&table) {
            Ok(total) => StudentTotal {
                student_id: student_id.to_string(),
                total,
                has_data: true,
            },
            Err(bad) => {
                warn!(
                    student = student_id,
                    row = bad.row,
                    value = %bad.value,
                    "non-numeric score; ranking with total 0"
                );
                zero(true)
            }
        },
        Err(LoadError::NotFound { .. }) => {
            debug!(student = student_id, "no score file; ranking with total 0");
            zero(false)
        }
        Err(e @ LoadError::Malformed { .. }) => {
            warn!(student = student_id, error = %e, "ranking with total 0");
            zero(false)
        }
    }
}

pub fn compute_ranks(roster: &[String], scores: &ScoreDir) -> RankTable {
    let totals = roster
        .iter()
        .map(|id| student_total(scores, id))
        .collect::<Vec<_>>();
    rank_totals(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::ScoreRow;

    fn total(id: &str, total: f64) -> StudentTotal {
        StudentTotal {
            student_id: id.to_string(),
            total,
            has_data: true,
        }
    }

    #[test]
    fn ordinal_suffixes() {
        let cases = [
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (22, "22nd"),
            (101, "101st"),
            (111, "111th"),
            (112, "112th"),
            (113, "113th"),
        ];
        for (n, want) in cases {
            assert_eq!(ordinal(n), want, "ordinal({n})");
        }
    }

    #[test]
    fn ties_keep_roster_order() {
        let ranks = rank_totals(vec![
            total("Adams", 200.0),
            total("Bala", 150.0),
            total("Deji", 200.0),
            total("Ngozi", 90.0),
        ]);
        assert_eq!(ranks.rank_of("Adams"), Some("1st"));
        assert_eq!(ranks.rank_of("Deji"), Some("2nd"));
        assert_eq!(ranks.rank_of("Bala"), Some("3rd"));
        assert_eq!(ranks.rank_of("Ngozi"), Some("4th"));

        let ids: Vec<_> = ranks.entries().iter().map(|e| e.student_id.as_str()).collect();
        assert_eq!(ids, ["Adams", "Bala", "Deji", "Ngozi"]);

        let swapped = rank_totals(vec![total("Deji", 200.0), total("Adams", 200.0)]);
        assert_eq!(swapped.rank_of("Deji"), Some("1st"));
        assert_eq!(swapped.rank_of("Adams"), Some("2nd"));
    }

    #[test]
    fn raw_total_ignores_grading_outcome() {
        let table = ScoreTable {
            rows: vec![
                ScoreRow::new(
                    Cell::Text("Maths".into()),
                    Cell::Float(10.5),
                    Cell::Empty,
                    Cell::Int(40),
                ),
                ScoreRow::new(
                    Cell::Text("English".into()),
                    Cell::Text("12".into()),
                    Cell::Int(8),
                    Cell::Int(30),
                ),
            ],
        };
        assert_eq!(raw_total(&table), Ok(100.5));
    }

    #[test]
    fn raw_total_rejects_text_marks() {
        let table = ScoreTable {
            rows: vec![ScoreRow::new(
                Cell::Text("Maths".into()),
                Cell::Text("abc".into()),
                Cell::Int(1),
                Cell::Int(1),
            )],
        };
        let err = raw_total(&table).expect_err("text mark");
        assert_eq!(err.row, 0);
        assert_eq!(err.value, "abc");
    }

    #[test]
    fn infinite_marks_make_the_table_unsummable() {
        let table = ScoreTable {
            rows: vec![
                ScoreRow::new(
                    Cell::Text("Maths".into()),
                    Cell::Int(10),
                    Cell::Float(f64::INFINITY),
                    Cell::Int(1),
                ),
                ScoreRow::new(
                    Cell::Text("English".into()),
                    Cell::Float(f64::NEG_INFINITY),
                    Cell::Int(1),
                    Cell::Int(1),
                ),
            ],
        };
        let err = raw_total(&table).expect_err("infinite mark");
        assert_eq!(err.row, 0);
        assert_eq!(err.value, "inf");
    }

    #[test]
    fn nan_totals_still_rank_in_a_total_order() {
        let ranks = rank_totals(vec![
            total("Adams", f64::NAN),
            total("Bala", 150.0),
            total("Deji", 90.0),
        ]);
        let mut seen: Vec<_> = ranks.entries().iter().map(|e| e.rank.clone()).collect();
        seen.sort();
        assert_eq!(seen, ["1st", "2nd", "3rd"]);
        assert_eq!(ranks.rank_of("Bala"), Some("2nd"));
        assert_eq!(ranks.rank_of("Deji"), Some("3rd"));
    }

    #[test]
    fn missing_students_rank_with_zero() {
        let scores = ScoreDir::new(
            std::env::temp_dir().join("reportcardd-rank-missing"),
            vec!["csv".into()],
        );
        let roster = vec!["Adams".to_string(), "Bala".to_string()];
        let ranks = compute_ranks(&roster, &scores);
        assert_eq!(ranks.entries().len(), 2);
        assert!(ranks.entries().iter().all(|e| e.total_score == 0.0 && !e.has_data));
        assert_eq!(ranks.rank_of("Adams"), Some("1st"));
        assert_eq!(ranks.rank_of("Bala"), Some("2nd"));
    }
}
