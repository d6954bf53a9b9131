use crate::auth::{self, Role};
use crate::calc;
use crate::export::{CSV_FILE_NAME, PDF_FILE_NAME};
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::rank::{self, RankTable};
use crate::scores::{LoadError, ScoreDir, ScoreTable, COLUMNS};
use serde_json::json;
use tracing::{info, warn};

pub const STUDENT_NOT_FOUND: &str = "Student data not found.";
const INVALID_STUDENT: &str = "Invalid student credentials";
const INVALID_ADMIN: &str = "Invalid admin credentials";
const RANK_UNKNOWN: &str = "N/A";

pub(super) fn required_str(req: &Request, key: &str) -> Result<String, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

fn score_dir(state: &AppState) -> Result<ScoreDir, HandlerErr> {
    state
        .score_dir()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

/// A graded report card plus the student's position in the class.
pub(super) struct StudentReport {
    pub student_id: String,
    pub table: ScoreTable,
    pub rank: String,
}

pub(super) fn authenticate(
    state: &AppState,
    role: Role,
    user_id: &str,
    password: &str,
) -> Result<(), HandlerErr> {
    if auth::verify(state.credentials.as_ref(), role, user_id, password) {
        return Ok(());
    }
    warn!(role = role.as_str(), user = user_id, "login rejected");
    let message = match role {
        Role::Student => INVALID_STUDENT,
        Role::Admin => INVALID_ADMIN,
    };
    Err(HandlerErr::new("auth_failed", message))
}

/// Everything a student sees after logging in, rebuilt from disk on each call.
pub(super) fn open_student_report(
    state: &AppState,
    user_id: &str,
    password: &str,
) -> Result<StudentReport, HandlerErr> {
    authenticate(state, Role::Student, user_id, password)?;
    let scores = score_dir(state)?;

    let mut table = match scores.load(user_id) {
        Ok(t) => t,
        Err(LoadError::NotFound { .. }) => {
            return Err(HandlerErr::new("not_found", STUDENT_NOT_FOUND)
                .with_details(json!({ "studentId": user_id })))
        }
        Err(e @ LoadError::Malformed { .. }) => {
            warn!(student = user_id, error = %e, "score file unreadable");
            return Err(HandlerErr::new("data_unreadable", e.to_string())
                .with_details(json!({ "studentId": user_id })));
        }
    };
    let summary = calc::grade_table(&mut table);
    if summary.skipped > 0 {
        info!(
            student = user_id,
            graded = summary.graded,
            skipped = summary.skipped,
            "rows left ungraded"
        );
    }

    let ranks = rank::compute_ranks(&state.config.roster, &scores);
    let rank = ranks
        .rank_of(user_id)
        .unwrap_or(RANK_UNKNOWN)
        .to_string();

    Ok(StudentReport {
        student_id: user_id.to_string(),
        table,
        rank,
    })
}

fn student_view(report: &StudentReport) -> serde_json::Value {
    let rows: Vec<Vec<String>> = report
        .table
        .rows
        .iter()
        .map(|r| r.display_cells().to_vec())
        .collect();
    json!({
        "role": Role::Student.as_str(),
        "userId": report.student_id,
        "welcome": format!("Welcome {}!", report.student_id),
        "title": format!("Report Card for {}", report.student_id),
        "columns": COLUMNS,
        "rows": rows,
        "rank": report.rank,
        "rankLine": format!("Rank: {} Position", report.rank),
        "downloads": {
            "csv": { "fileName": CSV_FILE_NAME, "mime": "text/csv" },
            "pdf": { "fileName": PDF_FILE_NAME, "mime": "application/pdf" },
        },
    })
}

fn admin_view(ranks: &RankTable) -> serde_json::Value {
    let students: Vec<serde_json::Value> = ranks
        .entries()
        .iter()
        .map(|e| {
            json!({
                "studentId": e.student_id,
                "totalScore": e.total_score.trunc() as i64,
                "rank": e.rank,
                "hasData": e.has_data,
            })
        })
        .collect();
    json!({
        "role": Role::Admin.as_str(),
        "welcome": "Welcome Admin!",
        "title": "Student Performance Overview",
        "students": students,
    })
}

fn login(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let role_raw = required_str(req, "role")?;
    let role = Role::parse(&role_raw).ok_or_else(|| {
        HandlerErr::new("bad_params", "role must be one of: Student, Admin")
            .with_details(json!({ "role": role_raw }))
    })?;
    let user_id = required_str(req, "userId")?;
    let password = required_str(req, "password")?;

    match role {
        Role::Student => {
            let report = open_student_report(state, &user_id, &password)?;
            info!(student = %user_id, rank = %report.rank, "student report served");
            Ok(student_view(&report))
        }
        Role::Admin => {
            authenticate(state, Role::Admin, &user_id, &password)?;
            let scores = score_dir(state)?;
            let ranks = rank::compute_ranks(&state.config.roster, &scores);
            info!(students = ranks.entries().len(), "admin overview served");
            Ok(admin_view(&ranks))
        }
    }
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    match login(state, req) {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "portal.login" => Some(handle_login(state, req)),
        _ => None,
    }
}
