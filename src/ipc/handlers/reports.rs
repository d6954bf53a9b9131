use super::portal::{open_student_report, required_str, StudentReport};
use crate::export;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::pdf::{self, ReportCard};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

fn read_export_input(
    state: &AppState,
    req: &Request,
) -> Result<(StudentReport, PathBuf), HandlerErr> {
    let user_id = required_str(req, "userId")?;
    let password = required_str(req, "password")?;
    let out_path = required_str(req, "outPath")?;
    if out_path.trim().is_empty() {
        return Err(HandlerErr::new("bad_params", "missing outPath"));
    }
    let report = open_student_report(state, &user_id, &password)?;
    Ok((report, PathBuf::from(out_path.trim())))
}

fn write_out(out: &Path, bytes: &[u8]) -> Result<(), HandlerErr> {
    export::write_artifact(out, bytes).map_err(|e| {
        HandlerErr::new("io_failed", format!("{e:#}"))
            .with_details(json!({ "path": out.to_string_lossy() }))
    })
}

fn export_csv(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let (report, out) = read_export_input(state, req)?;
    let bytes = export::render_csv(&report.table)
        .map_err(|e| HandlerErr::new("render_failed", format!("{e:#}")))?;
    write_out(&out, &bytes)?;
    info!(student = %report.student_id, path = %out.display(), "csv exported");
    Ok(json!({
        "path": out.to_string_lossy(),
        "bytes": bytes.len(),
        "rowsExported": report.table.rows.len(),
    }))
}

fn export_pdf(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let (report, out) = read_export_input(state, req)?;
    let workspace = state
        .workspace
        .as_deref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))?;
    let card = ReportCard {
        student_id: &report.student_id,
        rank: &report.rank,
        table: &report.table,
        institution: &state.config.institution,
        logo: state.config.logo_path(workspace),
        photo: state.config.photo_path(workspace, &report.student_id),
    };
    let rendered =
        pdf::render_pdf(&card).map_err(|e| HandlerErr::new("render_failed", format!("{e:#}")))?;
    write_out(&out, &rendered.bytes)?;
    info!(
        student = %report.student_id,
        path = %out.display(),
        pages = rendered.pages,
        "pdf exported"
    );
    Ok(json!({
        "path": out.to_string_lossy(),
        "bytes": rendered.bytes.len(),
        "pages": rendered.pages,
    }))
}

fn respond(
    req: &Request,
    result: Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "report.exportCsv" => Some(respond(req, export_csv(state, req))),
        "report.exportPdf" => Some(respond(req, export_pdf(state, req))),
        _ => None,
    }
}
