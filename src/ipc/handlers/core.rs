use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    if !path.is_dir() {
        return err(
            &req.id,
            "bad_params",
            "workspace path is not a directory",
            Some(json!({ "path": path.to_string_lossy() })),
        );
    }

    match state.select_workspace(&path) {
        Ok(source) => {
            info!(
                workspace = %path.display(),
                config = source.as_str(),
                roster = state.config.roster.len(),
                "workspace selected"
            );
            ok(
                &req.id,
                json!({
                    "workspacePath": path.to_string_lossy(),
                    "rosterSize": state.config.roster.len(),
                    "configSource": source.as_str(),
                }),
            )
        }
        Err(e) => {
            warn!(workspace = %path.display(), error = %format!("{e:#}"), "workspace rejected");
            err(
                &req.id,
                "config_invalid",
                format!("{e:#}"),
                Some(json!({ "path": path.to_string_lossy() })),
            )
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
