mod auth;
mod calc;
mod config;
mod export;
mod ipc;
mod pdf;
mod rank;
mod scores;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const WORKSPACE_ENV: &str = "REPORTCARD_WORKSPACE";

fn init_logging() {
    // stdout carries the protocol; logs go to stderr.
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn main() {
    init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "startup");

    let mut state = ipc::AppState::new();
    if let Some(path) = std::env::var_os(WORKSPACE_ENV).map(PathBuf::from) {
        match state.select_workspace(&path) {
            Ok(source) => info!(
                workspace = %path.display(),
                config = source.as_str(),
                "workspace selected from environment"
            ),
            Err(e) => warn!(workspace = %path.display(), error = %format!("{e:#}"), "ignoring workspace from environment"),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                let reply = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", reply);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    info!("stdin closed; shutting down");
}
