mod activity;
mod api;
mod config;
mod db;
mod ipc;
mod journal;
mod models;
mod validate;

use std::io::{self, BufRead, Write};

fn main() {
    // stdout carries the protocol; logs go to stderr.
    env_logger::init();

    let config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            log::error!("invalid configuration: {e:#}");
            std::process::exit(2);
        }
    };
    log::info!(
        "schoold {} starting, backend {}",
        env!("CARGO_PKG_VERSION"),
        config.api_base
    );

    let mut state = ipc::AppState::new(config);
    if let Some(ws) = state.config.workspace.clone() {
        // Best-effort: a broken workspace must not keep the sidecar from starting.
        if let Err(e) = ipc::open_workspace(&mut state, &ws, None) {
            log::warn!("could not open workspace {}: {e:?}", ws.display());
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
                // Can't reply without id.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() },
                });
                let _ = writeln!(stdout, "{resp}");
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
}
