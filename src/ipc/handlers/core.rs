use crate::config::normalize_api_base;
use crate::db;
use crate::ipc::helpers::{limit_param, run, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "apiBase": state.api.base(),
        "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
        "signedIn": state.user.is_some(),
    }))
}

/// Opens the session store and restores what the last run left there. An
/// explicit `api_base` wins over the stored one and is saved.
pub fn open_workspace(
    state: &mut AppState,
    path: &Path,
    api_base: Option<&str>,
) -> anyhow::Result<()> {
    let conn = db::open_db(path)?;

    match api_base.map(normalize_api_base).filter(|b| !b.is_empty()) {
        Some(base) => {
            db::settings_set_json(&conn, db::KEY_API_BASE, &json!(base))?;
            state.api.set_base(&base);
        }
        None => {
            if let Some(base) = db::settings_get_string(&conn, db::KEY_API_BASE)? {
                state.api.set_base(&base);
            }
        }
    }
    if let Some(token) = db::settings_get_string(&conn, db::KEY_SESSION_TOKEN)? {
        state.api.set_token(Some(token));
    }

    log::info!("workspace opened at {}", path.display());
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    Ok(())
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> HandlerResult {
    let Some(path) = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
    else {
        return Err(HandlerErr::new("bad_params", "missing params.path"));
    };
    let api_base = req.params.get("apiBase").and_then(|v| v.as_str());

    open_workspace(state, &path, api_base)
        .map_err(|e| HandlerErr::new("db_open_failed", format!("{e:?}")))?;

    Ok(json!({
        "workspacePath": path.to_string_lossy(),
        "apiBase": state.api.base(),
        "hasToken": state.api.token().is_some(),
    }))
}

fn handle_session_configure(state: &mut AppState, req: &Request) -> HandlerResult {
    let base = req
        .params
        .get("apiBase")
        .and_then(|v| v.as_str())
        .map(normalize_api_base)
        .unwrap_or_default();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(HandlerErr::new(
            "bad_params",
            "apiBase must be an http(s) URL",
        ));
    }
    if let Some(conn) = state.db.as_ref() {
        db::settings_set_json(conn, db::KEY_API_BASE, &json!(base))
            .map_err(|e| HandlerErr::new("db_write_failed", format!("{e:?}")))?;
    }
    state.api.set_base(&base);
    Ok(json!({ "apiBase": state.api.base() }))
}

fn handle_activity_tail(state: &mut AppState, req: &Request) -> HandlerResult {
    let entries = state.activity.tail(limit_param(req, 20));
    Ok(json!({ "entries": entries }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(run(state, req, "Health check failed", handle_health)),
        "workspace.select" => Some(run(
            state,
            req,
            "Failed to open workspace",
            handle_workspace_select,
        )),
        "session.configure" => Some(run(
            state,
            req,
            "Failed to configure backend",
            handle_session_configure,
        )),
        "activity.tail" => Some(run(state, req, "Failed to read activity", handle_activity_tail)),
        _ => None,
    }
}
