use crate::ipc::helpers::{persist_token, run, session_view, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::validate::{text, Registration};
use serde_json::json;

fn clear_session(state: &mut AppState) {
    state.api.set_token(None);
    state.user = None;
    state.journal.close();
    persist_token(state);
}

fn handle_session_get(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(session_view(state))
}

/// Revalidates a restored token. A rejected token is dropped silently, the
/// same as signing out.
fn handle_session_bootstrap(state: &mut AppState, _req: &Request) -> HandlerResult {
    if state.api.token().is_none() {
        state.user = None;
        return Ok(session_view(state));
    }
    match state.api.me() {
        Ok(user) => {
            log::info!("session restored for user #{}", user.id);
            state.user = Some(user);
        }
        Err(e) => {
            log::info!("stored session rejected: {e}");
            clear_session(state);
        }
    }
    Ok(session_view(state))
}

fn handle_login(state: &mut AppState, req: &Request) -> HandlerResult {
    let email = text(&req.params, "email");
    let password = req
        .params
        .get("password")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if email.is_empty() || password.is_empty() {
        return Err(HandlerErr::new("bad_params", "email and password are required"));
    }

    let resp = state.api.login(&email, &password)?;
    state.api.set_token(Some(resp.token));
    state.journal.close();
    persist_token(state);
    state
        .activity
        .info("Signed in", Some(json!(resp.user)));
    state.user = Some(resp.user);
    Ok(session_view(state))
}

fn handle_register(state: &mut AppState, req: &Request) -> HandlerResult {
    let reg = Registration::from_params(&req.params)?;
    let user = state.api.register(&reg)?;
    state.activity.info("Registered", Some(json!(user)));
    Ok(json!({ "user": user }))
}

fn handle_logout(state: &mut AppState, _req: &Request) -> HandlerResult {
    clear_session(state);
    state.activity.info("Signed out", None);
    Ok(session_view(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.get" => Some(run(state, req, "Session error", handle_session_get)),
        "session.bootstrap" => Some(run(state, req, "Session error", handle_session_bootstrap)),
        "auth.login" => Some(run(state, req, "Sign-in failed", handle_login)),
        "auth.register" => Some(run(state, req, "Registration failed", handle_register)),
        "auth.logout" => Some(run(state, req, "Sign-out failed", handle_logout)),
        _ => None,
    }
}
