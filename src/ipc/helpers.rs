use crate::api::ApiError;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::models::{Role, User};
use crate::validate::Invalid;
use serde_json::json;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<ApiError> for HandlerErr {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Network(message) => HandlerErr::new("network_failed", message),
            ApiError::Http { status, message } => {
                HandlerErr::new("http_error", message).with_details(json!({ "status": status }))
            }
            ApiError::Decode(message) => HandlerErr::new("bad_response", message),
        }
    }
}

impl From<Invalid> for HandlerErr {
    fn from(e: Invalid) -> Self {
        let details = e.details();
        HandlerErr::new("bad_params", e.message).with_details(details)
    }
}

pub type HandlerResult = Result<serde_json::Value, HandlerErr>;

/// Runs one handler. Failures land in the activity log under `label` and come
/// back as an IPC error; nothing is retried.
pub fn run<F>(state: &mut AppState, req: &Request, label: &str, f: F) -> serde_json::Value
where
    F: FnOnce(&mut AppState, &Request) -> HandlerResult,
{
    match f(state, req) {
        Ok(result) => ok(&req.id, result),
        Err(e) => {
            state
                .activity
                .error(label, Some(json!({ "error": e.message })));
            e.response(&req.id)
        }
    }
}

pub fn require_user(state: &AppState) -> Result<&User, HandlerErr> {
    match (&state.user, state.api.token()) {
        (Some(user), Some(_)) => Ok(user),
        _ => Err(HandlerErr::new("not_authenticated", "sign in first")),
    }
}

pub fn require_role(state: &AppState, role: Role) -> Result<&User, HandlerErr> {
    let user = require_user(state)?;
    if user.role != role {
        return Err(HandlerErr::new(
            "wrong_role",
            format!("this action is for {role} accounts"),
        )
        .with_details(json!({ "role": user.role })));
    }
    Ok(user)
}

/// Persists (or clears) the bearer token in the open workspace. A failed write
/// only costs the restore on next start, so it is logged and swallowed.
pub fn persist_token(state: &AppState) {
    let Some(conn) = state.db.as_ref() else {
        return;
    };
    let res = match state.api.token() {
        Some(token) => db::settings_set_json(conn, db::KEY_SESSION_TOKEN, &json!(token)),
        None => db::settings_delete(conn, db::KEY_SESSION_TOKEN),
    };
    if let Err(e) = res {
        log::warn!("failed to persist session token: {e:?}");
    }
}

pub fn session_view(state: &AppState) -> serde_json::Value {
    let mut view = match &state.user {
        Some(user) => json!({
            "signedIn": true,
            "label": user.session_label(),
            "role": user.role,
            "user": user,
        }),
        None => json!({
            "signedIn": false,
            "label": "Not signed in",
            "hasToken": state.api.token().is_some(),
        }),
    };
    view["lastActivity"] = json!(state.activity.latest());
    view
}

pub fn limit_param(req: &Request, default: usize) -> usize {
    req.params
        .get("limit")
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(default)
}
