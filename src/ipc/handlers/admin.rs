use crate::api::FilePart;
use crate::ipc::helpers::{require_role, run, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::models::{Role, User};
use crate::validate::{normalize_class_name, positive_id, text, Registration};
use serde_json::json;
use std::path::Path;

/// Upper bound the backend accepts for a schedule photo.
const SCHEDULE_PHOTO_MAX_BYTES: u64 = 20 << 20;

fn user_line(u: &User) -> String {
    let mut line = format!("#{} {} | {} | {}", u.id, u.full_name, u.email, u.role);
    if let Some(c) = u.class_name.as_deref().filter(|c| !c.is_empty()) {
        line.push_str(&format!(" | {c}"));
    }
    line
}

/// Content type from the file's magic bytes; `None` when it is not an image.
pub fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

fn handle_users_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_role(state, Role::Admin)?;
    let users = state.api.admin_users()?;
    let lines: Vec<String> = users.iter().map(user_line).collect();
    Ok(json!({ "users": users, "lines": lines }))
}

fn handle_users_create(state: &mut AppState, req: &Request) -> HandlerResult {
    require_role(state, Role::Admin)?;
    let reg = Registration::from_params(&req.params)?;
    let user = state.api.admin_create_user(&reg)?;
    state.activity.info("User created", Some(json!(user)));
    Ok(json!({ "user": user }))
}

fn handle_users_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    require_role(state, Role::Admin)?;
    let user_id = positive_id(req.params.get("userId"), "userId")?;
    let res = state.api.admin_delete_user(user_id)?;
    state
        .activity
        .info("User deleted", Some(json!({ "userId": user_id })));
    Ok(json!({ "userId": user_id, "server": res }))
}

fn handle_schedule_import(state: &mut AppState, req: &Request) -> HandlerResult {
    require_role(state, Role::Admin)?;
    let class_name = normalize_class_name(&text(&req.params, "className"));
    if class_name.is_empty() {
        return Err(HandlerErr::new("bad_params", "className is required")
            .with_details(json!({ "field": "className" })));
    }
    let file_path = text(&req.params, "filePath");
    if file_path.is_empty() {
        return Err(HandlerErr::new("bad_params", "choose a photo file")
            .with_details(json!({ "field": "filePath" })));
    }
    let path = Path::new(&file_path);

    let meta = std::fs::metadata(path).map_err(|e| {
        HandlerErr::new("io_failed", e.to_string()).with_details(json!({ "path": file_path }))
    })?;
    if meta.len() > SCHEDULE_PHOTO_MAX_BYTES {
        return Err(HandlerErr::new("bad_params", "photo is larger than 20 MiB")
            .with_details(json!({ "bytes": meta.len() })));
    }
    let bytes = std::fs::read(path).map_err(|e| {
        HandlerErr::new("io_failed", e.to_string()).with_details(json!({ "path": file_path }))
    })?;
    let Some(content_type) = sniff_image(&bytes) else {
        return Err(HandlerErr::new("bad_params", "uploaded file must be an image")
            .with_details(json!({ "field": "filePath" })));
    };
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("schedule");

    let res = state.api.admin_schedule_import(
        &class_name,
        FilePart {
            field: "file",
            file_name,
            content_type,
            bytes: &bytes,
        },
    )?;
    state
        .activity
        .info("Schedule photo saved", Some(res.clone()));
    Ok(json!({ "className": class_name, "contentType": content_type, "server": res }))
}

fn handle_schedule_clear(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_role(state, Role::Admin)?;
    let res = state.api.admin_schedule_clear()?;
    state
        .activity
        .info("Schedule photos deleted", Some(res.clone()));
    Ok(json!({ "server": res }))
}

fn handle_schedule_stats(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_role(state, Role::Admin)?;
    let stats = state.api.admin_schedule_stats()?;
    Ok(json!({ "total": stats.total, "classes": stats.classes }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "admin.users.list" => Some(run(state, req, "Failed to load users", handle_users_list)),
        "admin.users.create" => Some(run(state, req, "Failed to create user", handle_users_create)),
        "admin.users.delete" => Some(run(state, req, "Failed to delete user", handle_users_delete)),
        "admin.schedule.import" => Some(run(state, req, "Import failed", handle_schedule_import)),
        "admin.schedule.clear" => Some(run(
            state,
            req,
            "Failed to delete schedule",
            handle_schedule_clear,
        )),
        "admin.schedule.stats" => Some(run(
            state,
            req,
            "Failed to load schedule stats",
            handle_schedule_stats,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_recognizes_common_images() {
        assert_eq!(sniff_image(b"\x89PNG\r\n\x1a\n...."), Some("image/png"));
        assert_eq!(sniff_image(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_image(b"GIF89a..."), Some("image/gif"));
        assert_eq!(sniff_image(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_image(b"%PDF-1.7"), None);
        assert_eq!(sniff_image(b""), None);
    }

    #[test]
    fn user_line_appends_class_only_when_present() {
        let mut u = User {
            id: 7,
            full_name: "Olga".to_string(),
            email: "o@school.local".to_string(),
            role: Role::Student,
            class_name: Some("7A".to_string()),
        };
        assert_eq!(user_line(&u), "#7 Olga | o@school.local | student | 7A");
        u.class_name = None;
        assert_eq!(user_line(&u), "#7 Olga | o@school.local | student");
    }
}
