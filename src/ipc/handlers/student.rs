use crate::ipc::helpers::{require_role, run, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::journal::student_grades_grid;
use crate::models::{Homework, Role};
use crate::validate::text;
use base64::Engine;
use serde_json::json;

fn homework_line(h: &Homework) -> String {
    format!("{}: {} (due {})", h.subject, h.description, h.due_date)
}

/// Splits `data:<type>;base64,<payload>` into its content type and bytes.
pub fn decode_data_url(data_url: &str) -> Option<(String, Vec<u8>)> {
    let rest = data_url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let content_type = meta.strip_suffix(";base64")?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()?;
    Some((content_type.to_string(), bytes))
}

fn handle_schedule(state: &mut AppState, req: &Request) -> HandlerResult {
    require_role(state, Role::Student)?;
    let photo = state.api.student_schedule()?;
    if photo.image_data.trim().is_empty() {
        return Ok(json!({
            "found": false,
            "message": "No schedule found for your class yet.",
        }));
    }

    let class_name = if photo.class_name.trim().is_empty() {
        "-".to_string()
    } else {
        photo.class_name.clone()
    };
    let mut view = json!({
        "found": true,
        "className": class_name,
        "contentType": photo.content_type,
        "imageData": photo.image_data,
    });

    let save_to = text(&req.params, "saveTo");
    if !save_to.is_empty() {
        let Some((_, bytes)) = decode_data_url(&photo.image_data) else {
            return Err(HandlerErr::new(
                "bad_response",
                "schedule photo is not a base64 data URL",
            ));
        };
        std::fs::write(&save_to, &bytes).map_err(|e| {
            HandlerErr::new("io_failed", e.to_string()).with_details(json!({ "path": save_to }))
        })?;
        view["savedTo"] = json!(save_to);
        view["bytes"] = json!(bytes.len());
    }
    Ok(view)
}

fn handle_grades(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_role(state, Role::Student)?;
    let grades = state.api.student_grades()?;
    Ok(json!({ "grid": student_grades_grid(&grades) }))
}

fn handle_homework(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_role(state, Role::Student)?;
    let homework = state.api.student_homework()?;
    let lines: Vec<String> = homework.iter().map(homework_line).collect();
    Ok(json!({ "homework": homework, "lines": lines }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "student.schedule" => Some(run(state, req, "Schedule error", handle_schedule)),
        "student.grades" => Some(run(state, req, "Grades error", handle_grades)),
        "student.homework" => Some(run(state, req, "Homework error", handle_homework)),
        _ => None,
    }
}
