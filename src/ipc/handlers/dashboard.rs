use crate::ipc::helpers::{require_user, run, session_view, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::models::Role;
use serde_json::json;

fn field(name: &str, kind: &str) -> serde_json::Value {
    json!({ "name": name, "type": kind, "required": true })
}

fn optional_field(name: &str, kind: &str) -> serde_json::Value {
    json!({ "name": name, "type": kind, "required": false })
}

fn action(label: &str, method: &str) -> serde_json::Value {
    json!({ "label": label, "method": method })
}

fn admin_panels() -> serde_json::Value {
    json!([
        {
            "id": "users",
            "title": "Users",
            "actions": [action("Refresh list", "admin.users.list")],
            "form": {
                "method": "admin.users.create",
                "submitLabel": "Create user",
                "fields": [
                    field("fullName", "text"),
                    field("email", "email"),
                    field("password", "password"),
                    field("role", "select"),
                    optional_field("className", "text"),
                ],
            },
            "rowActions": [action("Delete", "admin.users.delete")],
        },
        {
            "id": "schedulePhotos",
            "title": "Schedule (photo per class)",
            "form": {
                "method": "admin.schedule.import",
                "submitLabel": "Save schedule photo",
                "fields": [field("className", "text"), field("filePath", "file")],
            },
            "actions": [
                action("Show classes with photos", "admin.schedule.stats"),
                action("Delete all schedule photos", "admin.schedule.clear"),
            ],
        },
    ])
}

fn teacher_panels() -> serde_json::Value {
    json!([
        {
            "id": "lessons",
            "title": "Add a lesson to the schedule",
            "form": {
                "method": "teacher.schedule.create",
                "submitLabel": "Save lesson",
                "fields": [
                    field("className", "text"),
                    field("subject", "text"),
                    field("weekday", "text"),
                    field("startTime", "time"),
                    field("endTime", "time"),
                    optional_field("room", "text"),
                ],
            },
        },
        {
            "id": "journal",
            "title": "Grade journal",
            "onOpen": action("Open journal", "teacher.journal.open"),
            "form": {
                "method": "teacher.subject.set",
                "submitLabel": "Save subject",
                "fields": [field("subject", "text")],
            },
            "actions": [action("Load journal", "teacher.journal.load")],
            "hint": "Date columns: a week back, today and a week ahead. Activate a cell to set a grade and comment.",
        },
        {
            "id": "homework",
            "title": "Assign homework",
            "form": {
                "method": "teacher.homework.create",
                "submitLabel": "Save homework",
                "fields": [
                    field("className", "text"),
                    field("subject", "text"),
                    field("description", "textarea"),
                    field("dueDate", "date"),
                ],
            },
        },
    ])
}

fn student_panels() -> serde_json::Value {
    json!([
        {
            "id": "schedule",
            "title": "My schedule",
            "actions": [action("Load", "student.schedule")],
        },
        {
            "id": "grades",
            "title": "My grades",
            "actions": [action("Load", "student.grades")],
        },
        {
            "id": "homework",
            "title": "My homework",
            "actions": [action("Load", "student.homework")],
        },
    ])
}

/// Declarative dashboard: panels, forms and the IPC methods they bind to.
fn handle_dashboard_get(state: &mut AppState, _req: &Request) -> HandlerResult {
    let role = require_user(state)?.role;
    let panels = match role {
        Role::Admin => admin_panels(),
        Role::Teacher => teacher_panels(),
        Role::Student => student_panels(),
    };
    Ok(json!({
        "role": role,
        "session": session_view(state),
        "panels": panels,
        "logout": action("Sign out", "auth.logout"),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.get" => Some(run(state, req, "Dashboard unavailable", handle_dashboard_get)),
        _ => None,
    }
}
