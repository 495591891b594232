use crate::ipc::handlers::teacher::subject_label;
use crate::ipc::helpers::{require_role, run, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::journal::{parse_iso_date, ISO_DATE};
use crate::models::Role;
use crate::validate::{iso_date, positive_id, GradeDraft, GRADE_MAX};
use chrono::Local;
use serde_json::json;

fn journal_view(state: &AppState) -> serde_json::Value {
    let j = &state.journal;
    let (from, to) = j.range().unwrap_or(("", ""));
    json!({
        "subject": j.subject(),
        "subjectLabel": subject_label(j.subject()),
        "from": from,
        "to": to,
        "dates": j.dates(),
        "grid": j.grid(),
    })
}

fn require_open(state: &AppState) -> Result<(), HandlerErr> {
    if !state.journal.is_open() {
        return Err(HandlerErr::new(
            "journal_not_open",
            "open the journal first",
        ));
    }
    Ok(())
}

fn reload(state: &mut AppState) -> Result<(), HandlerErr> {
    let (from, to) = match state.journal.range() {
        Some((f, t)) => (f.to_string(), t.to_string()),
        None => return Err(HandlerErr::new("journal_not_open", "open the journal first")),
    };
    let payload = state.api.teacher_journal(&from, &to)?;
    state.journal.load(payload);
    Ok(())
}

/// Fresh window around today (or `params.today`), students and subject.
fn handle_open(state: &mut AppState, req: &Request) -> HandlerResult {
    require_role(state, Role::Teacher)?;
    let today = match req.params.get("today").and_then(|v| v.as_str()) {
        Some(raw) => parse_iso_date(raw).ok_or_else(|| {
            HandlerErr::new("bad_params", "today must be YYYY-MM-DD")
                .with_details(json!({ "field": "today" }))
        })?,
        None => Local::now().date_naive(),
    };
    state.journal.open(today);
    log::debug!("journal window opened around {}", today.format(ISO_DATE));

    let students = state.api.teacher_students()?;
    state.journal.set_students(students);
    // A missing subject only means the teacher has not picked one yet.
    match state.api.teacher_subject() {
        Ok(s) => state.journal.set_subject(s.subject),
        Err(e) => log::debug!("teacher subject unavailable: {e}"),
    }
    Ok(journal_view(state))
}

fn handle_load(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_role(state, Role::Teacher)?;
    require_open(state)?;
    reload(state)?;
    Ok(journal_view(state))
}

fn handle_set_grade(state: &mut AppState, req: &Request) -> HandlerResult {
    require_role(state, Role::Teacher)?;
    require_open(state)?;
    if !state.journal.has_subject() {
        return Err(HandlerErr::new("no_subject", "set the teacher subject first"));
    }
    let draft = GradeDraft::from_params(&req.params)?;

    let saved = state.api.teacher_grade_create(&draft)?;
    reload(state)?;
    state.activity.info(
        "Grade saved",
        Some(json!({
            "studentId": draft.student_id,
            "date": draft.date,
            "value": draft.value,
            "subject": state.journal.subject(),
        })),
    );
    let mut view = journal_view(state);
    view["saved"] = json!(saved);
    Ok(view)
}

/// Prompt defaults for one cell: the current grade, or 5 with no comment.
/// `save` is the call the host completes with `value` and `comment`.
fn handle_cell(state: &mut AppState, req: &Request) -> HandlerResult {
    require_role(state, Role::Teacher)?;
    require_open(state)?;
    let student_id = positive_id(req.params.get("studentId"), "studentId")?;
    let date = iso_date(&req.params, "date")?;
    let existing = state.journal.latest(student_id, &date);
    Ok(json!({
        "studentId": student_id,
        "date": date,
        "prompt": format!("Grade for {date} (1-{GRADE_MAX}):"),
        "defaultValue": existing.map(|g| g.value).unwrap_or(GRADE_MAX),
        "defaultComment": existing.map(|g| g.comment.clone()).unwrap_or_default(),
        "existing": existing,
        "canEdit": state.journal.has_subject(),
        "save": {
            "method": "teacher.journal.setGrade",
            "params": { "studentId": student_id, "date": date },
        },
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teacher.journal.open" => Some(run(state, req, "Failed to open journal", handle_open)),
        "teacher.journal.load" => Some(run(state, req, "Failed to load journal", handle_load)),
        "teacher.journal.setGrade" => Some(run(state, req, "Failed to save grade", handle_set_grade)),
        "teacher.journal.cell" => Some(run(state, req, "Journal", handle_cell)),
        _ => None,
    }
}
