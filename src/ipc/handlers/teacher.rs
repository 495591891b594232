use crate::ipc::helpers::{require_role, run, HandlerErr, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::journal::student_grades_grid;
use crate::models::{Role, User};
use crate::validate::{positive_id, text, HomeworkDraft, ScheduleDraft};
use serde_json::json;

pub fn subject_label(subject: &str) -> &str {
    if subject.trim().is_empty() {
        "not set"
    } else {
        subject
    }
}

fn student_option(s: &User) -> serde_json::Value {
    json!({
        "value": s.id,
        "label": format!("{} | {} (#{})", s.class_or_dash(), s.full_name, s.id),
    })
}

fn handle_schedule_create(state: &mut AppState, req: &Request) -> HandlerResult {
    require_role(state, Role::Teacher)?;
    let draft = ScheduleDraft::from_params(&req.params)?;
    let entry = state.api.teacher_schedule_create(&draft)?;
    state.activity.info("Lesson saved", Some(json!(entry)));
    Ok(json!({ "entry": entry }))
}

fn handle_subject_get(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_role(state, Role::Teacher)?;
    let subject = state.api.teacher_subject()?.subject;
    state.journal.set_subject(subject.as_str());
    Ok(json!({ "subject": subject, "label": subject_label(&subject) }))
}

fn handle_subject_set(state: &mut AppState, req: &Request) -> HandlerResult {
    require_role(state, Role::Teacher)?;
    let subject = text(&req.params, "subject");
    if subject.is_empty() {
        return Err(HandlerErr::new("bad_params", "enter a subject")
            .with_details(json!({ "field": "subject" })));
    }
    let saved = state.api.teacher_set_subject(&subject)?.subject;
    state.journal.set_subject(saved.as_str());
    state
        .activity
        .info("Teacher subject saved", Some(json!({ "subject": saved })));
    Ok(json!({ "subject": saved, "label": subject_label(&saved) }))
}

fn handle_students_list(state: &mut AppState, _req: &Request) -> HandlerResult {
    require_role(state, Role::Teacher)?;
    let students = state.api.teacher_students()?;
    let options: Vec<serde_json::Value> = students.iter().map(student_option).collect();
    state.journal.set_students(students.clone());
    Ok(json!({
        "students": students,
        "options": options,
        "placeholder": "Choose a student",
    }))
}

fn handle_grades_for_student(state: &mut AppState, req: &Request) -> HandlerResult {
    require_role(state, Role::Teacher)?;
    let student_id = positive_id(req.params.get("studentId"), "studentId")?;
    let grades = state.api.teacher_grades_for_student(student_id)?;
    Ok(json!({
        "studentId": student_id,
        "grid": student_grades_grid(&grades),
    }))
}

fn handle_homework_create(state: &mut AppState, req: &Request) -> HandlerResult {
    require_role(state, Role::Teacher)?;
    let draft = HomeworkDraft::from_params(&req.params)?;
    let hw = state.api.teacher_homework_create(&draft)?;
    state.activity.info("Homework saved", Some(json!(hw)));
    Ok(json!({ "homework": hw }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teacher.schedule.create" => Some(run(state, req, "Failed to save lesson", handle_schedule_create)),
        "teacher.subject.get" => Some(run(state, req, "Failed to load subject", handle_subject_get)),
        "teacher.subject.set" => Some(run(state, req, "Failed to save subject", handle_subject_set)),
        "teacher.students.list" => Some(run(state, req, "Failed to load students", handle_students_list)),
        "teacher.grades.forStudent" => Some(run(
            state,
            req,
            "Failed to load grades",
            handle_grades_for_student,
        )),
        "teacher.homework.create" => Some(run(
            state,
            req,
            "Failed to save homework",
            handle_homework_create,
        )),
        _ => None,
    }
}
