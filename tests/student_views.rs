mod test_support;

use serde_json::json;
use test_support::{signed_in, temp_dir};

#[test]
fn grades_table_keeps_latest_edit_per_subject_and_date() {
    let (backend, mut sidecar) = signed_in("student");
    backend.route(
        "GET",
        "/api/student/grades",
        200,
        json!([
            { "id": 1, "studentId": 1, "subject": "Math", "value": 4, "comment": "", "teacherId": 2, "date": "2024-01-01" },
            { "id": 2, "studentId": 1, "subject": "Math", "value": 5, "comment": "", "teacherId": 2, "date": "2024-01-01" },
            { "id": 3, "studentId": 1, "subject": "Art", "value": 3, "comment": "sketch", "teacherId": 4, "date": "2024-01-03" },
            { "id": 4, "studentId": 1, "subject": "", "value": 2, "comment": "", "teacherId": 4, "date": "2024-01-09" },
        ]),
    );

    let result = sidecar.request_ok("student.grades", json!({}));
    let grid = &result["grid"];
    assert_eq!(grid["kind"], "table");
    assert_eq!(grid["cornerLabel"], "Subject \\ Date");

    let rows: Vec<&str> = grid["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .filter_map(|r| r["key"].as_str())
        .collect();
    assert_eq!(rows, vec!["Art", "Math"]);
    let cols: Vec<&str> = grid["columns"]
        .as_array()
        .expect("columns")
        .iter()
        .filter_map(|c| c["key"].as_str())
        .collect();
    assert_eq!(cols, vec!["2024-01-01", "2024-01-03", "2024-01-09"]);

    let math = &grid["rows"][1]["cells"];
    assert_eq!(math[0]["value"], 5);
    assert_eq!(math[0]["title"], "No comment");
    assert_eq!(math[1]["state"], "empty");
    assert_eq!(math[1]["marker"], "-");
    assert_eq!(grid["rows"][0]["cells"][1]["title"], "sketch");
}

#[test]
fn no_grades_yields_message_not_empty_table() {
    let (backend, mut sidecar) = signed_in("student");
    backend.route("GET", "/api/student/grades", 200, json!([]));
    let result = sidecar.request_ok("student.grades", json!({}));
    assert_eq!(result["grid"]["kind"], "noData");
    assert_eq!(result["grid"]["message"], "No grades yet.");
}

#[test]
fn schedule_photo_missing_and_present() {
    let (backend, mut sidecar) = signed_in("student");
    backend.route("GET", "/api/student/schedule", 200, json!({}));
    let missing = sidecar.request_ok("student.schedule", json!({}));
    assert_eq!(missing["found"], false);

    backend.route(
        "GET",
        "/api/student/schedule",
        200,
        json!({
            "className": "7A",
            "contentType": "image/png",
            "imageData": "data:image/png;base64,iVBORw0KGgo=",
        }),
    );
    let out = temp_dir("schoold-schedule").join("schedule.png");
    let found = sidecar.request_ok(
        "student.schedule",
        json!({ "saveTo": out.to_string_lossy() }),
    );
    assert_eq!(found["found"], true);
    assert_eq!(found["className"], "7A");
    assert_eq!(found["bytes"], 8);
    let saved = std::fs::read(&out).expect("saved photo");
    assert_eq!(&saved[..4], b"\x89PNG");
}

#[test]
fn homework_lines_list_subject_description_and_due_date() {
    let (backend, mut sidecar) = signed_in("student");
    backend.route(
        "GET",
        "/api/student/homework",
        200,
        json!([
            { "id": 1, "className": "7A", "subject": "Math", "description": "ex. 4-7", "dueDate": "2024-05-10", "teacherId": 2 }
        ]),
    );
    let result = sidecar.request_ok("student.homework", json!({}));
    assert_eq!(result["lines"][0], "Math: ex. 4-7 (due 2024-05-10)");
}

#[test]
fn teacher_cannot_read_student_views() {
    let (backend, mut sidecar) = signed_in("teacher");
    let error = sidecar.request_err("student.grades", json!({}));
    assert_eq!(error["code"], "wrong_role");
    assert!(backend.requests_to("GET", "/api/student/grades").is_empty());
}
