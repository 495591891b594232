//! Blocking client for the school REST backend.
//!
//! Every call goes out with `Content-Type: application/json` and, once signed
//! in, `Authorization: Bearer <token>`. Failed responses carry an `error` field
//! which becomes the error message; when it is absent the message falls back to
//! `HTTP <status>`.

use crate::models::{
    GradeRecord, Homework, JournalPayload, LoginResponse, ScheduleEntry, SchedulePhoto,
    ScheduleStats, SubjectPayload, User,
};
use crate::validate::{GradeDraft, HomeworkDraft, Registration, ScheduleDraft};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::io::Read;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// A file part for `multipart/form-data` uploads.
pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

pub struct ApiClient {
    agent: ureq::Agent,
    base: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout.min(Duration::from_secs(10)))
            .timeout_read(timeout)
            .build();
        ApiClient {
            agent,
            base: base.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn set_base(&mut self, base: &str) {
        self.base = base.trim().trim_end_matches('/').to_string();
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|t| !t.trim().is_empty());
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let mut req = self
            .agent
            .request(method, &format!("{}{}", self.base, path));
        if let Some(token) = &self.token {
            req = req.set("Authorization", &format!("Bearer {token}"));
        }
        req
    }

    fn finish(
        &self,
        method: &str,
        path: &str,
        result: Result<ureq::Response, ureq::Error>,
    ) -> ApiResult<serde_json::Value> {
        match result {
            Ok(resp) => Ok(read_json_lenient(resp)),
            Err(ureq::Error::Status(status, resp)) => {
                let body = read_json_lenient(resp);
                let message = error_message(&body, status);
                log::warn!("{method} {path} -> {status}: {message}");
                Err(ApiError::Http { status, message })
            }
            Err(ureq::Error::Transport(t)) => {
                log::warn!("{method} {path} failed: {t}");
                Err(ApiError::Network(t.to_string()))
            }
        }
    }

    pub fn send_json(
        &self,
        method: &str,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> ApiResult<serde_json::Value> {
        log::debug!("{method} {path}");
        let mut req = self
            .request(method, path)
            .set("Content-Type", "application/json");
        for (k, v) in query {
            req = req.query(k, v);
        }
        let result = match body {
            Some(b) => req.send_string(&b.to_string()),
            None => req.call(),
        };
        self.finish(method, path, result)
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        decode(self.send_json("GET", path, &[], None)?)
    }

    pub fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        decode(self.send_json("POST", path, &[], Some(&body))?)
    }

    pub fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        decode(self.send_json("DELETE", path, &[], None)?)
    }

    pub fn post_multipart(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        file: FilePart<'_>,
    ) -> ApiResult<serde_json::Value> {
        let boundary = format!(
            "schoold-{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or_default()
        );
        let body = multipart_body(&boundary, fields, &file);
        log::debug!("POST {path} (multipart, {} bytes)", body.len());
        let result = self
            .request("POST", path)
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .send_bytes(&body);
        self.finish("POST", path, result)
    }

    // --- auth ---

    pub fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        self.post("/api/login", &json!({ "email": email, "password": password }))
    }

    pub fn register(&self, reg: &Registration) -> ApiResult<User> {
        self.post("/api/register", reg)
    }

    pub fn me(&self) -> ApiResult<User> {
        self.get("/api/me")
    }

    // --- admin ---

    pub fn admin_users(&self) -> ApiResult<Vec<User>> {
        self.get("/api/admin/users")
    }

    pub fn admin_create_user(&self, reg: &Registration) -> ApiResult<User> {
        self.post("/api/admin/users", reg)
    }

    pub fn admin_delete_user(&self, user_id: i64) -> ApiResult<serde_json::Value> {
        self.delete(&format!("/api/admin/users/{user_id}"))
    }

    pub fn admin_schedule_import(
        &self,
        class_name: &str,
        file: FilePart<'_>,
    ) -> ApiResult<serde_json::Value> {
        self.post_multipart(
            "/api/admin/schedule/import",
            &[("className", class_name)],
            file,
        )
    }

    pub fn admin_schedule_clear(&self) -> ApiResult<serde_json::Value> {
        self.delete("/api/admin/schedule")
    }

    pub fn admin_schedule_stats(&self) -> ApiResult<ScheduleStats> {
        self.get("/api/admin/schedule/stats")
    }

    // --- teacher ---

    pub fn teacher_schedule_create(&self, draft: &ScheduleDraft) -> ApiResult<ScheduleEntry> {
        self.post("/api/teacher/schedule", draft)
    }

    pub fn teacher_subject(&self) -> ApiResult<SubjectPayload> {
        self.get("/api/teacher/subject")
    }

    pub fn teacher_set_subject(&self, subject: &str) -> ApiResult<SubjectPayload> {
        self.post("/api/teacher/subject", &json!({ "subject": subject }))
    }

    pub fn teacher_students(&self) -> ApiResult<Vec<User>> {
        self.get("/api/teacher/students")
    }

    pub fn teacher_journal(&self, from: &str, to: &str) -> ApiResult<JournalPayload> {
        decode(self.send_json(
            "GET",
            "/api/teacher/grades/journal",
            &[("from", from), ("to", to)],
            None,
        )?)
    }

    pub fn teacher_grade_create(&self, draft: &GradeDraft) -> ApiResult<GradeRecord> {
        self.post("/api/teacher/grades", draft)
    }

    pub fn teacher_grades_for_student(&self, student_id: i64) -> ApiResult<Vec<GradeRecord>> {
        let id = student_id.to_string();
        decode(self.send_json(
            "GET",
            "/api/teacher/grades",
            &[("studentId", id.as_str())],
            None,
        )?)
    }

    pub fn teacher_homework_create(&self, draft: &HomeworkDraft) -> ApiResult<Homework> {
        self.post("/api/teacher/homework", draft)
    }

    // --- student ---

    pub fn student_schedule(&self) -> ApiResult<SchedulePhoto> {
        self.get("/api/student/schedule")
    }

    pub fn student_grades(&self) -> ApiResult<Vec<GradeRecord>> {
        self.get("/api/student/grades")
    }

    pub fn student_homework(&self) -> ApiResult<Vec<Homework>> {
        self.get("/api/student/homework")
    }
}

/// Body as JSON; anything unreadable or unparseable reads as `{}`.
fn read_json_lenient(resp: ureq::Response) -> serde_json::Value {
    let mut raw = String::new();
    if resp.into_reader().read_to_string(&mut raw).is_err() {
        return json!({});
    }
    serde_json::from_str(&raw).unwrap_or_else(|_| json!({}))
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> ApiResult<T> {
    // A `null` list (Go nil slice) means "nothing yet".
    let value = if value.is_null() { json!([]) } else { value };
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

pub fn error_message(body: &serde_json::Value, status: u16) -> String {
    body.get("error")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

pub fn multipart_body(boundary: &str, fields: &[(&str, &str)], file: &FilePart<'_>) -> Vec<u8> {
    let mut body = Vec::with_capacity(file.bytes.len() + 512);
    for (name, value) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            file.field,
            file.file_name.replace('"', "_")
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
    body.extend_from_slice(file.bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_error_field() {
        assert_eq!(
            error_message(&json!({ "error": "invalid credentials" }), 401),
            "invalid credentials"
        );
        assert_eq!(error_message(&json!({}), 502), "HTTP 502");
        assert_eq!(error_message(&json!({ "error": "  " }), 400), "HTTP 400");
    }

    #[test]
    fn null_body_decodes_as_empty_list() {
        let rows: Vec<GradeRecord> = decode(serde_json::Value::Null).expect("decode");
        assert!(rows.is_empty());
    }

    #[test]
    fn multipart_body_has_fields_then_file() {
        let file = FilePart {
            field: "file",
            file_name: "7a.png",
            content_type: "image/png",
            bytes: b"\x89PNG",
        };
        let body = multipart_body("b0", &[("className", "7A")], &file);
        let text = String::from_utf8_lossy(&body);
        let field_at = text.find("name=\"className\"").expect("field part");
        let file_at = text.find("filename=\"7a.png\"").expect("file part");
        assert!(field_at < file_at);
        assert!(text.contains("Content-Type: image/png\r\n\r\n"));
        assert!(text.ends_with("\r\n--b0--\r\n"));
    }

    #[test]
    fn unreachable_backend_is_a_network_error() {
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1));
        match client.me() {
            Err(ApiError::Network(_)) => {}
            other => panic!("expected network error, got {other:?}"),
        }
    }
}
