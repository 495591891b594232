use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim() {
            "admin" => Some(Role::Admin),
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl User {
    /// Header label shown next to the logout button.
    pub fn session_label(&self) -> String {
        format!("{} ({})", self.full_name, self.role)
    }

    pub fn class_or_dash(&self) -> &str {
        match self.class_name.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => "-",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// One grade as the backend returns it. Fields the backend omits default to
/// empty so a malformed row can still be filtered out by the grid builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub student_id: i64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub teacher_id: i64,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JournalPayload {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub grades: Vec<GradeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    #[serde(default)]
    pub id: i64,
    pub class_name: String,
    pub subject: String,
    pub weekday: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub teacher_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePhoto {
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub image_data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleStats {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub classes: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Homework {
    #[serde(default)]
    pub id: i64,
    pub class_name: String,
    pub subject: String,
    pub description: String,
    pub due_date: String,
    #[serde(default)]
    pub teacher_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectPayload {
    #[serde(default)]
    pub subject: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_record_tolerates_missing_fields() {
        let g: GradeRecord =
            serde_json::from_str(r#"{"id":3,"value":4}"#).expect("decode partial grade");
        assert_eq!(g.id, 3);
        assert_eq!(g.value, 4);
        assert!(g.subject.is_empty());
        assert!(g.date.is_empty());
    }

    #[test]
    fn user_without_class_has_dash_label() {
        let u: User = serde_json::from_str(
            r#"{"id":1,"fullName":"Admin","email":"admin@school.local","role":"admin"}"#,
        )
        .expect("decode user");
        assert_eq!(u.class_or_dash(), "-");
        assert_eq!(u.session_label(), "Admin (admin)");
    }
}
