//! Local form checks. Anything rejected here never reaches the backend.

use crate::journal::parse_iso_date;
use crate::models::Role;
use serde::Serialize;
use serde_json::json;

pub const GRADE_MIN: i64 = 1;
pub const GRADE_MAX: i64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Invalid {
    pub field: &'static str,
    pub message: String,
}

impl Invalid {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Invalid {
            field,
            message: message.into(),
        }
    }

    pub fn details(&self) -> serde_json::Value {
        json!({ "field": self.field })
    }
}

pub fn text(params: &serde_json::Value, name: &str) -> String {
    match params.get(name) {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn required(params: &serde_json::Value, name: &'static str) -> Result<String, Invalid> {
    let v = text(params, name);
    if v.is_empty() {
        return Err(Invalid::new(name, format!("{name} is required")));
    }
    Ok(v)
}

/// Accepts `5`, `5.0` or `"5"`; anything that is not a whole number in 1..=5
/// is rejected.
pub fn grade_value(raw: Option<&serde_json::Value>) -> Result<i64, Invalid> {
    let n = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(v) if v.fract() == 0.0 && v >= GRADE_MIN as f64 && v <= GRADE_MAX as f64 => {
            Ok(v as i64)
        }
        _ => Err(Invalid::new(
            "value",
            format!("grade must be between {GRADE_MIN} and {GRADE_MAX}"),
        )),
    }
}

pub fn positive_id(raw: Option<&serde_json::Value>, field: &'static str) -> Result<i64, Invalid> {
    let id = match raw {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match id {
        Some(v) if v > 0 => Ok(v),
        _ => Err(Invalid::new(field, format!("valid {field} is required"))),
    }
}

pub fn iso_date(params: &serde_json::Value, name: &'static str) -> Result<String, Invalid> {
    let raw = required(params, name)?;
    parse_iso_date(&raw)
        .map(|d| d.format(crate::journal::ISO_DATE).to_string())
        .ok_or_else(|| Invalid::new(name, format!("{name} must be YYYY-MM-DD")))
}

/// Canonical class label: upper-case, no spaces, Cyrillic look-alikes mapped
/// to Latin, only `[0-9A-Z]` kept. "7 а" and "7A" name the same class.
pub fn normalize_class_name(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .chars()
        .map(|c| match c {
            'А' => 'A',
            'В' => 'B',
            'Е' => 'E',
            'К' => 'K',
            'М' => 'M',
            'Н' => 'H',
            'О' => 'O',
            'Р' => 'P',
            'С' => 'C',
            'Т' => 'T',
            'У' => 'Y',
            'Х' => 'X',
            other => other,
        })
        .filter(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        .collect()
}

fn class_name(params: &serde_json::Value) -> Result<String, Invalid> {
    let raw = required(params, "className")?;
    let normalized = normalize_class_name(&raw);
    if normalized.is_empty() {
        return Err(Invalid::new("className", "className is not a valid class"));
    }
    Ok(normalized)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub class_name: String,
}

impl Registration {
    pub fn from_params(params: &serde_json::Value) -> Result<Registration, Invalid> {
        let full_name = required(params, "fullName")?;
        let email = required(params, "email")?;
        let password = match params.get("password").and_then(|v| v.as_str()) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => return Err(Invalid::new("password", "password is required")),
        };
        let role = Role::parse(&text(params, "role"))
            .ok_or_else(|| Invalid::new("role", "role must be admin|teacher|student"))?;
        let class_name = if role == Role::Student {
            class_name(params)?
        } else {
            String::new()
        };
        Ok(Registration {
            full_name,
            email,
            password,
            role,
            class_name,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDraft {
    pub class_name: String,
    pub subject: String,
    pub weekday: String,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
}

impl ScheduleDraft {
    pub fn from_params(params: &serde_json::Value) -> Result<ScheduleDraft, Invalid> {
        Ok(ScheduleDraft {
            class_name: class_name(params)?,
            subject: required(params, "subject")?,
            weekday: required(params, "weekday")?,
            start_time: required(params, "startTime")?,
            end_time: required(params, "endTime")?,
            room: text(params, "room"),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeworkDraft {
    pub class_name: String,
    pub subject: String,
    pub description: String,
    pub due_date: String,
}

impl HomeworkDraft {
    pub fn from_params(params: &serde_json::Value) -> Result<HomeworkDraft, Invalid> {
        Ok(HomeworkDraft {
            class_name: class_name(params)?,
            subject: required(params, "subject")?,
            description: required(params, "description")?,
            due_date: iso_date(params, "dueDate")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeDraft {
    pub student_id: i64,
    pub value: i64,
    pub comment: String,
    pub date: String,
}

impl GradeDraft {
    pub fn from_params(params: &serde_json::Value) -> Result<GradeDraft, Invalid> {
        Ok(GradeDraft {
            student_id: positive_id(params.get("studentId"), "studentId")?,
            date: iso_date(params, "date")?,
            value: grade_value(params.get("value"))?,
            comment: text(params, "comment"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_value_accepts_whole_numbers_in_range() {
        assert_eq!(grade_value(Some(&json!(5))), Ok(5));
        assert_eq!(grade_value(Some(&json!("3"))), Ok(3));
        assert_eq!(grade_value(Some(&json!(4.0))), Ok(4));
        assert!(grade_value(Some(&json!(0))).is_err());
        assert!(grade_value(Some(&json!(6))).is_err());
        assert!(grade_value(Some(&json!("4.5"))).is_err());
        assert!(grade_value(Some(&json!(""))).is_err());
        assert!(grade_value(None).is_err());
    }

    #[test]
    fn class_names_normalize_cyrillic_lookalikes() {
        assert_eq!(normalize_class_name(" 7 а "), "7A");
        assert_eq!(normalize_class_name("10-В"), "10B");
        assert_eq!(normalize_class_name("11x"), "11X");
        assert_eq!(normalize_class_name("—"), "");
    }

    #[test]
    fn registration_drops_class_for_non_students() {
        let reg = Registration::from_params(&json!({
            "fullName": "T. Teacher",
            "email": "t@school.local",
            "password": "pw",
            "role": "teacher",
            "className": "7A"
        }))
        .expect("valid registration");
        assert_eq!(reg.role, Role::Teacher);
        assert_eq!(reg.class_name, "");
        let body = serde_json::to_value(&reg).expect("serialize");
        assert_eq!(body["fullName"], "T. Teacher");
        assert_eq!(body["role"], "teacher");
        assert_eq!(body["className"], "");
    }

    #[test]
    fn student_registration_requires_class() {
        let err = Registration::from_params(&json!({
            "fullName": "S. Student",
            "email": "s@school.local",
            "password": "pw",
            "role": "student"
        }))
        .expect_err("missing class");
        assert_eq!(err.field, "className");
    }

    #[test]
    fn registration_rejects_unknown_role() {
        let err = Registration::from_params(&json!({
            "fullName": "X",
            "email": "x@school.local",
            "password": "pw",
            "role": "principal"
        }))
        .expect_err("bad role");
        assert_eq!(err.field, "role");
    }

    #[test]
    fn grade_draft_checks_id_date_and_value() {
        let draft = GradeDraft::from_params(&json!({
            "studentId": "12",
            "date": "2024-05-06",
            "value": 5,
            "comment": "  oral answer "
        }))
        .expect("valid grade");
        assert_eq!(draft.student_id, 12);
        assert_eq!(draft.comment, "oral answer");

        let bad_date = GradeDraft::from_params(&json!({
            "studentId": 12, "date": "06.05.2024", "value": 5
        }))
        .expect_err("bad date");
        assert_eq!(bad_date.field, "date");

        let bad_id = GradeDraft::from_params(&json!({
            "studentId": 0, "date": "2024-05-06", "value": 5
        }))
        .expect_err("bad id");
        assert_eq!(bad_id.field, "studentId");
    }

    #[test]
    fn schedule_draft_allows_missing_room() {
        let draft = ScheduleDraft::from_params(&json!({
            "className": "7a",
            "subject": "Math",
            "weekday": "Monday",
            "startTime": "08:30",
            "endTime": "09:15"
        }))
        .expect("valid lesson");
        assert_eq!(draft.class_name, "7A");
        assert_eq!(draft.room, "");

        let err = ScheduleDraft::from_params(&json!({ "className": "7A", "subject": "Math" }))
            .expect_err("missing weekday");
        assert_eq!(err.field, "weekday");
    }
}
