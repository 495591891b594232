use crate::models::{GradeRecord, JournalPayload, User};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use serde_json::json;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Days shown on each side of "today" in the teacher journal.
pub const DATE_WINDOW_RADIUS: i64 = 7;

pub const ISO_DATE: &str = "%Y-%m-%d";

/// Returns `today - 7 ..= today + 7` as ISO dates.
pub fn date_window(today: NaiveDate) -> Vec<String> {
    (-DATE_WINDOW_RADIUS..=DATE_WINDOW_RADIUS)
        .map(|offset| (today + Duration::days(offset)).format(ISO_DATE).to_string())
        .collect()
}

pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), ISO_DATE).ok()
}

fn script_rank(c: char) -> u8 {
    if c.is_numeric() {
        1
    } else if ('\u{0400}'..='\u{04FF}').contains(&c) {
        2
    } else if c.is_alphabetic() {
        3
    } else {
        0
    }
}

fn collation_key(s: &str) -> Vec<(u8, char)> {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ё' { 'е' } else { c })
        .map(|c| (script_rank(c), c))
        .collect()
}

fn case_mask(s: &str) -> Vec<bool> {
    s.chars().map(char::is_uppercase).collect()
}

/// Russian-locale style ordering. Letters compare case-insensitively with `ё`
/// folded into `е`, and scripts rank punctuation, digits, Cyrillic, then the
/// rest. Ties put `е` before `ё` and lowercase before uppercase.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| case_mask(a).cmp(&case_mask(b)))
        .then_with(|| a.cmp(b))
}

/// A row or column header. `key` matches what the key extractor returns for a
/// record; `label` is what the UI shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisKey {
    pub key: String,
    pub label: String,
}

impl AxisKey {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        AxisKey {
            key: key.into(),
            label: label.into(),
        }
    }

    pub fn plain(key: impl Into<String>) -> Self {
        let key = key.into();
        AxisKey {
            label: key.clone(),
            key,
        }
    }
}

/// Where an axis gets its keys from.
#[derive(Debug, Clone)]
pub enum Axis {
    /// Distinct non-blank keys found in the records, sorted.
    FromRecords,
    /// Keys supplied by the caller (enrolled students, date window). Order is
    /// kept as given; duplicates collapse onto the first occurrence.
    Supplied(Vec<AxisKey>),
}

/// IPC method a cell invokes when activated, with the param names the row and
/// column keys are bound to.
#[derive(Debug, Clone, Copy)]
pub struct CellBinding {
    pub method: &'static str,
    pub row_param: &'static str,
    pub column_param: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct GridStyle {
    pub corner_label: &'static str,
    pub empty_marker: &'static str,
    pub empty_title: Option<&'static str>,
    pub comment_fallback: &'static str,
    pub no_data_message: &'static str,
    pub binding: Option<CellBinding>,
}

pub const STUDENT_GRADES_STYLE: GridStyle = GridStyle {
    corner_label: "Subject \\ Date",
    empty_marker: "-",
    empty_title: None,
    comment_fallback: "No comment",
    no_data_message: "No grades yet.",
    binding: None,
};

pub const TEACHER_JOURNAL_STYLE: GridStyle = GridStyle {
    corner_label: "Student",
    empty_marker: "+",
    empty_title: Some("Click to set a grade"),
    comment_fallback: "Click to set a grade",
    no_data_message: "Student list is empty.",
    binding: Some(CellBinding {
        method: "teacher.journal.cell",
        row_param: "studentId",
        column_param: "date",
    }),
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum GridCell {
    #[serde(rename_all = "camelCase")]
    Empty {
        marker: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        action: Option<serde_json::Value>,
    },
    #[serde(rename_all = "camelCase")]
    Grade {
        grade_id: i64,
        value: i64,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        action: Option<serde_json::Value>,
    },
}

impl GridCell {
    #[allow(dead_code)]
    pub fn value(&self) -> Option<i64> {
        match self {
            GridCell::Grade { value, .. } => Some(*value),
            GridCell::Empty { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRow {
    pub key: String,
    pub label: String,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridTable {
    pub corner_label: String,
    pub columns: Vec<AxisKey>,
    pub rows: Vec<GridRow>,
}

impl GridTable {
    #[allow(dead_code)]
    pub fn cell(&self, row_key: &str, column_key: &str) -> Option<&GridCell> {
        let col = self.columns.iter().position(|c| c.key == column_key)?;
        let row = self.rows.iter().find(|r| r.key == row_key)?;
        row.cells.get(col)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GridView {
    NoData { message: String },
    Table(GridTable),
}

impl GridView {
    pub fn table(&self) -> Option<&GridTable> {
        match self {
            GridView::Table(t) => Some(t),
            GridView::NoData { .. } => None,
        }
    }
}

pub type CellKey = (String, String);

/// Latest record per `(row, column)`. The greatest id wins; records with a
/// blank key on either axis are skipped.
pub fn latest_by_key<'a, R, C>(
    records: &'a [GradeRecord],
    row_key: R,
    col_key: C,
) -> HashMap<CellKey, &'a GradeRecord>
where
    R: Fn(&GradeRecord) -> String,
    C: Fn(&GradeRecord) -> String,
{
    let mut map: HashMap<CellKey, &GradeRecord> = HashMap::new();
    for r in records {
        let row = row_key(r).trim().to_string();
        let col = col_key(r).trim().to_string();
        if row.is_empty() || col.is_empty() {
            continue;
        }
        match map.get(&(row.clone(), col.clone())) {
            Some(prev) if prev.id >= r.id => {}
            _ => {
                map.insert((row, col), r);
            }
        }
    }
    map
}

fn resolve_axis<F>(
    axis: Axis,
    records: &[GradeRecord],
    key_of: F,
    sort: fn(&str, &str) -> Ordering,
) -> Vec<AxisKey>
where
    F: Fn(&GradeRecord) -> String,
{
    match axis {
        Axis::Supplied(keys) => {
            let mut seen = HashSet::new();
            keys.into_iter()
                .filter(|k| !k.key.trim().is_empty() && seen.insert(k.key.clone()))
                .collect()
        }
        Axis::FromRecords => {
            let mut keys: Vec<String> = records
                .iter()
                .map(|r| key_of(r).trim().to_string())
                .filter(|k| !k.is_empty())
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            keys.sort_by(|a, b| sort(a, b));
            keys.into_iter().map(AxisKey::plain).collect()
        }
    }
}

fn cell_action(style: &GridStyle, row: &str, column: &str) -> Option<serde_json::Value> {
    style.binding.map(|b| {
        let mut params = serde_json::Map::new();
        params.insert(b.row_param.to_string(), json!(row));
        params.insert(b.column_param.to_string(), json!(column));
        json!({ "method": b.method, "params": params })
    })
}

/// Builds the deduplicated grade grid. Never fails: a grid with no rows or no
/// columns comes back as [`GridView::NoData`].
pub fn build_grid<R, C>(
    records: &[GradeRecord],
    row_key: R,
    col_key: C,
    rows: Axis,
    columns: Axis,
    style: &GridStyle,
) -> GridView
where
    R: Fn(&GradeRecord) -> String,
    C: Fn(&GradeRecord) -> String,
{
    let rows = resolve_axis(rows, records, &row_key, locale_cmp);
    let columns = resolve_axis(columns, records, &col_key, |a: &str, b: &str| a.cmp(b));

    if rows.is_empty() || columns.is_empty() {
        return GridView::NoData {
            message: style.no_data_message.to_string(),
        };
    }

    let latest = latest_by_key(records, row_key, col_key);

    let rows = rows
        .into_iter()
        .map(|row| {
            let cells = columns
                .iter()
                .map(|col| {
                    let action = cell_action(style, &row.key, &col.key);
                    match latest.get(&(row.key.clone(), col.key.clone())) {
                        Some(g) => {
                            let title = if g.comment.trim().is_empty() {
                                style.comment_fallback.to_string()
                            } else {
                                g.comment.clone()
                            };
                            GridCell::Grade {
                                grade_id: g.id,
                                value: g.value,
                                title,
                                action,
                            }
                        }
                        None => GridCell::Empty {
                            marker: style.empty_marker.to_string(),
                            title: style.empty_title.map(str::to_string),
                            action,
                        },
                    }
                })
                .collect();
            GridRow {
                key: row.key,
                label: row.label,
                cells,
            }
        })
        .collect();

    GridView::Table(GridTable {
        corner_label: style.corner_label.to_string(),
        columns,
        rows,
    })
}

/// Student view: subjects down, dates across, both taken from the records.
pub fn student_grades_grid(records: &[GradeRecord]) -> GridView {
    build_grid(
        records,
        |r| r.subject.clone(),
        |r| r.date.clone(),
        Axis::FromRecords,
        Axis::FromRecords,
        &STUDENT_GRADES_STYLE,
    )
}

fn journal_row_key(g: &GradeRecord) -> String {
    if g.student_id > 0 {
        g.student_id.to_string()
    } else {
        String::new()
    }
}

fn journal_col_key(g: &GradeRecord) -> String {
    g.date.clone()
}

/// Teacher journal view state: rebuilt on every open/load, never persisted.
///
/// Fields are private; handlers change it only through the methods below.
#[derive(Debug, Clone, Default)]
pub struct TeacherJournal {
    subject: String,
    students: Vec<User>,
    dates: Vec<String>,
    grades: Vec<GradeRecord>,
}

impl TeacherJournal {
    /// Starts a fresh window around `today`. Subject, roster and grades are
    /// dropped until the next load.
    pub fn open(&mut self, today: NaiveDate) {
        *self = TeacherJournal {
            dates: date_window(today),
            ..TeacherJournal::default()
        };
    }

    /// Forgets the window and everything loaded for it.
    pub fn close(&mut self) {
        *self = TeacherJournal::default();
    }

    pub fn is_open(&self) -> bool {
        !self.dates.is_empty()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn has_subject(&self) -> bool {
        !self.subject.trim().is_empty()
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = subject.into();
    }

    pub fn set_students(&mut self, students: Vec<User>) {
        self.students = students;
    }

    /// Replaces subject and grades with a fresh `/grades/journal` payload.
    pub fn load(&mut self, payload: JournalPayload) {
        self.subject = payload.subject;
        self.grades = payload.grades;
    }

    /// First and last day of the window.
    pub fn range(&self) -> Option<(&str, &str)> {
        Some((self.dates.first()?.as_str(), self.dates.last()?.as_str()))
    }

    /// The grade the grid shows for this cell.
    pub fn latest(&self, student_id: i64, date: &str) -> Option<&GradeRecord> {
        latest_by_key(&self.grades, journal_row_key, journal_col_key)
            .remove(&(student_id.to_string(), date.trim().to_string()))
    }

    pub fn grid(&self) -> GridView {
        let rows = self
            .students
            .iter()
            .map(|s| {
                AxisKey::new(
                    s.id.to_string(),
                    format!("{} | {}", s.class_or_dash(), s.full_name),
                )
            })
            .collect();
        let columns = self.dates.iter().map(|d| AxisKey::plain(d.as_str())).collect();
        build_grid(
            &self.grades,
            journal_row_key,
            journal_col_key,
            Axis::Supplied(rows),
            Axis::Supplied(columns),
            &TEACHER_JOURNAL_STYLE,
        )
    }
}
