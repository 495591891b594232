use chrono::Local;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub at: String,
    pub level: Level,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// The user-visible log area. Handlers append outcomes here; the UI shows the
/// newest entry and may page back through `activity.tail`.
pub struct ActivityLog {
    limit: usize,
    entries: VecDeque<ActivityEntry>,
}

impl ActivityLog {
    pub fn new(limit: usize) -> Self {
        ActivityLog {
            limit: limit.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn info(&mut self, message: impl Into<String>, data: Option<serde_json::Value>) {
        let message = message.into();
        log::info!("{message}");
        self.push(Level::Info, message, data);
    }

    pub fn error(&mut self, message: impl Into<String>, data: Option<serde_json::Value>) {
        let message = message.into();
        log::warn!("{message}: {}", data.as_ref().map(|d| d.to_string()).unwrap_or_default());
        self.push(Level::Error, message, data);
    }

    fn push(&mut self, level: Level, message: String, data: Option<serde_json::Value>) {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(ActivityEntry {
            at: Local::now().format("%H:%M:%S").to_string(),
            level,
            message,
            data,
        });
    }

    pub fn latest(&self) -> Option<&ActivityEntry> {
        self.entries.back()
    }

    /// Up to `n` most recent entries, oldest first.
    pub fn tail(&self, n: usize) -> Vec<ActivityEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
