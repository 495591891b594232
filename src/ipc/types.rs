use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::activity::ActivityLog;
use crate::api::ApiClient;
use crate::config::Config;
use crate::journal::TeacherJournal;
use crate::models::User;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything the sidecar knows between requests.
///
/// Ownership per view: `api` token and `user` are written only by the auth
/// handlers and `workspace`/`db` only by core. `journal` changes only through
/// `TeacherJournal` methods: the journal handlers open and load it, the teacher
/// subject and student-list handlers refresh its subject and roster, and auth
/// closes it when the session changes. Every handler may append to `activity`.
pub struct AppState {
    pub config: Config,
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub api: ApiClient,
    pub user: Option<User>,
    pub journal: TeacherJournal,
    pub activity: ActivityLog,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let api = ApiClient::new(&config.api_base, config.http_timeout);
        let activity = ActivityLog::new(config.activity_limit);
        AppState {
            config,
            workspace: None,
            db: None,
            api,
            user: None,
            journal: TeacherJournal::default(),
            activity,
        }
    }
}
