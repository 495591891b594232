use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ACTIVITY_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub workspace: Option<PathBuf>,
    pub http_timeout: Duration,
    pub activity_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base: DEFAULT_API_BASE.to_string(),
            workspace: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        Config::from_lookup(|k| std::env::var(k).ok())
    }

    /// Reads `SCHOOLD_*` keys through `lookup`; unset or blank keys keep the
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = Config::default();

        if let Some(base) = get("SCHOOLD_API_BASE") {
            cfg.api_base = normalize_api_base(&base);
        }
        if let Some(ws) = get("SCHOOLD_WORKSPACE") {
            cfg.workspace = Some(PathBuf::from(ws));
        }
        if let Some(raw) = get("SCHOOLD_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("SCHOOLD_HTTP_TIMEOUT_SECS must be an integer, got {raw:?}"))?;
            cfg.http_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(raw) = get("SCHOOLD_ACTIVITY_LIMIT") {
            cfg.activity_limit = raw
                .parse()
                .with_context(|| format!("SCHOOLD_ACTIVITY_LIMIT must be an integer, got {raw:?}"))?;
        }
        Ok(cfg)
    }
}

pub fn normalize_api_base(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
