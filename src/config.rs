use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const APP_DIR: &str = "medal_terminal";

const DEFAULT_API_BASE_URL: &str = "https://api.jsonbin.io/v3/";
const DEFAULT_RESOURCE: &str = "6885aba2f7e7a370d1ee8f75";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    Bundled,
    Remote,
}

impl DataSourceKind {
    pub fn label(self) -> &'static str {
        match self {
            DataSourceKind::Bundled => "BUNDLED",
            DataSourceKind::Remote => "REMOTE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: DataSourceKind,
    pub api_base_url: String,
    pub resource: String,
    pub timeout: Duration,
    pub retries: u32,
    pub stale_after: Duration,
    pub query: Option<String>,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: DataSourceKind::Bundled,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            resource: DEFAULT_RESOURCE.to_string(),
            timeout: Duration::from_secs(10),
            retries: 3,
            stale_after: Duration::from_secs(5 * 60),
            query: None,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let source = match env::var("MEDALS_SOURCE")
            .unwrap_or_default()
            .trim()
            .to_lowercase()
            .as_str()
        {
            "remote" | "api" => DataSourceKind::Remote,
            _ => DataSourceKind::Bundled,
        };
        let timeout_secs = env_u64("MEDALS_TIMEOUT_SECS").unwrap_or(10).max(1);
        let retries = env_u64("MEDALS_RETRIES")
            .map(|v| v.min(10) as u32)
            .unwrap_or(defaults.retries);
        let stale_secs = env_u64("MEDALS_STALE_SECS").unwrap_or(300).max(10);

        Self {
            source,
            api_base_url: env_string("MEDALS_API_BASE_URL").unwrap_or(defaults.api_base_url),
            resource: env_string("MEDALS_RESOURCE").unwrap_or(defaults.resource),
            timeout: Duration::from_secs(timeout_secs),
            retries,
            stale_after: Duration::from_secs(stale_secs),
            query: env_string("MEDALS_QUERY"),
            log_filter: env_string("MEDALS_LOG").unwrap_or(defaults.log_filter),
        }
    }

    pub fn medals_url(&self) -> String {
        join_url(&self.api_base_url, &self.resource)
    }
}

/// Cache directory for this app: `$XDG_CACHE_HOME/medal_terminal`, falling
/// back to `~/.cache/medal_terminal`.
pub fn cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

fn join_url(base: &str, resource: &str) -> String {
    let resource = resource.trim();
    if resource.is_empty() {
        return base.trim().to_string();
    }
    format!(
        "{}/{}",
        base.trim().trim_end_matches('/'),
        resource.trim_start_matches('/')
    )
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|val| val.trim().parse::<u64>().ok())
}
