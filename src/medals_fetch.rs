use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::config::{AppConfig, DataSourceKind};
use crate::http_cache::{self, fetch_text_cached};
use crate::http_client::http_client;
use crate::medal::MedalRecord;

const BUNDLED_MEDALS: &str = include_str!("../assets/medals.json");
const MEDALS_KEY: &str = "medals";
// Wrapper keys tried first when the list is nested one level down.
const WRAPPER_KEYS: [&str; 2] = ["record", "data"];

/// Why a medals load failed. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected medals payload: {0}")]
    Payload(String),
}

impl FetchError {
    /// Transport failures, throttling and server errors may clear up on
    /// their own; a bad payload or a client error will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Payload(_) => false,
        }
    }
}

/// Exponential backoff: `min(base * 2^attempt, cap)` between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            base: Duration::from_millis(1000),
            cap: Duration::from_secs(30),
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.cap)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent. `op` receives the zero-based attempt index.
    pub fn run<T>(
        &self,
        mut op: impl FnMut(u32) -> Result<T, FetchError>,
        mut sleep: impl FnMut(Duration),
    ) -> Result<T, FetchError> {
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.retries && err.is_retryable() => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "medals fetch failed, retrying: {err}"
                    );
                    sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MedalsSource {
    Bundled,
    Remote {
        url: String,
        timeout: Duration,
        retry: RetryPolicy,
    },
}

impl MedalsSource {
    pub fn from_config(config: &AppConfig) -> Self {
        match config.source {
            DataSourceKind::Bundled => MedalsSource::Bundled,
            DataSourceKind::Remote => MedalsSource::Remote {
                url: config.medals_url(),
                timeout: config.timeout,
                retry: RetryPolicy::new(config.retries),
            },
        }
    }

    pub fn kind(&self) -> DataSourceKind {
        match self {
            MedalsSource::Bundled => DataSourceKind::Bundled,
            MedalsSource::Remote { .. } => DataSourceKind::Remote,
        }
    }

    pub fn load(&self) -> Result<Vec<MedalRecord>, FetchError> {
        match self {
            MedalsSource::Bundled => bundled_medals(),
            MedalsSource::Remote {
                url,
                timeout,
                retry,
            } => retry.run(|_| fetch_medals_once(url, *timeout), std::thread::sleep),
        }
    }

    /// Drop anything remembered about the last response.
    pub fn invalidate(&self) {
        if let MedalsSource::Remote { url, .. } = self {
            http_cache::invalidate(url);
        }
    }
}

pub fn bundled_medals() -> Result<Vec<MedalRecord>, FetchError> {
    parse_medals_json(BUNDLED_MEDALS)
}

fn fetch_medals_once(url: &str, timeout: Duration) -> Result<Vec<MedalRecord>, FetchError> {
    let client = http_client(timeout).map_err(|err| FetchError::Network(format!("{err:#}")))?;
    let body = fetch_text_cached(client, url)?;
    parse_medals_json(&body)
}

/// Accepts `{ "medals": [...] }`, the same object nested one level under a
/// wrapper key (jsonbin uses `record`), or a bare array.
pub fn parse_medals_json(raw: &str) -> Result<Vec<MedalRecord>, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }

    let root: Value = serde_json::from_str(trimmed)
        .map_err(|err| FetchError::Payload(format!("invalid json: {err}")))?;
    let list = find_medals_list(&root)
        .ok_or_else(|| FetchError::Payload("no medals list found".to_string()))?;

    list.iter()
        .enumerate()
        .map(|(idx, item)| parse_record(idx, item))
        .collect()
}

fn find_medals_list(root: &Value) -> Option<&Vec<Value>> {
    if let Some(list) = root.as_array() {
        return Some(list);
    }
    let obj = root.as_object()?;
    if let Some(list) = obj.get(MEDALS_KEY) {
        return list.as_array();
    }
    let preferred = WRAPPER_KEYS.iter().filter_map(|key| obj.get(*key));
    preferred
        .chain(obj.values())
        .find_map(|inner| inner.get(MEDALS_KEY).and_then(Value::as_array))
}

fn parse_record(idx: usize, item: &Value) -> Result<MedalRecord, FetchError> {
    let mut record = MedalRecord::deserialize(item)
        .map_err(|err| FetchError::Payload(format!("record {idx}: {err}")))?;
    let code = record.code.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(FetchError::Payload(format!(
            "record {idx}: missing country code"
        )));
    }
    if record.checked_total().is_none() {
        return Err(FetchError::Payload(format!(
            "record {idx}: medal counts for {code} overflow the total"
        )));
    }
    record.code = code;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use super::{FetchError, RetryPolicy};

    #[test]
    fn delay_doubles_and_caps_at_thirty_seconds() {
        let policy = RetryPolicy::new(3);
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(5), Duration::from_secs(30));
        assert_eq!(policy.delay_for(40), Duration::from_secs(30));
    }

    #[test]
    fn retries_network_errors_until_budget_is_spent() {
        let policy = RetryPolicy::new(3);
        let sleeps = RefCell::new(Vec::new());
        let mut calls = 0;
        let out: Result<(), FetchError> = policy.run(
            |_| {
                calls += 1;
                Err(FetchError::Network("down".to_string()))
            },
            |d| sleeps.borrow_mut().push(d),
        );
        assert!(out.is_err());
        assert_eq!(calls, 4);
        assert_eq!(
            sleeps.into_inner(),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000)
            ]
        );
    }

    #[test]
    fn stops_on_first_success() {
        let policy = RetryPolicy::new(3);
        let out = policy.run(
            |attempt| {
                if attempt < 1 {
                    Err(FetchError::Status {
                        status: 503,
                        message: "busy".to_string(),
                    })
                } else {
                    Ok(attempt)
                }
            },
            |_| {},
        );
        assert_eq!(out, Ok(1));
    }

    #[test]
    fn payload_errors_are_not_retried() {
        let policy = RetryPolicy::new(3);
        let mut calls = 0;
        let out: Result<(), FetchError> = policy.run(
            |_| {
                calls += 1;
                Err(FetchError::Payload("bad".to_string()))
            },
            |_| panic!("should not sleep"),
        );
        assert!(out.is_err());
        assert_eq!(calls, 1);
    }
}
