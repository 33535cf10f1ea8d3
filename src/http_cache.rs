use std::collections::HashMap;
use std::sync::Mutex;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, USER_AGENT};

use crate::medals_fetch::FetchError;

const USER_AGENT_VALUE: &str = concat!("medal_terminal/", env!("CARGO_PKG_VERSION"));

// Process-local only; response bodies never touch disk.
static CACHE: Mutex<Option<HashMap<String, CacheEntry>>> = Mutex::new(None);

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
}

/// GET `url`, revalidating against the last response with conditional
/// headers. A 304 returns the remembered body.
pub fn fetch_text_cached(client: &Client, url: &str) -> Result<String, FetchError> {
    let cached_entry = with_cache(|cache| cache.get(url).cloned());

    let mut req = client.get(url).header(USER_AGENT, USER_AGENT_VALUE);
    if let Some(entry) = cached_entry.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().map_err(|err| FetchError::Network(err.to_string()))?;
    let status = resp.status();
    if status == StatusCode::NOT_MODIFIED {
        if let Some(entry) = cached_entry {
            tracing::debug!(url, "not modified; reusing cached body");
            return Ok(entry.body);
        }
        return Err(FetchError::Status {
            status: status.as_u16(),
            message: "received 304 without a cached body".to_string(),
        });
    }

    let etag = header_string(resp.headers(), ETAG);
    let last_modified = header_string(resp.headers(), LAST_MODIFIED);
    let body = resp
        .text()
        .map_err(|err| FetchError::Network(format!("failed reading body: {err}")))?;
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            message: snippet(&body),
        });
    }

    with_cache(|cache| {
        cache.insert(
            url.to_string(),
            CacheEntry {
                body: body.clone(),
                etag,
                last_modified,
            },
        )
    });
    Ok(body)
}

/// Forget the remembered response for `url` so the next fetch is
/// unconditional.
pub fn invalidate(url: &str) {
    with_cache(|cache| cache.remove(url));
}

fn with_cache<T>(f: impl FnOnce(&mut HashMap<String, CacheEntry>) -> T) -> T {
    let mut guard = match CACHE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    f(guard.get_or_insert_with(HashMap::new))
}

fn header_string(
    headers: &reqwest::header::HeaderMap,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn snippet(body: &str) -> String {
    const MAX: usize = 120;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(MAX).collect();
    format!("{cut}…")
}
