use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config;

const VIEW_FILE: &str = "view.query";

/// Decoded query-string parameters, e.g. `sort=bronze&dir=asc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: BTreeMap<String, String>,
}

impl QueryParams {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim().trim_start_matches('?');
        let pairs = url::form_urlencoded::parse(trimmed.as_bytes())
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

/// Where the view's query parameters live between launches.
///
/// `replace` overwrites the current parameters in place; there is no history.
pub trait QueryStore {
    fn read(&self) -> QueryParams;
    fn replace(&mut self, params: &QueryParams) -> Result<()>;
}

impl<S: QueryStore + ?Sized> QueryStore for Box<S> {
    fn read(&self) -> QueryParams {
        (**self).read()
    }

    fn replace(&mut self, params: &QueryParams) -> Result<()> {
        (**self).replace(params)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryQueryStore {
    params: QueryParams,
    pub writes: usize,
}

impl MemoryQueryStore {
    pub fn new(raw: &str) -> Self {
        Self {
            params: QueryParams::parse(raw),
            writes: 0,
        }
    }

    pub fn query_string(&self) -> String {
        self.params.to_query_string()
    }
}

impl QueryStore for MemoryQueryStore {
    fn read(&self) -> QueryParams {
        self.params.clone()
    }

    fn replace(&mut self, params: &QueryParams) -> Result<()> {
        self.params = params.clone();
        self.writes += 1;
        Ok(())
    }
}

/// Query string kept in a one-line file under the cache directory.
#[derive(Debug, Clone)]
pub struct FileQueryStore {
    path: Option<PathBuf>,
}

impl FileQueryStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn in_cache_dir() -> Self {
        Self::new(config::cache_dir().map(|dir| dir.join(VIEW_FILE)))
    }

    /// Seed the file from an explicit query string, as if the view had been
    /// opened with that URL.
    pub fn seed(&mut self, raw: &str) -> Result<()> {
        self.replace(&QueryParams::parse(raw))
    }
}

impl QueryStore for FileQueryStore {
    fn read(&self) -> QueryParams {
        let Some(path) = &self.path else {
            return QueryParams::default();
        };
        let Ok(raw) = fs::read_to_string(path) else {
            return QueryParams::default();
        };
        QueryParams::parse(raw.lines().next().unwrap_or_default())
    }

    fn replace(&mut self, params: &QueryParams) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("create view state dir")?;
        }
        let tmp = path.with_extension("query.tmp");
        fs::write(&tmp, params.to_query_string()).context("write view state")?;
        fs::rename(&tmp, path).context("swap view state")?;
        Ok(())
    }
}
