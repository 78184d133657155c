use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::advisory::FilterWarning;
use crate::error::AppError;

/// One job listing. Unknown fields are empty strings, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub date_posted: String,
    pub snippet: String,
}

impl JobRecord {
    /// A record as produced by the search page: the four card fields set,
    /// detail fields left empty for enrichment.
    pub fn partial(
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            location: location.into(),
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Where the jobs in a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Cache,
    Live,
    StaleCacheOnError,
}

impl ResultSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultSource::Cache => "cache",
            ResultSource::Live => "live",
            ResultSource::StaleCacheOnError => "stale_cache_on_error",
        }
    }
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the cache stores under both the fresh and the stale key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub records: Vec<JobRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(records: Vec<JobRecord>) -> Self {
        Self {
            records,
            fetched_at: Utc::now(),
        }
    }
}

/// A successful search, whichever path produced it.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub jobs: Vec<JobRecord>,
    pub source: ResultSource,
    pub elapsed: Duration,
    /// Set only when stale data is served because the live fetch failed.
    pub error_message: Option<String>,
    pub filter_warning: Option<FilterWarning>,
}

impl SearchOutcome {
    pub fn count(&self) -> usize {
        self.jobs.len()
    }
}

/// A search that ended with no data to return.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct SearchFailure {
    pub error: AppError,
    pub elapsed: Duration,
}

/// Seconds with millisecond precision, as reported in `processing_time`.
pub fn processing_seconds(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}
