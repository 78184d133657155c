//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::models::CacheEntry;
use crate::traits::{CacheStore, Extractor, FieldMap, Fetcher, SelectorSet};

/// Build a [`FieldMap`] from literal pairs.
pub fn field_map(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// What a route answers with.
#[derive(Clone)]
pub enum MockResponse {
    Html(String),
    Error(AppError),
    /// Sleep, then answer with markup. Used to trip timeouts.
    Delayed(Duration, String),
    /// Panic inside the fetch, taking the calling task down with it.
    Panic,
}

impl MockResponse {
    pub fn html(markup: &str) -> Self {
        Self::Html(markup.to_string())
    }

    pub fn error(error: AppError) -> Self {
        Self::Error(error)
    }

    pub fn delayed(delay: Duration, markup: &str) -> Self {
        Self::Delayed(delay, markup.to_string())
    }
}

/// Mock fetcher routing by URL substring.
///
/// Routes are checked in registration order. Unrouted URLs fail with an
/// `HttpError`. Tracks every call plus the current and peak number of
/// fetches in flight; a fetch dropped mid-flight still counts as finished.
#[derive(Clone, Default)]
pub struct MockFetcher {
    routes: Arc<Mutex<Vec<(String, MockResponse)>>>,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, pattern: &str, response: MockResponse) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((pattern.to_string(), response));
        self
    }

    /// Every URL fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, pattern: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.contains(pattern))
            .count()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn response_for(&self, url: &str) -> Option<MockResponse> {
        self.routes
            .lock()
            .unwrap()
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _session = InFlight(Arc::clone(&self.in_flight));

        // Yield so overlapping fetches are actually observed as overlapping.
        tokio::task::yield_now().await;

        match self.response_for(url) {
            Some(MockResponse::Html(markup)) => Ok(markup),
            Some(MockResponse::Error(e)) => Err(e),
            Some(MockResponse::Delayed(delay, markup)) => {
                tokio::time::sleep(delay).await;
                Ok(markup)
            }
            Some(MockResponse::Panic) => panic!("mock fetcher panicked on {url}"),
            None => Err(AppError::HttpError(format!("no route for {url}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor keyed by the exact markup string.
///
/// Each registered map is trimmed to the fields the requested set asks for,
/// and maps left empty are dropped. Unknown markup yields no maps.
#[derive(Clone, Default)]
pub struct MockExtractor {
    pages: Arc<Mutex<HashMap<String, Vec<FieldMap>>>>,
    failing_fields: Arc<Mutex<Vec<String>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, markup: &str, maps: Vec<FieldMap>) -> Self {
        self.pages.lock().unwrap().insert(markup.to_string(), maps);
        self
    }

    /// Fail any extraction whose selector set includes `field`.
    pub fn failing_for(self, field: &str) -> Self {
        self.failing_fields.lock().unwrap().push(field.to_string());
        self
    }
}

impl Extractor for MockExtractor {
    fn extract(&self, markup: &str, selectors: &SelectorSet) -> Result<Vec<FieldMap>, AppError> {
        let failing = self.failing_fields.lock().unwrap();
        if let Some(field) = selectors
            .fields
            .iter()
            .find(|f| failing.iter().any(|name| name == f.name))
        {
            return Err(AppError::ExtractionError(format!(
                "mock failure for '{}'",
                field.name
            )));
        }

        let wanted: Vec<&str> = selectors.fields.iter().map(|f| f.name).collect();
        let pages = self.pages.lock().unwrap();
        let maps = pages
            .get(markup)
            .map(|maps| {
                maps.iter()
                    .map(|map| {
                        map.iter()
                            .filter(|(k, _)| wanted.contains(&k.as_str()))
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect::<FieldMap>()
                    })
                    .filter(|map| selectors.scope.is_some() || !map.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Ok(maps)
    }
}

// ---------------------------------------------------------------------------
// MockCache
// ---------------------------------------------------------------------------

/// In-memory cache without expiry that records every write.
#[derive(Clone, Default)]
pub struct MockCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    writes: Arc<Mutex<Vec<(String, usize, Duration)>>>,
    fail: bool,
}

impl MockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `get` and `set` returns a `CacheError`.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn seed(&self, key: &str, entry: CacheEntry) {
        self.entries.lock().unwrap().insert(key.to_string(), entry);
    }

    /// `(key, record count, ttl)` for every successful write, in order.
    pub fn writes(&self) -> Vec<(String, usize, Duration)> {
        self.writes.lock().unwrap().clone()
    }
}

impl CacheStore for MockCache {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, AppError> {
        if self.fail {
            return Err(AppError::CacheError("mock cache unavailable".into()));
        }
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, entry: CacheEntry, ttl: Duration) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::CacheError("mock cache unavailable".into()));
        }
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), entry.records.len(), ttl));
        self.entries.lock().unwrap().insert(key.to_string(), entry);
        Ok(())
    }
}
