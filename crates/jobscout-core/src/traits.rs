use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use crate::models::CacheEntry;

/// Fetches raw page markup from a URL.
///
/// Every call is an independent session; implementations must release
/// whatever they acquired (tabs, connections) on every exit path, including
/// when the returned future is dropped early.
pub trait Fetcher: Send + Sync + Clone + 'static {
    fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Field name → extracted text (or attribute value).
pub type FieldMap = HashMap<String, String>;

/// One field to pull out of the markup.
#[derive(Debug, Clone, Copy)]
pub struct FieldSelector {
    pub name: &'static str,
    /// CSS selectors tried in priority order; the first match wins.
    pub selectors: &'static [&'static str],
    /// Read this attribute instead of the element's text.
    pub attr: Option<&'static str>,
}

/// A set of fields, optionally scoped to a repeating element.
#[derive(Debug, Clone, Copy)]
pub struct SelectorSet {
    /// Repeating element (e.g. a result card). `None` means the whole document.
    pub scope: Option<&'static str>,
    pub fields: &'static [FieldSelector],
}

/// Pulls structured fields out of markup.
///
/// Returns one [`FieldMap`] per element matched by the set's scope, or a single
/// map for the whole document when unscoped. Fields that are not found are
/// simply absent from the map.
pub trait Extractor: Send + Sync + Clone + 'static {
    fn extract(&self, markup: &str, selectors: &SelectorSet) -> Result<Vec<FieldMap>, AppError>;
}

/// Key/value store with a per-entry TTL. Must tolerate concurrent callers.
pub trait CacheStore: Send + Sync + Clone + 'static {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<CacheEntry>, AppError>> + Send;

    fn set(
        &self,
        key: &str,
        entry: CacheEntry,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}
