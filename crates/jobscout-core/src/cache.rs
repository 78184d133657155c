//! Cache keys and the in-process cache store.
//!
//! Each query owns two slots: a fresh key with a short TTL that answers
//! repeat requests, and a stale key (fresh key + [`STALE_SUFFIX`]) with a long
//! TTL that is only read when a live fetch fails.
//!
//! Key parts are form-encoded and joined with [`KEY_SEPARATOR`], which never
//! survives encoding, so distinct queries cannot share a key and no fresh key
//! ends in the stale suffix.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use url::form_urlencoded;

use crate::error::AppError;
use crate::filters::FilterName;
use crate::models::CacheEntry;
use crate::query::JobQuery;
use crate::traits::CacheStore;

pub const KEY_PREFIX: &str = "jobs_search";
pub const KEY_SEPARATOR: char = '|';
// Filter parts always carry `=`, so a bare trailing `stale` part is never a
// fresh key.
pub const STALE_SUFFIX: &str = "|stale";

/// The fresh/stale key pair for one query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    fresh: String,
}

impl CacheKey {
    /// Derive the key from the normalised query.
    ///
    /// Case-insensitive in keyword, location and filter values. Filters are
    /// taken in canonical order and company names are sorted, so queries that
    /// differ only in parameter order share a key.
    pub fn for_query(query: &JobQuery) -> Self {
        let mut fresh = KEY_PREFIX.to_string();
        push_part(&mut fresh, &encode(&query.keyword.to_lowercase()));
        push_part(&mut fresh, &encode(&query.location.to_lowercase()));

        for (name, value) in &query.filters {
            let value = match name {
                FilterName::Company => {
                    let mut companies: Vec<String> = value
                        .split(',')
                        .map(|company| encode(&company.to_lowercase()))
                        .collect();
                    companies.sort();
                    companies.join(",")
                }
                _ => encode(&value.to_lowercase()),
            };
            push_part(&mut fresh, &format!("{name}={value}"));
        }

        Self { fresh }
    }

    pub fn fresh(&self) -> &str {
        &self.fresh
    }

    pub fn stale(&self) -> String {
        format!("{}{STALE_SUFFIX}", self.fresh)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.fresh)
    }
}

fn push_part(key: &mut String, part: &str) {
    key.push(KEY_SEPARATOR);
    key.push_str(part);
}

fn encode(part: &str) -> String {
    form_urlencoded::byte_serialize(part.as_bytes()).collect()
}

// ---------------------------------------------------------------------------
// MokaCacheStore
// ---------------------------------------------------------------------------

/// Value stored in moka: the entry plus the TTL it was written with.
#[derive(Clone)]
struct CachedValue {
    entry: Arc<CacheEntry>,
    ttl: Duration,
}

/// Per-entry expiry: each write carries its own TTL.
struct EntryTtl;

impl Expiry<String, CachedValue> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process [`CacheStore`] backed by `moka`. Cheap to clone; clones share
/// the same underlying cache.
#[derive(Clone)]
pub struct MokaCacheStore {
    cache: Cache<String, CachedValue>,
}

impl MokaCacheStore {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryTtl)
            .build();
        Self { cache }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl CacheStore for MokaCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, AppError> {
        Ok(self
            .cache
            .get(key)
            .await
            .map(|value| CacheEntry::clone(&value.entry)))
    }

    async fn set(&self, key: &str, entry: CacheEntry, ttl: Duration) -> Result<(), AppError> {
        let value = CachedValue {
            entry: Arc::new(entry),
            ttl,
        };
        self.cache.insert(key.to_string(), value).await;
        Ok(())
    }
}
