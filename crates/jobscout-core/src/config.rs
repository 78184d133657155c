use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_SEARCH_URL: &str = "https://www.linkedin.com/jobs/search/";

/// Outbound proxy applied to every fetch session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    /// `host:port`, as taken by `--proxy-server`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.address())
    }

    pub fn has_credentials(&self) -> bool {
        self.username.is_some()
    }
}

/// Tunables for the scrape orchestrator.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Search page to query; filters and keywords are appended to it.
    pub search_url: String,
    /// Detail pages fetched simultaneously per request.
    pub concurrency: usize,
    pub search_timeout: Duration,
    pub detail_timeout: Duration,
    /// Upper bound on cards turned into records (and thus detail fetches).
    pub max_cards: usize,
    pub fresh_ttl: Duration,
    pub stale_ttl: Duration,
    pub cache_capacity: u64,
    pub proxy: Option<ProxyConfig>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            concurrency: 5,
            search_timeout: Duration::from_secs(15),
            detail_timeout: Duration::from_secs(10),
            max_cards: 25,
            fresh_ttl: Duration::from_secs(600),
            stale_ttl: Duration::from_secs(86_400),
            cache_capacity: 10_000,
            proxy: None,
        }
    }
}

impl ScrapeConfig {
    /// Read configuration from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// - `JOBSCOUT_SEARCH_URL`
    /// - `JOBSCOUT_CONCURRENCY` (default 5, at least 1)
    /// - `JOBSCOUT_SEARCH_TIMEOUT_SECS` (default 15)
    /// - `JOBSCOUT_DETAIL_TIMEOUT_SECS` (default 10)
    /// - `JOBSCOUT_MAX_CARDS` (default 25, at least 1)
    /// - `JOBSCOUT_FRESH_TTL_SECS` (default 600)
    /// - `JOBSCOUT_STALE_TTL_SECS` (default 86400)
    /// - `JOBSCOUT_CACHE_CAPACITY` (default 10000)
    /// - `PROXY_HOST` / `PROXY_PORT` / `PROXY_USERNAME` / `PROXY_PASSWORD`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let search_url = lookup("JOBSCOUT_SEARCH_URL").unwrap_or(defaults.search_url);
        let concurrency = positive(&lookup, "JOBSCOUT_CONCURRENCY", defaults.concurrency)?;
        let max_cards = positive(&lookup, "JOBSCOUT_MAX_CARDS", defaults.max_cards)?;
        let cache_capacity =
            positive(&lookup, "JOBSCOUT_CACHE_CAPACITY", defaults.cache_capacity)?;
        let search_timeout = seconds(&lookup, "JOBSCOUT_SEARCH_TIMEOUT_SECS", defaults.search_timeout)?;
        let detail_timeout = seconds(&lookup, "JOBSCOUT_DETAIL_TIMEOUT_SECS", defaults.detail_timeout)?;
        let fresh_ttl = seconds(&lookup, "JOBSCOUT_FRESH_TTL_SECS", defaults.fresh_ttl)?;
        let stale_ttl = seconds(&lookup, "JOBSCOUT_STALE_TTL_SECS", defaults.stale_ttl)?;

        let proxy = match (lookup("PROXY_HOST"), lookup("PROXY_PORT")) {
            (Some(host), Some(port)) if !host.is_empty() => Some(ProxyConfig {
                host,
                port: parse("PROXY_PORT", &port)?,
                username: lookup("PROXY_USERNAME").filter(|u| !u.is_empty()),
                password: lookup("PROXY_PASSWORD"),
            }),
            (Some(host), None) if !host.is_empty() => {
                return Err(AppError::ConfigError(
                    "PROXY_HOST is set but PROXY_PORT is not".into(),
                ));
            }
            _ => None,
        };

        Ok(Self {
            search_url,
            concurrency,
            search_timeout,
            detail_timeout,
            max_cards,
            fresh_ttl,
            stale_ttl,
            cache_capacity,
            proxy,
        })
    }
}

fn parse<T: FromStr>(name: &str, raw: &str) -> Result<T, AppError> {
    raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!("Invalid {name} '{raw}': expected a number"))
    })
}

fn positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr + PartialEq + Default,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => {
            let value: T = parse(name, &raw)?;
            if value == T::default() {
                return Err(AppError::ConfigError(format!("{name} must be at least 1")));
            }
            Ok(value)
        }
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: Duration,
) -> Result<Duration, AppError> {
    Ok(Duration::from_secs(positive(
        lookup,
        name,
        default.as_secs(),
    )?))
}
