pub mod advisory;
pub mod cache;
pub mod config;
pub mod enrich;
pub mod error;
pub mod filters;
pub mod models;
pub mod query;
pub mod scrape;
pub mod selectors;
pub mod single_flight;
pub mod traits;
pub mod url_builder;
pub mod util;
pub mod validate;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use advisory::FilterWarning;
pub use cache::{CacheKey, MokaCacheStore};
pub use config::{ProxyConfig, ScrapeConfig};
pub use error::{AppError, ValidationError};
pub use filters::FilterName;
pub use models::{JobRecord, ResultSource, SearchFailure, SearchOutcome};
pub use query::JobQuery;
pub use scrape::ScrapeService;
pub use traits::{CacheStore, Extractor, Fetcher};
