use futures::future::BoxFuture;

use jobscout_core::models::{SearchFailure, SearchOutcome};
use jobscout_core::query::JobQuery;
use jobscout_core::scrape::ScrapeService;
use jobscout_core::traits::{CacheStore, Extractor, Fetcher};

/// Object-safe view of the orchestrator, so handlers don't carry its generics.
pub trait JobSearch: Send + Sync {
    fn search_jobs<'a>(
        &'a self,
        query: &'a JobQuery,
    ) -> BoxFuture<'a, Result<SearchOutcome, SearchFailure>>;
}

impl<F, X, S> JobSearch for ScrapeService<F, X, S>
where
    F: Fetcher,
    X: Extractor,
    S: CacheStore,
{
    fn search_jobs<'a>(
        &'a self,
        query: &'a JobQuery,
    ) -> BoxFuture<'a, Result<SearchOutcome, SearchFailure>> {
        Box::pin(self.search(query))
    }
}

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub search: Box<dyn JobSearch>,
}

impl AppState {
    pub fn new(search: impl JobSearch + 'static) -> Self {
        Self {
            search: Box::new(search),
        }
    }
}
