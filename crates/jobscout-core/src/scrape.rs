use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::advisory;
use crate::cache::CacheKey;
use crate::config::ScrapeConfig;
use crate::enrich::DetailEnricher;
use crate::error::AppError;
use crate::models::{CacheEntry, JobRecord, ResultSource, SearchFailure, SearchOutcome};
use crate::query::JobQuery;
use crate::selectors::{COMPANY, LOCATION, SEARCH_CARDS, TITLE, URL};
use crate::single_flight::KeyedLocks;
use crate::traits::{CacheStore, Extractor, FieldMap, Fetcher};
use crate::url_builder::build_search_url;

/// Orchestrates a job search: cache lookup → search page → card parsing →
/// concurrent detail enrichment → fresh + stale cache writes, with a fall back
/// to stale data when the live path fails.
///
/// Generic over the fetcher, extractor and cache so the whole flow runs
/// against fakes in tests.
pub struct ScrapeService<F, X, S>
where
    F: Fetcher,
    X: Extractor,
    S: CacheStore,
{
    fetcher: F,
    extractor: X,
    cache: S,
    enricher: DetailEnricher<F, X>,
    config: ScrapeConfig,
    in_flight: KeyedLocks,
}

impl<F, X, S> ScrapeService<F, X, S>
where
    F: Fetcher,
    X: Extractor,
    S: CacheStore,
{
    pub fn new(fetcher: F, extractor: X, cache: S, config: ScrapeConfig) -> Self {
        let enricher = DetailEnricher::new(fetcher.clone(), extractor.clone(), config.detail_timeout);
        Self {
            fetcher,
            extractor,
            cache,
            enricher,
            config,
            in_flight: KeyedLocks::new(),
        }
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Run a validated query.
    ///
    /// 1. Serve the fresh cache entry if there is one
    /// 2. Otherwise take the per-key lock and check again
    /// 3. Fetch and parse the search page, enrich every card concurrently
    /// 4. Write fresh and stale entries
    /// 5. On any failure in 3-4, serve the stale entry or give up
    pub async fn search(&self, query: &JobQuery) -> Result<SearchOutcome, SearchFailure> {
        let started = Instant::now();
        let key = CacheKey::for_query(query);
        let span = tracing::info_span!("job_search", request_id = %Uuid::new_v4(), %key);

        async {
            if let Some(entry) = self.cache_get(key.fresh()).await {
                tracing::info!(count = entry.records.len(), "Fresh cache hit");
                return Ok(self.outcome(query, entry.records, ResultSource::Cache, None, started));
            }

            let _guard = self.in_flight.lock(key.fresh()).await;
            if let Some(entry) = self.cache_get(key.fresh()).await {
                tracing::info!(count = entry.records.len(), "Populated by concurrent request");
                return Ok(self.outcome(query, entry.records, ResultSource::Cache, None, started));
            }

            match self.live_search(query, &key).await {
                Ok(jobs) => {
                    tracing::info!(
                        count = jobs.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Live search complete"
                    );
                    Ok(self.outcome(query, jobs, ResultSource::Live, None, started))
                }
                Err(error) => self.stale_fallback(query, &key, error, started).await,
            }
        }
        .instrument(span)
        .await
    }

    async fn live_search(&self, query: &JobQuery, key: &CacheKey) -> Result<Vec<JobRecord>, AppError> {
        let url = build_search_url(&self.config.search_url, query)?;
        tracing::info!(%url, "Fetching search page");

        let timeout = self.config.search_timeout;
        let markup = tokio::time::timeout(timeout, self.fetcher.fetch(&url, timeout))
            .await
            .unwrap_or(Err(AppError::Timeout(timeout)))?;
        tracing::debug!(bytes = markup.len(), "Fetched search page");

        let cards = self.extractor.extract(&markup, &SEARCH_CARDS)?;
        let total_cards = cards.len();
        let partials: Vec<JobRecord> = cards
            .into_iter()
            .filter_map(|card| card_to_record(card, &url))
            .take(self.config.max_cards)
            .collect();
        tracing::info!(cards = total_cards, kept = partials.len(), "Parsed result cards");

        let jobs = if partials.is_empty() {
            partials
        } else {
            self.enrich_all(partials).await
        };

        self.store(key, &jobs).await;
        Ok(jobs)
    }

    /// Enrich every record with bounded parallelism.
    ///
    /// Tasks never fail as a unit: each returns its record, enriched or not,
    /// and a task that panics is replaced by its original partial record.
    /// Output order matches input order.
    async fn enrich_all(&self, records: Vec<JobRecord>) -> Vec<JobRecord> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut enriched: Vec<Option<JobRecord>> = vec![None; records.len()];

        for (index, record) in records.iter().cloned().enumerate() {
            let enricher = self.enricher.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(
                async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    (index, enricher.enrich(record).await)
                }
                .in_current_span(),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, record)) => enriched[index] = Some(record),
                Err(e) => tracing::warn!(error = %e, "Enrichment task aborted"),
            }
        }

        enriched
            .into_iter()
            .zip(records)
            .map(|(done, original)| done.unwrap_or(original))
            .collect()
    }

    /// Write both slots. Failures are logged; a result we could not cache is
    /// still a result.
    async fn store(&self, key: &CacheKey, jobs: &[JobRecord]) {
        let entry = CacheEntry::new(jobs.to_vec());
        if let Err(e) = self
            .cache
            .set(key.fresh(), entry.clone(), self.config.fresh_ttl)
            .await
        {
            tracing::warn!(error = %e, "Failed to write fresh cache entry");
        }
        if let Err(e) = self
            .cache
            .set(&key.stale(), entry, self.config.stale_ttl)
            .await
        {
            tracing::warn!(error = %e, "Failed to write stale cache entry");
        }
    }

    async fn stale_fallback(
        &self,
        query: &JobQuery,
        key: &CacheKey,
        error: AppError,
        started: Instant,
    ) -> Result<SearchOutcome, SearchFailure> {
        tracing::warn!(error = %error, "Live search failed, trying stale cache");

        match self.cache_get(&key.stale()).await {
            Some(entry) => {
                let age = Utc::now() - entry.fetched_at;
                tracing::info!(
                    count = entry.records.len(),
                    age_secs = age.num_seconds(),
                    "Serving stale cache after live failure"
                );
                let message = format!("Live scrape failed ({error}); serving cached results");
                Ok(self.outcome(
                    query,
                    entry.records,
                    ResultSource::StaleCacheOnError,
                    Some(message),
                    started,
                ))
            }
            None => {
                tracing::error!(error = %error, "No stale data to fall back on");
                Err(SearchFailure {
                    error,
                    elapsed: started.elapsed(),
                })
            }
        }
    }

    /// Cache reads never fail a request; an unavailable cache is a miss.
    async fn cache_get(&self, key: &str) -> Option<CacheEntry> {
        match self.cache.get(key).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(%key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    fn outcome(
        &self,
        query: &JobQuery,
        jobs: Vec<JobRecord>,
        source: ResultSource,
        error_message: Option<String>,
        started: Instant,
    ) -> SearchOutcome {
        let filter_warning = advisory::analyze(query, &jobs);
        SearchOutcome {
            jobs,
            source,
            elapsed: started.elapsed(),
            error_message,
            filter_warning,
        }
    }
}

/// Turn one card into a partial record. Cards missing any of the four
/// essential fields are dropped.
fn card_to_record(mut card: FieldMap, page_url: &str) -> Option<JobRecord> {
    let mut take = |name: &str| card.remove(name).filter(|v| !v.is_empty());
    let title = take(TITLE)?;
    let company = take(COMPANY)?;
    let location = take(LOCATION)?;
    let href = take(URL)?;
    Some(JobRecord::partial(title, company, location, absolute_url(page_url, &href)))
}

fn absolute_url(page_url: &str, href: &str) -> String {
    Url::parse(page_url)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cache::MokaCacheStore;
    use crate::filters::FilterName;
    use crate::selectors::{DATE_POSTED, DESCRIPTION};
    use crate::testutil::*;

    const SEARCH: &str = "search-page";

    fn config() -> ScrapeConfig {
        ScrapeConfig {
            search_url: "https://jobs.example.com/search".into(),
            search_timeout: Duration::from_millis(500),
            detail_timeout: Duration::from_millis(200),
            ..ScrapeConfig::default()
        }
    }

    fn query() -> JobQuery {
        JobQuery::new(Some("dev"), Some("usa"), []).unwrap()
    }

    fn card(n: usize) -> FieldMap {
        field_map(&[
            (TITLE, &format!("Job {n}")),
            (COMPANY, "Acme"),
            (LOCATION, "USA"),
            (URL, &format!("https://jobs.example.com/view/{n}")),
        ])
    }

    fn detail(n: usize) -> FieldMap {
        field_map(&[
            (DATE_POSTED, &format!("{n} days ago")),
            (DESCRIPTION, &format!("Description {n}")),
        ])
    }

    /// Fetcher + extractor serving `n` cards, each with a working detail page.
    fn site(n: usize) -> (MockFetcher, MockExtractor) {
        let mut fetcher = MockFetcher::new().route("/search", MockResponse::html(SEARCH));
        let mut extractor = MockExtractor::new().on(SEARCH, (1..=n).map(card).collect());
        for i in 1..=n {
            let markup = format!("detail-{i}");
            fetcher = fetcher.route(&format!("/view/{i}"), MockResponse::html(&markup));
            extractor = extractor.on(&markup, vec![detail(i)]);
        }
        (fetcher, extractor)
    }

    #[tokio::test]
    async fn live_search_enriches_and_caches_both_slots() {
        let (fetcher, extractor) = site(2);
        let cache = MockCache::new();
        let svc = ScrapeService::new(fetcher, extractor, cache.clone(), config());

        let outcome = svc.search(&query()).await.unwrap();

        assert_eq!(outcome.source, ResultSource::Live);
        assert_eq!(outcome.count(), 2);
        assert_eq!(outcome.jobs[0].title, "Job 1");
        assert_eq!(outcome.jobs[0].date_posted, "1 days ago");
        assert_eq!(outcome.jobs[1].snippet, "Description 2");
        assert!(outcome.error_message.is_none());

        let writes = cache.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], ("jobs_search|dev|usa".to_string(), 2, Duration::from_secs(600)));
        assert_eq!(
            writes[1],
            ("jobs_search|dev|usa|stale".to_string(), 2, Duration::from_secs(86_400))
        );
    }

    #[tokio::test]
    async fn repeat_request_is_served_from_cache_without_fetching() {
        let (fetcher, extractor) = site(2);
        let svc = ScrapeService::new(fetcher.clone(), extractor, MokaCacheStore::new(100), config());

        let first = svc.search(&query()).await.unwrap();
        let calls_after_first = fetcher.calls().len();
        let second = svc.search(&query()).await.unwrap();

        assert_eq!(first.source, ResultSource::Live);
        assert_eq!(second.source, ResultSource::Cache);
        assert_eq!(first.jobs, second.jobs);
        assert_eq!(fetcher.calls().len(), calls_after_first);
    }

    #[tokio::test]
    async fn detail_failures_never_reduce_the_count() {
        let fetcher = MockFetcher::new()
            .route("/search", MockResponse::html(SEARCH))
            .route("/view/1", MockResponse::html("detail-1"))
            .route("/view/2", MockResponse::error(AppError::HttpError("HTTP 500".into())))
            .route("/view/3", MockResponse::delayed(Duration::from_secs(5), "detail-3"))
            .route("/view/4", MockResponse::html("unparsable"));
        let extractor = MockExtractor::new()
            .on(SEARCH, (1..=4).map(card).collect())
            .on("detail-1", vec![detail(1)])
            .on("detail-3", vec![detail(3)]);
        let svc = ScrapeService::new(fetcher, extractor, MockCache::new(), config());

        let outcome = svc.search(&query()).await.unwrap();

        assert_eq!(outcome.count(), 4);
        let titles: Vec<_> = outcome.jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, ["Job 1", "Job 2", "Job 3", "Job 4"]);
        assert_eq!(outcome.jobs[0].date_posted, "1 days ago");
        for job in &outcome.jobs[1..] {
            assert!(job.date_posted.is_empty());
            assert!(job.snippet.is_empty());
            assert!(!job.url.is_empty());
        }
    }

    #[tokio::test]
    async fn fan_out_respects_concurrency_limit() {
        let mut fetcher = MockFetcher::new().route("/search", MockResponse::html(SEARCH));
        for i in 1..=12 {
            fetcher = fetcher.route(
                &format!("/view/{i}"),
                MockResponse::delayed(Duration::from_millis(30), "d"),
            );
        }
        let extractor = MockExtractor::new().on(SEARCH, (1..=12).map(card).collect());
        let svc = ScrapeService::new(
            fetcher.clone(),
            extractor,
            MockCache::new(),
            ScrapeConfig {
                concurrency: 3,
                ..config()
            },
        );

        let outcome = svc.search(&query()).await.unwrap();

        assert_eq!(outcome.count(), 12);
        assert_eq!(fetcher.calls().len(), 13);
        assert!(fetcher.peak_in_flight() <= 3, "peak {}", fetcher.peak_in_flight());
        assert!(fetcher.peak_in_flight() >= 2);
    }

    #[tokio::test]
    async fn cards_missing_essential_fields_are_dropped_and_capped() {
        let mut cards: Vec<FieldMap> = (1..=30).map(card).collect();
        cards[0].remove(COMPANY);
        cards[1].insert(URL.to_string(), String::new());
        let fetcher = MockFetcher::new().route("/search", MockResponse::html(SEARCH));
        let extractor = MockExtractor::new().on(SEARCH, cards);
        let svc = ScrapeService::new(
            fetcher.clone(),
            extractor,
            MockCache::new(),
            ScrapeConfig {
                max_cards: 5,
                ..config()
            },
        );

        let outcome = svc.search(&query()).await.unwrap();

        assert_eq!(outcome.count(), 5);
        assert_eq!(outcome.jobs[0].title, "Job 3");
        assert_eq!(fetcher.calls().len(), 1 + 5);
    }

    #[tokio::test]
    async fn zero_cards_is_an_empty_live_result_and_is_cached() {
        let fetcher = MockFetcher::new().route("/search", MockResponse::html(SEARCH));
        let cache = MockCache::new();
        let svc = ScrapeService::new(fetcher, MockExtractor::new(), cache.clone(), config());

        let outcome = svc.search(&query()).await.unwrap();

        assert_eq!(outcome.source, ResultSource::Live);
        assert!(outcome.jobs.is_empty());
        assert_eq!(cache.writes().len(), 2);
    }

    #[tokio::test]
    async fn relative_card_urls_are_resolved() {
        let mut relative = card(1);
        relative.insert(URL.to_string(), "/jobs/view/1?ref=abc".to_string());
        let fetcher = MockFetcher::new().route("/search", MockResponse::html(SEARCH));
        let extractor = MockExtractor::new().on(SEARCH, vec![relative]);
        let svc = ScrapeService::new(fetcher, extractor, MockCache::new(), config());

        let outcome = svc.search(&query()).await.unwrap();

        assert_eq!(outcome.jobs[0].url, "https://jobs.example.com/jobs/view/1?ref=abc");
    }

    #[tokio::test]
    async fn fetch_failure_serves_stale_cache() {
        let stale = JobRecord::partial("Synthetic", "Acme", "USA", "https://jobs.example.com/x");
        let cache = MockCache::new();
        cache.seed("jobs_search|dev|usa|stale", CacheEntry::new(vec![stale.clone()]));
        let fetcher = MockFetcher::new().route(
            "/search",
            MockResponse::error(AppError::NetworkError("connection reset".into())),
        );
        let svc = ScrapeService::new(fetcher, MockExtractor::new(), cache.clone(), config());

        let outcome = svc.search(&query()).await.unwrap();

        assert_eq!(outcome.source, ResultSource::StaleCacheOnError);
        assert_eq!(outcome.jobs, vec![stale]);
        assert!(!outcome.error_message.unwrap().is_empty());
        assert!(cache.writes().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_without_stale_data_is_terminal() {
        let fetcher = MockFetcher::new().route(
            "/search",
            MockResponse::error(AppError::HttpError("HTTP 999".into())),
        );
        let svc = ScrapeService::new(fetcher, MockExtractor::new(), MockCache::new(), config());

        let failure = svc.search(&query()).await.unwrap_err();

        assert!(failure.error.is_transport());
    }

    #[tokio::test]
    async fn search_timeout_is_reported_as_timeout() {
        let fetcher = MockFetcher::new().route(
            "/search",
            MockResponse::delayed(Duration::from_secs(5), SEARCH),
        );
        let svc = ScrapeService::new(
            fetcher.clone(),
            MockExtractor::new(),
            MockCache::new(),
            ScrapeConfig {
                search_timeout: Duration::from_millis(50),
                ..config()
            },
        );

        let failure = svc.search(&query()).await.unwrap_err();

        assert!(failure.error.is_timeout());
        assert_eq!(fetcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn extraction_failure_falls_back_to_stale() {
        let cache = MockCache::new();
        cache.seed("jobs_search|dev|usa|stale", CacheEntry::new(vec![]));
        let fetcher = MockFetcher::new().route("/search", MockResponse::html(SEARCH));
        let extractor = MockExtractor::new().failing_for(TITLE);
        let svc = ScrapeService::new(fetcher, extractor, cache, config());

        let outcome = svc.search(&query()).await.unwrap();

        assert_eq!(outcome.source, ResultSource::StaleCacheOnError);
    }

    #[tokio::test]
    async fn unavailable_cache_is_a_miss_not_an_error() {
        let (fetcher, extractor) = site(1);
        let cache = MockCache::new().failing();
        let svc = ScrapeService::new(fetcher, extractor, cache, config());

        let outcome = svc.search(&query()).await.unwrap();

        assert_eq!(outcome.source, ResultSource::Live);
        assert_eq!(outcome.count(), 1);
    }

    #[tokio::test]
    async fn panicking_enrichment_task_keeps_the_partial_record() {
        let (_, extractor) = site(2);
        let fetcher = MockFetcher::new()
            .route("/search", MockResponse::html(SEARCH))
            .route("/view/1", MockResponse::Panic)
            .route("/view/2", MockResponse::html("detail-2"));
        let svc = ScrapeService::new(fetcher, extractor, MockCache::new(), config());

        let outcome = svc.search(&query()).await.unwrap();

        assert_eq!(outcome.source, ResultSource::Live);
        assert_eq!(outcome.count(), 2);
        assert_eq!(
            outcome.jobs[0],
            JobRecord::partial("Job 1", "Acme", "USA", "https://jobs.example.com/view/1")
        );
        assert_eq!(outcome.jobs[1].snippet, "Description 2");
    }

    #[tokio::test]
    async fn lookalike_location_does_not_read_another_querys_stale_slot() {
        let (fetcher, extractor) = site(1);
        let cache = MokaCacheStore::new(100);
        let svc = ScrapeService::new(fetcher.clone(), extractor, cache.clone(), config());

        svc.search(&query()).await.unwrap();
        let lookalike = JobQuery::new(Some("dev"), Some("usa_stale"), []).unwrap();
        let outcome = svc.search(&lookalike).await.unwrap();

        assert_eq!(outcome.source, ResultSource::Live);
        assert_eq!(fetcher.call_count("/search"), 2);

        let stale_key = CacheKey::for_query(&query()).stale();
        assert!(cache.get(&stale_key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn concurrent_identical_requests_scrape_once() {
        let fetcher = MockFetcher::new()
            .route("/search", MockResponse::delayed(Duration::from_millis(100), SEARCH))
            .route("/view/1", MockResponse::html("detail-1"));
        let extractor = MockExtractor::new()
            .on(SEARCH, vec![card(1)])
            .on("detail-1", vec![detail(1)]);
        let svc = Arc::new(ScrapeService::new(
            fetcher.clone(),
            extractor,
            MokaCacheStore::new(100),
            config(),
        ));

        let (qa, qb) = (query(), query());
        let (a, b) = tokio::join!(svc.search(&qa), svc.search(&qb));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(fetcher.call_count("/search"), 1);
        let mut sources = [a.source, b.source];
        sources.sort_by_key(|s| s.as_str());
        assert_eq!(sources, [ResultSource::Cache, ResultSource::Live]);
        assert_eq!(a.jobs, b.jobs);
    }

    #[tokio::test]
    async fn filter_warning_attached_without_changing_jobs() {
        let fetcher = MockFetcher::new().route("/search", MockResponse::html(SEARCH));
        let mut cards: Vec<FieldMap> = (1..=3).map(card).collect();
        cards[0].insert(TITLE.to_string(), "Summer Intern".to_string());
        cards[1].insert(TITLE.to_string(), "Engineering Internship".to_string());
        let extractor = MockExtractor::new().on(SEARCH, cards);
        let cache = MockCache::new();
        let svc = ScrapeService::new(fetcher, extractor, cache.clone(), config());
        let query =
            JobQuery::new(Some("dev"), Some("usa"), [(FilterName::JobType, "fulltime")]).unwrap();

        let outcome = svc.search(&query).await.unwrap();

        assert_eq!(outcome.count(), 3);
        assert!(outcome.filter_warning.is_some());
        assert_eq!(cache.writes()[0].1, 3);
    }
}
