use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use jobscout_client::ScraperExtractor;
use jobscout_core::cache::MokaCacheStore;
use jobscout_core::config::ScrapeConfig;
use jobscout_core::scrape::ScrapeService;
use jobscout_core::testutil::{MockFetcher, MockResponse};
use jobscout_server::routes;
use jobscout_server::state::AppState;

pub const SEARCH_URL: &str = "https://jobs.example.com/jobs/search/";

pub const SEARCH_HTML: &str = r#"
<html><body><ul class="jobs-search__results-list">
  <li><div class="base-card">
    <a class="base-card__full-link" href="/jobs/view/1?trk=search"></a>
    <h3 class="base-search-card__title">Rust Engineer</h3>
    <h4 class="base-search-card__subtitle"><a>Acme</a></h4>
    <span class="job-search-card__location">Berlin, Germany</span>
  </div></li>
  <li><div class="base-card">
    <a class="base-card__full-link" href="https://jobs.example.com/jobs/view/2"></a>
    <h3 class="base-search-card__title">Backend Developer</h3>
    <h4 class="base-search-card__subtitle"><a>Globex</a></h4>
    <span class="job-search-card__location">Remote</span>
  </div></li>
  <li><div class="base-card">
    <h3 class="base-search-card__title">Card without link</h3>
  </div></li>
</ul></body></html>
"#;

pub const DETAIL_1_HTML: &str = r#"
<html><body>
  <span class="posted-time-ago__text">2 days ago</span>
  <div class="show-more-less-html__markup"><p>Build the   search engine.</p></div>
</body></html>
"#;

pub const DETAIL_2_HTML: &str = r#"
<html><body>
  <time>1 week ago</time>
  <section class="description">Own our APIs.</section>
</body></html>
"#;

pub struct TestApp {
    pub router: Router,
    pub fetcher: MockFetcher,
    pub cache: MokaCacheStore,
}

/// A fetcher serving the fixture search page and both detail pages.
pub fn fixture_fetcher() -> MockFetcher {
    MockFetcher::new()
        .route("/jobs/search", MockResponse::html(SEARCH_HTML))
        .route("/jobs/view/1", MockResponse::html(DETAIL_1_HTML))
        .route("/jobs/view/2", MockResponse::html(DETAIL_2_HTML))
}

pub fn test_config() -> ScrapeConfig {
    ScrapeConfig {
        search_url: SEARCH_URL.to_string(),
        search_timeout: Duration::from_millis(300),
        detail_timeout: Duration::from_millis(300),
        ..ScrapeConfig::default()
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(fixture_fetcher())
}

pub fn setup_test_app_with(fetcher: MockFetcher) -> TestApp {
    let cache = MokaCacheStore::new(1_000);
    let service = ScrapeService::new(
        fetcher.clone(),
        ScraperExtractor::new(),
        cache.clone(),
        test_config(),
    );
    let state = Arc::new(AppState::new(service));

    TestApp {
        router: routes::router(state),
        fetcher,
        cache,
    }
}

/// Issue a GET and decode the JSON body.
pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap();
    (status, json)
}
