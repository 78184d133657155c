use std::time::Duration;

use axum::http::StatusCode;

use jobscout_core::error::AppError;
use jobscout_core::models::{CacheEntry, JobRecord};
use jobscout_core::testutil::{MockFetcher, MockResponse};
use jobscout_core::traits::CacheStore;

use crate::common::{get_json, setup_test_app, setup_test_app_with};

const BASE: &str = "keyword=rust&location=Berlin";

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app();

    let (status, json) = get_json(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn openapi_document_lists_search_routes() {
    let app = setup_test_app();

    let (status, json) = get_json(&app.router, "/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    for path in ["/v1/jobs", "/v1/jobs/remote", "/v1/jobs/advanced", "/health"] {
        assert!(json["paths"].get(path).is_some(), "missing {path}");
    }
}

#[tokio::test]
async fn live_search_then_cache_hit() {
    let app = setup_test_app();
    let uri = format!("/v1/jobs?{BASE}");

    let (status, first) = get_json(&app.router, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["source"], "live");
    assert_eq!(first["count"], 2);
    assert!(first["processing_time"].is_number());
    assert!(first.get("error_message").is_none());

    let jobs = first["jobs"].as_array().unwrap();
    assert_eq!(jobs[0]["title"], "Rust Engineer");
    assert_eq!(jobs[0]["company"], "Acme");
    assert_eq!(jobs[0]["url"], "https://jobs.example.com/jobs/view/1?trk=search");
    assert_eq!(jobs[0]["date_posted"], "2 days ago");
    assert_eq!(jobs[0]["snippet"], "Build the search engine.");
    assert_eq!(jobs[1]["date_posted"], "1 week ago");
    assert_eq!(jobs[1]["snippet"], "Own our APIs.");

    let (status, second) = get_json(&app.router, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["source"], "cache");
    assert_eq!(second["jobs"], first["jobs"]);
    assert_eq!(app.fetcher.call_count("/jobs/search"), 1);
}

#[tokio::test]
async fn parameter_order_and_case_share_a_cache_entry() {
    let app = setup_test_app();

    get_json(
        &app.router,
        "/v1/jobs/advanced?keyword=rust&location=Berlin&job_type=contract&date_posted=week",
    )
    .await;
    let (_, json) = get_json(
        &app.router,
        "/v1/jobs/advanced?date_posted=WEEK&location=berlin&job_type=contract&keyword=Rust",
    )
    .await;

    assert_eq!(json["source"], "cache");
    assert_eq!(app.fetcher.call_count("/jobs/search"), 1);
}

#[tokio::test]
async fn filters_reach_the_search_url() {
    let app = setup_test_app();

    let (status, _) = get_json(
        &app.router,
        &format!("/v1/jobs/advanced?{BASE}&date_posted=week&experience=senior&workplace=remote"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let search_url = &app.fetcher.calls()[0];
    assert!(search_url.starts_with("https://jobs.example.com/jobs/search/?"));
    assert!(search_url.contains("keywords=rust"));
    assert!(search_url.contains("f_TPR=r604800"));
    assert!(search_url.contains("f_E=4"));
    assert!(search_url.contains("f_WT=2"));
}

#[tokio::test]
async fn workplace_route_accepts_workplace() {
    let app = setup_test_app();

    let (status, json) = get_json(&app.router, &format!("/v1/jobs/remote?{BASE}&workplace=hybrid")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    assert!(app.fetcher.calls()[0].contains("f_WT=3"));
}

#[tokio::test]
async fn missing_parameters_returns_400() {
    let app = setup_test_app();

    let (status, json) = get_json(&app.router, "/v1/jobs?keyword=rust").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("Missing"));
    assert!(json["processing_time"].is_number());
    assert!(json.get("jobs").is_none());
    assert!(app.fetcher.calls().is_empty());
}

#[tokio::test]
async fn unknown_parameter_returns_400() {
    let app = setup_test_app();

    let (status, json) = get_json(&app.router, &format!("/v1/jobs/advanced?{BASE}&salary=high")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("salary"));
}

#[tokio::test]
async fn filter_on_the_wrong_route_returns_400() {
    let app = setup_test_app();

    let (status, json) = get_json(&app.router, &format!("/v1/jobs/type?{BASE}&experience=mid")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("experience"));
}

#[tokio::test]
async fn repeated_parameter_returns_400() {
    let app = setup_test_app();

    let (status, _) = get_json(&app.router, &format!("/v1/jobs?{BASE}&keyword=go")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_filter_value_returns_400() {
    let app = setup_test_app();

    let (status, json) =
        get_json(&app.router, &format!("/v1/jobs/date-posted?{BASE}&date_posted=year")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = json["error"].as_str().unwrap();
    assert!(error.contains("date_posted"));
    assert!(error.contains("week"));
}

#[tokio::test]
async fn too_many_companies_returns_400() {
    let app = setup_test_app();
    let companies = (1..=11).map(|i| format!("c{i}")).collect::<Vec<_>>().join(",");

    let (status, json) =
        get_json(&app.router, &format!("/v1/jobs/company?{BASE}&company={companies}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Too many companies (11)"));
}

#[tokio::test]
async fn ten_companies_are_accepted() {
    let app = setup_test_app();
    let companies = (1..=10).map(|i| format!("c{i}")).collect::<Vec<_>>().join(",");

    let (status, _) =
        get_json(&app.router, &format!("/v1/jobs/company?{BASE}&company={companies}")).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn transport_failure_without_stale_returns_502() {
    let app = setup_test_app_with(MockFetcher::new().route(
        "/jobs/search",
        MockResponse::error(AppError::HttpError("HTTP 999 for search".into())),
    ));

    let (status, json) = get_json(&app.router, &format!("/v1/jobs?{BASE}")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["success"], false);
    assert!(json["processing_time"].is_number());
    assert!(json.get("jobs").is_none());
}

#[tokio::test]
async fn search_timeout_without_stale_returns_504() {
    let app = setup_test_app_with(MockFetcher::new().route(
        "/jobs/search",
        MockResponse::delayed(Duration::from_secs(5), "<html></html>"),
    ));

    let (status, json) = get_json(&app.router, &format!("/v1/jobs?{BASE}")).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(json["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn live_failure_serves_stale_data() {
    let app = setup_test_app_with(MockFetcher::new().route(
        "/jobs/search",
        MockResponse::error(AppError::NetworkError("connection reset".into())),
    ));
    let synthetic = JobRecord::partial("Cached Role", "Initech", "Berlin", "https://jobs.example.com/x");
    app.cache
        .set(
            "jobs_search|rust|berlin|stale",
            CacheEntry::new(vec![synthetic]),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let (status, json) = get_json(&app.router, &format!("/v1/jobs?{BASE}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["source"], "stale_cache_on_error");
    assert_eq!(json["count"], 1);
    assert_eq!(json["jobs"][0]["title"], "Cached Role");
    assert!(!json["error_message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn internship_heavy_fulltime_results_carry_a_warning() {
    let search = r#"
        <div class="base-card">
          <a class="base-card__full-link" href="/jobs/view/1"></a>
          <h3 class="base-search-card__title">Software Intern</h3>
          <h4 class="base-search-card__subtitle">Acme</h4>
          <span class="job-search-card__location">Berlin</span>
        </div>
    "#;
    let app = setup_test_app_with(
        MockFetcher::new().route("/jobs/search", MockResponse::html(search)),
    );

    let (status, json) =
        get_json(&app.router, &format!("/v1/jobs/type?{BASE}&job_type=fulltime")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["filter_warning"]["internship_ratio"], 1.0);
    assert!(!json["filter_warning"]["suggestions"].as_array().unwrap().is_empty());
}
