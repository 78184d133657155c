use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use jobscout_core::error::AppError;
use jobscout_core::filters::FilterName;
use jobscout_core::models::processing_seconds;
use jobscout_core::query::JobQuery;

use crate::dto::{
    AdvancedParams, CompanyParam, DatePostedParam, ErrorResponse, ExperienceParam,
    HealthResponse, JobSearchResponse, JobTypeParam, SearchParams, WorkplaceParam,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Raw query pairs, in request order, duplicates included.
type RawParams = Query<Vec<(String, String)>>;

/// Build the full router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/v1/jobs", get(search))
        .route("/v1/jobs/date-posted", get(search_by_date_posted))
        .route("/v1/jobs/type", get(search_by_job_type))
        .route("/v1/jobs/experience", get(search_by_experience))
        .route("/v1/jobs/company", get(search_by_company))
        .route("/v1/jobs/remote", get(search_by_workplace))
        .route("/v1/jobs/advanced", get(search_advanced));

    let public = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

/// Validate the raw parameters against the filters this route accepts, then
/// hand the query to the orchestrator.
async fn run_search(
    state: &AppState,
    params: Vec<(String, String)>,
    accepted: &[FilterName],
) -> Result<Json<JobSearchResponse>, ApiError> {
    let started = Instant::now();
    let query = JobQuery::from_params(params, accepted).map_err(|e| {
        tracing::info!(error = %e, "Rejected search request");
        ApiError {
            error: AppError::from(e),
            processing_time: Some(processing_seconds(started.elapsed())),
        }
    })?;

    let outcome = state.search.search_jobs(&query).await?;
    Ok(Json(JobSearchResponse::from(outcome)))
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/jobs",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching jobs", body = JobSearchResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 502, description = "Live fetch failed and no stale data", body = ErrorResponse),
        (status = 504, description = "Live fetch timed out and no stale data", body = ErrorResponse),
    ),
    tag = "jobs"
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): RawParams,
) -> Result<Json<JobSearchResponse>, ApiError> {
    run_search(&state, params, &[]).await
}

#[utoipa::path(
    get,
    path = "/v1/jobs/date-posted",
    params(SearchParams, DatePostedParam),
    responses(
        (status = 200, description = "Matching jobs", body = JobSearchResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 502, description = "Live fetch failed and no stale data", body = ErrorResponse),
        (status = 504, description = "Live fetch timed out and no stale data", body = ErrorResponse),
    ),
    tag = "jobs"
)]
pub async fn search_by_date_posted(
    State(state): State<Arc<AppState>>,
    Query(params): RawParams,
) -> Result<Json<JobSearchResponse>, ApiError> {
    run_search(&state, params, &[FilterName::DatePosted]).await
}

#[utoipa::path(
    get,
    path = "/v1/jobs/type",
    params(SearchParams, JobTypeParam),
    responses(
        (status = 200, description = "Matching jobs", body = JobSearchResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 502, description = "Live fetch failed and no stale data", body = ErrorResponse),
        (status = 504, description = "Live fetch timed out and no stale data", body = ErrorResponse),
    ),
    tag = "jobs"
)]
pub async fn search_by_job_type(
    State(state): State<Arc<AppState>>,
    Query(params): RawParams,
) -> Result<Json<JobSearchResponse>, ApiError> {
    run_search(&state, params, &[FilterName::JobType]).await
}

#[utoipa::path(
    get,
    path = "/v1/jobs/experience",
    params(SearchParams, ExperienceParam),
    responses(
        (status = 200, description = "Matching jobs", body = JobSearchResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 502, description = "Live fetch failed and no stale data", body = ErrorResponse),
        (status = 504, description = "Live fetch timed out and no stale data", body = ErrorResponse),
    ),
    tag = "jobs"
)]
pub async fn search_by_experience(
    State(state): State<Arc<AppState>>,
    Query(params): RawParams,
) -> Result<Json<JobSearchResponse>, ApiError> {
    run_search(&state, params, &[FilterName::Experience]).await
}

#[utoipa::path(
    get,
    path = "/v1/jobs/company",
    params(SearchParams, CompanyParam),
    responses(
        (status = 200, description = "Matching jobs", body = JobSearchResponse),
        (status = 400, description = "Invalid parameters or too many companies", body = ErrorResponse),
        (status = 502, description = "Live fetch failed and no stale data", body = ErrorResponse),
        (status = 504, description = "Live fetch timed out and no stale data", body = ErrorResponse),
    ),
    tag = "jobs"
)]
pub async fn search_by_company(
    State(state): State<Arc<AppState>>,
    Query(params): RawParams,
) -> Result<Json<JobSearchResponse>, ApiError> {
    run_search(&state, params, &[FilterName::Company]).await
}

#[utoipa::path(
    get,
    path = "/v1/jobs/remote",
    params(SearchParams, WorkplaceParam),
    responses(
        (status = 200, description = "Matching jobs", body = JobSearchResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 502, description = "Live fetch failed and no stale data", body = ErrorResponse),
        (status = 504, description = "Live fetch timed out and no stale data", body = ErrorResponse),
    ),
    tag = "jobs"
)]
pub async fn search_by_workplace(
    State(state): State<Arc<AppState>>,
    Query(params): RawParams,
) -> Result<Json<JobSearchResponse>, ApiError> {
    run_search(&state, params, &[FilterName::Workplace]).await
}

#[utoipa::path(
    get,
    path = "/v1/jobs/advanced",
    params(SearchParams, AdvancedParams),
    responses(
        (status = 200, description = "Matching jobs", body = JobSearchResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 502, description = "Live fetch failed and no stale data", body = ErrorResponse),
        (status = 504, description = "Live fetch timed out and no stale data", body = ErrorResponse),
    ),
    tag = "jobs"
)]
pub async fn search_advanced(
    State(state): State<Arc<AppState>>,
    Query(params): RawParams,
) -> Result<Json<JobSearchResponse>, ApiError> {
    run_search(&state, params, &FilterName::ALL).await
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
