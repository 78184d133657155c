use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "jobscout API",
        version = "0.1.0",
        description = "Job listing search with a fresh/stale cache and concurrent detail enrichment."
    ),
    paths(
        crate::routes::search,
        crate::routes::search_by_date_posted,
        crate::routes::search_by_job_type,
        crate::routes::search_by_experience,
        crate::routes::search_by_company,
        crate::routes::search_by_workplace,
        crate::routes::search_advanced,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::JobSearchResponse,
        crate::dto::JobRecordResponse,
        crate::dto::FilterWarningResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "jobs", description = "Job search"),
        (name = "system", description = "Health and system status"),
    )
)]
pub struct ApiDoc;
