use serde::Serialize;

use jobscout_core::advisory::FilterWarning;
use jobscout_core::models::{JobRecord, SearchOutcome, processing_seconds};

// ---------------------------------------------------------------------------
// Query parameters (documentation only; handlers read raw pairs so unknown
// and repeated parameters can be rejected)
// ---------------------------------------------------------------------------

#[derive(Debug, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Search terms. Letters, digits, spaces and `- + # . / &`; at most 100 characters.
    pub keyword: String,
    /// Location. Letters, digits, spaces and `- , . '`; at most 100 characters.
    pub location: String,
}

#[derive(Debug, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DatePostedParam {
    /// `day`, `week` or `month`.
    pub date_posted: String,
}

#[derive(Debug, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JobTypeParam {
    /// `fulltime`, `parttime`, `contract` or `internship`.
    pub job_type: String,
}

#[derive(Debug, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExperienceParam {
    /// `entry`, `associate`, `mid`, `senior` or `director`.
    pub experience: String,
}

#[derive(Debug, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompanyParam {
    /// Comma-separated company names, at most 10.
    pub company: String,
}

#[derive(Debug, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkplaceParam {
    /// `all`, `onsite`, `remote` or `hybrid`.
    pub workplace: String,
}

#[derive(Debug, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdvancedParams {
    pub date_posted: Option<String>,
    pub job_type: Option<String>,
    pub experience: Option<String>,
    pub company: Option<String>,
    pub workplace: Option<String>,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobRecordResponse {
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    /// Relative posting date as shown by the site, e.g. "3 days ago". Empty if unknown.
    pub date_posted: String,
    /// Start of the description, at most 200 characters plus "...". Empty if unknown.
    pub snippet: String,
}

impl From<JobRecord> for JobRecordResponse {
    fn from(record: JobRecord) -> Self {
        Self {
            title: record.title,
            company: record.company,
            location: record.location,
            url: record.url,
            date_posted: record.date_posted,
            snippet: record.snippet,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FilterWarningResponse {
    pub message: String,
    pub internship_ratio: f64,
    pub suggestions: Vec<String>,
}

impl From<FilterWarning> for FilterWarningResponse {
    fn from(warning: FilterWarning) -> Self {
        Self {
            message: warning.message,
            internship_ratio: warning.internship_ratio,
            suggestions: warning.suggestions,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobSearchResponse {
    pub success: bool,
    pub jobs: Vec<JobRecordResponse>,
    /// `cache`, `live` or `stale_cache_on_error`.
    pub source: String,
    pub count: usize,
    /// Seconds, millisecond precision.
    pub processing_time: f64,
    /// Why stale data is being served.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_warning: Option<FilterWarningResponse>,
}

impl From<SearchOutcome> for JobSearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        Self {
            success: true,
            count: outcome.count(),
            source: outcome.source.to_string(),
            processing_time: processing_seconds(outcome.elapsed),
            jobs: outcome.jobs.into_iter().map(JobRecordResponse::from).collect(),
            error_message: outcome.error_message,
            filter_warning: outcome.filter_warning.map(FilterWarningResponse::from),
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}
