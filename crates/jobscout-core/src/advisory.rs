//! Post-search check for filters the site appears to have ignored.
//!
//! The site's full-time filter is known to leak internships. When more than
//! half of the titles in a full-time search look like internships, the
//! response carries an advisory. The job list and cache are never altered.

use serde::{Deserialize, Serialize};

use crate::filters::FilterName;
use crate::models::JobRecord;
use crate::query::JobQuery;

const INTERNSHIP_WORDS: &[&str] = &[
    "intern",
    "interns",
    "internship",
    "internships",
    "trainee",
    "apprentice",
    "apprenticeship",
];

/// Non-fatal hint attached to a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterWarning {
    pub message: String,
    /// Share of returned titles that look like internships, 0.0..=1.0.
    pub internship_ratio: f64,
    /// Filters from the request that are worth relaxing or changing.
    pub suggestions: Vec<String>,
}

/// Whether a title reads like an internship posting.
pub fn looks_like_internship(title: &str) -> bool {
    let lower = title.to_lowercase();
    if lower.contains("co-op") {
        return true;
    }
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| INTERNSHIP_WORDS.contains(&word))
}

/// Inspect a result list against the filters that produced it.
pub fn analyze(query: &JobQuery, jobs: &[JobRecord]) -> Option<FilterWarning> {
    if query.filter(FilterName::JobType) != Some("fulltime") || jobs.is_empty() {
        return None;
    }

    let internships = jobs
        .iter()
        .filter(|job| looks_like_internship(&job.title))
        .count();
    if internships * 2 <= jobs.len() {
        return None;
    }

    let mut suggestions = vec![
        "job_type=fulltime is not being honoured by the site; filter titles client-side or drop job_type"
            .to_string(),
    ];
    for (name, value) in &query.filters {
        match name {
            FilterName::JobType => {}
            FilterName::Experience if value == "entry" => suggestions.push(
                "experience=entry attracts internship postings; try experience=associate".into(),
            ),
            _ => suggestions.push(format!("relax {name}={value} to widen the pool")),
        }
    }

    Some(FilterWarning {
        message: format!(
            "{internships} of {} results look like internships despite job_type=fulltime",
            jobs.len()
        ),
        internship_ratio: internships as f64 / jobs.len() as f64,
        suggestions,
    })
}
