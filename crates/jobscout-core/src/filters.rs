//! The fixed filter enumeration and its lookup tables.
//!
//! Each filter name maps to one query parameter on the search site. Every
//! filter except `company` has a closed set of values, each with a site code.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Recognised filter names.
///
/// The declaration order is the canonical order used for URL building and
/// cache keys (`Ord` is derived from it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterName {
    DatePosted,
    JobType,
    Experience,
    Company,
    Workplace,
}

/// Validated filters, keyed in canonical order. Values are already normalised.
pub type Filters = BTreeMap<FilterName, String>;

impl FilterName {
    pub const ALL: [FilterName; 5] = [
        FilterName::DatePosted,
        FilterName::JobType,
        FilterName::Experience,
        FilterName::Company,
        FilterName::Workplace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterName::DatePosted => "date_posted",
            FilterName::JobType => "job_type",
            FilterName::Experience => "experience",
            FilterName::Company => "company",
            FilterName::Workplace => "workplace",
        }
    }

    /// Query parameter the search site expects for this filter.
    pub fn param_name(&self) -> &'static str {
        match self {
            FilterName::DatePosted => "f_TPR",
            FilterName::JobType => "f_JT",
            FilterName::Experience => "f_E",
            FilterName::Company => "f_C",
            FilterName::Workplace => "f_WT",
        }
    }

    /// The closed value set, or `None` for free-form filters.
    pub fn allowed_values(&self) -> Option<&'static [&'static str]> {
        match self {
            FilterName::DatePosted => Some(&["day", "week", "month"]),
            FilterName::JobType => Some(&["fulltime", "parttime", "contract", "internship"]),
            FilterName::Experience => Some(&["entry", "associate", "mid", "senior", "director"]),
            FilterName::Company => None,
            FilterName::Workplace => Some(&["all", "onsite", "remote", "hybrid"]),
        }
    }

    /// Site code for an enumerated value.
    ///
    /// `None` for free-form filters, unknown values, and `workplace=all`
    /// (which means "no restriction" and is left out of the URL).
    pub fn code(&self, value: &str) -> Option<&'static str> {
        let code = match (self, value) {
            (FilterName::DatePosted, "day") => "r86400",
            (FilterName::DatePosted, "week") => "r604800",
            (FilterName::DatePosted, "month") => "r2592000",
            (FilterName::JobType, "fulltime") => "F",
            (FilterName::JobType, "parttime") => "P",
            (FilterName::JobType, "contract") => "C",
            (FilterName::JobType, "internship") => "I",
            (FilterName::Experience, "entry") => "2",
            (FilterName::Experience, "associate") => "3",
            (FilterName::Experience, "mid") => "4",
            (FilterName::Experience, "senior") => "4",
            (FilterName::Experience, "director") => "5",
            (FilterName::Workplace, "onsite") => "1",
            (FilterName::Workplace, "remote") => "2",
            (FilterName::Workplace, "hybrid") => "3",
            _ => return None,
        };
        Some(code)
    }
}

impl fmt::Display for FilterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FilterName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownFilter {
                name: s.to_string(),
            })
    }
}
