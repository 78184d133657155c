//! Input validation: pure functions, no I/O.
//!
//! Keyword and location are bounded, then stripped down to an allow-list of
//! characters. Filters are checked against the closed value sets in
//! [`crate::filters`].

use crate::error::ValidationError;
use crate::filters::FilterName;
use crate::util::normalize_whitespace;

/// Maximum length of a raw keyword or location, in characters.
pub const MAX_PARAM_CHARS: usize = 100;

/// Maximum number of comma-separated company names.
pub const MAX_COMPANIES: usize = 10;

const KEYWORD_PUNCTUATION: &[char] = &['-', '+', '#', '.', '/', '&'];
const LOCATION_PUNCTUATION: &[char] = &['-', ',', '.', '\''];
const COMPANY_PUNCTUATION: &[char] = &['-', '&', '.', '\''];

/// Validate and sanitise the two required search parameters.
///
/// Rules, in order: both present and non-blank, both at most
/// [`MAX_PARAM_CHARS`] characters, then characters outside the allow-list are
/// stripped; a value left empty by stripping is rejected.
pub fn validate(
    raw_keyword: Option<&str>,
    raw_location: Option<&str>,
) -> Result<(String, String), ValidationError> {
    let (keyword, location) = match (raw_keyword, raw_location) {
        (Some(k), Some(l)) if !k.trim().is_empty() && !l.trim().is_empty() => (k, l),
        _ => return Err(ValidationError::MissingParameters),
    };

    if keyword.chars().count() > MAX_PARAM_CHARS {
        return Err(ValidationError::TooLong { field: "keyword" });
    }
    if location.chars().count() > MAX_PARAM_CHARS {
        return Err(ValidationError::TooLong { field: "location" });
    }

    let keyword = sanitize(keyword, KEYWORD_PUNCTUATION);
    if keyword.is_empty() {
        return Err(ValidationError::InvalidCharacters { field: "keyword" });
    }
    let location = sanitize(location, LOCATION_PUNCTUATION);
    if location.is_empty() {
        return Err(ValidationError::InvalidCharacters { field: "location" });
    }

    Ok((keyword, location))
}

/// Validate one filter value. `Ok(None)` means "not set".
pub fn validate_filter(name: FilterName, value: &str) -> Result<Option<String>, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    match name.allowed_values() {
        None => validate_company(value).map(Some),
        Some(allowed) => {
            let normalized = value.to_lowercase();
            if allowed.contains(&normalized.as_str()) {
                Ok(Some(normalized))
            } else {
                Err(ValidationError::InvalidFilterValue {
                    name: name.as_str(),
                    allowed: allowed.join(", "),
                })
            }
        }
    }
}

/// Validate a comma-separated company list and re-join the clean tokens.
pub fn validate_company(value: &str) -> Result<String, ValidationError> {
    let companies: Vec<String> = value
        .split(',')
        .map(|token| sanitize(token, COMPANY_PUNCTUATION))
        .filter(|token| !token.is_empty())
        .collect();

    if companies.is_empty() {
        return Err(ValidationError::NoValidCompanies);
    }
    if companies.len() > MAX_COMPANIES {
        return Err(ValidationError::TooManyCompanies {
            count: companies.len(),
        });
    }

    Ok(companies.join(","))
}

/// Keep word characters, whitespace and the given punctuation; collapse
/// whitespace.
fn sanitize(raw: &str, punctuation: &[char]) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace() || punctuation.contains(c))
        .collect();
    normalize_whitespace(&kept)
}
