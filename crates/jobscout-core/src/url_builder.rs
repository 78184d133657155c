use url::Url;

use crate::error::AppError;
use crate::filters::{FilterName, Filters};
use crate::query::JobQuery;

/// Compose the search-page URL for a query.
///
/// Keyword and location are always present. Filters are appended in the
/// canonical [`FilterName`] order, so equal queries give byte-identical URLs.
/// `company` is passed through as free text; the site expects opaque company
/// ids there, so it may not narrow results server-side. Filters without a
/// site code are skipped.
pub fn build_search_url(base: &str, query: &JobQuery) -> Result<String, AppError> {
    let mut url = Url::parse(base)
        .map_err(|e| AppError::ConfigError(format!("Invalid search URL '{base}': {e}")))?;

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("keywords", &query.keyword);
        pairs.append_pair("location", &query.location);
        for (name, value) in filter_params(&query.filters) {
            pairs.append_pair(name, &value);
        }
    }

    Ok(url.into())
}

/// Resolve filters to `(param, value)` pairs in canonical order.
fn filter_params(filters: &Filters) -> Vec<(&'static str, String)> {
    filters
        .iter()
        .filter_map(|(name, value)| match name {
            FilterName::Company => Some((name.param_name(), value.clone())),
            _ => name
                .code(value)
                .map(|code| (name.param_name(), code.to_string())),
        })
        .collect()
}
