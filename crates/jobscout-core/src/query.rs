use std::collections::HashSet;

use crate::error::ValidationError;
use crate::filters::{FilterName, Filters};
use crate::validate::{validate, validate_filter};

/// A validated search: sanitised keyword and location plus zero or more filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobQuery {
    pub keyword: String,
    pub location: String,
    pub filters: Filters,
}

impl JobQuery {
    /// Build a query from already-separated parts, validating everything.
    pub fn new<'a>(
        keyword: Option<&str>,
        location: Option<&str>,
        filters: impl IntoIterator<Item = (FilterName, &'a str)>,
    ) -> Result<Self, ValidationError> {
        let (keyword, location) = validate(keyword, location)?;

        let mut validated = Filters::new();
        for (name, value) in filters {
            if let Some(value) = validate_filter(name, value)? {
                validated.insert(name, value);
            }
        }

        Ok(Self {
            keyword,
            location,
            filters: validated,
        })
    }

    /// Build a query from raw request parameters.
    ///
    /// `accepted` lists the filters the calling endpoint supports; any other
    /// recognised filter is rejected, as is any unrecognised parameter name
    /// and any parameter given twice.
    pub fn from_params<K, V>(
        params: impl IntoIterator<Item = (K, V)>,
        accepted: &[FilterName],
    ) -> Result<Self, ValidationError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut keyword = None;
        let mut location = None;
        let mut raw_filters = Vec::new();

        for (name, value) in params {
            let (name, value) = (name.as_ref(), value.as_ref());
            if !seen.insert(name.to_string()) {
                return Err(ValidationError::DuplicateParameter {
                    name: name.to_string(),
                });
            }
            match name {
                "keyword" => keyword = Some(value.to_string()),
                "location" => location = Some(value.to_string()),
                other => {
                    let filter: FilterName = other.parse()?;
                    if !accepted.contains(&filter) {
                        return Err(ValidationError::FilterNotSupported {
                            name: other.to_string(),
                        });
                    }
                    raw_filters.push((filter, value.to_string()));
                }
            }
        }

        Self::new(
            keyword.as_deref(),
            location.as_deref(),
            raw_filters.iter().map(|(name, value)| (*name, value.as_str())),
        )
    }

    pub fn filter(&self, name: FilterName) -> Option<&str> {
        self.filters.get(&name).map(String::as_str)
    }
}
