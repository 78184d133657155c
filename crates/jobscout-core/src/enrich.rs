use std::time::Duration;

use crate::error::AppError;
use crate::models::JobRecord;
use crate::selectors::{DATE_POSTED, DESCRIPTION, DETAIL_DATE_POSTED, DETAIL_DESCRIPTION};
use crate::traits::{Extractor, Fetcher, SelectorSet};
use crate::util::{normalize_whitespace, truncate_with_ellipsis};

/// Maximum snippet length in characters, before the `...` marker.
pub const SNIPPET_MAX_CHARS: usize = 200;

/// Fills `date_posted` and `snippet` from a record's own detail page.
///
/// Never fails: a timeout, transport error or missing selector only leaves the
/// affected field as it was.
#[derive(Clone)]
pub struct DetailEnricher<F, X>
where
    F: Fetcher,
    X: Extractor,
{
    fetcher: F,
    extractor: X,
    timeout: Duration,
}

impl<F, X> DetailEnricher<F, X>
where
    F: Fetcher,
    X: Extractor,
{
    pub fn new(fetcher: F, extractor: X, timeout: Duration) -> Self {
        Self {
            fetcher,
            extractor,
            timeout,
        }
    }

    pub async fn enrich(&self, mut record: JobRecord) -> JobRecord {
        let markup = match self.fetch_detail(&record.url).await {
            Ok(markup) => markup,
            Err(e) => {
                tracing::debug!(url = %record.url, error = %e, "Detail fetch failed, keeping partial record");
                return record;
            }
        };

        if let Some(date) = self.first_field(&markup, &DETAIL_DATE_POSTED, DATE_POSTED, &record.url) {
            record.date_posted = date;
        }

        if let Some(description) =
            self.first_field(&markup, &DETAIL_DESCRIPTION, DESCRIPTION, &record.url)
        {
            record.snippet =
                truncate_with_ellipsis(&normalize_whitespace(&description), SNIPPET_MAX_CHARS);
        }

        record
    }

    /// Fetch under a hard deadline, even if the fetcher ignores its timeout.
    async fn fetch_detail(&self, url: &str) -> Result<String, AppError> {
        if url.is_empty() {
            return Err(AppError::Generic("record has no detail URL".into()));
        }
        tokio::time::timeout(self.timeout, self.fetcher.fetch(url, self.timeout))
            .await
            .unwrap_or(Err(AppError::Timeout(self.timeout)))
    }

    fn first_field(
        &self,
        markup: &str,
        selectors: &SelectorSet,
        field: &str,
        url: &str,
    ) -> Option<String> {
        match self.extractor.extract(markup, selectors) {
            Ok(maps) => maps
                .into_iter()
                .find_map(|mut map| map.remove(field))
                .filter(|value| !value.is_empty()),
            Err(e) => {
                tracing::debug!(%url, %field, error = %e, "Detail extraction failed");
                None
            }
        }
    }
}
