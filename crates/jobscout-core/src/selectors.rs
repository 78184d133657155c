//! Selectors for the search-result and job-detail page layouts.

use crate::traits::{FieldSelector, SelectorSet};

pub const TITLE: &str = "title";
pub const COMPANY: &str = "company";
pub const LOCATION: &str = "location";
pub const URL: &str = "url";
pub const DATE_POSTED: &str = "date_posted";
pub const DESCRIPTION: &str = "description";

/// One entry per result card on the search page.
pub const SEARCH_CARDS: SelectorSet = SelectorSet {
    scope: Some("div.base-card"),
    fields: &[
        FieldSelector {
            name: TITLE,
            selectors: &["h3.base-search-card__title"],
            attr: None,
        },
        FieldSelector {
            name: COMPANY,
            selectors: &["h4.base-search-card__subtitle"],
            attr: None,
        },
        FieldSelector {
            name: LOCATION,
            selectors: &["span.job-search-card__location"],
            attr: None,
        },
        FieldSelector {
            name: URL,
            selectors: &["a.base-card__full-link"],
            attr: Some("href"),
        },
    ],
};

pub const DETAIL_DATE_POSTED: SelectorSet = SelectorSet {
    scope: None,
    fields: &[FieldSelector {
        name: DATE_POSTED,
        selectors: &[
            "span.posted-time-ago__text",
            "span.topcard__flavor--metadata",
            "time",
        ],
        attr: None,
    }],
};

pub const DETAIL_DESCRIPTION: SelectorSet = SelectorSet {
    scope: None,
    fields: &[FieldSelector {
        name: DESCRIPTION,
        selectors: &[
            "div.show-more-less-html__markup",
            "div.description__text",
            "section.description",
        ],
        attr: None,
    }],
};
