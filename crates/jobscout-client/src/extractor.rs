use jobscout_core::error::AppError;
use jobscout_core::traits::{Extractor, FieldMap, FieldSelector, SelectorSet};
use jobscout_core::util::normalize_whitespace;
use scraper::{ElementRef, Html, Selector};

/// CSS-selector extractor backed by `scraper`.
///
/// Each field's selectors are tried in order and the first non-empty value
/// wins. Text is whitespace-normalised; attribute values are trimmed.
#[derive(Clone, Default)]
pub struct ScraperExtractor;

impl ScraperExtractor {
    pub fn new() -> Self {
        Self
    }
}

struct CompiledField<'a> {
    field: &'a FieldSelector,
    selectors: Vec<Selector>,
}

impl Extractor for ScraperExtractor {
    fn extract(&self, markup: &str, set: &SelectorSet) -> Result<Vec<FieldMap>, AppError> {
        let fields = set
            .fields
            .iter()
            .map(|field| {
                Ok(CompiledField {
                    field,
                    selectors: field
                        .selectors
                        .iter()
                        .map(|s| parse_selector(s))
                        .collect::<Result<_, _>>()?,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let document = Html::parse_document(markup);

        match set.scope {
            Some(scope) => {
                let scope = parse_selector(scope)?;
                Ok(document
                    .select(&scope)
                    .map(|element| extract_fields(element, &fields))
                    .collect())
            }
            None => Ok(vec![extract_fields(document.root_element(), &fields)]),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, AppError> {
    Selector::parse(selector)
        .map_err(|e| AppError::ExtractionError(format!("Invalid selector '{selector}': {e}")))
}

fn extract_fields(root: ElementRef<'_>, fields: &[CompiledField<'_>]) -> FieldMap {
    let mut map = FieldMap::new();
    for compiled in fields {
        let value = compiled.selectors.iter().find_map(|selector| {
            root.select(selector)
                .find_map(|element| element_value(element, compiled.field.attr))
        });
        if let Some(value) = value {
            map.insert(compiled.field.name.to_string(), value);
        }
    }
    map
}

fn element_value(element: ElementRef<'_>, attr: Option<&str>) -> Option<String> {
    let value = match attr {
        Some(attr) => element.value().attr(attr)?.trim().to_string(),
        None => normalize_whitespace(&element.text().collect::<Vec<_>>().join(" ")),
    };
    (!value.is_empty()).then_some(value)
}
