//! Query catalog: named, date-templated search queries per category.
//!
//! The catalog is validated as a whole before any request is issued, and
//! rendered once per run by substituting the `{{start_date}}` and
//! `{{end_date}}` placeholders.

use crate::model::Category;
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, warn};

pub const START_DATE_PLACEHOLDER: &str = "{{start_date}}";
pub const END_DATE_PLACEHOLDER: &str = "{{end_date}}";

static LEFTOVER_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*[A-Za-z0-9_-]+\s*\}\}").expect("placeholder regex"));

/// Category name → metric name → query template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct QueryCatalog {
    categories: BTreeMap<String, BTreeMap<String, String>>,
}

impl QueryCatalog {
    #[must_use]
    pub fn new(categories: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        Self { categories }
    }

    /// Query template for a category/metric pair.
    #[must_use]
    pub fn get(&self, category: Category, metric: &str) -> Option<&str> {
        self.categories
            .get(category.as_str())
            .and_then(|queries| queries.get(metric))
            .map(String::as_str)
    }

    pub fn insert(&mut self, category: Category, metric: &str, template: impl Into<String>) {
        self.categories
            .entry(category.as_str().to_string())
            .or_default()
            .insert(metric.to_string(), template.into());
    }

    pub fn remove(&mut self, category: Category, metric: &str) -> Option<String> {
        self.categories
            .get_mut(category.as_str())
            .and_then(|queries| queries.remove(metric))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.values().all(BTreeMap::is_empty)
    }

    /// Render every template with the given date window.
    #[must_use]
    pub fn render(&self, window: &DateWindow) -> RenderedCatalog {
        let queries = self
            .categories
            .iter()
            .map(|(category, templates)| {
                let rendered = templates
                    .iter()
                    .map(|(metric, template)| {
                        let query = window.apply(template);
                        if let Some(leftover) = LEFTOVER_PLACEHOLDER.find(&query) {
                            warn!(
                                category = %category,
                                metric = %metric,
                                placeholder = leftover.as_str(),
                                "Query still contains an unrendered placeholder"
                            );
                        }
                        (metric.clone(), query)
                    })
                    .collect();
                (category.clone(), rendered)
            })
            .collect();

        RenderedCatalog { queries }
    }
}

/// Confirm that every `required` metric exists for both categories.
///
/// Logs one error per missing entry and returns `false` if any is missing.
#[must_use]
pub fn validate(catalog: &QueryCatalog, required: &[&str]) -> bool {
    let missing = missing_queries(catalog, &Category::ALL, required);
    for key in &missing {
        error!(query = %key, "Query not found in catalog");
    }
    missing.is_empty()
}

/// List `Category.Metric` keys absent from the catalog, in request order.
#[must_use]
pub fn missing_queries(
    catalog: &QueryCatalog,
    categories: &[Category],
    required: &[&str],
) -> Vec<String> {
    let mut missing = Vec::new();
    for metric in required {
        for category in categories {
            if catalog.get(*category, metric).is_none() {
                missing.push(format!("{category}.{metric}"));
            }
        }
    }
    missing
}

/// Inclusive date bounds substituted into the query templates.
///
/// Values are opaque strings here; calendar validation belongs to the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: String,
    pub end: String,
}

impl DateWindow {
    #[must_use]
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    #[must_use]
    pub fn apply(&self, template: &str) -> String {
        template
            .replace(START_DATE_PLACEHOLDER, &self.start)
            .replace(END_DATE_PLACEHOLDER, &self.end)
    }
}

/// Catalog with every placeholder substituted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RenderedCatalog {
    queries: BTreeMap<String, BTreeMap<String, String>>,
}

impl RenderedCatalog {
    #[must_use]
    pub fn get(&self, category: Category, metric: &str) -> Option<&str> {
        self.queries
            .get(category.as_str())
            .and_then(|queries| queries.get(metric))
            .map(String::as_str)
    }

    /// Metric names present in any category, sorted.
    #[must_use]
    pub fn metrics(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .queries
            .values()
            .flat_map(|queries| queries.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::query;

    fn full_catalog() -> QueryCatalog {
        let mut catalog = QueryCatalog::default();
        for category in Category::ALL {
            for metric in query::COMMON {
                catalog.insert(
                    category,
                    metric,
                    format!("project = QA AND metric = {metric} AND created >= {{{{start_date}}}} AND created <= {{{{end_date}}}}"),
                );
            }
        }
        catalog
    }

    #[test]
    fn complete_catalog_validates() {
        assert!(validate(&full_catalog(), &query::COMMON));
    }

    #[test]
    fn missing_exploratory_noise_fails() {
        let mut catalog = full_catalog();
        catalog.remove(Category::Exploratory, query::NOISE);
        assert!(!validate(&catalog, &query::COMMON));
        assert_eq!(
            missing_queries(&catalog, &Category::ALL, &query::COMMON),
            vec!["Exploratory.Noise".to_string()]
        );
    }

    #[test]
    fn reports_every_missing_entry() {
        let mut catalog = full_catalog();
        catalog.remove(Category::Regression, query::FIXED);
        catalog.remove(Category::Exploratory, query::FIXED);
        catalog.remove(Category::Exploratory, query::RESOLUTION);
        let missing = missing_queries(&catalog, &Category::ALL, &query::COMMON);
        assert_eq!(
            missing,
            vec![
                "Regression.Fixed".to_string(),
                "Exploratory.Fixed".to_string(),
                "Exploratory.Resolution".to_string(),
            ]
        );
    }

    #[test]
    fn render_substitutes_both_dates() {
        let window = DateWindow::new("2024-01-01", "2024-01-31");
        let rendered = full_catalog().render(&window);
        let query = rendered.get(Category::Regression, query::NOISE).unwrap();
        assert!(query.contains("created >= 2024-01-01"));
        assert!(query.contains("created <= 2024-01-31"));
        assert!(!query.contains("{{"));
    }

    #[test]
    fn render_replaces_repeated_placeholders() {
        let window = DateWindow::new("a", "b");
        assert_eq!(
            window.apply("{{start_date}} {{start_date}} {{end_date}}"),
            "a a b"
        );
    }

    #[test]
    fn rendered_metrics_are_deduplicated() {
        let rendered = full_catalog().render(&DateWindow::new("x", "y"));
        let metrics = rendered.metrics();
        assert_eq!(metrics.len(), query::COMMON.len());
    }

    #[test]
    fn catalog_deserializes_from_nested_maps() {
        let json = r#"{"Regression":{"Noise":"q1"},"Exploratory":{"Noise":"q2"}}"#;
        let catalog: QueryCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.get(Category::Exploratory, "Noise"), Some("q2"));
        assert!(validate(&catalog, &["Noise"]));
    }
}
