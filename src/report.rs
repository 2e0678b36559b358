//! Report orchestration.
//!
//! One run validates the catalog, renders it for a date window, fetches and
//! buckets every count query, derives percentages and defect ages, and
//! normalizes the table. Nothing is fetched unless validation passes.

use crate::age::{DefectAgeCalculator, DefectAges};
use crate::catalog::{self, DateWindow, QueryCatalog, RenderedCatalog};
use crate::error::{ReportError, Result};
use crate::export::{ExportSummary, ReportExporter};
use crate::fetch::{FetchStats, Fetcher, SearchTransport};
use crate::metrics;
use crate::model::{Category, Issue, PriorityBucket, query, row};
use crate::table::{Cell, ColumnKey, MetricsTable};
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info};

/// Everything a finished run hands to the export collaborator.
#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub window: DateWindow,
    pub generated_at: DateTime<Utc>,
    pub table: MetricsTable,
    pub queries: RenderedCatalog,
    pub defect_ages: DefectAges,
    pub fetch_stats: FetchStats,
}

/// Drives one report run against a search transport.
pub struct ReportGenerator<'a, T> {
    catalog: &'a QueryCatalog,
    fetcher: Fetcher<T>,
    now: Option<DateTime<Utc>>,
    progress: ProgressBar,
}

impl<'a, T: SearchTransport> ReportGenerator<'a, T> {
    #[must_use]
    pub fn new(catalog: &'a QueryCatalog, fetcher: Fetcher<T>) -> Self {
        Self {
            catalog,
            fetcher,
            now: None,
            progress: ProgressBar::hidden(),
        }
    }

    /// Fix the instant unresolved defects age against. Without it the clock
    /// is read once when the age calculation starts.
    #[must_use]
    pub const fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Report fetch progress on the given bar.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub const fn fetcher(&self) -> &Fetcher<T> {
        &self.fetcher
    }

    /// Check that every query a run needs is present.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::CatalogInvalid`] listing every missing key.
    pub fn validate(&self) -> Result<()> {
        validate_catalog(self.catalog)
    }

    /// Build the finished, normalized table for a date window.
    ///
    /// # Errors
    ///
    /// Returns an error if catalog validation fails; no request is issued in
    /// that case. Fetch failures do not error: they contribute no data.
    pub fn build(&mut self, window: &DateWindow) -> Result<ReportOutput> {
        self.validate()?;

        let queries = self.catalog.render(window);
        let mut table = MetricsTable::standard();
        info!(start = %window.start, end = %window.end, "Generating report");

        self.progress
            .set_length((query::COMMON.len() * Category::ALL.len() + query::DEFECT_SETS.len()) as u64);

        for metric in query::COMMON {
            for category in Category::ALL {
                let issues = self.fetch_rendered(&queries, category, metric);
                record_counts(&mut table, metric, category, &issues);
            }
        }
        metrics::fill_overall_counts(&mut table, &row::COUNTS);

        let mut resolved = self.fetch_rendered(&queries, Category::Regression, query::RESOLVED_DEFECT);
        let mut unresolved =
            self.fetch_rendered(&queries, Category::Regression, query::UNRESOLVED_DEFECT);

        table.drop_row(row::RESOLUTION);
        metrics::compute_cell_metrics(&mut table);
        let now = self.now.unwrap_or_else(Utc::now);
        let defect_ages =
            DefectAgeCalculator::new(now).apply(&mut table, &mut resolved, &mut unresolved);
        metrics::compute_overall_metrics(&mut table);
        table.normalize();

        self.progress.finish_and_clear();
        let fetch_stats = self.fetcher.stats();
        info!(
            requests = fetch_stats.requests,
            failed_queries = fetch_stats.failed_queries,
            issues = fetch_stats.issues_received,
            cache_hits = fetch_stats.cache_hits,
            "Report data collected"
        );

        Ok(ReportOutput {
            window: window.clone(),
            generated_at: now,
            table,
            queries,
            defect_ages,
            fetch_stats,
        })
    }

    /// Build the report and hand it to an exporter.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the export fails.
    pub fn run(
        &mut self,
        window: &DateWindow,
        exporter: &dyn ReportExporter,
    ) -> Result<(ReportOutput, ExportSummary)> {
        let output = self.build(window)?;
        let summary = exporter.export(&output)?;
        Ok((output, summary))
    }

    fn fetch_rendered(
        &mut self,
        queries: &RenderedCatalog,
        category: Category,
        metric: &str,
    ) -> Vec<Issue> {
        self.progress.set_message(format!("{category} {metric}"));
        let issues = queries
            .get(category, metric)
            .map(|jql| self.fetcher.fetch(jql))
            .unwrap_or_default();
        self.progress.inc(1);
        issues
    }
}

/// Validate the common metrics for both categories and the defect-set
/// queries of `Regression`, logging every missing key.
///
/// # Errors
///
/// Returns [`ReportError::CatalogInvalid`] if anything is missing.
pub fn validate_catalog(catalog: &QueryCatalog) -> Result<()> {
    let common_ok = catalog::validate(catalog, &query::COMMON);
    let defect_missing =
        catalog::missing_queries(catalog, &[Category::Regression], &query::DEFECT_SETS);
    for key in &defect_missing {
        error!(query = %key, "Query not found in catalog");
    }

    if common_ok && defect_missing.is_empty() {
        return Ok(());
    }

    let mut missing = catalog::missing_queries(catalog, &Category::ALL, &query::COMMON);
    missing.extend(defect_missing);
    error!(missing = missing.len(), "Validation failed; no queries were issued");
    Err(ReportError::CatalogInvalid { missing })
}

/// Count issues per priority bucket.
#[must_use]
pub fn bucket_counts(issues: &[Issue]) -> BTreeMap<PriorityBucket, u64> {
    let mut counts: BTreeMap<PriorityBucket, u64> =
        PriorityBucket::ALL.iter().map(|bucket| (*bucket, 0)).collect();
    for issue in issues {
        *counts.entry(issue.bucket()).or_insert(0) += 1;
    }
    counts
}

fn record_counts(table: &mut MetricsTable, row_name: &str, category: Category, issues: &[Issue]) {
    for (bucket, count) in bucket_counts(issues) {
        table.set(row_name, &ColumnKey::cell(category, bucket), Cell::Count(count));
    }
}

/// JSON payload for `--json` output.
#[derive(Debug, Clone, Serialize, schemars::JsonSchema)]
pub struct ReportPayload {
    pub start_date: String,
    pub end_date: String,
    pub generated_at: DateTime<Utc>,
    pub columns: Vec<String>,
    pub rows: Vec<PayloadRow>,
    pub requests: usize,
    pub failed_queries: usize,
    pub cache_hits: usize,
}

#[derive(Debug, Clone, Serialize, schemars::JsonSchema)]
pub struct PayloadRow {
    pub metric: String,
    pub values: Vec<String>,
}

impl From<&ReportOutput> for ReportPayload {
    fn from(output: &ReportOutput) -> Self {
        Self {
            start_date: output.window.start.clone(),
            end_date: output.window.end.clone(),
            generated_at: output.generated_at,
            columns: output
                .table
                .layout()
                .columns()
                .iter()
                .map(ToString::to_string)
                .collect(),
            rows: output
                .table
                .render_rows()
                .into_iter()
                .map(|r| PayloadRow {
                    metric: r.metric,
                    values: r.values,
                })
                .collect(),
            requests: output.fetch_stats.requests,
            failed_queries: output.fetch_stats.failed_queries,
            cache_hits: output.fetch_stats.cache_hits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, SearchPage};
    use crate::model::{IssueFields, PriorityField};
    use chrono::TimeZone;
    use std::cell::Cell as StdCell;

    fn issue(priority: &str) -> Issue {
        Issue {
            key: None,
            fields: IssueFields {
                priority: Some(PriorityField {
                    name: priority.to_string(),
                }),
                created: None,
                resolutiondate: None,
                updated: None,
            },
            defect_age: None,
        }
    }

    #[test]
    fn bucket_counts_cover_every_bucket() {
        let counts = bucket_counts(&[issue("Blocker"), issue("Major"), issue("Minor")]);
        assert_eq!(counts[&PriorityBucket::Blocker], 1);
        assert_eq!(counts[&PriorityBucket::Critical], 0);
        assert_eq!(counts[&PriorityBucket::Others], 2);
    }

    #[test]
    fn validation_requires_defect_queries() {
        let mut catalog = QueryCatalog::default();
        for category in Category::ALL {
            for metric in query::COMMON {
                catalog.insert(category, metric, "q");
            }
        }
        let err = validate_catalog(&catalog).unwrap_err();
        match err {
            ReportError::CatalogInvalid { missing } => assert_eq!(
                missing,
                vec![
                    "Regression.Resolved_Defect".to_string(),
                    "Regression.Un-Resolved_Defect".to_string()
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }

        for metric in query::DEFECT_SETS {
            catalog.insert(Category::Regression, metric, "q");
        }
        validate_catalog(&catalog).unwrap();
    }

    /// Matches nothing and remembers when it was last asked.
    #[derive(Default)]
    struct ClockedTransport {
        last_request: StdCell<Option<DateTime<Utc>>>,
    }

    impl SearchTransport for ClockedTransport {
        fn search(
            &self,
            _query: &str,
            _start_at: usize,
            _max_results: usize,
        ) -> std::result::Result<SearchPage, FetchError> {
            self.last_request.set(Some(Utc::now()));
            Ok(SearchPage::default())
        }
    }

    fn complete_catalog() -> QueryCatalog {
        let mut catalog = QueryCatalog::default();
        for category in Category::ALL {
            for metric in query::COMMON {
                catalog.insert(category, metric, format!("{category} {metric}"));
            }
        }
        for metric in query::DEFECT_SETS {
            catalog.insert(Category::Regression, metric, metric);
        }
        catalog
    }

    #[test]
    fn age_clock_is_read_after_fetching() {
        let transport = ClockedTransport::default();
        let catalog = complete_catalog();
        let output = ReportGenerator::new(&catalog, Fetcher::new(&transport))
            .build(&DateWindow::new("2024-01-01", "2024-01-31"))
            .unwrap();

        let last_request = transport.last_request.get().expect("requests were issued");
        assert!(output.generated_at >= last_request);
    }

    #[test]
    fn fixed_clock_is_used_verbatim() {
        let transport = ClockedTransport::default();
        let catalog = complete_catalog();
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        let output = ReportGenerator::new(&catalog, Fetcher::new(&transport))
            .with_now(now)
            .build(&DateWindow::new("2024-01-01", "2024-01-31"))
            .unwrap();
        assert_eq!(output.generated_at, now);
    }
}
