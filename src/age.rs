//! Defect age statistics.
//!
//! Resolved defects age from creation to resolution; still-open defects age
//! from creation to a single `now` fixed when the calculator is built. Ages
//! are whole days (floored), grouped by priority bucket.
//!
//! The defect sets are category-agnostic, so the same per-bucket averages
//! are written into every category column and one overall average into
//! `Overall`.

use crate::model::{Issue, PriorityBucket, row};
use crate::table::{AGE_UNIT_SUFFIX, Cell, ColumnKey, MetricsTable};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const SECONDS_PER_DAY: i64 = 86_400;

/// Running total for one priority bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgeTotals {
    pub total_days: i64,
    pub count: usize,
}

impl AgeTotals {
    /// Mean age; an empty group averages to zero.
    #[must_use]
    pub fn average(self) -> f64 {
        self.total_days as f64 / self.count.max(1) as f64
    }

    fn add(&mut self, days: i64) {
        self.total_days += days;
        self.count += 1;
    }

    fn merge(&mut self, other: Self) {
        self.total_days += other.total_days;
        self.count += other.count;
    }
}

/// Per-bucket and overall ages for one defect set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgeSummary {
    pub groups: BTreeMap<PriorityBucket, AgeTotals>,
    pub skipped: usize,
}

impl AgeSummary {
    /// Totals for a bucket; missing buckets are empty.
    #[must_use]
    pub fn group(&self, bucket: PriorityBucket) -> AgeTotals {
        self.groups.get(&bucket).copied().unwrap_or_default()
    }

    /// Sum of all group ages over the sum of all group counts.
    #[must_use]
    pub fn overall(&self) -> AgeTotals {
        let mut totals = AgeTotals::default();
        for group in self.groups.values() {
            totals.merge(*group);
        }
        totals
    }

    fn from_annotated(issues: &[Issue]) -> Self {
        let mut summary = Self::default();
        for issue in issues {
            match issue.defect_age {
                Some(days) => summary.groups.entry(issue.bucket()).or_default().add(days),
                None => summary.skipped += 1,
            }
        }
        summary
    }
}

/// Which clock a defect set ages against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefectState {
    Resolved,
    Unresolved,
}

/// Computes defect ages against one fixed `now`.
#[derive(Debug, Clone, Copy)]
pub struct DefectAgeCalculator {
    now: DateTime<Utc>,
}

impl DefectAgeCalculator {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Age of one defect in whole days, floored, or `None` without usable
    /// timestamps. A creation time after `now` gives a negative age.
    ///
    /// A resolved defect missing `resolutiondate` falls back to `updated`.
    #[must_use]
    pub fn age_in_days(&self, issue: &Issue, state: DefectState) -> Option<i64> {
        let created = issue.created_at()?;
        let end: DateTime<FixedOffset> = match state {
            DefectState::Resolved => issue.resolved_at().or_else(|| issue.updated_at())?,
            DefectState::Unresolved => self.now.fixed_offset(),
        };
        let seconds = end.signed_duration_since(created).num_seconds();
        Some(seconds.div_euclid(SECONDS_PER_DAY))
    }

    /// Set `defect_age` on every issue of a defect set.
    pub fn annotate(&self, issues: &mut [Issue], state: DefectState) {
        for issue in issues.iter_mut() {
            issue.defect_age = self.age_in_days(issue, state);
            if issue.defect_age.is_none() {
                warn!(
                    key = issue.key.as_deref().unwrap_or("<unknown>"),
                    ?state,
                    "Skipping defect without usable timestamps"
                );
            }
        }
    }

    /// Annotate a defect set and group its ages by priority bucket.
    pub fn summarize(&self, issues: &mut [Issue], state: DefectState) -> AgeSummary {
        self.annotate(issues, state);
        let summary = AgeSummary::from_annotated(issues);
        debug!(
            ?state,
            defects = issues.len(),
            skipped = summary.skipped,
            "Summarized defect ages"
        );
        summary
    }

    /// Compute both defect sets and write their averages into the table.
    pub fn apply(
        &self,
        table: &mut MetricsTable,
        resolved: &mut [Issue],
        unresolved: &mut [Issue],
    ) -> DefectAges {
        let ages = DefectAges {
            resolved: self.summarize(resolved, DefectState::Resolved),
            unresolved: self.summarize(unresolved, DefectState::Unresolved),
        };
        write_age_row(table, row::RESOLVED_DEFECT, &ages.resolved);
        write_age_row(table, row::UNRESOLVED_DEFECT, &ages.unresolved);
        ages
    }
}

/// Age summaries for both defect sets of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DefectAges {
    pub resolved: AgeSummary,
    pub unresolved: AgeSummary,
}

/// Format an average age with its unit, e.g. `4.00 days`.
#[must_use]
pub fn format_age(average: f64) -> String {
    format!("{average:.2} {AGE_UNIT_SUFFIX}")
}

fn write_age_row(table: &mut MetricsTable, row_name: &str, summary: &AgeSummary) {
    let layout = table.layout().clone();
    for category in &layout.categories {
        for bucket in &layout.priorities {
            let value = format_age(summary.group(*bucket).average());
            table.set(row_name, &ColumnKey::cell(*category, *bucket), Cell::Text(value));
        }
    }
    table.set(
        row_name,
        &ColumnKey::overall(),
        Cell::Text(format_age(summary.overall().average())),
    );
}
