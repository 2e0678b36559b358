//! Derived percentage metrics.
//!
//! Per (category, priority) cell:
//! - `Noise%`, `Fixed%`, `Gerrit%` are shares of `Resolved`; a zero
//!   denominator yields the literal `"0.0%"`.
//! - `Resolution%` is `Resolved / BugsRaised`; a zero denominator yields
//!   `"0.00%"`.
//!
//! The `Overall` column recomputes the same ratios from counts summed across
//! every category column, never from an average of cell percentages.

use crate::model::row;
use crate::table::{Cell, ColumnKey, MetricsTable};

/// Value written when a share has no resolved issues to divide by.
pub const ZERO_SHARE: &str = "0.0%";

/// Format `numerator / denominator` as a percentage with two decimals.
#[must_use]
pub fn format_share(numerator: u64, denominator: u64) -> String {
    if denominator == 0 {
        return ZERO_SHARE.to_string();
    }
    format!("{:.2}%", percentage(numerator, denominator))
}

/// Format the resolution rate; no bugs raised reads as `0.00%`.
#[must_use]
pub fn format_resolution(resolved: u64, bugs_raised: u64) -> String {
    let rate = if bugs_raised > 0 {
        percentage(resolved, bugs_raised)
    } else {
        0.0
    };
    format!("{rate:.2}%")
}

fn percentage(numerator: u64, denominator: u64) -> f64 {
    numerator as f64 / denominator as f64 * 100.0
}

/// Counts feeding the four derived percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellCounts {
    pub bugs_raised: u64,
    pub resolved: u64,
    pub fixed: u64,
    pub gerrit_fix: u64,
    pub noise: u64,
}

impl CellCounts {
    #[must_use]
    pub fn read(table: &MetricsTable, column: &ColumnKey) -> Self {
        Self {
            bugs_raised: table.count(row::BUGS_RAISED, column),
            resolved: table.count(row::RESOLVED, column),
            fixed: table.count(row::FIXED, column),
            gerrit_fix: table.count(row::GERRIT_FIX, column),
            noise: table.count(row::NOISE, column),
        }
    }

    fn accumulate(&mut self, other: Self) {
        self.bugs_raised += other.bugs_raised;
        self.resolved += other.resolved;
        self.fixed += other.fixed;
        self.gerrit_fix += other.gerrit_fix;
        self.noise += other.noise;
    }

    fn write_percentages(self, table: &mut MetricsTable, column: &ColumnKey) {
        table.set(row::NOISE_PCT, column, Cell::Text(format_share(self.noise, self.resolved)));
        table.set(row::FIXED_PCT, column, Cell::Text(format_share(self.fixed, self.resolved)));
        table.set(
            row::GERRIT_PCT,
            column,
            Cell::Text(format_share(self.gerrit_fix, self.resolved)),
        );
        table.set(
            row::RESOLUTION_PCT,
            column,
            Cell::Text(format_resolution(self.resolved, self.bugs_raised)),
        );
    }
}

/// Fill the percentage rows for every (category, priority) column.
pub fn compute_cell_metrics(table: &mut MetricsTable) {
    for column in table.layout().category_columns() {
        CellCounts::read(table, &column).write_percentages(table, &column);
    }
}

/// Fill the percentage rows of the `Overall` column from summed counts.
pub fn compute_overall_metrics(table: &mut MetricsTable) {
    let mut totals = CellCounts::default();
    for column in table.layout().category_columns() {
        totals.accumulate(CellCounts::read(table, &column));
    }
    totals.write_percentages(table, &ColumnKey::overall());
}

/// Write the `Overall` cell of each count row as the sum of its category
/// columns. Rows not present in the table are skipped.
pub fn fill_overall_counts(table: &mut MetricsTable, rows: &[&str]) {
    let columns = table.layout().category_columns();
    for row_name in rows {
        if !table.has_row(row_name) {
            continue;
        }
        let total: u64 = columns.iter().map(|c| table.count(row_name, c)).sum();
        table.set(row_name, &ColumnKey::overall(), Cell::Count(total));
    }
}
