//! The metrics table: a sparse `(row, column) → cell` mapping with an
//! explicit row and column order for rendering.
//!
//! Row identity decides what a cell holds. Count rows keep integers; derived
//! rows (`Noise%`, `Resolved-Defect`, ...) are overwritten with formatted
//! strings. The shape comes from a [`TableLayout`], so categories,
//! priorities and metric rows stay data rather than structure.

use crate::model::{Category, PriorityBucket, row};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Group name of the single cross-category column.
pub const OVERALL: &str = "Overall";

/// Unit suffix stripped from age values by [`MetricsTable::normalize`].
pub const AGE_UNIT_SUFFIX: &str = "days";

/// Column key: a (category, priority) pair or the bare `Overall` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ColumnKey {
    pub group: String,
    pub priority: Option<String>,
}

impl ColumnKey {
    #[must_use]
    pub fn cell(category: Category, priority: PriorityBucket) -> Self {
        Self {
            group: category.as_str().to_string(),
            priority: Some(priority.as_str().to_string()),
        }
    }

    #[must_use]
    pub fn overall() -> Self {
        Self {
            group: OVERALL.to_string(),
            priority: None,
        }
    }

    #[must_use]
    pub fn is_overall(&self) -> bool {
        self.priority.is_none()
    }

    /// Priority header text; empty for `Overall`.
    #[must_use]
    pub fn priority_label(&self) -> &str {
        self.priority.as_deref().unwrap_or("")
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.priority {
            Some(priority) => write!(f, "{}/{priority}", self.group),
            None => f.write_str(&self.group),
        }
    }
}

/// A single table value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Count(u64),
    Text(String),
}

impl Cell {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub const fn as_count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Ordered rows and columns of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub rows: Vec<String>,
    pub categories: Vec<Category>,
    pub priorities: Vec<PriorityBucket>,
}

impl TableLayout {
    /// The report layout: every metric row, both categories, three buckets.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            rows: row::ALL.iter().map(|name| (*name).to_string()).collect(),
            categories: Category::ALL.to_vec(),
            priorities: PriorityBucket::ALL.to_vec(),
        }
    }

    /// The (category, priority) columns, category-major.
    #[must_use]
    pub fn category_columns(&self) -> Vec<ColumnKey> {
        self.categories
            .iter()
            .flat_map(|category| {
                self.priorities
                    .iter()
                    .map(|priority| ColumnKey::cell(*category, *priority))
            })
            .collect()
    }

    /// Every column in display order, `Overall` last.
    #[must_use]
    pub fn columns(&self) -> Vec<ColumnKey> {
        let mut columns = self.category_columns();
        columns.push(ColumnKey::overall());
        columns
    }
}

/// Mutable metrics table for one report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsTable {
    layout: TableLayout,
    cells: HashMap<(String, ColumnKey), Cell>,
}

impl MetricsTable {
    /// Create a table with every row zero-filled across every
    /// (category, priority) column. `Overall` cells start absent.
    #[must_use]
    pub fn new(layout: TableLayout) -> Self {
        let mut cells = HashMap::new();
        for row_name in &layout.rows {
            for column in layout.category_columns() {
                cells.insert((row_name.clone(), column), Cell::Count(0));
            }
        }
        Self { layout, cells }
    }

    #[must_use]
    pub fn standard() -> Self {
        Self::new(TableLayout::standard())
    }

    #[must_use]
    pub const fn layout(&self) -> &TableLayout {
        &self.layout
    }

    #[must_use]
    pub fn rows(&self) -> &[String] {
        &self.layout.rows
    }

    #[must_use]
    pub fn has_row(&self, row_name: &str) -> bool {
        self.layout.rows.iter().any(|r| r == row_name)
    }

    #[must_use]
    pub fn get(&self, row_name: &str, column: &ColumnKey) -> Option<&Cell> {
        self.cells.get(&(row_name.to_string(), column.clone()))
    }

    /// Count stored at a cell; absent or text cells read as zero.
    #[must_use]
    pub fn count(&self, row_name: &str, column: &ColumnKey) -> u64 {
        self.get(row_name, column)
            .and_then(Cell::as_count)
            .unwrap_or(0)
    }

    /// Store a value. Writing to an unknown row appends it to the layout.
    pub fn set(&mut self, row_name: &str, column: &ColumnKey, value: Cell) {
        if !self.has_row(row_name) {
            self.layout.rows.push(row_name.to_string());
        }
        self.cells.insert((row_name.to_string(), column.clone()), value);
    }

    /// Remove a row and all of its cells. Unknown rows are ignored.
    pub fn drop_row(&mut self, row_name: &str) {
        self.layout.rows.retain(|r| r != row_name);
        self.cells.retain(|(r, _), _| r != row_name);
    }

    /// Prepare the table for export.
    ///
    /// Strips a trailing age-unit suffix from text cells so durations are
    /// bare numbers, and fills every absent cell with an empty string.
    /// Applying it twice is the same as applying it once.
    pub fn normalize(&mut self) {
        let columns = self.layout.columns();
        for row_name in self.layout.rows.clone() {
            for column in &columns {
                let key = (row_name.clone(), column.clone());
                let normalized = match self.cells.get(&key) {
                    None => Cell::text(""),
                    Some(Cell::Text(value)) => Cell::Text(strip_age_unit(value)),
                    Some(cell @ Cell::Count(_)) => cell.clone(),
                };
                self.cells.insert(key, normalized);
            }
        }
    }

    /// Rows in display order with their cells rendered in column order.
    /// Absent cells render as empty strings.
    #[must_use]
    pub fn render_rows(&self) -> Vec<RenderedRow> {
        let columns = self.layout.columns();
        self.layout
            .rows
            .iter()
            .map(|row_name| RenderedRow {
                metric: row_name.clone(),
                values: columns
                    .iter()
                    .map(|column| {
                        self.get(row_name, column)
                            .map(ToString::to_string)
                            .unwrap_or_default()
                    })
                    .collect(),
            })
            .collect()
    }
}

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedRow {
    pub metric: String,
    pub values: Vec<String>,
}

fn strip_age_unit(value: &str) -> String {
    let trimmed = value.trim_end();
    trimmed
        .strip_suffix(AGE_UNIT_SUFFIX)
        .map_or(trimmed, str::trim_end)
        .to_string()
}
