//! Plain-text rendering of the metrics table.

use crate::table::MetricsTable;
use unicode_width::UnicodeWidthStr;

/// Fallback width when the terminal size is unknown.
const DEFAULT_WIDTH: usize = 80;

/// Determine terminal width from `COLUMNS` or the terminal itself.
#[must_use]
pub fn terminal_width() -> usize {
    if let Ok(columns) = std::env::var("COLUMNS") {
        if let Ok(value) = columns.trim().parse::<usize>() {
            if value > 0 {
                return value;
            }
        }
    }

    if let Ok((cols, _)) = crossterm::terminal::size() {
        if cols > 0 {
            return usize::from(cols);
        }
    }

    DEFAULT_WIDTH
}

/// Render the table with a two-line header (category, priority) and
/// right-aligned value columns.
///
/// When the table is wider than `max_width`, the category columns are
/// printed as two stacked blocks so each block fits.
#[must_use]
pub fn render_table(table: &MetricsTable, max_width: usize) -> String {
    let columns = table.layout().columns();
    let rows = table.render_rows();

    let label_width = rows
        .iter()
        .map(|r| r.metric.width())
        .chain(["Metrics".width(), "Priority".width()])
        .max()
        .unwrap_or(0);

    let column_widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            rows.iter()
                .map(|r| r.values[idx].width())
                .chain([column.group.width(), column.priority_label().width()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let full_width = label_width + column_widths.iter().map(|w| w + 2).sum::<usize>();
    let blocks: Vec<Vec<usize>> = if full_width <= max_width {
        vec![(0..columns.len()).collect()]
    } else {
        split_blocks(&columns.iter().map(|c| c.group.as_str()).collect::<Vec<_>>())
    };

    let mut out = String::new();
    for (block_idx, block) in blocks.iter().enumerate() {
        if block_idx > 0 {
            out.push('\n');
        }
        push_line(
            &mut out,
            "Metrics",
            label_width,
            block
                .iter()
                .map(|&i| (columns[i].group.as_str(), column_widths[i])),
        );
        push_line(
            &mut out,
            "Priority",
            label_width,
            block
                .iter()
                .map(|&i| (columns[i].priority_label(), column_widths[i])),
        );
        for rendered in &rows {
            push_line(
                &mut out,
                &rendered.metric,
                label_width,
                block.iter().map(|&i| (rendered.values[i].as_str(), column_widths[i])),
            );
        }
    }
    out
}

/// Split column indices into one block per distinct group, keeping order.
fn split_blocks(groups: &[&str]) -> Vec<Vec<usize>> {
    let mut blocks: Vec<Vec<usize>> = Vec::new();
    let mut last: Option<&str> = None;
    for (idx, group) in groups.iter().enumerate() {
        if last == Some(*group) {
            if let Some(block) = blocks.last_mut() {
                block.push(idx);
            }
        } else {
            blocks.push(vec![idx]);
        }
        last = Some(group);
    }
    blocks
}

fn push_line<'a>(
    out: &mut String,
    label: &str,
    label_width: usize,
    cells: impl Iterator<Item = (&'a str, usize)>,
) {
    out.push_str(label);
    out.push_str(&" ".repeat(label_width.saturating_sub(label.width())));
    for (value, width) in cells {
        out.push_str("  ");
        out.push_str(&" ".repeat(width.saturating_sub(value.width())));
        out.push_str(value);
    }
    let trimmed_len = out.trim_end_matches(' ').len();
    out.truncate(trimmed_len);
    out.push('\n');
}
