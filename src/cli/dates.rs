//! Report window input: parsing, ordering and interactive prompts.

use crate::catalog::DateWindow;
use crate::error::{ReportError, Result};
use chrono::NaiveDate;
use std::io::{BufRead, Write};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns [`ReportError::InvalidDate`] for anything else, including
/// impossible dates such as `2024-02-30`.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| ReportError::InvalidDate {
        value: trimmed.to_string(),
    })
}

/// Validate both bounds and build the window.
///
/// # Errors
///
/// Returns an error if either date is malformed or `start > end`.
pub fn window_from(start: &str, end: &str) -> Result<DateWindow> {
    let start_date = parse_date(start)?;
    let end_date = parse_date(end)?;
    if start_date > end_date {
        return Err(ReportError::DateOrder {
            start: start_date.to_string(),
            end: end_date.to_string(),
        });
    }
    Ok(DateWindow::new(
        start_date.format(DATE_FORMAT).to_string(),
        end_date.format(DATE_FORMAT).to_string(),
    ))
}

/// Use the given dates, prompting on `input` for any that are missing.
///
/// # Errors
///
/// Returns an error if reading the prompt fails or a date is invalid.
pub fn resolve_window<R: BufRead, W: Write>(
    start: Option<&str>,
    end: Option<&str>,
    input: &mut R,
    prompt_out: &mut W,
) -> Result<DateWindow> {
    let start = match start {
        Some(value) => value.to_string(),
        None => prompt(input, prompt_out, "Enter start date (YYYY-MM-DD): ")?,
    };
    let end = match end {
        Some(value) => value.to_string(),
        None => prompt(input, prompt_out, "Enter end date (YYYY-MM-DD): ")?,
    };
    window_from(&start, &end)
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<String> {
    out.write_all(label.as_bytes())?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
