//! Queries command implementation.
//!
//! Renders the catalog for a date window and prints it. Nothing is fetched.

use crate::cli::QueriesArgs;
use crate::cli::dates::window_from;
use crate::config::{ReportConfig, resolve_config_path};
use crate::error::Result;
use crate::format::OutputContext;
use crate::model::Category;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct RenderedQuery<'a> {
    category: Category,
    metric: &'a str,
    query: &'a str,
}

/// Execute the queries command.
///
/// # Errors
///
/// Returns an error if a date is invalid or the configuration cannot be
/// loaded.
pub fn execute(args: &QueriesArgs, ctx: &OutputContext) -> Result<()> {
    let window = window_from(&args.start, &args.end)?;
    let path = resolve_config_path(args.config.config.as_deref())?;
    let config = ReportConfig::load(&path)?;
    let rendered = config.catalog.render(&window);

    let mut entries = Vec::new();
    for metric in rendered.metrics() {
        for category in Category::ALL {
            if let Some(query) = rendered.get(category, metric) {
                entries.push(RenderedQuery {
                    category,
                    metric,
                    query,
                });
            }
        }
    }

    if ctx.is_json() {
        ctx.json_pretty(&entries);
        return Ok(());
    }
    if ctx.mode().is_quiet() {
        return Ok(());
    }

    for entry in &entries {
        println!("{}.{}: {}", entry.category, entry.metric, entry.query);
    }
    Ok(())
}
