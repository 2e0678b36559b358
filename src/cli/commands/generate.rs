//! Generate command implementation.
//!
//! The interactive report flow: resolve the date window (prompting for
//! missing bounds), load the configuration, fetch and compute the table,
//! print it, then export the CSV artifacts.

use crate::cli::GenerateArgs;
use crate::cli::dates::resolve_window;
use crate::config;
use crate::error::Result;
use crate::export::{CsvExporter, ExportSummary, ReportExporter};
use crate::fetch::{Fetcher, HttpTransport};
use crate::format::{OutputContext, render_table};
use crate::report::{ReportGenerator, ReportPayload};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Serialize)]
struct GenerateOutput {
    #[serde(flatten)]
    report: ReportPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    export: Option<ExportSummary>,
}

/// Execute the generate command.
///
/// # Errors
///
/// Returns an error if the dates are invalid, the configuration cannot be
/// loaded, the catalog misses a query, or the export fails.
pub fn execute(args: &GenerateArgs, ctx: &OutputContext) -> Result<()> {
    let window = resolve_window(
        args.start.as_deref(),
        args.end.as_deref(),
        &mut io::stdin().lock(),
        &mut io::stderr(),
    )?;

    let (config, path) = config::load_config(&args.overrides())?;
    info!(config = %path.display(), "Using configuration");

    let transport = HttpTransport::new(
        &config.api_credentials,
        Duration::from_secs(config.settings.timeout_secs),
    )?;
    let fetcher = Fetcher::with_page_size(transport, config.settings.page_size);

    let mut generator = ReportGenerator::new(&config.catalog, fetcher);
    if ctx.wants_progress() {
        generator = generator.with_progress(spinner());
    }
    let output = generator.build(&window)?;

    let export = if args.no_export {
        None
    } else {
        Some(CsvExporter::new(&config.settings.output_dir).export(&output)?)
    };

    if ctx.is_json() {
        ctx.json_pretty(&GenerateOutput {
            report: ReportPayload::from(&output),
            export,
        });
        return Ok(());
    }

    if !ctx.mode().is_quiet() {
        println!("Defect report {} .. {}", window.start, window.end);
        println!();
        print!("{}", render_table(&output.table, ctx.width()));
    }
    if let Some(summary) = export {
        if !ctx.mode().is_quiet() {
            println!();
        }
        println!("Report written to {}", summary.report_path.display());
        println!("Queries written to {}", summary.queries_path.display());
    }
    Ok(())
}

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
