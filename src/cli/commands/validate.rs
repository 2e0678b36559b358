//! Validate command implementation.
//!
//! Loads the configuration and checks the query catalog. No request is sent.

use crate::cli::ConfigArgs;
use crate::config::{self, CliOverrides};
use crate::error::Result;
use crate::format::OutputContext;
use crate::model::{Category, query};
use crate::report::validate_catalog;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct ValidateOutput {
    valid: bool,
    config: PathBuf,
    queries: usize,
}

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the catalog
/// misses a required query.
pub fn execute(args: &ConfigArgs, ctx: &OutputContext) -> Result<()> {
    let overrides = CliOverrides {
        config: args.config.clone(),
        ..CliOverrides::default()
    };
    let (config, path) = config::load_config(&overrides)?;
    validate_catalog(&config.catalog)?;

    let required = query::COMMON.len() * Category::ALL.len() + query::DEFECT_SETS.len();
    let output = ValidateOutput {
        valid: true,
        config: path,
        queries: required,
    };

    if ctx.is_json() {
        ctx.json_pretty(&output);
    } else if !ctx.mode().is_quiet() {
        println!(
            "Catalog OK: {} required queries present in {}",
            output.queries,
            output.config.display()
        );
    }
    Ok(())
}
