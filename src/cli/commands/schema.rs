//! Schema command implementation.
//!
//! Emits JSON Schema documents for the configuration file, the `--json`
//! report payload and the error envelope.

use crate::config::ReportConfig;
use crate::error::Result;
use crate::format::OutputContext;
use crate::report::ReportPayload;
use chrono::{DateTime, Utc};
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize, schemars::JsonSchema)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
struct ErrorBody {
    /// Machine-readable error code (SCREAMING_SNAKE_CASE)
    code: String,
    /// Human-readable message
    message: String,
    /// Optional hint for remediation
    hint: Option<String>,
}

#[derive(Debug, Serialize)]
struct SchemaOutput {
    tool: &'static str,
    generated_at: DateTime<Utc>,
    schemas: BTreeMap<&'static str, RootSchema>,
}

/// Execute the schema command.
///
/// The output is JSON in every mode except quiet.
///
/// # Errors
///
/// Infallible today; kept fallible for dispatch symmetry.
pub fn execute(ctx: &OutputContext) -> Result<()> {
    if ctx.mode().is_quiet() {
        return Ok(());
    }

    let payload = SchemaOutput {
        tool: "dfr",
        generated_at: Utc::now(),
        schemas: build_schemas(),
    };
    ctx.json_pretty(&payload);
    Ok(())
}

fn build_schemas() -> BTreeMap<&'static str, RootSchema> {
    let mut schemas = BTreeMap::new();
    schemas.insert("ReportConfig", schema_for!(ReportConfig));
    schemas.insert("ReportPayload", schema_for!(ReportPayload));
    schemas.insert("ErrorEnvelope", schema_for!(ErrorEnvelope));
    schemas
}
