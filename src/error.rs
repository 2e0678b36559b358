//! Error types for `defect_report`.
//!
//! Transport failures never surface here: the fetcher degrades them to an
//! empty result set (see [`crate::fetch::FetchError`]). Everything in
//! [`ReportError`] either aborts the run or is reported by the CLI.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = ReportError> = std::result::Result<T, E>;

/// Errors that abort a report run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("query catalog validation failed: missing {}", missing.join(", "))]
    CatalogInvalid { missing: Vec<String> },

    #[error("invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("start date {start} is after end date {end}")]
    DateOrder { start: String, end: String },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("export error: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ConfigNotFound,
    ConfigInvalid,
    CatalogInvalid,
    InvalidDate,
    HttpClient,
    ExportFailed,
    IoError,
    ParseError,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigNotFound => "CONFIG_NOT_FOUND",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::CatalogInvalid => "CATALOG_INVALID",
            Self::InvalidDate => "INVALID_DATE",
            Self::HttpClient => "HTTP_CLIENT",
            Self::ExportFailed => "EXPORT_FAILED",
            Self::IoError => "IO_ERROR",
            Self::ParseError => "PARSE_ERROR",
        }
    }
}

impl ReportError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::CatalogInvalid { .. } => ErrorCode::CatalogInvalid,
            Self::InvalidDate { .. } | Self::DateOrder { .. } => ErrorCode::InvalidDate,
            Self::Http(_) => ErrorCode::HttpClient,
            Self::Export(_) | Self::Csv(_) => ErrorCode::ExportFailed,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) | Self::Yaml(_) => ErrorCode::ParseError,
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::CatalogInvalid { .. } => 1,
            Self::InvalidDate { .. } | Self::DateOrder { .. } => 2,
            Self::ConfigNotFound { .. } | Self::Config(_) | Self::Json(_) | Self::Yaml(_) => 3,
            Self::Http(_) => 4,
            Self::Export(_) | Self::Csv(_) | Self::Io(_) => 5,
        }
    }

    /// Optional remediation hint shown to the user.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ConfigNotFound { .. } => Some(
                "Pass --config PATH or set DFR_CONFIG to the query catalog file".to_string(),
            ),
            Self::CatalogInvalid { .. } => Some(
                "Add the missing queries under the listed category in the config file"
                    .to_string(),
            ),
            Self::InvalidDate { .. } => Some("Dates look like 2024-01-31".to_string()),
            Self::DateOrder { .. } => Some("Swap --start and --end".to_string()),
            _ => None,
        }
    }

    /// Build a structured error for JSON output.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError {
            code: self.code(),
            message: self.to_string(),
            hint: self.hint(),
        }
    }
}

/// Error body emitted by `--json` runs.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredError {
    pub code: ErrorCode,
    pub message: String,
    pub hint: Option<String>,
}

impl StructuredError {
    /// Render as the `{ "error": { ... } }` envelope.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self })
    }
}
