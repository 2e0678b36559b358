//! `defect_report` - defect metrics report generator
//!
//! This crate provides the core of the `dfr` CLI: it runs a catalog of
//! search queries for a date window against an issue tracker, buckets the
//! results by category and priority, derives percentage and defect-age
//! metrics, and exports a spreadsheet-style report.
//!
//! # Architecture
//!
//! - [`catalog`] - Query catalog, date placeholders and validation
//! - [`fetch`] - Paginated search with a pluggable transport
//! - [`table`] - Sparse metrics table and normalization
//! - [`metrics`] - Percentage metrics per cell and overall
//! - [`age`] - Defect age statistics
//! - [`report`] - Run orchestration
//! - [`export`] - CSV export collaborator
//! - [`config`] - Configuration file, env and CLI layering
//! - [`cli`] - Command-line interface using clap
//! - [`format`] - Output formatting (text, JSON)
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod age;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod format;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod report;
pub mod table;

pub use error::{ErrorCode, ReportError, Result, StructuredError};
