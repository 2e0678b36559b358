//! Output formatting for `defect_report`.
//!
//! Supports human-readable text tables and machine-parseable JSON.
//! Diagnostics always go to stderr so stdout stays clean for `--json`.

mod context;
mod text;

pub use context::{OutputContext, OutputMode};
pub use text::{render_table, terminal_width};
