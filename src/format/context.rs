//! Output context and mode detection.
//!
//! Determines whether to print Plain, JSON, or Quiet output based on CLI
//! flags, and carries the terminal width used to lay out the report table.
//!
//! # Mode Selection Logic
//!
//! 1. `--json` flag → JSON mode (machine-readable)
//! 2. `--quiet` flag → Quiet mode (minimal output)
//! 3. Otherwise → Plain mode

use std::io::IsTerminal;

use super::text::terminal_width;

/// Output mode determining formatting strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Aligned text tables for humans.
    #[default]
    Plain,

    /// JSON output for machine consumption.
    Json,

    /// Quiet mode: no report printed, only the export paths.
    Quiet,
}

impl OutputMode {
    /// Returns true if this mode produces structured data (JSON).
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Json)
    }

    /// Returns true if this mode should minimize output.
    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Whether progress indicators may be drawn.
    #[must_use]
    pub const fn shows_progress(&self) -> bool {
        matches!(self, Self::Plain)
    }
}

/// Output context providing mode detection and terminal info.
#[derive(Debug, Clone)]
pub struct OutputContext {
    mode: OutputMode,
    width: usize,
    is_tty: bool,
}

impl OutputContext {
    /// Create context from CLI flags.
    #[must_use]
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        let mode = if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Plain
        };

        Self {
            mode,
            width: terminal_width(),
            is_tty: std::io::stderr().is_terminal(),
        }
    }

    /// Get the current output mode.
    #[must_use]
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.mode.is_structured()
    }

    /// Get terminal width in columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Whether a progress spinner should be drawn on stderr.
    #[must_use]
    pub const fn wants_progress(&self) -> bool {
        self.is_tty && self.mode.shows_progress()
    }

    /// Override the terminal width.
    #[must_use]
    pub const fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Print a value as pretty JSON to stdout.
    pub fn json_pretty<T: serde::Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(err) => tracing::error!(error = %err, "Failed to serialize JSON output"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_is_structured() {
        assert!(!OutputMode::Plain.is_structured());
        assert!(OutputMode::Json.is_structured());
        assert!(!OutputMode::Quiet.is_structured());
    }

    #[test]
    fn test_context_from_flags_json_wins() {
        let ctx = OutputContext::from_flags(true, true);
        assert_eq!(ctx.mode(), OutputMode::Json);
        assert!(ctx.is_json());
        assert!(!ctx.wants_progress());
    }

    #[test]
    fn test_context_from_flags_quiet() {
        let ctx = OutputContext::from_flags(false, true);
        assert_eq!(ctx.mode(), OutputMode::Quiet);
        assert!(!ctx.wants_progress());
    }

    #[test]
    fn test_context_width_override() {
        let ctx = OutputContext::from_flags(false, false).with_width(120);
        assert_eq!(ctx.width(), 120);
    }
}
