//! CLI definitions and entry point.

pub mod commands;
pub mod dates;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::CliOverrides;

/// Defect metrics report generator.
#[derive(Parser, Debug)]
#[command(name = "dfr", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write JSON logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Output machine-readable JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every query, build the metrics table and export it
    Generate(GenerateArgs),

    /// Check that the query catalog holds every required query
    Validate(ConfigArgs),

    /// Print the catalog rendered for a date window without fetching
    Queries(QueriesArgs),

    /// Emit JSON Schemas for the config document and report payload
    Schema,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Locating the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to the configuration file (default: per-user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// First day of the window (YYYY-MM-DD); prompted for when absent
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// Last day of the window (YYYY-MM-DD); prompted for when absent
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Directory receiving report.csv and jql_queries.csv
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Override the search API URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Print the table without writing any files
    #[arg(long)]
    pub no_export: bool,
}

impl GenerateArgs {
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            config: self.config.config.clone(),
            api_url: self.api_url.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct QueriesArgs {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start: String,

    /// Last day of the window (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub end: String,

    #[command(flatten)]
    pub config: ConfigArgs,
}
