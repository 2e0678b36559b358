//! Configuration management for `defect_report`.
//!
//! The configuration document carries the API endpoint, the credential pair,
//! optional run settings and the query catalog. Every top-level key other
//! than `api_credentials` and `settings` is a catalog category.
//!
//! Sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`DFR_API_URL`, `DFR_API_USERNAME`, `DFR_API_PASSWORD`)
//! 3. The configuration file (JSON, or YAML by extension)
//!
//! The file itself is found via `--config`, then `DFR_CONFIG`, then the
//! per-user config directory.

use crate::catalog::QueryCatalog;
use crate::error::{ReportError, Result};
use crate::fetch::DEFAULT_PAGE_SIZE;
use crate::fetch::http::DEFAULT_TIMEOUT_SECS;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "DFR_CONFIG";
/// File name looked up in the per-user config directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "queries.json";
/// Default directory for exported artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "report";

const APP_DIR: &str = "dfr";

/// Search API endpoint and credential pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ApiCredentials {
    pub api_url: String,
    pub api_username: String,
    pub api_password: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_url", &self.api_url)
            .field("api_username", &self.api_username)
            .field("api_password", &"<redacted>")
            .finish()
    }
}

/// Optional run settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Settings {
    /// Issues requested per page.
    pub page_size: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Directory receiving `report.csv` and `jql_queries.csv`.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// The parsed configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportConfig {
    pub api_credentials: ApiCredentials,
    #[serde(default)]
    pub settings: Settings,
    #[serde(flatten)]
    pub catalog: QueryCatalog,
}

impl ReportConfig {
    /// Parse a configuration document; `.yaml`/`.yml` paths parse as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the contents cannot be parsed or required keys
    /// are missing.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let config: Self = if is_yaml {
            serde_yaml::from_str(contents)?
        } else {
            serde_json::from_str(contents)?
        };
        Ok(config)
    }

    /// Load and parse the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is absent, unreadable or malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            error!(path = %path.display(), "Configuration file not found");
            return Err(ReportError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = fs::read_to_string(path)?;
        let config = Self::parse(&contents, path).inspect_err(|err| {
            error!(path = %path.display(), error = %err, "Configuration file is invalid");
        })?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| env::var(key).ok());
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = non_empty("DFR_API_URL") {
            self.api_credentials.api_url = url;
        }
        if let Some(username) = non_empty("DFR_API_USERNAME") {
            self.api_credentials.api_username = username;
        }
        if let Some(password) = lookup("DFR_API_PASSWORD") {
            self.api_credentials.api_password = password;
        }
    }

    /// Apply CLI overrides (highest precedence).
    pub fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(url) = &cli.api_url {
            self.api_credentials.api_url.clone_from(url);
        }
        if let Some(dir) = &cli.output_dir {
            self.settings.output_dir.clone_from(dir);
        }
    }

    /// Check the keys a run cannot proceed without.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Config`] naming the first missing value.
    pub fn validate(&self) -> Result<()> {
        if self.api_credentials.api_url.trim().is_empty() {
            return Err(ReportError::Config("api_credentials.api_url is empty".to_string()));
        }
        if self.api_credentials.api_username.trim().is_empty() {
            return Err(ReportError::Config(
                "api_credentials.api_username is empty".to_string(),
            ));
        }
        if self.settings.page_size == 0 {
            return Err(ReportError::Config("settings.page_size must be positive".to_string()));
        }
        if self.catalog.is_empty() {
            return Err(ReportError::Config("configuration holds no queries".to_string()));
        }
        Ok(())
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub api_url: Option<String>,
    pub output_dir: Option<PathBuf>,
}

/// Resolve, load, override and validate the configuration.
///
/// # Errors
///
/// Returns an error if no file can be found, it cannot be parsed, or a
/// required value is missing after overrides.
pub fn load_config(cli: &CliOverrides) -> Result<(ReportConfig, PathBuf)> {
    let path = resolve_config_path(cli.config.as_deref())?;
    let mut config = ReportConfig::load(&path)?;
    config.apply_env();
    config.apply_cli(cli);
    config.validate()?;
    Ok((config, path))
}

/// Pick the configuration file path.
///
/// # Errors
///
/// Returns an error if no explicit path is given and no per-user config
/// directory can be determined.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_config_path_with(explicit, |key| env::var(key).ok())
}

fn resolve_config_path_with(
    explicit: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<PathBuf> {
    let candidate = match explicit {
        Some(path) => path.to_path_buf(),
        None => match lookup(CONFIG_ENV).filter(|value| !value.trim().is_empty()) {
            Some(value) => PathBuf::from(value),
            None => user_config_dir(&lookup)
                .map(|dir| dir.join(APP_DIR).join(DEFAULT_CONFIG_FILENAME))
                .ok_or_else(|| {
                    ReportError::Config(format!(
                        "cannot locate a config directory; pass --config or set {CONFIG_ENV}"
                    ))
                })?,
        },
    };

    Ok(normalize_path(&candidate))
}

/// Per-user configuration directory for this platform.
fn user_config_dir(lookup: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if cfg!(windows) {
        return non_empty("APPDATA").map(PathBuf::from);
    }

    non_empty("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| non_empty("HOME").map(|home| Path::new(&home).join(".config")))
}

/// Canonicalize existing paths without the Windows `\\?\` prefix.
fn normalize_path(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
