//! Settings for the one-shot pipeline.
//!
//! Loaded from a TOML file (path in `ARCHIVAL_ZONE_CONFIG`, default `archival_zone.toml`), with the
//! Dropbox token optionally taken from `DROPBOX_ACCESS_TOKEN` instead of the file:
//!
//! ```toml
//! [dropbox]
//! access_token = "sl.xxxxx"
//! timeout_secs = 60
//! # local_root = "/home/me/Dropbox"   # read a synced folder instead of the API
//!
//! [run]
//! folder = "/QualityZone2"
//! pattern = "*.xlsx"
//! water_year = 20
//! sheet = 1
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{IngestionError, IngestionResult};
use crate::ingestion::{FormatOptions, SheetSelector};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "ARCHIVAL_ZONE_CONFIG";
/// Environment variable overriding `dropbox.access_token`.
pub const TOKEN_ENV: &str = "DROPBOX_ACCESS_TOKEN";
/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "archival_zone.toml";

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub dropbox: DropboxConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// Storage backend settings.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropboxConfig {
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Read from a locally synced directory instead of the Dropbox API.
    #[serde(default)]
    pub local_root: Option<PathBuf>,
}

impl Default for DropboxConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            timeout_secs: default_timeout_secs(),
            local_root: None,
        }
    }
}

impl fmt::Debug for DropboxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropboxConfig")
            .field("access_token_set", &!self.access_token.is_empty())
            .field("timeout_secs", &self.timeout_secs)
            .field("local_root", &self.local_root)
            .finish()
    }
}

/// What the one-shot run should fetch and check.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default = "default_folder")]
    pub folder: String,
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Two-digit water year to check coverage against.
    #[serde(default)]
    pub water_year: Option<u8>,
    /// Values above 1 fetch files on a worker pool of that size. Ignored when `skip_failed` is set.
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub sheet: Option<SheetSelector>,
    #[serde(default)]
    pub header_row_skip: usize,
    #[serde(default)]
    pub index_column: usize,
    #[serde(default = "default_missing_marker")]
    pub missing_marker: String,
    /// Keep going past files that fail to ingest and report them at the end.
    #[serde(default)]
    pub skip_failed: bool,
    /// Append per-file progress lines to this file.
    #[serde(default)]
    pub progress_log: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            pattern: default_pattern(),
            water_year: None,
            workers: default_workers(),
            sheet: None,
            header_row_skip: 0,
            index_column: 0,
            missing_marker: default_missing_marker(),
            skip_failed: false,
            progress_log: None,
        }
    }
}

impl RunConfig {
    /// Whether files are fetched on a worker pool; `skip_failed` ingests sequentially.
    pub fn uses_worker_pool(&self) -> bool {
        self.workers > 1 && !self.skip_failed
    }

    /// Format options for the ingestor.
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            sheet_selector: self.sheet.clone(),
            header_row_skip: self.header_row_skip,
            index_column: self.index_column,
            missing_marker: self.missing_marker.clone(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_folder() -> String {
    "/".to_string()
}

fn default_pattern() -> String {
    "*".to_string()
}

fn default_workers() -> usize {
    1
}

fn default_missing_marker() -> String {
    "NAN".to_string()
}

impl Config {
    /// Parse settings from TOML text.
    pub fn from_toml_str(s: &str) -> IngestionResult<Self> {
        toml::from_str(s).map_err(|e| IngestionError::Config {
            message: e.to_string(),
        })
    }

    /// Read settings from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> IngestionResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| IngestionError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from the environment: config file (if present) plus token override.
    ///
    /// A missing default config file is not an error; a missing file named explicitly through
    /// [`CONFIG_PATH_ENV`] is.
    pub fn load() -> IngestionResult<Self> {
        let config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_path(path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_path(DEFAULT_CONFIG_PATH)?
            }
            Err(_) => Self::default(),
        };
        config
            .with_token_override(std::env::var(TOKEN_ENV).ok())
            .validated()
    }

    /// Replace the access token when `token` is a non-empty value.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.dropbox.access_token = token.trim().to_string();
        }
        self
    }

    /// Check that the settings are usable.
    pub fn validated(self) -> IngestionResult<Self> {
        if self.dropbox.local_root.is_none() && self.dropbox.access_token.is_empty() {
            return Err(IngestionError::Config {
                message: format!(
                    "no Dropbox access token: set dropbox.access_token or {TOKEN_ENV}, \
                     or dropbox.local_root"
                ),
            });
        }
        if self.run.workers == 0 {
            return Err(IngestionError::Config {
                message: "run.workers must be at least 1".to_string(),
            });
        }
        if let Some(wy) = self.run.water_year {
            if wy > 99 {
                return Err(IngestionError::Config {
                    message: format!("run.water_year must be a two-digit year, got {wy}"),
                });
            }
        }
        Ok(self)
    }
}
