//! Configuration management.
//!
//! Configuration is read from a TOML file and then overridden by environment
//! variables:
//!
//! ```toml
//! guides_dir = "guides"
//! cache_path = ".cache/agent_index.json"
//! max_columns = 40
//!
//! [database]
//! kind = "sqlite"
//! path = "data/main.sqlite"
//!
//! [database.attach]
//! financial = "data/financial.sqlite"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! port = 9090
//! ```

use crate::guides::DEFAULT_GUIDE_EXTENSION;
use crate::index::{BuildOptions, DEFAULT_MAX_COLUMNS};
use crate::observability::LogFormat;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SCHEMADEX_CONFIG_PATH";

/// Main configuration for schemadex.
#[derive(Debug, Clone)]
pub struct SchemadexConfig {
    /// Database to index.
    pub database: DatabaseConfig,
    /// Directory holding guide documents.
    pub guides_dir: PathBuf,
    /// Guide file extension, without the dot.
    pub guide_extension: String,
    /// Where the index cache document is written.
    pub cache_path: PathBuf,
    /// Columns listed by a table description before truncating.
    pub max_columns: usize,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Metrics exporter settings.
    pub metrics: MetricsSettings,
}

/// Which database backend to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseKind {
    /// A SQLite file, plus optional attached files.
    #[default]
    Sqlite,
    /// A PostgreSQL server.
    Postgres,
}

impl DatabaseKind {
    /// Parses a backend name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an unknown backend.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => Err(Error::InvalidInput(format!(
                "unknown database kind '{other}' (expected sqlite or postgres)"
            ))),
        }
    }
}

/// Database connection settings.
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Backend.
    pub kind: DatabaseKind,
    /// SQLite main database file.
    pub path: Option<PathBuf>,
    /// Extra SQLite files attached as additional schemas, by schema name.
    pub attach: BTreeMap<String, PathBuf>,
    /// PostgreSQL connection string.
    pub url: Option<String>,
    /// Schemas to skip; `None` uses the backend's internal schemas.
    pub excluded_schemas: Option<Vec<String>>,
}

/// Logging settings.
#[derive(Debug, Clone, Default)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `schemadex=debug`.
    pub level: Option<String>,
    /// Output format.
    pub format: LogFormat,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Default Prometheus scrape port.
pub const DEFAULT_METRICS_PORT: u16 = 9090;

/// Metrics exporter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSettings {
    /// Serve a Prometheus scrape endpoint.
    pub enabled: bool,
    /// Port of the scrape endpoint.
    pub port: u16,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            port: DEFAULT_METRICS_PORT,
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Database section.
    pub database: Option<ConfigFileDatabase>,
    /// Guide directory.
    pub guides_dir: Option<String>,
    /// Guide extension.
    pub guide_extension: Option<String>,
    /// Cache path.
    pub cache_path: Option<String>,
    /// Column limit.
    pub max_columns: Option<usize>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Metrics section.
    pub metrics: Option<ConfigFileMetrics>,
}

/// Database section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileDatabase {
    /// Backend name.
    pub kind: Option<String>,
    /// SQLite file.
    pub path: Option<String>,
    /// Attached SQLite files.
    pub attach: Option<BTreeMap<String, String>>,
    /// PostgreSQL URL.
    pub url: Option<String>,
    /// Excluded schemas.
    pub excluded_schemas: Option<Vec<String>>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// Filter directive.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file.
    pub file: Option<String>,
}

/// Metrics section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileMetrics {
    /// Enable the exporter.
    pub enabled: Option<bool>,
    /// Scrape port.
    pub port: Option<u16>,
}

impl Default for SchemadexConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            guides_dir: PathBuf::from("guides"),
            guide_extension: DEFAULT_GUIDE_EXTENSION.to_string(),
            cache_path: PathBuf::from(".cache").join("agent_index.json"),
            max_columns: DEFAULT_MAX_COLUMNS,
            logging: LoggingSettings::default(),
            metrics: MetricsSettings::default(),
        }
    }
}

impl SchemadexConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::operation("read_config_file", format!("{}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or names an unknown backend.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::operation("parse_config_file", e))?;
        Self::from_config_file(file)
    }

    /// Loads configuration from the first location that exists.
    ///
    /// Checks, in order:
    /// 1. `explicit` (the `--config` flag)
    /// 2. `SCHEMADEX_CONFIG_PATH`
    /// 3. Platform config dir (`~/.config/schemadex/config.toml` on Linux)
    ///
    /// Falls back to defaults when none is found. Environment overrides are
    /// applied last in every case.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be loaded, or a
    /// found file is malformed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);

        let mut config = if let Some(path) = explicit.map(Path::to_path_buf).or(env_path) {
            Self::load_from_file(&path)?
        } else {
            match Self::default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::load_from_file(&path)?,
                None => Self::default(),
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Platform-specific default config file location.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("schemadex").join("config.toml"))
    }

    /// Converts a `ConfigFile` to `SchemadexConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(db) = file.database {
            if let Some(kind) = db.kind {
                config.database.kind = DatabaseKind::parse(&kind)?;
            }
            config.database.path = db.path.map(PathBuf::from);
            config.database.url = db.url;
            config.database.excluded_schemas = db.excluded_schemas;
            if let Some(attach) = db.attach {
                config.database.attach = attach
                    .into_iter()
                    .map(|(schema, path)| (schema, PathBuf::from(path)))
                    .collect();
            }
        }
        if let Some(dir) = file.guides_dir {
            config.guides_dir = PathBuf::from(dir);
        }
        if let Some(ext) = file.guide_extension {
            config.guide_extension = ext.trim_start_matches('.').to_string();
        }
        if let Some(path) = file.cache_path {
            config.cache_path = PathBuf::from(path);
        }
        if let Some(max_columns) = file.max_columns {
            config.max_columns = max_columns;
        }
        if let Some(logging) = file.logging {
            config.logging.level = logging.level;
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format);
            }
            config.logging.file = logging.file.map(PathBuf::from);
        }
        if let Some(metrics) = file.metrics {
            config.metrics.enabled = metrics.enabled.unwrap_or(config.metrics.enabled);
            config.metrics.port = metrics.port.unwrap_or(config.metrics.port);
        }

        Ok(config)
    }

    /// Applies `SCHEMADEX_*` and `DATABASE_URL` environment overrides.
    ///
    /// Unparseable `SCHEMADEX_METRICS_ENABLED` or `SCHEMADEX_METRICS_PORT`
    /// values are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("SCHEMADEX_DATABASE_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(dir) = lookup("SCHEMADEX_GUIDES_DIR") {
            self.guides_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("SCHEMADEX_CACHE_PATH") {
            self.cache_path = PathBuf::from(path);
        }
        if let Some(enabled) = lookup("SCHEMADEX_METRICS_ENABLED").and_then(|v| parse_bool(&v)) {
            self.metrics.enabled = enabled;
        }
        if let Some(port) = lookup("SCHEMADEX_METRICS_PORT").and_then(|v| v.trim().parse().ok()) {
            self.metrics.port = port;
        }
    }

    /// Sets the SQLite database path.
    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database.path = Some(path.into());
        self
    }

    /// Sets the guide directory.
    #[must_use]
    pub fn with_guides_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.guides_dir = path.into();
        self
    }

    /// Sets the cache path.
    #[must_use]
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    /// Index build options derived from this configuration.
    #[must_use]
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            guides_dir: self.guides_dir.clone(),
            guide_extension: self.guide_extension.clone(),
            cache_path: Some(self.cache_path.clone()),
            excluded_schemas: self.database.excluded_schemas.clone(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
