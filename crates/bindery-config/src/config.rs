// crates/bindery-config/src/config.rs
// ============================================================================
// Module: Bindery Configuration
// Description: Configuration loading and validation for the bookstore.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: bindery-xml, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path is taken from an explicit argument, then the `BINDERY_CONFIG`
//! environment variable, then `bindery.toml` in the working directory. A file
//! that does not exist yields the built-in defaults; a file that exists but
//! cannot be read, parsed, or validated fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use bindery_xml::CATALOG_FILE;
use bindery_xml::ORDERS_FILE;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "bindery.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "BINDERY_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default HTTP bind address.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";
/// Default directory holding the XML documents and database.
const DEFAULT_DATA_DIR: &str = "data";
/// Default directory holding XSLT stylesheets.
const DEFAULT_XSLT_DIR: &str = "xslt";
/// Default SQLite database filename, resolved inside the data directory.
const DEFAULT_DATABASE_FILE: &str = "bookstore.db";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Bookstore service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage locations for documents and the database.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Audit mirror configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Config {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when reading, parsing, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        if !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.storage.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Returns the directory holding the XML documents.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(self.storage.data_dir.trim())
    }

    /// Returns the path of the catalog document.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir().join(CATALOG_FILE)
    }

    /// Returns the path of the orders document.
    #[must_use]
    pub fn orders_path(&self) -> PathBuf {
        self.data_dir().join(ORDERS_FILE)
    }

    /// Returns the SQLite database path; relative filenames resolve inside
    /// the data directory.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        let file = Path::new(self.storage.database_file.trim());
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir().join(file)
        }
    }

    /// Returns the directory holding XSLT stylesheets.
    #[must_use]
    pub fn xslt_dir(&self) -> PathBuf {
        PathBuf::from(self.storage.xslt_dir.trim())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the server binds.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl ServerConfig {
    /// Parses the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the address is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr.trim().parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "server.bind_addr is not a socket address: {}",
                self.bind_addr
            ))
        })
    }

    /// Validates the server section.
    fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr().map(|_| ())
    }
}

/// Storage locations for documents and the database.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `catalog.xml`, `orders.xml`, and the database.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Directory holding XSLT stylesheets served to clients.
    #[serde(default = "default_xslt_dir")]
    pub xslt_dir: String,
    /// SQLite database filename or absolute path.
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            xslt_dir: default_xslt_dir(),
            database_file: default_database_file(),
        }
    }
}

impl StorageConfig {
    /// Validates the storage section.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("storage.data_dir", &self.data_dir)?;
        validate_path_string("storage.xslt_dir", &self.xslt_dir)?;
        validate_path_string("storage.database_file", &self.database_file)?;
        Ok(())
    }
}

/// Destination for the operational audit mirror. The SQLite change log is
/// always written; this only selects the additional human-readable copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Mirror events to standard error.
    #[default]
    Stderr,
    /// Append events to a log file.
    File,
    /// No mirror.
    Off,
}

/// Audit mirror configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Mirror destination.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log file path; required exactly when `sink = "file"`.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates the audit section.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (AuditSinkKind::File, None) => Err(ConfigError::Invalid(
                "audit.path must be set when audit.sink = \"file\"".to_string(),
            )),
            (_, Some(_)) => Err(ConfigError::Invalid(
                "audit.path is only allowed when audit.sink = \"file\"".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the default bind address.
fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

/// Returns the default data directory.
fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

/// Returns the default XSLT directory.
fn default_xslt_dir() -> String {
    DEFAULT_XSLT_DIR.to_string()
}

/// Returns the default database filename.
fn default_database_file() -> String {
    DEFAULT_DATABASE_FILE.to_string()
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string against length and byte constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.contains('\0') {
        return Err(ConfigError::Invalid(format!("{field} must not contain NUL bytes")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
