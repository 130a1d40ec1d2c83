//! Configuration schema types
//!
//! This module defines the configuration structure for Intake. Every section
//! has defaults, so an empty file is a valid configuration.

use crate::domain::ids::{IdScheme, IdSchemes};
use crate::domain::metadata::User;
use crate::domain::options::{ImportOptions, ImportStrategy, ReportMode};
use crate::core::query::PagingLimits;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main Intake configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Import defaults
    #[serde(default)]
    pub import: ImportConfig,

    /// Data value audit settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Tracked entity query settings
    #[serde(default)]
    pub query: QueryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl IntakeConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.import.validate()?;
        self.audit.validate()?;
        self.query.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Defaults applied to every import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// General identifier scheme (uid, code, name, attribute:<uid>)
    #[serde(default = "default_id_scheme")]
    pub id_scheme: String,

    /// Override for program references
    #[serde(default)]
    pub program_id_scheme: Option<String>,

    /// Override for program stage references
    #[serde(default)]
    pub program_stage_id_scheme: Option<String>,

    /// Override for organisation unit references
    #[serde(default)]
    pub org_unit_id_scheme: Option<String>,

    /// Import strategy (create, update, create_and_update, delete)
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Report detail (errors, warnings, full)
    #[serde(default = "default_report_mode")]
    pub report_mode: String,
}

impl ImportConfig {
    fn validate(&self) -> Result<(), String> {
        self.id_schemes()
            .map_err(|e| format!("import: {e}"))?;
        self.import_strategy()
            .map_err(|e| format!("import.strategy: {e}"))?;
        self.report_mode()
            .map_err(|e| format!("import.report_mode: {e}"))?;
        Ok(())
    }

    /// Parsed identifier schemes
    pub fn id_schemes(&self) -> Result<IdSchemes, String> {
        let parse = |value: &Option<String>| -> Result<Option<IdScheme>, String> {
            value.as_deref().map(str::parse).transpose()
        };
        Ok(IdSchemes {
            id_scheme: self.id_scheme.parse()?,
            program: parse(&self.program_id_scheme)?,
            program_stage: parse(&self.program_stage_id_scheme)?,
            org_unit: parse(&self.org_unit_id_scheme)?,
        })
    }

    pub fn import_strategy(&self) -> Result<ImportStrategy, String> {
        self.strategy.parse()
    }

    pub fn report_mode(&self) -> Result<ReportMode, String> {
        self.report_mode.parse()
    }

    /// Import options for the given acting user
    ///
    /// # Errors
    ///
    /// Returns an error if a scheme, the strategy or the report mode does
    /// not parse.
    pub fn import_options(&self, user: Option<User>) -> Result<ImportOptions, String> {
        Ok(ImportOptions::new(user)
            .with_id_schemes(self.id_schemes()?)
            .with_strategy(self.import_strategy()?)
            .with_report_mode(self.report_mode()?))
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            id_scheme: default_id_scheme(),
            program_id_scheme: None,
            program_stage_id_scheme: None,
            org_unit_id_scheme: None,
            strategy: default_strategy(),
            report_mode: default_report_mode(),
        }
    }
}

/// Data value audit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Record data value changes (the changelog flag)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Audit log file path
    #[serde(default = "default_audit_path")]
    pub path: PathBuf,

    /// Write JSON lines instead of plain text
    #[serde(default = "default_true")]
    pub json: bool,
}

impl AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.path.as_os_str().is_empty() {
            return Err("audit.path cannot be empty when auditing is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_audit_path(),
            json: true,
        }
    }
}

/// Tracked entity query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Page size used when a query requests none
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,

    /// Largest page size a query may request
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

impl QueryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.default_page_size < 1 {
            return Err("query.default_page_size must be >= 1".to_string());
        }
        if self.max_page_size < self.default_page_size {
            return Err(format!(
                "query.max_page_size ({}) must be >= query.default_page_size ({})",
                self.max_page_size, self.default_page_size
            ));
        }
        Ok(())
    }

    pub fn paging_limits(&self) -> PagingLimits {
        PagingLimits {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Maximum log file size in MB
    #[serde(default = "default_local_max_size_mb")]
    pub local_max_size_mb: usize,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "size"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_max_size_mb == 0 {
            return Err("logging.local_max_size_mb must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            local_max_size_mb: default_local_max_size_mb(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_id_scheme() -> String {
    "uid".to_string()
}

fn default_strategy() -> String {
    "create_and_update".to_string()
}

fn default_report_mode() -> String {
    "errors".to_string()
}

fn default_audit_path() -> PathBuf {
    PathBuf::from("./audit/data_value_audit.log")
}

fn default_page_size() -> i64 {
    crate::core::query::DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> i64 {
    1000
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

fn default_local_max_size_mb() -> usize {
    100
}
