//! Configuration management for Intake.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Intake uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `INTAKE_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation per section
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use intake::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("intake.toml")?;
//!
//! println!("Strategy: {}", config.import.strategy);
//! println!("Audit enabled: {}", config.audit.enabled);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`ImportConfig`] - Identifier schemes, strategy and report mode
//! - [`AuditConfig`] - Data value audit log
//! - [`QueryConfig`] - Paging limits for tracked entity queries
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [import]
//! id_scheme = "uid"
//! strategy = "create_and_update"
//! report_mode = "errors"
//!
//! [audit]
//! enabled = true
//! path = "${INTAKE_AUDIT_DIR}/data_value_audit.log"
//! json = true
//!
//! [query]
//! default_page_size = 50
//! max_page_size = 1000
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, AuditConfig, ImportConfig, IntakeConfig, LoggingConfig, QueryConfig,
};
