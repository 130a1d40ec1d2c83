//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels with `RUST_LOG` style directives
//! - Human readable console output
//! - Local JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use intake::logging::init_logging;
//! use intake::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an import
///
/// # Example
///
/// ```no_run
/// use intake::log_import_start;
///
/// let import_id = uuid::Uuid::new_v4();
/// log_import_start!(import_id, 3, "CREATE_AND_UPDATE");
/// ```
#[macro_export]
macro_rules! log_import_start {
    ($import_id:expr, $records:expr, $strategy:expr) => {
        tracing::info!(
            import_id = %$import_id,
            records = $records,
            strategy = %$strategy,
            "Starting import"
        );
    };
}

/// Log the completion of an import
///
/// `$stats` must expose `created`, `updated`, `deleted` and `ignored`.
///
/// # Example
///
/// ```no_run
/// use intake::log_import_complete;
/// use intake::core::import::Stats;
/// use std::time::Duration;
///
/// let import_id = uuid::Uuid::new_v4();
/// log_import_complete!(import_id, "SUCCESS", Stats::default(), Duration::from_secs(1));
/// ```
#[macro_export]
macro_rules! log_import_complete {
    ($import_id:expr, $status:expr, $stats:expr, $duration:expr) => {{
        let stats = &$stats;
        tracing::info!(
            import_id = %$import_id,
            status = %$status,
            created = stats.created,
            updated = stats.updated,
            deleted = stats.deleted,
            ignored = stats.ignored,
            duration_ms = $duration.as_millis() as u64,
            "Import completed"
        );
    }};
}

/// Log a record that was ignored, with the reason
///
/// # Example
///
/// ```no_run
/// use intake::log_record_rejected;
///
/// log_record_rejected!("a1234567890123456789bc", "Organisation unit does not exist");
/// ```
#[macro_export]
macro_rules! log_record_rejected {
    ($reference:expr, $message:expr) => {
        tracing::debug!(
            reference = %$reference,
            reason = %$message,
            "Record rejected"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use intake::log_error_with_context;
/// use intake::domain::IntakeError;
///
/// let error = IntakeError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
