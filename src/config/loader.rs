//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::IntakeConfig;
use crate::domain::errors::IntakeError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into IntakeConfig
/// 4. Applies environment variable overrides (INTAKE_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use intake::config::loader::load_config;
///
/// let config = load_config("intake.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<IntakeConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(IntakeError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        IntakeError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text, with substitution, overrides and
/// validation as in [`load_config`]
pub fn parse_config(contents: &str) -> Result<IntakeConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: IntakeConfig = toml::from_str(&contents)
        .map_err(|e| IntakeError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        IntakeError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| IntakeError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(IntakeError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        IntakeError::Configuration(format!("Invalid value for {name}: '{value}'"))
    })
}

/// Applies environment variable overrides using INTAKE_* prefix
///
/// Environment variables follow the pattern: INTAKE_<SECTION>_<KEY>
/// For example: INTAKE_IMPORT_STRATEGY, INTAKE_AUDIT_ENABLED
fn apply_env_overrides(config: &mut IntakeConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("INTAKE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Import overrides
    if let Ok(val) = std::env::var("INTAKE_IMPORT_ID_SCHEME") {
        config.import.id_scheme = val;
    }
    if let Ok(val) = std::env::var("INTAKE_IMPORT_STRATEGY") {
        config.import.strategy = val;
    }
    if let Ok(val) = std::env::var("INTAKE_IMPORT_REPORT_MODE") {
        config.import.report_mode = val;
    }

    // Audit overrides
    if let Ok(val) = std::env::var("INTAKE_AUDIT_ENABLED") {
        config.audit.enabled = parse_override("INTAKE_AUDIT_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("INTAKE_AUDIT_PATH") {
        config.audit.path = val.into();
    }
    if let Ok(val) = std::env::var("INTAKE_AUDIT_JSON") {
        config.audit.json = parse_override("INTAKE_AUDIT_JSON", &val)?;
    }

    // Query overrides
    if let Ok(val) = std::env::var("INTAKE_QUERY_DEFAULT_PAGE_SIZE") {
        config.query.default_page_size = parse_override("INTAKE_QUERY_DEFAULT_PAGE_SIZE", &val)?;
    }
    if let Ok(val) = std::env::var("INTAKE_QUERY_MAX_PAGE_SIZE") {
        config.query.max_page_size = parse_override("INTAKE_QUERY_MAX_PAGE_SIZE", &val)?;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("INTAKE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("INTAKE_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("INTAKE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("INTAKE_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
