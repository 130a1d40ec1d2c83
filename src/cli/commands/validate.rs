//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Intake configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        // load_config validates every section
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Id Scheme: {}", config.import.id_scheme);
        println!("  Import Strategy: {}", config.import.strategy);
        println!("  Report Mode: {}", config.import.report_mode);
        if config.audit.enabled {
            println!(
                "  Audit Log: {} ({})",
                config.audit.path.display(),
                if config.audit.json { "json" } else { "text" }
            );
        } else {
            println!("  Audit Log: disabled");
        }
        println!(
            "  Page Size: {} (max {})",
            config.query.default_page_size, config.query.max_page_size
        );
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[import]\nstrategy = \"create\"\n").unwrap();
        file.flush().unwrap();

        let path = file.path().to_string_lossy().to_string();
        assert_eq!(ValidateArgs {}.execute(&path).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[import]\nreport_mode = \"verbose\"\n").unwrap();
        file.flush().unwrap();

        let path = file.path().to_string_lossy().to_string();
        assert_eq!(ValidateArgs {}.execute(&path).await.unwrap(), 2);
    }
}
