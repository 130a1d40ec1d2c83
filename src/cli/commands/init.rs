//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "intake.toml")]
    pub output: String,

    /// Include comments explaining every setting
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Validate configuration: intake validate-config");
                println!("  3. Run an import: intake import --metadata metadata.json --bundle bundle.json");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Intake Configuration File

[application]
log_level = "info"

[import]
id_scheme = "uid"
strategy = "create_and_update"
report_mode = "errors"

[audit]
enabled = true
path = "./audit/data_value_audit.log"
json = true

[query]
default_page_size = 50
max_page_size = 1000

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
local_max_size_mb = 100
"#
        .to_string()
    }

    /// Generate configuration with comments
    fn generate_config_with_examples() -> String {
        r#"# Intake Configuration File
#
# Every setting has a default; remove what you do not need to change.
# Values may reference environment variables with ${VAR_NAME}, and any
# setting can be overridden with INTAKE_<SECTION>_<KEY>.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Import Defaults
# ============================================================================
[import]
# How references to metadata are matched: uid or code
id_scheme = "uid"

# Per-object overrides of id_scheme
# program_id_scheme = "code"
# program_stage_id_scheme = "code"
# org_unit_id_scheme = "code"

# create | update | create_and_update | delete
strategy = "create_and_update"

# errors | warnings | full
report_mode = "errors"

# ============================================================================
# Data Value Audit
# ============================================================================
[audit]
# Record data value changes of imported events
enabled = true

# Append-only audit log
path = "./audit/data_value_audit.log"

# JSON lines (true) or plain text (false)
json = true

# ============================================================================
# Tracked Entity Queries
# ============================================================================
[query]
# Page size used when a query requests none
default_page_size = 50

# Queries asking for more are rejected
max_page_size = 1000

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = false

# Log directory
local_path = "./logs"

# Log rotation (daily, hourly or size)
local_rotation = "daily"

# Maximum log file size in MB
local_max_size_mb = 100
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_generated_configs_parse() {
        let minimal = parse_config(&InitArgs::generate_minimal_config()).unwrap();
        assert_eq!(minimal.import.strategy, "create_and_update");

        let commented = parse_config(&InitArgs::generate_config_with_examples()).unwrap();
        assert_eq!(commented.query.max_page_size, 1000);
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("intake.toml");
        fs::write(&output, "").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
    }
}
