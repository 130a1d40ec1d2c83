//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Intake using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Intake - Tracker import validation and conversion
#[derive(Parser, Debug)]
#[command(name = "intake")]
#[command(version, about, long_about = None)]
#[command(author = "Intake Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "intake.toml", env = "INTAKE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "INTAKE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate and apply a tracker bundle
    Import(commands::import::ImportArgs),

    /// Map tracked entity search criteria to query parameters
    Query(commands::query::QueryArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_import() {
        let cli = Cli::parse_from([
            "intake",
            "import",
            "--metadata",
            "metadata.json",
            "--bundle",
            "bundle.json",
        ]);
        assert_eq!(cli.config, "intake.toml");
        match cli.command {
            Commands::Import(args) => {
                assert_eq!(args.bundle.to_string_lossy(), "bundle.json");
                assert!(args.strategy.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_import_overrides() {
        let cli = Cli::parse_from([
            "intake",
            "import",
            "-m",
            "metadata.json",
            "-b",
            "bundle.json",
            "--strategy",
            "delete",
            "--report-mode",
            "full",
            "--user",
            "admin",
        ]);
        let Commands::Import(args) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(args.strategy.as_deref(), Some("delete"));
        assert_eq!(args.report_mode.as_deref(), Some("full"));
        assert_eq!(args.user.as_deref(), Some("admin"));
    }

    #[test]
    fn test_cli_parse_query() {
        let cli = Cli::parse_from([
            "intake",
            "query",
            "--metadata",
            "metadata.json",
            "--criteria",
            "criteria.json",
        ]);
        assert!(matches!(cli.command, Commands::Query(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["intake", "--config", "custom.toml", "validate-config"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["intake", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["intake", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["intake", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
