//! Import command implementation
//!
//! This module implements the `import` command: it validates a bundle
//! against a metadata catalog and applies it to an in-memory store seeded
//! from an optional snapshot of existing entities.

use super::{read_json, write_json};
use crate::adapters::access::DefaultAccessManager;
use crate::adapters::store::InMemoryStore;
use crate::config::load_config;
use crate::core::audit::{AuditRecorder, AuditSink, FileAuditSink, MemoryAuditSink};
use crate::core::import::{ImportReport, TrackerImporter};
use crate::domain::entities::StoredEntity;
use crate::domain::metadata::{CatalogDocument, MetadataCatalog};
use crate::domain::records::TrackerBundle;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Metadata catalog (JSON)
    #[arg(short, long)]
    pub metadata: PathBuf,

    /// Bundle of tracked entities, enrollments and events (JSON)
    #[arg(short, long)]
    pub bundle: PathBuf,

    /// Existing entities to seed the store with (JSON array)
    #[arg(long)]
    pub existing: Option<PathBuf>,

    /// Override import strategy (create, update, create_and_update, delete)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Override report mode (errors, warnings, full)
    #[arg(long)]
    pub report_mode: Option<String>,

    /// Username of the acting user; imports run as the system user otherwise
    #[arg(short, long)]
    pub user: Option<String>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ImportArgs {
    /// Execute the import command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(bundle = %self.bundle.display(), "Starting import command");

        let mut config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        if let Some(strategy) = &self.strategy {
            tracing::info!(strategy = %strategy, "Overriding import strategy from CLI");
            config.import.strategy = strategy.clone();
        }
        if let Some(report_mode) = &self.report_mode {
            tracing::info!(report_mode = %report_mode, "Overriding report mode from CLI");
            config.import.report_mode = report_mode.clone();
        }
        if let Err(e) = config.validate() {
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let catalog: MetadataCatalog = read_json::<CatalogDocument>(&self.metadata)?.into();
        let bundle: TrackerBundle = read_json(&self.bundle)?;
        let existing: Vec<StoredEntity> = match &self.existing {
            Some(path) => read_json(path)?,
            None => Vec::new(),
        };

        let user = match &self.user {
            Some(username) => match catalog.user_by_username(username) {
                Some(user) => Some(user.clone()),
                None => {
                    eprintln!("Unknown user: {username}");
                    return Ok(2);
                }
            },
            None => None,
        };
        let options = match config.import.import_options(user) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Invalid import settings: {e}");
                return Ok(2);
            }
        };

        let sink: Arc<dyn AuditSink> = if config.audit.enabled {
            Arc::new(FileAuditSink::new(&config.audit.path, config.audit.json)?)
        } else {
            Arc::new(MemoryAuditSink::new())
        };

        let catalog = Arc::new(catalog);
        let importer = TrackerImporter::new(
            Arc::new(InMemoryStore::with_entities(existing)),
            Arc::clone(&catalog),
            Arc::new(DefaultAccessManager::new(catalog)),
            AuditRecorder::new(config.audit.enabled, sink),
        );

        let report = match importer.import(&bundle, options, Some(shutdown_signal)).await {
            Ok(report) => report,
            Err(e) => {
                crate::log_error_with_context!(e, "Import aborted");
                eprintln!("Import failed: {e}");
                return Ok(5);
            }
        };

        match &self.output {
            Some(path) => {
                write_json(path, &report)?;
                println!("Report written to {}", path.display());
            }
            None => println!("{}", serde_json::to_string_pretty(&report)?),
        }
        Self::print_summary(&report);

        Ok(Self::exit_code(&report))
    }

    fn print_summary(report: &ImportReport) {
        eprintln!();
        eprintln!("Import Summary:");
        eprintln!("  Status: {}", report.status);
        eprintln!("  Created: {}", report.stats.created);
        eprintln!("  Updated: {}", report.stats.updated);
        eprintln!("  Deleted: {}", report.stats.deleted);
        eprintln!("  Ignored: {}", report.stats.ignored);
        eprintln!("  Duration: {:.2}s", report.duration_ms as f64 / 1000.0);
    }

    /// 130 when interrupted, 1 when records were ignored, 0 otherwise
    pub fn exit_code(report: &ImportReport) -> i32 {
        if report.cancelled {
            tracing::info!("Import interrupted by user signal");
            130
        } else if report.has_errors() {
            1
        } else {
            0
        }
    }
}
