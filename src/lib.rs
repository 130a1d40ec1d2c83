// Intake - Tracker import validation and conversion
// Copyright (c) 2025 Intake Contributors
// Licensed under the MIT License

//! # Intake - Tracker import validation and conversion
//!
//! Intake validates bundles of tracked entities, enrollments and events
//! against a metadata catalog, converts the accepted records into stored
//! entities and writes them transactionally, auditing every data value
//! change along the way.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Preheating** the metadata and existing entities a bundle references
//! - **Validating** records through an ordered chain of checkers per stage
//! - **Converting** import records into stored entities and back
//! - **Persisting** events with data value bookkeeping and audit entries
//! - **Mapping** tracked entity search criteria into query parameters
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (preheat, validation, convert, persist, audit, query, import)
//! - [`adapters`] - Storage and access control seams
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use intake::adapters::access::DefaultAccessManager;
//! use intake::adapters::store::InMemoryStore;
//! use intake::config::load_config;
//! use intake::core::audit::{AuditRecorder, MemoryAuditSink};
//! use intake::core::import::TrackerImporter;
//! use intake::domain::metadata::{CatalogDocument, MetadataCatalog};
//! use intake::domain::records::TrackerBundle;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("intake.toml")?;
//!
//!     let document: CatalogDocument =
//!         serde_json::from_str(&std::fs::read_to_string("metadata.json")?)?;
//!     let catalog = Arc::new(MetadataCatalog::from(document));
//!     let bundle: TrackerBundle =
//!         serde_json::from_str(&std::fs::read_to_string("bundle.json")?)?;
//!
//!     let importer = TrackerImporter::new(
//!         Arc::new(InMemoryStore::new()),
//!         Arc::clone(&catalog),
//!         Arc::new(DefaultAccessManager::new(catalog)),
//!         AuditRecorder::new(config.audit.enabled, Arc::new(MemoryAuditSink::new())),
//!     );
//!
//!     let options = config.import.import_options(None)?;
//!     let report = importer.import(&bundle, options, None).await?;
//!
//!     println!("{}: {} created, {} ignored", report.status, report.stats.created, report.stats.ignored);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`domain::Result`], an alias over
//! [`domain::IntakeError`]. Record-level problems are not errors: they are
//! reported as diagnostics in the import report.
//!
//! ## Logging
//!
//! Intake uses structured logging with the `tracing` crate. See
//! [`logging::init_logging`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
