//! Core business logic for Intake.
//!
//! # Modules
//!
//! - [`preheat`] - Read-only snapshot of metadata and existing entities
//! - [`validation`] - Checkers and the per-stage checker pipeline
//! - [`convert`] - Conversion between import records and stored entities
//! - [`persist`] - Event writes with data value bookkeeping
//! - [`audit`] - Data value audit recording
//! - [`query`] - Tracked entity search criteria mapping
//! - [`import`] - Import orchestration and reporting
//!
//! # Import Workflow
//!
//! 1. **Preheat**: Load referenced metadata and existing entities
//! 2. **Classify**: Pick insert, update or delete per record from the strategy
//! 3. **Validate**: Run the checker chain per tracker type and stage
//! 4. **Persist**: Convert accepted records and write each in a transaction
//! 5. **Audit**: Record data value changes of committed events
//! 6. **Report**: Build the import report
//!
//! # Example
//!
//! ```rust,no_run
//! use intake::adapters::access::DefaultAccessManager;
//! use intake::adapters::store::InMemoryStore;
//! use intake::core::audit::{AuditRecorder, MemoryAuditSink};
//! use intake::core::import::TrackerImporter;
//! use intake::domain::metadata::MetadataCatalog;
//! use intake::domain::options::ImportOptions;
//! use intake::domain::records::TrackerBundle;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Arc::new(MetadataCatalog::new());
//! let importer = TrackerImporter::new(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::clone(&catalog),
//!     Arc::new(DefaultAccessManager::new(catalog)),
//!     AuditRecorder::new(true, Arc::new(MemoryAuditSink::new())),
//! );
//!
//! let report = importer
//!     .import(&TrackerBundle::default(), ImportOptions::default(), None)
//!     .await?;
//! println!("Status: {}", report.status);
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod convert;
pub mod import;
pub mod persist;
pub mod preheat;
pub mod query;
pub mod validation;
