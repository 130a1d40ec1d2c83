//! Domain models and types for Intake.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Identifiers** ([`Uid`], [`IdScheme`], [`IdSchemes`])
//! - **Metadata** ([`Program`], [`ProgramStage`], [`OrganisationUnit`], [`User`], ...)
//!   and the [`MetadataCatalog`] that indexes it
//! - **Import records** ([`TrackedEntity`], [`Enrollment`], [`Event`]) as submitted
//! - **Persisted entities** ([`StoredTrackedEntity`], [`StoredEnrollment`], [`StoredEvent`])
//! - **Audit entries** ([`DataValueAudit`])
//! - **Error types** ([`IntakeError`], [`StoreError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, IntakeError>`]:
//!
//! ```rust,no_run
//! use intake::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let config = intake::config::load_config("intake.toml")?;
//!     println!("{}", config.import.strategy);
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod context;
pub mod entities;
pub mod errors;
pub mod ids;
pub mod metadata;
pub mod options;
pub mod records;
pub mod result;

// Re-export commonly used types for convenience
pub use audit::{AuditType, DataValueAudit};
pub use entities::{
    EventDataValue, StoredEnrollment, StoredEntity, StoredEvent, StoredTrackedEntity,
    TrackedEntityAttributeValue, UserInfoSnapshot, FALLBACK_USERNAME,
};
pub use errors::{IntakeError, StoreError};
pub use ids::{IdScheme, IdSchemes, Uid};
pub use metadata::{
    DataElement, FeatureType, MetadataCatalog, OrganisationUnit, Program, ProgramStage,
    ProgramType, TrackedEntityAttribute, TrackedEntityType, User, ValueType,
};
pub use options::{ImportOptions, ImportStrategy, ReportMode};
pub use records::{
    Attribute, DataValue, Enrollment, EnrollmentStatus, Event, EventStatus, Geometry,
    TrackedEntity, TrackerBundle, TrackerRecord, TrackerType,
};
pub use result::Result;
