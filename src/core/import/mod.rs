//! Bundle import
//!
//! [`TrackerImporter`] drives one bundle through preheat, validation,
//! conversion, persistence and auditing, and returns an [`ImportReport`].

pub mod importer;
pub mod report;

pub use importer::TrackerImporter;
pub use report::{Diagnostic, ImportReport, ImportStatus, Stats, TypeReport};
