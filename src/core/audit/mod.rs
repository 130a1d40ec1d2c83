//! Data value auditing
//!
//! The [`AuditRecorder`] turns committed data value mutations into
//! [`DataValueAudit`](crate::domain::audit::DataValueAudit) entries and appends
//! them to an [`AuditSink`].

pub mod recorder;
pub mod sink;

pub use recorder::{AuditRecorder, PendingAudit};
pub use sink::{AuditSink, FileAuditSink, MemoryAuditSink};
