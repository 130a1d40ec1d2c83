//! Audit sinks

use crate::domain::audit::DataValueAudit;
use crate::domain::{IntakeError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Append-only destination for audit entries
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one entry
    async fn append(&self, audit: DataValueAudit) -> Result<()>;
}

/// Sink keeping entries in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    entries: Arc<Mutex<Vec<DataValueAudit>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the entries appended so far
    pub async fn entries(&self) -> Vec<DataValueAudit> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, audit: DataValueAudit) -> Result<()> {
        self.entries.lock().await.push(audit);
        Ok(())
    }
}

/// Sink appending entries to a file, one per line
///
/// Lines are JSON objects when `json_format` is set, plain text otherwise.
#[derive(Debug)]
pub struct FileAuditSink {
    path: PathBuf,
    json_format: bool,
    write_lock: Mutex<()>,
}

impl FileAuditSink {
    /// Creates the sink, creating the parent directory if needed
    pub fn new(path: impl Into<PathBuf>, json_format: bool) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                IntakeError::Audit(format!(
                    "Failed to create audit log directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(Self {
            path,
            json_format,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format_line(&self, audit: &DataValueAudit) -> Result<String> {
        if self.json_format {
            return serde_json::to_string(audit)
                .map_err(|e| IntakeError::Audit(format!("Failed to serialize audit entry: {e}")));
        }
        Ok(format!(
            "[{}] {} | event: {} | dataElement: {} | value: {} | modifiedBy: {} | providedElsewhere: {}",
            audit.created().to_rfc3339(),
            audit.audit_type(),
            audit.event(),
            audit.data_element(),
            audit.value().unwrap_or(""),
            audit.modified_by().unwrap_or(""),
            audit.provided_elsewhere()
        ))
    }
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn append(&self, audit: DataValueAudit) -> Result<()> {
        let mut line = self.format_line(&audit)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                IntakeError::Audit(format!(
                    "Failed to open audit log {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| IntakeError::Audit(format!("Failed to write audit entry: {e}")))?;
        file.flush()
            .await
            .map_err(|e| IntakeError::Audit(format!("Failed to flush audit log: {e}")))?;
        Ok(())
    }
}
