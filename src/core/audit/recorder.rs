//! Audit recorder

use super::sink::AuditSink;
use crate::domain::audit::{AuditType, DataValueAudit};
use crate::domain::entities::EventDataValue;
use crate::domain::ids::Uid;
use crate::domain::metadata::DataElement;
use crate::domain::Result;
use std::sync::Arc;

/// Audit work collected while writing, performed once the write committed
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAudit {
    pub data_value: EventDataValue,
    /// `None` when the data element did not resolve; such entries are skipped
    pub data_element: Option<DataElement>,
    pub event: Uid,
    pub audit_type: AuditType,
}

/// Writes data value audits when the changelog is enabled
#[derive(Clone)]
pub struct AuditRecorder {
    enabled: bool,
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(enabled: bool, sink: Arc<dyn AuditSink>) -> Self {
        Self { enabled, sink }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records one mutation
    ///
    /// Returns `false` without touching the sink when auditing is disabled or
    /// the data element is unresolved.
    pub async fn record(
        &self,
        data_value: &EventDataValue,
        data_element: Option<&DataElement>,
        event: &Uid,
        audit_type: AuditType,
    ) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }
        let Some(data_element) = data_element else {
            tracing::debug!(
                event = %event,
                data_element = %data_value.data_element,
                "Skipping audit for unresolved data element"
            );
            return Ok(false);
        };

        let audit = DataValueAudit::new(data_element.uid.clone(), event.clone(), data_value, audit_type);
        self.sink.append(audit).await?;
        Ok(true)
    }

    /// Records every pending entry in order; returns how many were written
    pub async fn record_all(&self, pending: &[PendingAudit]) -> Result<usize> {
        let mut written = 0;
        for entry in pending {
            if self
                .record(
                    &entry.data_value,
                    entry.data_element.as_ref(),
                    &entry.event,
                    entry.audit_type,
                )
                .await?
            {
                written += 1;
            }
        }
        Ok(written)
    }
}

impl std::fmt::Debug for AuditRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditRecorder")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audit::MemoryAuditSink;
    use crate::domain::metadata::ValueType;

    fn uid(s: &str) -> Uid {
        Uid::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_disabled_recorder_is_noop() {
        let sink = MemoryAuditSink::new();
        let recorder = AuditRecorder::new(false, Arc::new(sink.clone()));
        let dv = EventDataValue::new(uid("deA"), "1", "alice");
        let de = DataElement::new(uid("deA"), ValueType::Integer);

        let written = recorder
            .record(&dv, Some(&de), &uid("evA"), AuditType::Create)
            .await
            .unwrap();

        assert!(!written);
        assert!(sink.is_empty().await);
    }

    #[tokio::test]
    async fn test_unresolved_data_element_is_noop() {
        let sink = MemoryAuditSink::new();
        let recorder = AuditRecorder::new(true, Arc::new(sink.clone()));
        let dv = EventDataValue::new(uid("deA"), "1", "alice");

        assert!(!recorder
            .record(&dv, None, &uid("evA"), AuditType::Update)
            .await
            .unwrap());
        assert!(sink.is_empty().await);
    }

    #[tokio::test]
    async fn test_record_snapshots_value() {
        let sink = MemoryAuditSink::new();
        let recorder = AuditRecorder::new(true, Arc::new(sink.clone()));
        let dv = EventDataValue::new(uid("deA"), "42", "alice");
        let de = DataElement::new(uid("deA"), ValueType::Integer);

        recorder
            .record(&dv, Some(&de), &uid("evA"), AuditType::Update)
            .await
            .unwrap();

        let entries = sink.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value(), Some("42"));
        assert_eq!(entries[0].modified_by(), Some("alice"));
        assert_eq!(entries[0].audit_type(), AuditType::Update);
    }

    #[tokio::test]
    async fn test_record_all_counts_written() {
        let sink = MemoryAuditSink::new();
        let recorder = AuditRecorder::new(true, Arc::new(sink.clone()));
        let pending = vec![
            PendingAudit {
                data_value: EventDataValue::new(uid("deA"), "1", "alice"),
                data_element: Some(DataElement::new(uid("deA"), ValueType::Integer)),
                event: uid("evA"),
                audit_type: AuditType::Create,
            },
            PendingAudit {
                data_value: EventDataValue::new(uid("deB"), "2", "alice"),
                data_element: None,
                event: uid("evA"),
                audit_type: AuditType::Create,
            },
        ];

        assert_eq!(recorder.record_all(&pending).await.unwrap(), 1);
        assert_eq!(sink.len().await, 1);
    }
}
