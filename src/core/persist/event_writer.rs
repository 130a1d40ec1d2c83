//! Event writer
//!
//! Validates an event's (data element, data value) pairs, writes the event in
//! the caller's transaction and hands back the audit entries to record once
//! that transaction has committed.

use crate::adapters::store::StoreTransaction;
use crate::core::audit::PendingAudit;
use crate::core::preheat::PreheatContext;
use crate::core::validation::validate_value;
use crate::domain::audit::AuditType;
use crate::domain::entities::{EventDataValue, StoredEntity, StoredEvent};
use crate::domain::metadata::DataElement;
use crate::domain::{IntakeError, Result};

/// Writes events together with their data values
#[derive(Debug, Clone, Copy)]
pub struct EventWriter<'a> {
    preheat: &'a PreheatContext,
    changelog: bool,
}

impl<'a> EventWriter<'a> {
    /// `changelog` enables collecting audit entries
    pub fn new(preheat: &'a PreheatContext, changelog: bool) -> Self {
        Self { preheat, changelog }
    }

    fn removal(&self, event: &StoredEvent, data_value: &EventDataValue) -> PendingAudit {
        PendingAudit {
            data_value: data_value.clone(),
            data_element: self
                .preheat
                .data_element(data_value.data_element.as_str())
                .cloned(),
            event: event.uid.clone(),
            audit_type: AuditType::Delete,
        }
    }

    /// Inserts a new event with the given data values
    ///
    /// # Errors
    ///
    /// - [`IntakeError::ContractViolation`] if a data element does not match
    ///   the data value it is paired with
    /// - [`IntakeError::Validation`] for a missing stored-by or an invalid value
    /// - storage errors from the transaction
    pub async fn save_event_with_data_values(
        &self,
        tx: &mut dyn StoreTransaction,
        mut event: StoredEvent,
        data_values: Vec<(DataElement, EventDataValue)>,
    ) -> Result<Vec<PendingAudit>> {
        Self::validate_pairs(&data_values)?;

        let mut pending = Vec::new();
        let mut file_resources = Vec::new();
        event.data_values = Vec::with_capacity(data_values.len());
        for (data_element, data_value) in data_values {
            if data_element.is_file_type() {
                file_resources.extend(data_value.value.clone());
            }
            if self.changelog {
                pending.push(PendingAudit {
                    data_value: data_value.clone(),
                    data_element: Some(data_element),
                    event: event.uid.clone(),
                    audit_type: AuditType::Create,
                });
            }
            event.data_values.push(data_value);
        }

        tx.save(StoredEntity::Event(event)).await?;
        for file_resource in &file_resources {
            tx.assign_file_resource(file_resource).await?;
        }
        Ok(pending)
    }

    /// Replaces an existing event and its data values
    ///
    /// Values are compared with `previous` to decide between CREATE, UPDATE
    /// and DELETE audits. Only new or changed file values are assigned.
    pub async fn update_event_with_data_values(
        &self,
        tx: &mut dyn StoreTransaction,
        mut event: StoredEvent,
        data_values: Vec<(DataElement, EventDataValue)>,
        previous: Option<&StoredEvent>,
    ) -> Result<Vec<PendingAudit>> {
        Self::validate_pairs(&data_values)?;

        let mut pending = Vec::new();
        let mut file_resources = Vec::new();
        event.data_values = Vec::with_capacity(data_values.len());
        for (data_element, data_value) in data_values {
            let before = previous.and_then(|p| p.data_value(data_element.uid.as_str()));
            let audit_type = match before {
                None => Some(AuditType::Create),
                Some(before)
                    if before.value != data_value.value
                        || before.provided_elsewhere != data_value.provided_elsewhere =>
                {
                    Some(AuditType::Update)
                }
                Some(_) => None,
            };
            if let Some(audit_type) = audit_type {
                if data_element.is_file_type() {
                    file_resources.extend(data_value.value.clone());
                }
                if self.changelog {
                    pending.push(PendingAudit {
                        data_value: data_value.clone(),
                        data_element: Some(data_element),
                        event: event.uid.clone(),
                        audit_type,
                    });
                }
            }
            event.data_values.push(data_value);
        }

        if let Some(previous) = previous.filter(|_| self.changelog) {
            for removed in previous
                .data_values
                .iter()
                .filter(|dv| event.data_value(dv.data_element.as_str()).is_none())
            {
                pending.push(self.removal(&event, removed));
            }
        }

        tx.update(StoredEntity::Event(event)).await?;
        for file_resource in &file_resources {
            tx.assign_file_resource(file_resource).await?;
        }
        Ok(pending)
    }

    /// Soft-deletes an event; every stored value gets a DELETE audit
    pub async fn delete_event(
        &self,
        tx: &mut dyn StoreTransaction,
        existing: &StoredEvent,
    ) -> Result<Vec<PendingAudit>> {
        tx.delete(&existing.uid).await?;
        if !self.changelog {
            return Ok(Vec::new());
        }
        Ok(existing
            .data_values
            .iter()
            .map(|dv| self.removal(existing, dv))
            .collect())
    }

    fn validate_pairs(data_values: &[(DataElement, EventDataValue)]) -> Result<()> {
        for (data_element, data_value) in data_values {
            if data_value
                .stored_by
                .as_deref()
                .map_or(true, |s| s.trim().is_empty())
            {
                return Err(IntakeError::Validation(
                    "Stored by is null or empty".to_string(),
                ));
            }
            if data_element.uid != data_value.data_element {
                return Err(IntakeError::ContractViolation(format!(
                    "DataElement {} assigned to EventDataValues does not match with one EventDataValue: {}",
                    data_element.uid, data_value.data_element
                )));
            }
            let Some(value) = data_value.value.as_deref() else {
                return Err(IntakeError::Validation(format!(
                    "Data value for {} is null",
                    data_element.uid
                )));
            };
            if let Err(reason) = validate_value(data_element.value_type, value) {
                return Err(IntakeError::Validation(format!(
                    "Value is not valid:  {reason}"
                )));
            }
        }
        Ok(())
    }
}
