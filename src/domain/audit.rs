//! Data value audit model
//!
//! An audit entry is an immutable snapshot of one data value mutation.

use super::entities::EventDataValue;
use super::ids::Uid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of data value mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditType {
    Create,
    Update,
    Delete,
}

impl fmt::Display for AuditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        };
        write!(f, "{name}")
    }
}

/// Immutable audit entry for a tracked entity data value
///
/// `created` is the time the audit was written, independent of when the
/// mutation itself was stamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValueAudit {
    data_element: Uid,
    event: Uid,
    value: Option<String>,
    modified_by: Option<String>,
    provided_elsewhere: bool,
    audit_type: AuditType,
    created: DateTime<Utc>,
}

impl DataValueAudit {
    /// Snapshots a data value for the given event
    pub fn new(data_element: Uid, event: Uid, data_value: &EventDataValue, audit_type: AuditType) -> Self {
        Self {
            data_element,
            event,
            value: data_value.value.clone(),
            modified_by: data_value.stored_by.clone(),
            provided_elsewhere: data_value.provided_elsewhere,
            audit_type,
            created: Utc::now(),
        }
    }

    pub fn data_element(&self) -> &Uid {
        &self.data_element
    }

    pub fn event(&self) -> &Uid {
        &self.event
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn modified_by(&self) -> Option<&str> {
        self.modified_by.as_deref()
    }

    pub fn provided_elsewhere(&self) -> bool {
        self.provided_elsewhere
    }

    pub fn audit_type(&self) -> AuditType {
        self.audit_type
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

impl fmt::Display for DataValueAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[dataElement: '{}', event: '{}', value: '{}']",
            self.data_element,
            self.event,
            self.value.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_audit_snapshot() {
        let mut value = EventDataValue::new(Uid::new("deA").unwrap(), "42", "alice");
        value.provided_elsewhere = true;
        value.last_updated = Utc::now() - Duration::days(3);

        let audit = DataValueAudit::new(
            Uid::new("deA").unwrap(),
            Uid::new("evA").unwrap(),
            &value,
            AuditType::Update,
        );

        assert_eq!(audit.value(), Some("42"));
        assert_eq!(audit.modified_by(), Some("alice"));
        assert!(audit.provided_elsewhere());
        assert_eq!(audit.audit_type(), AuditType::Update);
        assert!(audit.created() > value.last_updated);
    }

    #[test]
    fn test_audit_display() {
        let value = EventDataValue::new(Uid::new("deA").unwrap(), "7", "bob");
        let audit = DataValueAudit::new(
            Uid::new("deA").unwrap(),
            Uid::new("evA").unwrap(),
            &value,
            AuditType::Create,
        );
        assert_eq!(
            audit.to_string(),
            "[dataElement: 'deA', event: 'evA', value: '7']"
        );
    }

    #[test]
    fn test_audit_type_serialization() {
        let json = serde_json::to_string(&AuditType::Delete).unwrap();
        assert_eq!(json, "\"DELETE\"");
    }
}
