//! Persisted tracker entities
//!
//! Internal representation produced by the converters and handed to the
//! storage collaborator. Metadata references are resolved uids.

use super::ids::Uid;
use super::metadata::User;
use super::records::{EnrollmentStatus, EventStatus, Geometry, TrackerType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Username recorded when no acting user is known
pub const FALLBACK_USERNAME: &str = "[Unknown]";

/// Snapshot of the user who created or modified an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoSnapshot {
    pub uid: Uid,
    pub username: String,
}

impl UserInfoSnapshot {
    pub fn from_user(user: &User) -> Self {
        Self {
            uid: user.uid.clone(),
            username: user.username.clone(),
        }
    }
}

/// Attribute value stored on a tracked entity or enrollment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntityAttributeValue {
    pub attribute: Uid,
    pub value: String,
    pub stored_by: String,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Data value stored on an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDataValue {
    pub data_element: Uid,
    pub value: Option<String>,
    pub provided_elsewhere: bool,
    pub stored_by: Option<String>,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl EventDataValue {
    pub fn new(data_element: Uid, value: impl Into<String>, stored_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            data_element,
            value: Some(value.into()),
            provided_elsewhere: false,
            stored_by: Some(stored_by.into()),
            created: now,
            last_updated: now,
        }
    }
}

/// Persisted tracked entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTrackedEntity {
    pub uid: Uid,
    pub tracked_entity_type: Uid,
    pub organisation_unit: Uid,
    pub inactive: bool,
    pub potential_duplicate: bool,
    pub geometry: Option<Geometry>,
    pub stored_by: String,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub created_at_client: Option<DateTime<Utc>>,
    pub last_updated_at_client: Option<DateTime<Utc>>,
    pub created_by: Option<UserInfoSnapshot>,
    pub last_updated_by: Option<UserInfoSnapshot>,
    pub deleted: bool,
    pub attribute_values: Vec<TrackedEntityAttributeValue>,
}

/// Persisted enrollment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEnrollment {
    pub uid: Uid,
    pub tracked_entity: Uid,
    pub program: Uid,
    pub organisation_unit: Uid,
    pub status: EnrollmentStatus,
    pub enrollment_date: Option<DateTime<Utc>>,
    pub incident_date: Option<DateTime<Utc>>,
    pub follow_up: bool,
    pub geometry: Option<Geometry>,
    pub stored_by: String,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub created_by: Option<UserInfoSnapshot>,
    pub last_updated_by: Option<UserInfoSnapshot>,
    pub completed_by: Option<String>,
    pub completed_date: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub attribute_values: Vec<TrackedEntityAttributeValue>,
}

/// Persisted event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub uid: Uid,
    pub program: Option<Uid>,
    pub program_stage: Uid,
    pub enrollment: Option<Uid>,
    pub organisation_unit: Uid,
    pub status: EventStatus,
    pub execution_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub geometry: Option<Geometry>,
    pub stored_by: String,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub created_by: Option<UserInfoSnapshot>,
    pub last_updated_by: Option<UserInfoSnapshot>,
    pub completed_by: Option<String>,
    pub completed_date: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub data_values: Vec<EventDataValue>,
}

impl StoredEvent {
    /// Data value stored for the given data element
    pub fn data_value(&self, data_element: &str) -> Option<&EventDataValue> {
        self.data_values
            .iter()
            .find(|dv| dv.data_element.as_str() == data_element)
    }
}

/// Any persisted tracker entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StoredEntity {
    TrackedEntity(StoredTrackedEntity),
    Enrollment(StoredEnrollment),
    Event(StoredEvent),
}

impl StoredEntity {
    pub fn uid(&self) -> &Uid {
        match self {
            Self::TrackedEntity(te) => &te.uid,
            Self::Enrollment(en) => &en.uid,
            Self::Event(ev) => &ev.uid,
        }
    }

    pub fn tracker_type(&self) -> TrackerType {
        match self {
            Self::TrackedEntity(_) => TrackerType::TrackedEntity,
            Self::Enrollment(_) => TrackerType::Enrollment,
            Self::Event(_) => TrackerType::Event,
        }
    }

    pub fn organisation_unit(&self) -> &Uid {
        match self {
            Self::TrackedEntity(te) => &te.organisation_unit,
            Self::Enrollment(en) => &en.organisation_unit,
            Self::Event(ev) => &ev.organisation_unit,
        }
    }

    pub fn is_deleted(&self) -> bool {
        match self {
            Self::TrackedEntity(te) => te.deleted,
            Self::Enrollment(en) => en.deleted,
            Self::Event(ev) => ev.deleted,
        }
    }

    /// Marks the entity as soft-deleted
    pub fn mark_deleted(&mut self) {
        match self {
            Self::TrackedEntity(te) => te.deleted = true,
            Self::Enrollment(en) => en.deleted = true,
            Self::Event(ev) => ev.deleted = true,
        }
    }

    pub fn as_event(&self) -> Option<&StoredEvent> {
        match self {
            Self::Event(ev) => Some(ev),
            _ => None,
        }
    }

    pub fn as_enrollment(&self) -> Option<&StoredEnrollment> {
        match self {
            Self::Enrollment(en) => Some(en),
            _ => None,
        }
    }

    pub fn as_tracked_entity(&self) -> Option<&StoredTrackedEntity> {
        match self {
            Self::TrackedEntity(te) => Some(te),
            _ => None,
        }
    }
}

impl From<StoredTrackedEntity> for StoredEntity {
    fn from(value: StoredTrackedEntity) -> Self {
        Self::TrackedEntity(value)
    }
}

impl From<StoredEnrollment> for StoredEntity {
    fn from(value: StoredEnrollment) -> Self {
        Self::Enrollment(value)
    }
}

impl From<StoredEvent> for StoredEntity {
    fn from(value: StoredEvent) -> Self {
        Self::Event(value)
    }
}
