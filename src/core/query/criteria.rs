//! Tracked entity search criteria as sent by clients

use super::params::OrganisationUnitSelectionMode;
use crate::domain::records::{EnrollmentStatus, EventStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw search criteria; nothing here has been resolved yet
///
/// `org_unit` and `tracked_entity` hold `;`-separated uids, `order` holds
/// `,`-separated `field[:direction]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackedEntityCriteria {
    pub query: Option<String>,
    pub attribute: Vec<String>,
    pub filter: Vec<String>,
    pub org_unit: Option<String>,
    pub ou_mode: Option<OrganisationUnitSelectionMode>,
    pub program: Option<String>,
    pub program_status: Option<EnrollmentStatus>,
    pub program_stage: Option<String>,
    pub follow_up: Option<bool>,
    pub last_updated_start_date: Option<DateTime<Utc>>,
    pub last_updated_end_date: Option<DateTime<Utc>>,
    pub last_updated_duration: Option<String>,
    pub program_enrollment_start_date: Option<DateTime<Utc>>,
    pub program_enrollment_end_date: Option<DateTime<Utc>>,
    /// Deprecated alias of `program_enrollment_start_date`
    pub program_start_date: Option<DateTime<Utc>>,
    /// Deprecated alias of `program_enrollment_end_date`
    pub program_end_date: Option<DateTime<Utc>>,
    pub program_incident_start_date: Option<DateTime<Utc>>,
    pub program_incident_end_date: Option<DateTime<Utc>>,
    pub tracked_entity_type: Option<String>,
    pub tracked_entity: Option<String>,
    pub event_status: Option<EventStatus>,
    pub event_start_date: Option<DateTime<Utc>>,
    pub event_end_date: Option<DateTime<Utc>>,
    pub potential_duplicate: Option<bool>,
    pub skip_meta: bool,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub total_pages: bool,
    pub skip_paging: Option<bool>,
    pub include_deleted: bool,
    pub include_all_attributes: bool,
    pub order: Option<String>,
}

impl TrackedEntityCriteria {
    /// Requested organisation unit keys
    pub fn org_units(&self) -> Vec<&str> {
        split_list(self.org_unit.as_deref())
    }

    /// Requested tracked entity uids
    pub fn tracked_entities(&self) -> Vec<&str> {
        split_list(self.tracked_entity.as_deref())
    }
}

fn split_list(value: Option<&str>) -> Vec<&str> {
    value
        .map(|v| {
            v.split(';')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
