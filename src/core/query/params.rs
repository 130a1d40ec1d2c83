//! Resolved tracked entity query parameters

use super::filter::{QueryFilter, QueryItem};
use crate::domain::ids::Uid;
use crate::domain::records::{EnrollmentStatus, EventStatus};
use crate::domain::{IntakeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Page used when none or an invalid one is requested
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when none or an invalid one is requested
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// How the requested organisation units are expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganisationUnitSelectionMode {
    #[default]
    Selected,
    Children,
    Descendants,
    Accessible,
    Capture,
    All,
}

impl FromStr for OrganisationUnitSelectionMode {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "SELECTED" => Ok(Self::Selected),
            "CHILDREN" => Ok(Self::Children),
            "DESCENDANTS" => Ok(Self::Descendants),
            "ACCESSIBLE" => Ok(Self::Accessible),
            "CAPTURE" => Ok(Self::Capture),
            "ALL" => Ok(Self::All),
            _ => Err(IntakeError::IllegalQuery(format!(
                "Organisation unit selection mode is not valid: {s}"
            ))),
        }
    }
}

/// Sort direction of an order parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Lenient parse; anything but `desc` sorts ascending
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

/// Field and direction to order results by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderParam {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderParam {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Parses `field[:direction],field[:direction]...`
    pub fn parse_list(order: &str) -> Vec<Self> {
        order
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| match part.split_once(':') {
                Some((field, direction)) => Self::new(field, SortDirection::parse(direction)),
                None => Self::new(part, SortDirection::Asc),
            })
            .collect()
    }
}

/// Paging bounds applied by the mapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingLimits {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for PagingLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: 1000,
        }
    }
}

/// Validated parameters for a tracked entity search
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntityQueryParams {
    pub query: Option<QueryFilter>,
    pub attributes: Vec<QueryItem>,
    pub filters: Vec<QueryItem>,
    pub organisation_units: Vec<Uid>,
    pub organisation_unit_mode: OrganisationUnitSelectionMode,
    pub program: Option<Uid>,
    pub program_stage: Option<Uid>,
    pub program_status: Option<EnrollmentStatus>,
    pub follow_up: Option<bool>,
    pub last_updated_start_date: Option<DateTime<Utc>>,
    pub last_updated_end_date: Option<DateTime<Utc>>,
    pub last_updated_duration: Option<String>,
    pub program_enrollment_start_date: Option<DateTime<Utc>>,
    pub program_enrollment_end_date: Option<DateTime<Utc>>,
    pub program_incident_start_date: Option<DateTime<Utc>>,
    pub program_incident_end_date: Option<DateTime<Utc>>,
    pub tracked_entity_type: Option<Uid>,
    pub tracked_entity_uids: Vec<Uid>,
    pub event_status: Option<EventStatus>,
    pub event_start_date: Option<DateTime<Utc>>,
    pub event_end_date: Option<DateTime<Utc>>,
    pub potential_duplicate: Option<bool>,
    pub user: Option<Uid>,
    pub skip_meta: bool,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub total_pages: bool,
    pub skip_paging: bool,
    pub include_deleted: bool,
    pub include_all_attributes: bool,
    pub orders: Vec<OrderParam>,
    #[serde(skip)]
    pub default_page_size: Option<i64>,
}

impl TrackedEntityQueryParams {
    /// Requested page, or [`DEFAULT_PAGE`] unless it is at least 1
    pub fn page_with_default(&self) -> i64 {
        self.page.filter(|page| *page > 0).unwrap_or(DEFAULT_PAGE)
    }

    /// Requested page size, or the default unless it is at least 0
    pub fn page_size_with_default(&self) -> i64 {
        self.page_size
            .filter(|size| *size >= 0)
            .unwrap_or_else(|| self.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    /// Rows to skip for the requested page, saturating at `i64::MAX`
    pub fn offset(&self) -> i64 {
        (self.page_with_default() - 1).saturating_mul(self.page_size_with_default())
    }

    pub fn is_paging(&self) -> bool {
        !self.skip_paging
    }

    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    pub fn has_organisation_units(&self) -> bool {
        !self.organisation_units.is_empty()
    }
}
