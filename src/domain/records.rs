//! Import records
//!
//! External representation of tracked entities, enrollments and events as
//! submitted by clients, already deserialized. References to metadata are
//! plain strings because they are resolved under the import's id scheme.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// GeoJSON-like geometry attached to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Geometry type name, e.g. `Point` or `Polygon`
    #[serde(rename = "type")]
    pub geometry_type: String,

    /// Raw coordinates
    #[serde(default)]
    pub coordinates: serde_json::Value,
}

impl Geometry {
    pub fn new(geometry_type: impl Into<String>, coordinates: serde_json::Value) -> Self {
        Self {
            geometry_type: geometry_type.into(),
            coordinates,
        }
    }

    /// A point at the given longitude and latitude
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self::new("Point", serde_json::json!([longitude, latitude]))
    }
}

/// Event status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    #[default]
    Active,
    Completed,
    Visited,
    Schedule,
    Overdue,
    Skipped,
}

/// Enrollment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

/// Kind of tracker object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackerType {
    TrackedEntity,
    Enrollment,
    Event,
}

impl TrackerType {
    /// Human readable name used in report messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::TrackedEntity => "TrackedEntity",
            Self::Enrollment => "Enrollment",
            Self::Event => "Event",
        }
    }
}

impl fmt::Display for TrackerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Value captured for a data element on an event
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValue {
    pub data_element: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub provided_elsewhere: bool,
    #[serde(default)]
    pub stored_by: Option<String>,
}

impl DataValue {
    pub fn new(data_element: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            data_element: data_element.into(),
            value: Some(value.into()),
            provided_elsewhere: false,
            stored_by: None,
        }
    }

    /// Value with surrounding whitespace removed, `None` when blank
    pub fn non_blank_value(&self) -> Option<&str> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Value of a tracked entity attribute
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub attribute: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub stored_by: Option<String>,
}

impl Attribute {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: Some(value.into()),
            stored_by: None,
        }
    }

    pub fn non_blank_value(&self) -> Option<&str> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Tracked entity as submitted
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    #[serde(default)]
    pub tracked_entity: Option<String>,
    pub tracked_entity_type: String,
    pub org_unit: String,
    #[serde(default)]
    pub inactive: bool,
    #[serde(default)]
    pub potential_duplicate: bool,
    #[serde(default)]
    pub stored_by: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub created_at_client: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at_client: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Enrollment as submitted
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[serde(default)]
    pub enrollment: Option<String>,
    pub tracked_entity: String,
    pub program: String,
    pub org_unit: String,
    #[serde(default)]
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub enrolled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub follow_up: bool,
    #[serde(default)]
    pub stored_by: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Event as submitted
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    pub program_stage: String,
    #[serde(default)]
    pub enrollment: Option<String>,
    pub org_unit: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stored_by: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub data_values: Vec<DataValue>,
}

impl Event {
    /// Creates an event in the given stage and org unit
    pub fn new(program_stage: impl Into<String>, org_unit: impl Into<String>) -> Self {
        Self {
            program_stage: program_stage.into(),
            org_unit: org_unit.into(),
            ..Self::default()
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.event = Some(uid.into());
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_data_value(mut self, data_value: DataValue) -> Self {
        self.data_values.push(data_value);
        self
    }
}

/// One record of any tracker type
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerRecord {
    TrackedEntity(TrackedEntity),
    Enrollment(Enrollment),
    Event(Event),
}

impl TrackerRecord {
    /// Client supplied identifier, if any
    pub fn uid(&self) -> Option<&str> {
        match self {
            Self::TrackedEntity(te) => te.tracked_entity.as_deref(),
            Self::Enrollment(en) => en.enrollment.as_deref(),
            Self::Event(ev) => ev.event.as_deref(),
        }
    }

    pub fn tracker_type(&self) -> TrackerType {
        match self {
            Self::TrackedEntity(_) => TrackerType::TrackedEntity,
            Self::Enrollment(_) => TrackerType::Enrollment,
            Self::Event(_) => TrackerType::Event,
        }
    }

    pub fn org_unit(&self) -> &str {
        match self {
            Self::TrackedEntity(te) => &te.org_unit,
            Self::Enrollment(en) => &en.org_unit,
            Self::Event(ev) => &ev.org_unit,
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match self {
            Self::TrackedEntity(te) => te.geometry.as_ref(),
            Self::Enrollment(en) => en.geometry.as_ref(),
            Self::Event(ev) => ev.geometry.as_ref(),
        }
    }

    pub fn stored_by(&self) -> Option<&str> {
        match self {
            Self::TrackedEntity(te) => te.stored_by.as_deref(),
            Self::Enrollment(en) => en.stored_by.as_deref(),
            Self::Event(ev) => ev.stored_by.as_deref(),
        }
    }

    /// Reference used in reports: the uid or a placeholder for new records
    pub fn reference(&self) -> String {
        self.uid()
            .map(str::to_string)
            .unwrap_or_else(|| format!("<new {}>", self.tracker_type()))
    }
}

impl From<TrackedEntity> for TrackerRecord {
    fn from(value: TrackedEntity) -> Self {
        Self::TrackedEntity(value)
    }
}

impl From<Enrollment> for TrackerRecord {
    fn from(value: Enrollment) -> Self {
        Self::Enrollment(value)
    }
}

impl From<Event> for TrackerRecord {
    fn from(value: Event) -> Self {
        Self::Event(value)
    }
}

/// Records submitted together in one import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerBundle {
    #[serde(default)]
    pub tracked_entities: Vec<TrackedEntity>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl TrackerBundle {
    /// Bundle containing only events
    pub fn of_events(events: Vec<Event>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.tracked_entities.len() + self.enrollments.len() + self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records of one tracker type, in submission order
    pub fn records(&self, tracker_type: TrackerType) -> Vec<TrackerRecord> {
        match tracker_type {
            TrackerType::TrackedEntity => self
                .tracked_entities
                .iter()
                .cloned()
                .map(TrackerRecord::from)
                .collect(),
            TrackerType::Enrollment => self
                .enrollments
                .iter()
                .cloned()
                .map(TrackerRecord::from)
                .collect(),
            TrackerType::Event => self
                .events
                .iter()
                .cloned()
                .map(TrackerRecord::from)
                .collect(),
        }
    }

    /// Every client supplied record identifier in the bundle
    pub fn uids(&self) -> Vec<&str> {
        self.tracked_entities
            .iter()
            .filter_map(|te| te.tracked_entity.as_deref())
            .chain(
                self.enrollments
                    .iter()
                    .filter_map(|en| en.enrollment.as_deref()),
            )
            .chain(self.events.iter().filter_map(|ev| ev.event.as_deref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserialization() {
        let json = r#"{
            "event": "a1234567890123456789bc",
            "programStage": "stageA",
            "orgUnit": "ouA",
            "status": "COMPLETED",
            "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
            "dataValues": [{"dataElement": "deA", "value": "12"}]
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.status, EventStatus::Completed);
        assert_eq!(event.geometry.unwrap().geometry_type, "Point");
        assert_eq!(event.data_values[0].value.as_deref(), Some("12"));
        assert!(!event.data_values[0].provided_elsewhere);
    }

    #[test]
    fn test_non_blank_value() {
        let mut dv = DataValue::new("deA", "  ");
        assert_eq!(dv.non_blank_value(), None);
        dv.value = Some(" 5 ".to_string());
        assert_eq!(dv.non_blank_value(), Some("5"));
    }

    #[test]
    fn test_tracker_record_reference() {
        let record = TrackerRecord::from(Event::new("stageA", "ouA"));
        assert_eq!(record.reference(), "<new Event>");
        assert_eq!(record.tracker_type(), TrackerType::Event);

        let record = TrackerRecord::from(Event::new("stageA", "ouA").with_uid("evA"));
        assert_eq!(record.reference(), "evA");
    }

    #[test]
    fn test_bundle_records_and_uids() {
        let bundle = TrackerBundle::of_events(vec![
            Event::new("stageA", "ouA").with_uid("ev1"),
            Event::new("stageA", "ouA"),
        ]);
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.records(TrackerType::Event).len(), 2);
        assert!(bundle.records(TrackerType::Enrollment).is_empty());
        assert_eq!(bundle.uids(), vec!["ev1"]);
    }
}
