//! Event conversion

use super::{acting_user, new_entity_uid, resolve_stored_by, resolve_stored_by_or, TrackerConverter};
use crate::core::preheat::PreheatContext;
use crate::domain::entities::{EventDataValue, StoredEvent};
use crate::domain::ids::Uid;
use crate::domain::records::{DataValue, Event, EventStatus};
use chrono::{DateTime, Utc};

/// Converts between [`Event`] and [`StoredEvent`]
#[derive(Debug, Default, Clone, Copy)]
pub struct EventConverter;

impl EventConverter {
    fn merge_data_values(
        preheat: &PreheatContext,
        mut stored: Vec<EventDataValue>,
        submitted: &[DataValue],
        event_stored_by: &str,
        now: DateTime<Utc>,
    ) -> Vec<EventDataValue> {
        for dv in submitted {
            let Some(data_element) = preheat.data_element(&dv.data_element) else {
                continue;
            };
            let position = stored
                .iter()
                .position(|v| v.data_element == data_element.uid);
            let Some(value) = dv.non_blank_value() else {
                if let Some(position) = position {
                    stored.remove(position);
                }
                continue;
            };
            let stored_by = resolve_stored_by_or(dv.stored_by.as_deref(), event_stored_by);

            match position {
                Some(position) => {
                    let current = &mut stored[position];
                    if current.value.as_deref() != Some(value)
                        || current.provided_elsewhere != dv.provided_elsewhere
                    {
                        current.value = Some(value.to_string());
                        current.provided_elsewhere = dv.provided_elsewhere;
                        current.stored_by = Some(stored_by);
                        current.last_updated = now;
                    }
                }
                None => stored.push(EventDataValue {
                    data_element: data_element.uid.clone(),
                    value: Some(value.to_string()),
                    provided_elsewhere: dv.provided_elsewhere,
                    stored_by: Some(stored_by),
                    created: now,
                    last_updated: now,
                }),
            }
        }
        stored
    }
}

impl TrackerConverter<Event, StoredEvent> for EventConverter {
    fn to(&self, internal: &StoredEvent) -> Event {
        Event {
            event: Some(internal.uid.to_string()),
            program: internal.program.as_ref().map(Uid::to_string),
            program_stage: internal.program_stage.to_string(),
            enrollment: internal.enrollment.as_ref().map(Uid::to_string),
            org_unit: internal.organisation_unit.to_string(),
            status: internal.status,
            occurred_at: internal.execution_date,
            scheduled_at: internal.due_date,
            stored_by: Some(internal.stored_by.clone()),
            geometry: internal.geometry.clone(),
            data_values: internal
                .data_values
                .iter()
                .map(|dv| DataValue {
                    data_element: dv.data_element.to_string(),
                    value: dv.value.clone(),
                    provided_elsewhere: dv.provided_elsewhere,
                    stored_by: dv.stored_by.clone(),
                })
                .collect(),
        }
    }

    fn from(&self, preheat: &PreheatContext, external: &Event) -> Option<StoredEvent> {
        let existing = external
            .event
            .as_deref()
            .and_then(|uid| preheat.existing_event(uid));
        self.from_existing(preheat, existing, external)
    }

    fn from_existing(
        &self,
        preheat: &PreheatContext,
        existing: Option<&StoredEvent>,
        external: &Event,
    ) -> Option<StoredEvent> {
        let schemes = &preheat.import_options().id_schemes;
        let stage = preheat.program_stage(schemes.program_stage_id_scheme(), &external.program_stage)?;
        let program = preheat
            .event_program(external.program.as_deref(), stage)
            .map(|p| p.uid.clone());
        let org_unit = preheat.organisation_unit(&external.org_unit)?.uid.clone();
        let enrollment = external
            .enrollment
            .as_deref()
            .and_then(|uid| Uid::new(uid).ok());

        let now = Utc::now();
        let stored_by = resolve_stored_by(preheat, external.stored_by.as_deref());
        let user = acting_user(preheat);

        let mut event = match existing {
            Some(existing) => {
                let mut event = existing.clone();
                event.last_updated = now;
                event.last_updated_by = user;
                event
            }
            None => StoredEvent {
                uid: new_entity_uid(preheat, external.event.as_deref()),
                program: None,
                program_stage: stage.uid.clone(),
                enrollment: None,
                organisation_unit: org_unit.clone(),
                status: external.status,
                execution_date: None,
                due_date: None,
                geometry: None,
                stored_by: stored_by.clone(),
                created: now,
                last_updated: now,
                created_by: user.clone(),
                last_updated_by: user,
                completed_by: None,
                completed_date: None,
                deleted: false,
                data_values: Vec::new(),
            },
        };

        event.program = program;
        event.program_stage = stage.uid.clone();
        event.enrollment = enrollment;
        event.organisation_unit = org_unit;
        event.execution_date = external.occurred_at;
        event.due_date = external.scheduled_at;
        event.geometry = external.geometry.clone();
        event.stored_by = stored_by;

        if external.status == EventStatus::Completed {
            if event.status != EventStatus::Completed || event.completed_date.is_none() {
                event.completed_by = Some(
                    preheat
                        .import_options()
                        .username()
                        .unwrap_or(&event.stored_by)
                        .to_string(),
                );
                event.completed_date = Some(now);
            }
        } else {
            event.completed_by = None;
            event.completed_date = None;
        }
        event.status = external.status;

        let stored_values = std::mem::take(&mut event.data_values);
        event.data_values = Self::merge_data_values(
            preheat,
            stored_values,
            &external.data_values,
            &event.stored_by,
            now,
        );
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::checks::test_support::{fixture, fixture_for};
    use crate::domain::entities::FALLBACK_USERNAME;
    use crate::domain::records::Geometry;

    #[test]
    fn test_new_event() {
        let fixture = fixture();
        let event = Event::new("stageA", "ouA")
            .with_uid("a1234567890123456789bc")
            .with_data_value(DataValue::new("deA", "7"));

        let stored = EventConverter.from(&fixture.preheat, &event).unwrap();

        assert_eq!(stored.uid.as_str(), "a1234567890123456789bc");
        assert_eq!(stored.program.as_ref().map(Uid::as_str), Some("progA"));
        assert_eq!(stored.stored_by, "clerk");
        assert_eq!(stored.created, stored.last_updated);
        assert_eq!(stored.created_by.as_ref().unwrap().username, "clerk");
        assert_eq!(stored.data_values.len(), 1);
        assert_eq!(stored.data_values[0].stored_by.as_deref(), Some("clerk"));
    }

    #[test]
    fn test_existing_event_keeps_creation_fields() {
        let fixture = fixture();
        let before = fixture.preheat.existing_event("evActive").unwrap().clone();
        let event = Event::new("stageA", "ouA")
            .with_uid("evActive")
            .with_geometry(Geometry::point(1.0, 2.0));

        let stored = EventConverter.from(&fixture.preheat, &event).unwrap();

        assert_eq!(stored.uid, before.uid);
        assert_eq!(stored.created, before.created);
        assert_eq!(stored.created_by, before.created_by);
        assert!(stored.last_updated >= before.last_updated);
        assert_eq!(stored.last_updated_by.as_ref().unwrap().username, "clerk");
        assert!(stored.geometry.is_some());
    }

    #[test]
    fn test_data_values_inherit_event_stored_by() {
        let fixture = fixture_for(None);
        let mut own = DataValue::new("deText", "note");
        own.stored_by = Some("nurse".to_string());
        let mut event = Event::new("stageA", "ouA").with_data_value(DataValue::new("deA", "1"));
        event.data_values.push(own);

        let stored = EventConverter.from(&fixture.preheat, &event).unwrap();

        assert_eq!(stored.stored_by, FALLBACK_USERNAME);
        assert_eq!(stored.data_values[0].stored_by.as_deref(), Some(FALLBACK_USERNAME));
        assert_eq!(stored.data_values[1].stored_by.as_deref(), Some("nurse"));
    }

    #[test]
    fn test_blank_value_removes_stored_value() {
        let fixture = fixture();
        let mut existing = fixture.preheat.existing_event("evActive").unwrap().clone();
        existing
            .data_values
            .push(EventDataValue::new(Uid::new("deA").unwrap(), "3", "alice"));
        let event = Event::new("stageA", "ouA")
            .with_uid("evActive")
            .with_data_value(DataValue::new("deA", ""));

        let stored = EventConverter
            .from_existing(&fixture.preheat, Some(&existing), &event)
            .unwrap();
        assert!(stored.data_value("deA").is_none());
    }

    #[test]
    fn test_completion_stamps() {
        let fixture = fixture();
        let event = Event::new("stageA", "ouA").with_status(EventStatus::Completed);
        let stored = EventConverter.from(&fixture.preheat, &event).unwrap();
        assert_eq!(stored.completed_by.as_deref(), Some("clerk"));
        assert!(stored.completed_date.is_some());
    }

    #[test]
    fn test_unresolved_stage_is_none() {
        let fixture = fixture();
        let events = vec![
            Event::new("stageMissing", "ouA"),
            Event::new("stageA", "ouA"),
        ];
        let converted = EventConverter.from_all(&fixture.preheat, &events);
        assert!(converted[0].is_none());
        assert!(converted[1].is_some());
    }

    #[test]
    fn test_to_external() {
        let fixture = fixture();
        let stored = fixture.preheat.existing_event("evCompleted").unwrap();
        let event = EventConverter.to(stored);
        assert_eq!(event.event.as_deref(), Some("evCompleted"));
        assert_eq!(event.status, EventStatus::Completed);
        assert_eq!(event.program_stage, "stageA");
    }
}
