//! Enrollment conversion

use super::{acting_user, merge_attribute_values, new_entity_uid, resolve_stored_by, TrackerConverter};
use crate::core::preheat::PreheatContext;
use crate::domain::entities::StoredEnrollment;
use crate::domain::ids::Uid;
use crate::domain::records::{Attribute, Enrollment, EnrollmentStatus};
use chrono::Utc;

/// Converts between [`Enrollment`] and [`StoredEnrollment`]
#[derive(Debug, Default, Clone, Copy)]
pub struct EnrollmentConverter;

impl TrackerConverter<Enrollment, StoredEnrollment> for EnrollmentConverter {
    fn to(&self, internal: &StoredEnrollment) -> Enrollment {
        Enrollment {
            enrollment: Some(internal.uid.to_string()),
            tracked_entity: internal.tracked_entity.to_string(),
            program: internal.program.to_string(),
            org_unit: internal.organisation_unit.to_string(),
            status: internal.status,
            enrolled_at: internal.enrollment_date,
            occurred_at: internal.incident_date,
            follow_up: internal.follow_up,
            stored_by: Some(internal.stored_by.clone()),
            geometry: internal.geometry.clone(),
            attributes: internal
                .attribute_values
                .iter()
                .map(|v| Attribute {
                    attribute: v.attribute.to_string(),
                    value: Some(v.value.clone()),
                    stored_by: Some(v.stored_by.clone()),
                })
                .collect(),
        }
    }

    fn from(&self, preheat: &PreheatContext, external: &Enrollment) -> Option<StoredEnrollment> {
        let existing = external
            .enrollment
            .as_deref()
            .and_then(|uid| preheat.existing_enrollment(uid));
        self.from_existing(preheat, existing, external)
    }

    fn from_existing(
        &self,
        preheat: &PreheatContext,
        existing: Option<&StoredEnrollment>,
        external: &Enrollment,
    ) -> Option<StoredEnrollment> {
        let scheme = preheat.import_options().id_schemes.program_id_scheme();
        let program = preheat.program(scheme, &external.program)?.uid.clone();
        let org_unit = preheat.organisation_unit(&external.org_unit)?.uid.clone();
        let tracked_entity = Uid::new(external.tracked_entity.as_str()).ok()?;

        let now = Utc::now();
        let stored_by = resolve_stored_by(preheat, external.stored_by.as_deref());
        let user = acting_user(preheat);

        let mut enrollment = match existing {
            Some(existing) => {
                let mut enrollment = existing.clone();
                enrollment.last_updated = now;
                enrollment.last_updated_by = user;
                enrollment
            }
            None => StoredEnrollment {
                uid: new_entity_uid(preheat, external.enrollment.as_deref()),
                tracked_entity: tracked_entity.clone(),
                program: program.clone(),
                organisation_unit: org_unit.clone(),
                status: external.status,
                enrollment_date: None,
                incident_date: None,
                follow_up: false,
                geometry: None,
                stored_by: stored_by.clone(),
                created: now,
                last_updated: now,
                created_by: user.clone(),
                last_updated_by: user,
                completed_by: None,
                completed_date: None,
                deleted: false,
                attribute_values: Vec::new(),
            },
        };

        enrollment.tracked_entity = tracked_entity;
        enrollment.program = program;
        enrollment.organisation_unit = org_unit;
        enrollment.enrollment_date = external.enrolled_at.or(enrollment.enrollment_date).or(Some(now));
        enrollment.incident_date = external
            .occurred_at
            .or(enrollment.incident_date)
            .or(enrollment.enrollment_date);
        enrollment.follow_up = external.follow_up;
        enrollment.geometry = external.geometry.clone();
        enrollment.stored_by = stored_by;

        if external.status == EnrollmentStatus::Completed {
            if enrollment.status != EnrollmentStatus::Completed || enrollment.completed_date.is_none() {
                enrollment.completed_by = Some(
                    preheat
                        .import_options()
                        .username()
                        .unwrap_or(&enrollment.stored_by)
                        .to_string(),
                );
                enrollment.completed_date = Some(now);
            }
        } else {
            enrollment.completed_by = None;
            enrollment.completed_date = None;
        }
        enrollment.status = external.status;

        let stored_values = std::mem::take(&mut enrollment.attribute_values);
        enrollment.attribute_values = merge_attribute_values(
            preheat,
            stored_values,
            &external.attributes,
            &enrollment.stored_by,
            now,
        );
        Some(enrollment)
    }
}
