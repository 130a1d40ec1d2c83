//! Geometry check
//!
//! A record's geometry must match the feature type declared by its program
//! stage (events), program (enrollments) or tracked entity type. A declared
//! feature type of NONE accepts any geometry.

use crate::core::validation::{Checker, ErrorCode, Outcome, ValidationContext};
use crate::domain::metadata::FeatureType;
use crate::domain::records::TrackerRecord;

/// Checks geometry against the declared feature type
#[derive(Debug, Default, Clone, Copy)]
pub struct GeometryCheck;

impl GeometryCheck {
    fn declared(record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Option<(FeatureType, &'static str, String)> {
        match record {
            TrackerRecord::Event(ev) => ctx
                .event_stage(ev)
                .map(|stage| (stage.feature_type, "program stage", stage.uid.to_string())),
            TrackerRecord::Enrollment(_) => ctx
                .record_program(record)
                .map(|program| (program.feature_type, "program", program.uid.to_string())),
            TrackerRecord::TrackedEntity(te) => ctx
                .preheat
                .tracked_entity_type(&te.tracked_entity_type)
                .map(|tet| (tet.feature_type, "tracked entity type", tet.uid.to_string())),
        }
    }
}

impl Checker for GeometryCheck {
    fn name(&self) -> &'static str {
        "geometry"
    }

    fn check(&self, record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Outcome {
        let Some(geometry) = record.geometry() else {
            return Outcome::ok();
        };
        // Unresolved owners are reported by the reference checks
        let Some((feature_type, owner, owner_uid)) = Self::declared(record, ctx) else {
            return Outcome::ok();
        };
        if feature_type == FeatureType::None
            || geometry.geometry_type.eq_ignore_ascii_case(feature_type.value())
        {
            return Outcome::ok();
        }

        Outcome::error(format!(
            "Geometry ({}) does not conform to the feature type ({}) specified for the {owner}: {owner_uid}",
            geometry.geometry_type,
            feature_type.value()
        ))
        .with_reference(record.reference())
        .with_code(ErrorCode::GeometryMismatch)
    }
}
