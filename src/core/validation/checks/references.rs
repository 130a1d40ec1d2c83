//! Metadata reference checks
//!
//! Every metadata reference on a record must resolve in the preheat context
//! under the import's identifier schemes.

use crate::core::validation::{Checker, ErrorCode, Outcome, ValidationContext};
use crate::domain::records::TrackerRecord;

/// Event program stage must resolve
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgramStageCheck;

impl Checker for ProgramStageCheck {
    fn name(&self) -> &'static str {
        "program_stage"
    }

    fn check(&self, record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Outcome {
        let TrackerRecord::Event(event) = record else {
            return Outcome::ok();
        };
        if ctx.event_stage(event).is_some() {
            return Outcome::ok();
        }
        Outcome::error(format!(
            "Event.programStage does not point to a valid programStage: {}",
            event.program_stage
        ))
        .with_reference(record.reference())
        .with_code(ErrorCode::ProgramStageNotFound)
    }
}

/// Program references must resolve, and an event's stage must belong to it
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgramCheck;

impl Checker for ProgramCheck {
    fn name(&self) -> &'static str {
        "program"
    }

    fn check(&self, record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Outcome {
        let scheme = ctx.preheat.import_options().id_schemes.program_id_scheme();
        match record {
            TrackerRecord::TrackedEntity(_) => Outcome::ok(),
            TrackerRecord::Enrollment(en) => {
                if ctx.preheat.program(scheme, &en.program).is_some() {
                    Outcome::ok()
                } else {
                    Outcome::error(format!(
                        "Enrollment.program does not point to a valid program: {}",
                        en.program
                    ))
                    .with_reference(record.reference())
                    .with_code(ErrorCode::ProgramNotFound)
                }
            }
            TrackerRecord::Event(ev) => {
                let Some(key) = ev.program.as_deref() else {
                    return Outcome::ok();
                };
                let Some(program) = ctx.preheat.program(scheme, key) else {
                    return Outcome::error(format!(
                        "Event.program does not point to a valid program: {key}"
                    ))
                    .with_reference(record.reference())
                    .with_code(ErrorCode::ProgramNotFound);
                };
                match ctx.event_stage(ev) {
                    Some(stage) if stage.program != program.uid => Outcome::error(format!(
                        "Program stage {} does not belong to program {}",
                        stage.uid, program.uid
                    ))
                    .with_reference(record.reference())
                    .with_code(ErrorCode::ProgramStageNotInProgram),
                    _ => Outcome::ok(),
                }
            }
        }
    }
}

/// Organisation unit must resolve
#[derive(Debug, Default, Clone, Copy)]
pub struct OrgUnitCheck;

impl Checker for OrgUnitCheck {
    fn name(&self) -> &'static str {
        "org_unit"
    }

    fn check(&self, record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Outcome {
        if ctx.record_org_unit(record).is_some() {
            return Outcome::ok();
        }
        Outcome::error(format!(
            "{}.orgUnit does not point to a valid organisation unit: {}",
            record.tracker_type(),
            record.org_unit()
        ))
        .with_reference(record.reference())
        .with_code(ErrorCode::OrgUnitNotFound)
    }
}

/// Tracked entity type must resolve
#[derive(Debug, Default, Clone, Copy)]
pub struct TrackedEntityTypeCheck;

impl Checker for TrackedEntityTypeCheck {
    fn name(&self) -> &'static str {
        "tracked_entity_type"
    }

    fn check(&self, record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Outcome {
        let TrackerRecord::TrackedEntity(te) = record else {
            return Outcome::ok();
        };
        if ctx.preheat.tracked_entity_type(&te.tracked_entity_type).is_some() {
            return Outcome::ok();
        }
        Outcome::error(format!(
            "TrackedEntity.trackedEntityType does not point to a valid trackedEntityType: {}",
            te.tracked_entity_type
        ))
        .with_reference(record.reference())
        .with_code(ErrorCode::TrackedEntityTypeNotFound)
    }
}
