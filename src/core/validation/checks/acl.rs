//! Access control checks

use crate::core::validation::{Checker, ErrorCode, Outcome, ValidationContext};
use crate::domain::records::TrackerRecord;

/// Rejects deletes the acting user is not allowed to perform
///
/// Deleting a record that does not exist is not an access violation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeleteAclCheck;

impl Checker for DeleteAclCheck {
    fn name(&self) -> &'static str {
        "delete_acl"
    }

    fn check(&self, record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Outcome {
        let Some(existing) = record
            .uid()
            .and_then(|uid| ctx.preheat.existing_by_uid(uid))
            .filter(|existing| {
                existing.tracker_type() == record.tracker_type() && !existing.is_deleted()
            })
        else {
            return Outcome::ok();
        };

        let violations = ctx.access.can_delete(ctx.preheat.user(), existing, true);
        if violations.is_empty() {
            return Outcome::ok();
        }
        Outcome::error(violations.join("; "))
            .with_reference(record.reference())
            .with_code(ErrorCode::NoDeleteAccess)
    }
}

/// Rejects inserts and updates outside the user's write scope
#[derive(Debug, Default, Clone, Copy)]
pub struct WriteAclCheck;

impl Checker for WriteAclCheck {
    fn name(&self) -> &'static str {
        "write_acl"
    }

    fn check(&self, record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Outcome {
        let Some(org_unit) = ctx.record_org_unit(record) else {
            return Outcome::ok();
        };
        let program = ctx.record_program(record);
        if ctx.access.can_access(ctx.preheat.user(), program, org_unit) {
            return Outcome::ok();
        }

        let target = match program {
            Some(program) => format!("program {} in organisation unit {}", program.uid, org_unit.uid),
            None => format!("organisation unit {}", org_unit.uid),
        };
        Outcome::error(format!(
            "User has no write access to {} for {target}",
            record.tracker_type()
        ))
        .with_reference(record.reference())
        .with_code(ErrorCode::NoWriteAccess)
    }
}
