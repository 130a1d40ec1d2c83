//! Completion status check
//!
//! Moving an event away from COMPLETED requires super-user rights or the
//! uncomplete authority.

use crate::core::validation::{Checker, ErrorCode, Outcome, ValidationContext};
use crate::domain::metadata::AUTHORITY_UNCOMPLETE_EVENT;
use crate::domain::records::{EventStatus, TrackerRecord};

/// Guards reopening completed events
#[derive(Debug, Default, Clone, Copy)]
pub struct UncompleteAuthCheck;

impl Checker for UncompleteAuthCheck {
    fn name(&self) -> &'static str {
        "uncomplete_auth"
    }

    fn check(&self, record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Outcome {
        let TrackerRecord::Event(event) = record else {
            return Outcome::ok();
        };
        let Some(existing) = event.event.as_deref().and_then(|uid| ctx.preheat.existing_event(uid))
        else {
            return Outcome::ok();
        };

        if existing.status != EventStatus::Completed || event.status == EventStatus::Completed {
            return Outcome::ok();
        }

        match ctx.preheat.user() {
            None => Outcome::ok(),
            Some(user) if user.is_authorized(AUTHORITY_UNCOMPLETE_EVENT) => Outcome::ok(),
            Some(_) => Outcome::error("User is not authorized to uncomplete events")
                .with_reference(record.reference())
                .with_code(ErrorCode::UncompleteNotAuthorized),
        }
    }
}
