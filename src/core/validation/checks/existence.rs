//! Existence check
//!
//! Inserts need a fresh, well-formed uid; updates need an existing record of
//! the same tracker type.

use crate::core::validation::{Checker, ErrorCode, ImportStage, Outcome, ValidationContext};
use crate::domain::ids::{IdScheme, Uid};
use crate::domain::records::{TrackerRecord, TrackerType};

/// Checks the record uid against the stage it is imported under
#[derive(Debug, Default, Clone, Copy)]
pub struct ExistenceCheck;

impl Checker for ExistenceCheck {
    fn name(&self) -> &'static str {
        "existence"
    }

    fn check(&self, record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Outcome {
        let tracker_type = record.tracker_type();
        match (ctx.stage, record.uid()) {
            (ImportStage::Insert, None) => Outcome::ok(),
            (ImportStage::Insert, Some(uid)) => {
                let uid_scheme = ctx.preheat.import_options().id_schemes.id_scheme == IdScheme::Uid;
                if uid_scheme && !Uid::is_valid_format(uid) {
                    return Outcome::error(format!("Invalid {tracker_type} uid: {uid}"))
                        .with_reference(uid)
                        .with_code(ErrorCode::InvalidUid);
                }
                match ctx.preheat.existing_by_uid(uid) {
                    Some(existing) if existing.tracker_type() != tracker_type => {
                        Self::claimed_by_other_type(uid, tracker_type, existing.tracker_type())
                    }
                    Some(_) => Outcome::error(format!("{tracker_type} ({uid}) already exists"))
                        .with_reference(uid)
                        .with_code(ErrorCode::AlreadyExists),
                    None => Outcome::ok(),
                }
            }
            (ImportStage::Update, None) => {
                Outcome::error(format!("{tracker_type} uid is required for updates"))
                    .with_reference(record.reference())
                    .with_code(ErrorCode::NotFound)
            }
            (ImportStage::Update, Some(uid)) => match ctx.preheat.existing_by_uid(uid) {
                Some(existing) if existing.tracker_type() != tracker_type => {
                    Self::claimed_by_other_type(uid, tracker_type, existing.tracker_type())
                }
                Some(existing) if existing.is_deleted() => {
                    Outcome::error(format!("{tracker_type} ({uid}) has been deleted"))
                        .with_reference(uid)
                        .with_code(ErrorCode::NotFound)
                }
                Some(_) => Outcome::ok(),
                None => Outcome::error(format!("{tracker_type} ({uid}) does not exist"))
                    .with_reference(uid)
                    .with_code(ErrorCode::NotFound),
            },
            (ImportStage::Delete, _) => Outcome::ok(),
        }
    }
}

impl ExistenceCheck {
    /// Uids are unique across tracker types
    fn claimed_by_other_type(uid: &str, tracker_type: TrackerType, owner: TrackerType) -> Outcome {
        Outcome::error(format!(
            "{tracker_type} ({uid}) conflicts with an existing record of type {owner}"
        ))
        .with_reference(uid)
        .with_code(ErrorCode::AlreadyExists)
    }
}
