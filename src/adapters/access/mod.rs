//! Access control collaborator
//!
//! Checkers and the query mapper ask a [`TrackerAccessManager`] whether the
//! acting user may write, delete or search. [`DefaultAccessManager`] answers
//! from organisation unit paths and program sharing.

use crate::domain::entities::StoredEntity;
use crate::domain::metadata::{MetadataCatalog, OrganisationUnit, Program, User};
use std::sync::Arc;

/// Capability checks for the acting user
///
/// A `None` user is the system user and is allowed everything.
pub trait TrackerAccessManager: Send + Sync {
    /// Whether the user may write data for the program in the org unit
    fn can_access(
        &self,
        user: Option<&User>,
        program: Option<&Program>,
        org_unit: &OrganisationUnit,
    ) -> bool;

    /// Violations preventing the user from deleting the entity
    ///
    /// An empty list means the delete is allowed.
    fn can_delete(
        &self,
        user: Option<&User>,
        entity: &StoredEntity,
        allow_already_deleted: bool,
    ) -> Vec<String>;

    /// Whether the user may search data registered in the org unit
    fn can_search(&self, user: Option<&User>, org_unit: &OrganisationUnit) -> bool;
}

/// Access manager backed by the metadata catalog
#[derive(Debug, Clone)]
pub struct DefaultAccessManager {
    catalog: Arc<MetadataCatalog>,
}

impl DefaultAccessManager {
    pub fn new(catalog: Arc<MetadataCatalog>) -> Self {
        Self { catalog }
    }

    fn in_capture_scope(user: &User, org_unit: &OrganisationUnit) -> bool {
        user.organisation_units
            .iter()
            .any(|root| org_unit.is_descendant_of(root.as_str()))
    }

    fn can_write_program(user: &User, program: &Program) -> bool {
        program.public_data_write || program.data_write_users.contains(&user.uid)
    }

    fn entity_program<'a>(&'a self, entity: &StoredEntity) -> Option<&'a Program> {
        match entity {
            StoredEntity::TrackedEntity(_) => None,
            StoredEntity::Enrollment(en) => self.catalog.program(en.program.as_str()),
            StoredEntity::Event(ev) => ev
                .program
                .as_ref()
                .and_then(|p| self.catalog.program(p.as_str()))
                .or_else(|| {
                    self.catalog
                        .program_stage(ev.program_stage.as_str())
                        .and_then(|stage| self.catalog.program(stage.program.as_str()))
                }),
        }
    }
}

impl TrackerAccessManager for DefaultAccessManager {
    fn can_access(
        &self,
        user: Option<&User>,
        program: Option<&Program>,
        org_unit: &OrganisationUnit,
    ) -> bool {
        let Some(user) = user else {
            return true;
        };
        if user.is_super() {
            return true;
        }
        Self::in_capture_scope(user, org_unit)
            && program.map_or(true, |p| Self::can_write_program(user, p))
    }

    fn can_delete(
        &self,
        user: Option<&User>,
        entity: &StoredEntity,
        allow_already_deleted: bool,
    ) -> Vec<String> {
        let mut violations = Vec::new();
        if entity.is_deleted() && !allow_already_deleted {
            violations.push(format!(
                "{} already deleted: {}",
                entity.tracker_type(),
                entity.uid()
            ));
        }

        let Some(user) = user else {
            return violations;
        };
        if user.is_super() {
            return violations;
        }

        match self.catalog.organisation_unit(entity.organisation_unit().as_str()) {
            Some(org_unit) if Self::in_capture_scope(user, org_unit) => {}
            _ => violations.push(format!(
                "User has no delete access to organisation unit: {}",
                entity.organisation_unit()
            )),
        }

        if let Some(program) = self.entity_program(entity) {
            if !Self::can_write_program(user, program) {
                violations.push(format!(
                    "User has no data write access to program: {}",
                    program.uid
                ));
            }
        }
        violations
    }

    fn can_search(&self, user: Option<&User>, org_unit: &OrganisationUnit) -> bool {
        let Some(user) = user else {
            return true;
        };
        user.is_super()
            || user
                .search_organisation_units
                .iter()
                .chain(user.organisation_units.iter())
                .any(|root| org_unit.is_descendant_of(root.as_str()))
    }
}
