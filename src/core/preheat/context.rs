//! Preheat context
//!
//! Read-only snapshot of the metadata, users and existing entities one import
//! needs. Built once per batch by [`PreheatBuilder`]; nothing can be added or
//! changed after [`PreheatBuilder::build`], so checkers may share it freely.

use crate::domain::entities::{StoredEnrollment, StoredEntity, StoredEvent, StoredTrackedEntity};
use crate::domain::errors::IntakeError;
use crate::domain::ids::{IdScheme, Uid};
use crate::domain::metadata::{
    DataElement, OrganisationUnit, Program, ProgramStage, TrackedEntityAttribute,
    TrackedEntityType, User,
};
use crate::domain::options::ImportOptions;
use crate::domain::Result;
use std::collections::HashMap;

/// Objects indexed by uid and, optionally, by code
#[derive(Debug, Clone)]
struct Indexed<T> {
    by_uid: HashMap<Uid, T>,
    by_code: HashMap<String, Uid>,
}

impl<T> Default for Indexed<T> {
    fn default() -> Self {
        Self {
            by_uid: HashMap::new(),
            by_code: HashMap::new(),
        }
    }
}

impl<T> Indexed<T> {
    fn insert(&mut self, uid: Uid, code: Option<&str>, value: T) {
        if let Some(code) = code {
            self.by_code.insert(code.to_string(), uid.clone());
        }
        self.by_uid.insert(uid, value);
    }

    fn get(&self, id_scheme: &IdScheme, key: &str) -> Option<&T> {
        match id_scheme {
            IdScheme::Uid => self.by_uid.get(key),
            IdScheme::Code => self.by_code.get(key).and_then(|uid| self.by_uid.get(uid)),
            IdScheme::Name | IdScheme::Attribute(_) => None,
        }
    }

    fn by_uid(&self, uid: &str) -> Option<&T> {
        self.by_uid.get(uid)
    }

    fn len(&self) -> usize {
        self.by_uid.len()
    }
}

/// Immutable per-batch lookup context
///
/// Every lookup returns `None` when the key does not resolve.
#[derive(Debug, Clone)]
pub struct PreheatContext {
    import_options: ImportOptions,
    programs: Indexed<Program>,
    program_stages: Indexed<ProgramStage>,
    organisation_units: Indexed<OrganisationUnit>,
    tracked_entity_types: HashMap<Uid, TrackedEntityType>,
    data_elements: HashMap<Uid, DataElement>,
    attributes: HashMap<Uid, TrackedEntityAttribute>,
    users: HashMap<String, User>,
    existing: HashMap<Uid, StoredEntity>,
}

impl PreheatContext {
    /// Creates a builder for the given import
    pub fn builder(import_options: ImportOptions) -> PreheatBuilder {
        PreheatBuilder::new(import_options)
    }

    pub fn import_options(&self) -> &ImportOptions {
        &self.import_options
    }

    /// Acting user, `None` for system imports
    pub fn user(&self) -> Option<&User> {
        self.import_options.user.as_ref()
    }

    /// Program resolved under the given scheme
    pub fn program(&self, id_scheme: &IdScheme, key: &str) -> Option<&Program> {
        self.programs.get(id_scheme, key)
    }

    /// Program by uid, regardless of the import's schemes
    pub fn program_by_uid(&self, uid: &str) -> Option<&Program> {
        self.programs.by_uid(uid)
    }

    /// Program stage resolved under the given scheme
    pub fn program_stage(&self, id_scheme: &IdScheme, key: &str) -> Option<&ProgramStage> {
        self.program_stages.get(id_scheme, key)
    }

    /// Organisation unit resolved under the import's org unit scheme
    pub fn organisation_unit(&self, key: &str) -> Option<&OrganisationUnit> {
        let scheme = self.import_options.id_schemes.org_unit_id_scheme();
        self.organisation_units.get(scheme, key)
    }

    pub fn tracked_entity_type(&self, uid: &str) -> Option<&TrackedEntityType> {
        self.tracked_entity_types.get(uid)
    }

    pub fn data_element(&self, uid: &str) -> Option<&DataElement> {
        self.data_elements.get(uid)
    }

    pub fn attribute(&self, uid: &str) -> Option<&TrackedEntityAttribute> {
        self.attributes.get(uid)
    }

    /// Preloaded user referenced by a USERNAME value
    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    /// Existing entity of any type
    pub fn existing_by_uid(&self, uid: &str) -> Option<&StoredEntity> {
        self.existing.get(uid)
    }

    pub fn existing_event(&self, uid: &str) -> Option<&StoredEvent> {
        self.existing_by_uid(uid).and_then(StoredEntity::as_event)
    }

    pub fn existing_enrollment(&self, uid: &str) -> Option<&StoredEnrollment> {
        self.existing_by_uid(uid).and_then(StoredEntity::as_enrollment)
    }

    pub fn existing_tracked_entity(&self, uid: &str) -> Option<&StoredTrackedEntity> {
        self.existing_by_uid(uid).and_then(StoredEntity::as_tracked_entity)
    }

    /// Number of existing entities loaded
    pub fn existing_count(&self) -> usize {
        self.existing.len()
    }

    /// Program an event belongs to, from its stage when not given explicitly
    pub fn event_program(&self, program: Option<&str>, stage: &ProgramStage) -> Option<&Program> {
        let scheme = self.import_options.id_schemes.program_id_scheme();
        program
            .and_then(|key| self.program(scheme, key))
            .or_else(|| self.program_by_uid(stage.program.as_str()))
    }
}

/// Builder for [`PreheatContext`]
#[derive(Debug)]
pub struct PreheatBuilder {
    context: PreheatContext,
}

impl PreheatBuilder {
    pub fn new(import_options: ImportOptions) -> Self {
        Self {
            context: PreheatContext {
                import_options,
                programs: Indexed::default(),
                program_stages: Indexed::default(),
                organisation_units: Indexed::default(),
                tracked_entity_types: HashMap::new(),
                data_elements: HashMap::new(),
                attributes: HashMap::new(),
                users: HashMap::new(),
                existing: HashMap::new(),
            },
        }
    }

    pub fn program(mut self, program: Program) -> Self {
        self.context
            .programs
            .insert(program.uid.clone(), program.code.clone().as_deref(), program);
        self
    }

    pub fn program_stage(mut self, stage: ProgramStage) -> Self {
        self.context
            .program_stages
            .insert(stage.uid.clone(), stage.code.clone().as_deref(), stage);
        self
    }

    pub fn organisation_unit(mut self, org_unit: OrganisationUnit) -> Self {
        self.context.organisation_units.insert(
            org_unit.uid.clone(),
            org_unit.code.clone().as_deref(),
            org_unit,
        );
        self
    }

    pub fn tracked_entity_type(mut self, tracked_entity_type: TrackedEntityType) -> Self {
        self.context
            .tracked_entity_types
            .insert(tracked_entity_type.uid.clone(), tracked_entity_type);
        self
    }

    pub fn data_element(mut self, data_element: DataElement) -> Self {
        self.context
            .data_elements
            .insert(data_element.uid.clone(), data_element);
        self
    }

    pub fn attribute(mut self, attribute: TrackedEntityAttribute) -> Self {
        self.context.attributes.insert(attribute.uid.clone(), attribute);
        self
    }

    /// Preloads a user referenced by a USERNAME value
    pub fn user(mut self, user: User) -> Self {
        self.context.users.insert(user.username.clone(), user);
        self
    }

    pub fn existing(mut self, entity: StoredEntity) -> Self {
        self.context.existing.insert(entity.uid().clone(), entity);
        self
    }

    /// Finishes the context
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::UnsupportedIdScheme`] if any configured scheme is
    /// neither `uid` nor `code`.
    pub fn build(self) -> Result<PreheatContext> {
        validate_id_schemes(&self.context.import_options)?;
        tracing::debug!(
            programs = self.context.programs.len(),
            program_stages = self.context.program_stages.len(),
            organisation_units = self.context.organisation_units.len(),
            existing = self.context.existing.len(),
            "Preheat context built"
        );
        Ok(self.context)
    }
}

/// Rejects identifier schemes the context cannot resolve
pub fn validate_id_schemes(options: &ImportOptions) -> Result<()> {
    match options
        .id_schemes
        .all()
        .into_iter()
        .find(|scheme| !matches!(scheme, IdScheme::Uid | IdScheme::Code))
    {
        Some(scheme) => Err(IntakeError::UnsupportedIdScheme(scheme.name())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::IdSchemes;

    fn uid(s: &str) -> Uid {
        Uid::new(s).unwrap()
    }

    fn context(options: ImportOptions) -> Result<PreheatContext> {
        PreheatContext::builder(options)
            .program(Program::new(uid("progA")).with_code("ANC"))
            .program_stage(ProgramStage::new(uid("stageA"), uid("progA")).with_code("VISIT"))
            .organisation_unit(OrganisationUnit::new(uid("ouA")).with_code("OU_A"))
            .build()
    }

    #[test]
    fn test_lookup_by_uid_and_code() {
        let ctx = context(ImportOptions::default()).unwrap();
        assert!(ctx.program(&IdScheme::Uid, "progA").is_some());
        assert!(ctx.program(&IdScheme::Code, "ANC").is_some());
        assert!(ctx.program(&IdScheme::Uid, "ANC").is_none());
        assert_eq!(
            ctx.program_stage(&IdScheme::Code, "VISIT").unwrap().uid.as_str(),
            "stageA"
        );
    }

    #[test]
    fn test_unresolved_lookups_are_none() {
        let ctx = context(ImportOptions::default()).unwrap();
        assert!(ctx.program_stage(&IdScheme::Uid, "missing").is_none());
        assert!(ctx.data_element("missing").is_none());
        assert!(ctx.existing_by_uid("missing").is_none());
        assert!(ctx.user().is_none());
    }

    #[test]
    fn test_org_unit_uses_import_scheme() {
        let mut schemes = IdSchemes::default();
        schemes.org_unit = Some(IdScheme::Code);
        let ctx = context(ImportOptions::default().with_id_schemes(schemes)).unwrap();
        assert!(ctx.organisation_unit("OU_A").is_some());
        assert!(ctx.organisation_unit("ouA").is_none());
    }

    #[test]
    fn test_unsupported_scheme_fails_build() {
        let options = ImportOptions::default().with_id_schemes(IdSchemes::new(IdScheme::Name));
        let err = context(options).unwrap_err();
        assert!(matches!(err, IntakeError::UnsupportedIdScheme(ref s) if s == "name"));

        let mut schemes = IdSchemes::default();
        schemes.program_stage = Some(IdScheme::Attribute("attrA".to_string()));
        let err = context(ImportOptions::default().with_id_schemes(schemes)).unwrap_err();
        assert!(matches!(err, IntakeError::UnsupportedIdScheme(_)));
    }
}
