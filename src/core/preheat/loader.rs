//! Preheat loading
//!
//! Collects every identifier a bundle references, fetches existing entities
//! from the store once per distinct uid, copies the referenced metadata out
//! of the catalog and builds the [`PreheatContext`].

use super::context::{validate_id_schemes, PreheatBuilder, PreheatContext};
use crate::adapters::store::TrackerStore;
use crate::domain::ids::{IdScheme, Uid};
use crate::domain::metadata::{MetadataCatalog, OrganisationUnit, Program, ProgramStage, ValueType};
use crate::domain::options::ImportOptions;
use crate::domain::records::TrackerBundle;
use crate::domain::Result;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

/// Bulk loader for the preheat context
pub struct Preheater<'a> {
    store: &'a dyn TrackerStore,
    catalog: &'a MetadataCatalog,
}

impl<'a> Preheater<'a> {
    pub fn new(store: &'a dyn TrackerStore, catalog: &'a MetadataCatalog) -> Self {
        Self { store, catalog }
    }

    /// Builds the context for one bundle
    ///
    /// # Errors
    ///
    /// Fails on an unsupported identifier scheme or a store error. Both are
    /// batch-fatal.
    pub async fn preheat(
        &self,
        bundle: &TrackerBundle,
        import_options: ImportOptions,
    ) -> Result<PreheatContext> {
        validate_id_schemes(&import_options)?;

        let schemes = import_options.id_schemes.clone();
        let mut metadata = MetadataSelection::new(self.catalog);

        for te in &bundle.tracked_entities {
            metadata.tracked_entity_type(&te.tracked_entity_type);
            metadata.org_unit(schemes.org_unit_id_scheme(), &te.org_unit);
            for attribute in &te.attributes {
                metadata.attribute(&attribute.attribute, attribute.value.as_deref());
            }
        }

        for en in &bundle.enrollments {
            metadata.program(schemes.program_id_scheme(), &en.program);
            metadata.org_unit(schemes.org_unit_id_scheme(), &en.org_unit);
            for attribute in &en.attributes {
                metadata.attribute(&attribute.attribute, attribute.value.as_deref());
            }
        }

        for ev in &bundle.events {
            if let Some(program) = &ev.program {
                metadata.program(schemes.program_id_scheme(), program);
            }
            metadata.program_stage(schemes.program_stage_id_scheme(), &ev.program_stage);
            metadata.org_unit(schemes.org_unit_id_scheme(), &ev.org_unit);
            for dv in &ev.data_values {
                metadata.data_element(&dv.data_element, dv.value.as_deref());
            }
        }

        let mut builder = metadata.into_builder(import_options);

        // One store round trip per distinct uid
        let uids: BTreeSet<&str> = bundle.uids().into_iter().collect();
        let mut found = 0usize;
        for raw in uids {
            let Ok(uid) = Uid::new(raw) else {
                continue;
            };
            if let Some(entity) = self.store.get_by_uid(&uid).await? {
                found += 1;
                builder = builder.existing(entity);
            }
        }
        debug!(existing = found, "Existing entities loaded");

        let context = builder.build()?;
        info!(
            records = bundle.len(),
            existing = context.existing_count(),
            "Preheat complete"
        );
        Ok(context)
    }
}

/// Metadata referenced by a bundle, deduplicated by uid
struct MetadataSelection<'c> {
    catalog: &'c MetadataCatalog,
    programs: Vec<&'c Program>,
    program_stages: Vec<&'c ProgramStage>,
    org_units: Vec<&'c OrganisationUnit>,
    tracked_entity_types: HashSet<&'c str>,
    data_elements: HashSet<&'c str>,
    attributes: HashSet<&'c str>,
    usernames: HashSet<String>,
    seen: HashSet<&'c str>,
}

impl<'c> MetadataSelection<'c> {
    fn new(catalog: &'c MetadataCatalog) -> Self {
        Self {
            catalog,
            programs: Vec::new(),
            program_stages: Vec::new(),
            org_units: Vec::new(),
            tracked_entity_types: HashSet::new(),
            data_elements: HashSet::new(),
            attributes: HashSet::new(),
            usernames: HashSet::new(),
            seen: HashSet::new(),
        }
    }

    fn program(&mut self, scheme: &IdScheme, key: &str) {
        let catalog = self.catalog;
        let found = match scheme {
            IdScheme::Code => catalog.program_by_code(key),
            _ => catalog.program(key),
        };
        if let Some(program) = found {
            self.add_program(program);
        }
    }

    fn add_program(&mut self, program: &'c Program) {
        if !self.seen.insert(program.uid.as_str()) {
            return;
        }
        self.programs.push(program);
        if let Some(tet) = &program.tracked_entity_type {
            self.tracked_entity_type(tet.as_str());
        }
        for attribute in &program.attributes {
            self.attributes.insert(attribute.as_str());
        }
    }

    fn program_stage(&mut self, scheme: &IdScheme, key: &str) {
        let catalog = self.catalog;
        let found = match scheme {
            IdScheme::Code => catalog.program_stage_by_code(key),
            _ => catalog.program_stage(key),
        };
        let Some(stage) = found else {
            return;
        };
        if !self.seen.insert(stage.uid.as_str()) {
            return;
        }
        self.program_stages.push(stage);
        for de in &stage.data_elements {
            self.data_elements.insert(de.as_str());
        }
        if let Some(program) = catalog.program(stage.program.as_str()) {
            self.add_program(program);
        }
    }

    fn org_unit(&mut self, scheme: &IdScheme, key: &str) {
        let catalog = self.catalog;
        let found = match scheme {
            IdScheme::Code => catalog.organisation_unit_by_code(key),
            _ => catalog.organisation_unit(key),
        };
        if let Some(org_unit) = found {
            if self.seen.insert(org_unit.uid.as_str()) {
                self.org_units.push(org_unit);
            }
        }
    }

    fn tracked_entity_type(&mut self, uid: &str) {
        let catalog = self.catalog;
        if let Some(tet) = catalog.tracked_entity_type(uid) {
            self.tracked_entity_types.insert(tet.uid.as_str());
            for attribute in &tet.attributes {
                self.attributes.insert(attribute.as_str());
            }
        }
    }

    fn data_element(&mut self, uid: &str, value: Option<&str>) {
        let catalog = self.catalog;
        if let Some(de) = catalog.data_element(uid) {
            self.data_elements.insert(de.uid.as_str());
            self.username_value(de.value_type, value);
        }
    }

    fn attribute(&mut self, uid: &str, value: Option<&str>) {
        let catalog = self.catalog;
        if let Some(attribute) = catalog.attribute(uid) {
            self.attributes.insert(attribute.uid.as_str());
            self.username_value(attribute.value_type, value);
        }
    }

    fn username_value(&mut self, value_type: ValueType, value: Option<&str>) {
        if value_type == ValueType::Username {
            if let Some(username) = value.map(str::trim).filter(|v| !v.is_empty()) {
                self.usernames.insert(username.to_string());
            }
        }
    }

    fn into_builder(self, import_options: ImportOptions) -> PreheatBuilder {
        let catalog = self.catalog;
        let mut builder = PreheatBuilder::new(import_options);
        for program in self.programs {
            builder = builder.program(program.clone());
        }
        for stage in self.program_stages {
            builder = builder.program_stage(stage.clone());
        }
        for org_unit in self.org_units {
            builder = builder.organisation_unit(org_unit.clone());
        }
        for uid in self.tracked_entity_types {
            if let Some(tet) = catalog.tracked_entity_type(uid) {
                builder = builder.tracked_entity_type(tet.clone());
            }
        }
        for uid in self.data_elements {
            if let Some(de) = catalog.data_element(uid) {
                builder = builder.data_element(de.clone());
            }
        }
        for uid in self.attributes {
            if let Some(attribute) = catalog.attribute(uid) {
                builder = builder.attribute(attribute.clone());
            }
        }
        for username in &self.usernames {
            if let Some(user) = catalog.user_by_username(username) {
                builder = builder.user(user.clone());
            }
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::InMemoryStore;
    use crate::domain::errors::IntakeError;
    use crate::domain::ids::IdSchemes;
    use crate::domain::metadata::{DataElement, User};
    use crate::domain::records::{DataValue, Event};

    fn uid(s: &str) -> Uid {
        Uid::new(s).unwrap()
    }

    fn catalog() -> MetadataCatalog {
        let mut catalog = MetadataCatalog::new();
        catalog.add_program(Program::new(uid("progA")).with_stage(uid("stageA")));
        catalog.add_program_stage(
            ProgramStage::new(uid("stageA"), uid("progA"))
                .with_code("VISIT")
                .with_data_element(uid("deA"))
                .with_data_element(uid("deUser")),
        );
        catalog.add_organisation_unit(OrganisationUnit::new(uid("ouA")));
        catalog.add_data_element(DataElement::new(uid("deA"), ValueType::Integer));
        catalog.add_data_element(DataElement::new(uid("deUser"), ValueType::Username));
        catalog.add_user(User::new(uid("u1"), "alice"));
        catalog
    }

    #[tokio::test]
    async fn test_preheat_copies_referenced_metadata() {
        let store = InMemoryStore::new();
        let catalog = catalog();
        let bundle = TrackerBundle::of_events(vec![Event::new("stageA", "ouA")
            .with_data_value(DataValue::new("deA", "5"))
            .with_data_value(DataValue::new("deUser", "alice"))]);

        let ctx = Preheater::new(&store, &catalog)
            .preheat(&bundle, ImportOptions::default())
            .await
            .unwrap();

        assert!(ctx.program_stage(&IdScheme::Uid, "stageA").is_some());
        assert!(ctx.program_by_uid("progA").is_some());
        assert!(ctx.organisation_unit("ouA").is_some());
        assert!(ctx.data_element("deA").is_some());
        assert!(ctx.user_by_username("alice").is_some());
    }

    #[tokio::test]
    async fn test_preheat_resolves_codes() {
        let store = InMemoryStore::new();
        let catalog = catalog();
        let bundle = TrackerBundle::of_events(vec![Event::new("VISIT", "ouA")]);
        let mut schemes = IdSchemes::default();
        schemes.program_stage = Some(IdScheme::Code);

        let ctx = Preheater::new(&store, &catalog)
            .preheat(&bundle, ImportOptions::default().with_id_schemes(schemes))
            .await
            .unwrap();

        assert!(ctx.program_stage(&IdScheme::Code, "VISIT").is_some());
    }

    #[tokio::test]
    async fn test_preheat_rejects_unsupported_scheme() {
        let store = InMemoryStore::new();
        let catalog = catalog();
        let options = ImportOptions::default().with_id_schemes(IdSchemes::new(IdScheme::Name));

        let err = Preheater::new(&store, &catalog)
            .preheat(&TrackerBundle::default(), options)
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::UnsupportedIdScheme(_)));
    }
}
