//! Shared fixtures for checker tests

use crate::adapters::access::DefaultAccessManager;
use crate::core::preheat::PreheatContext;
use crate::core::validation::{ImportStage, ValidationContext};
use crate::domain::entities::{StoredEntity, StoredEvent};
use crate::domain::ids::Uid;
use crate::domain::metadata::{
    DataElement, FeatureType, MetadataCatalog, OrganisationUnit, Program, ProgramStage,
    TrackedEntityAttribute, TrackedEntityType, User, ValueType,
};
use crate::domain::options::ImportOptions;
use crate::domain::records::EventStatus;
use chrono::Utc;
use std::sync::Arc;

pub struct Fixture {
    pub preheat: PreheatContext,
    pub access: DefaultAccessManager,
}

pub fn uid(s: &str) -> Uid {
    Uid::new(s).unwrap()
}

pub fn catalog() -> MetadataCatalog {
    let mut catalog = MetadataCatalog::new();

    let root = OrganisationUnit::new(uid("root"));
    let ou_a = OrganisationUnit::child_of(uid("ouA"), &root);
    catalog.add_organisation_unit(root);
    catalog.add_organisation_unit(ou_a);
    catalog.add_organisation_unit(OrganisationUnit::new(uid("ouOther")));

    catalog.add_program(
        Program::new(uid("progA"))
            .with_stage(uid("stageA"))
            .with_stage(uid("stagePoint"))
            .with_attribute(uid("attrA"))
            .with_attribute(uid("attrUser"))
            .with_tracked_entity_type(uid("tetA")),
    );
    catalog.add_program(
        Program::new(uid("progRestricted"))
            .with_stage(uid("stageR"))
            .restricted_to(vec![uid("uOwner")]),
    );

    catalog.add_program_stage(
        ProgramStage::new(uid("stageA"), uid("progA"))
            .with_data_element(uid("deA"))
            .with_data_element(uid("deText"))
            .with_data_element(uid("deUser"))
            .with_data_element(uid("deFile")),
    );
    catalog.add_program_stage(
        ProgramStage::new(uid("stagePoint"), uid("progA")).with_feature_type(FeatureType::Point),
    );
    catalog.add_program_stage(ProgramStage::new(uid("stageR"), uid("progRestricted")));

    catalog.add_tracked_entity_type(
        TrackedEntityType::new(uid("tetA"))
            .with_attribute(uid("attrA"))
            .with_attribute(uid("attrUser")),
    );

    catalog.add_data_element(DataElement::new(uid("deA"), ValueType::Integer));
    catalog.add_data_element(DataElement::new(uid("deText"), ValueType::Text));
    catalog.add_data_element(DataElement::new(uid("deUser"), ValueType::Username));
    catalog.add_data_element(DataElement::new(uid("deFile"), ValueType::FileResource));
    catalog.add_data_element(DataElement::new(uid("deOrphan"), ValueType::Integer));

    catalog.add_attribute(TrackedEntityAttribute::new(uid("attrA"), ValueType::Text));
    catalog.add_attribute(TrackedEntityAttribute::new(uid("attrUser"), ValueType::Username));
    catalog.add_attribute(TrackedEntityAttribute::new(uid("attrNum"), ValueType::Integer));

    catalog.add_user(User::new(uid("uAlice"), "alice"));
    catalog
}

pub fn stored_event(uid_str: &str, status: EventStatus) -> StoredEntity {
    let now = Utc::now();
    StoredEntity::Event(StoredEvent {
        uid: uid(uid_str),
        program: Some(uid("progA")),
        program_stage: uid("stageA"),
        enrollment: None,
        organisation_unit: uid("ouA"),
        status,
        execution_date: Some(now),
        due_date: None,
        geometry: None,
        stored_by: "alice".to_string(),
        created: now,
        last_updated: now,
        created_by: None,
        last_updated_by: None,
        completed_by: None,
        completed_date: None,
        deleted: false,
        data_values: Vec::new(),
    })
}

/// Clerk with capture access below `root` and no extra authorities
pub fn clerk() -> User {
    User::new(uid("uClerk"), "clerk").with_organisation_unit(uid("root"))
}

pub fn fixture() -> Fixture {
    fixture_for(Some(clerk()))
}

pub fn fixture_for(user: Option<User>) -> Fixture {
    let catalog = catalog();
    let mut builder = PreheatContext::builder(ImportOptions::new(user));

    for key in ["progA", "progRestricted"] {
        builder = builder.program(catalog.program(key).unwrap().clone());
    }
    for stage in catalog.program_stages() {
        builder = builder.program_stage(stage.clone());
    }
    for key in ["root", "ouA", "ouOther"] {
        builder = builder.organisation_unit(catalog.organisation_unit(key).unwrap().clone());
    }
    builder = builder.tracked_entity_type(catalog.tracked_entity_type("tetA").unwrap().clone());
    for key in ["deA", "deText", "deUser", "deFile", "deOrphan"] {
        builder = builder.data_element(catalog.data_element(key).unwrap().clone());
    }
    for attribute in catalog.attributes().values() {
        builder = builder.attribute(attribute.clone());
    }
    builder = builder
        .user(catalog.user("uAlice").unwrap().clone())
        .existing(stored_event("evCompleted", EventStatus::Completed))
        .existing(stored_event("evActive", EventStatus::Active));

    Fixture {
        preheat: builder.build().unwrap(),
        access: DefaultAccessManager::new(Arc::new(catalog)),
    }
}

pub fn context(fixture: &Fixture, stage: ImportStage) -> ValidationContext<'_> {
    ValidationContext::new(&fixture.preheat, &fixture.access, stage)
}
