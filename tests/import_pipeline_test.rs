//! End-to-end tests for the import pipeline against the in-memory store

use intake::adapters::access::DefaultAccessManager;
use intake::adapters::store::InMemoryStore;
use intake::core::audit::{AuditRecorder, MemoryAuditSink};
use intake::core::import::{ImportStatus, TrackerImporter};
use chrono::Utc;
use intake::core::validation::ErrorCode;
use intake::domain::audit::AuditType;
use intake::domain::entities::{StoredEnrollment, StoredEntity};
use intake::domain::ids::Uid;
use intake::domain::metadata::{CatalogDocument, MetadataCatalog};
use intake::domain::options::{ImportOptions, ImportStrategy};
use intake::domain::records::{
    DataValue, EnrollmentStatus, Event, Geometry, TrackerBundle, TrackerType,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;

const EVENT_A: &str = "a1234567890123456789bc";
const EVENT_B: &str = "b1234567890123456789bc";
const EVENT_C: &str = "c1234567890123456789bc";

fn catalog() -> MetadataCatalog {
    let document: CatalogDocument = serde_json::from_value(json!({
        "programs": [{
            "uid": "progVisits",
            "programStages": ["stageVisit", "stageSite"]
        }],
        "programStages": [
            {
                "uid": "stageVisit",
                "program": "progVisits",
                "dataElements": ["deWeight", "deNote"]
            },
            {
                "uid": "stageSite",
                "program": "progVisits",
                "featureType": "POINT"
            }
        ],
        "organisationUnits": [
            { "uid": "ouRoot", "path": "/ouRoot" },
            { "uid": "ouClinic", "path": "/ouRoot/ouClinic" }
        ],
        "dataElements": [
            { "uid": "deWeight", "valueType": "INTEGER" },
            { "uid": "deNote", "valueType": "TEXT" }
        ],
        "users": [{
            "uid": "uNurse",
            "username": "nurse",
            "organisationUnits": ["ouRoot"]
        }]
    }))
    .unwrap();
    document.into()
}

struct Pipeline {
    store: InMemoryStore,
    sink: MemoryAuditSink,
    importer: TrackerImporter,
    options: ImportOptions,
}

fn pipeline(store: InMemoryStore) -> Pipeline {
    let catalog = Arc::new(catalog());
    let nurse = catalog.user_by_username("nurse").cloned();
    let sink = MemoryAuditSink::new();
    let importer = TrackerImporter::new(
        Arc::new(store.clone()),
        Arc::clone(&catalog),
        Arc::new(DefaultAccessManager::new(catalog)),
        AuditRecorder::new(true, Arc::new(sink.clone())),
    );
    Pipeline {
        store,
        sink,
        importer,
        options: ImportOptions::new(nurse),
    }
}

fn site_event(uid: &str) -> Event {
    Event::new("stageSite", "ouClinic")
        .with_uid(uid)
        .with_geometry(Geometry::point(36.8, -1.3))
}

fn visit_event(uid: &str, weight: &str) -> Event {
    Event::new("stageVisit", "ouClinic")
        .with_uid(uid)
        .with_data_value(DataValue::new("deWeight", weight))
}

#[tokio::test]
async fn test_invalid_geometry_rejects_only_that_event() {
    let p = pipeline(InMemoryStore::new());
    let polygon = Geometry::new("Polygon", json!([[[0, 0], [1, 1], [0, 1], [0, 0]]]));
    let bundle = TrackerBundle::of_events(vec![
        site_event(EVENT_A),
        Event::new("stageSite", "ouClinic")
            .with_uid(EVENT_B)
            .with_geometry(polygon),
        site_event(EVENT_C),
    ]);

    let report = p.importer.import(&bundle, p.options.clone(), None).await.unwrap();

    assert_eq!(report.status, ImportStatus::Error);
    assert_eq!(report.stats.created, 2);
    assert_eq!(report.stats.ignored, 1);
    assert_eq!(report.stats_for(TrackerType::Event).created, 2);

    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].reference, EVENT_B);

    assert!(p.store.get(EVENT_A).await.is_some());
    assert!(p.store.get(EVENT_B).await.is_none());
    assert!(p.store.get(EVENT_C).await.is_some());
}

#[tokio::test]
async fn test_reimport_updates_and_preserves_created() {
    let p = pipeline(InMemoryStore::new());

    let first = TrackerBundle::of_events(vec![visit_event(EVENT_A, "70")]);
    let report = p.importer.import(&first, p.options.clone(), None).await.unwrap();
    assert_eq!(report.stats.created, 1);
    let created = p.store.get(EVENT_A).await.unwrap();

    let second = TrackerBundle::of_events(vec![visit_event(EVENT_A, "72")]);
    let report = p.importer.import(&second, p.options.clone(), None).await.unwrap();
    assert_eq!(report.status, ImportStatus::Success);
    assert_eq!(report.stats.updated, 1);

    let updated = p.store.get(EVENT_A).await.unwrap();
    let (before, after) = (created.as_event().unwrap(), updated.as_event().unwrap());
    assert_eq!(after.created, before.created);
    assert_eq!(
        after.data_value("deWeight").and_then(|dv| dv.value.as_deref()),
        Some("72")
    );

    let audits = p.sink.entries().await;
    let types: Vec<_> = audits.iter().map(|a| a.audit_type()).collect();
    assert_eq!(types, vec![AuditType::Create, AuditType::Update]);
}

#[tokio::test]
async fn test_delete_marks_event_deleted() {
    let p = pipeline(InMemoryStore::new());
    let bundle = TrackerBundle::of_events(vec![visit_event(EVENT_A, "70")]);
    p.importer.import(&bundle, p.options.clone(), None).await.unwrap();

    let report = p
        .importer
        .import(
            &bundle,
            p.options.clone().with_strategy(ImportStrategy::Delete),
            None,
        )
        .await
        .unwrap();

    assert_eq!(report.stats.deleted, 1);
    assert!(p.store.get(EVENT_A).await.unwrap().is_deleted());
}

#[tokio::test]
async fn test_delete_of_missing_event_succeeds_without_writing() {
    let p = pipeline(InMemoryStore::new());
    let bundle = TrackerBundle::of_events(vec![visit_event(EVENT_A, "70")]);

    let report = p
        .importer
        .import(
            &bundle,
            p.options.clone().with_strategy(ImportStrategy::Delete),
            None,
        )
        .await
        .unwrap();

    assert_eq!(report.status, ImportStatus::Success);
    assert_eq!(report.stats.deleted, 0);
    assert_eq!(report.stats.ignored, 0);
    assert!(!report.has_errors());
    assert_eq!(p.store.commit_count().await, 0);
    assert!(p.sink.is_empty().await);
}

#[tokio::test]
async fn test_repeated_delete_writes_and_audits_once() {
    let p = pipeline(InMemoryStore::new());
    let bundle = TrackerBundle::of_events(vec![visit_event(EVENT_A, "70")]);
    let delete = p.options.clone().with_strategy(ImportStrategy::Delete);
    p.importer.import(&bundle, p.options.clone(), None).await.unwrap();

    let first = p.importer.import(&bundle, delete.clone(), None).await.unwrap();
    assert_eq!(first.stats.deleted, 1);
    let commits = p.store.commit_count().await;
    let delete_audits = |entries: &[intake::domain::audit::DataValueAudit]| {
        entries
            .iter()
            .filter(|a| a.audit_type() == AuditType::Delete)
            .count()
    };
    assert_eq!(delete_audits(&p.sink.entries().await), 1);

    let second = p.importer.import(&bundle, delete, None).await.unwrap();

    assert_eq!(second.status, ImportStatus::Success);
    assert_eq!(second.stats.deleted, 0);
    assert_eq!(second.stats.ignored, 0);
    assert_eq!(p.store.commit_count().await, commits);
    assert_eq!(delete_audits(&p.sink.entries().await), 1);
    assert!(p.store.get(EVENT_A).await.unwrap().is_deleted());
}

fn stored_enrollment(uid: &str) -> StoredEntity {
    let now = Utc::now();
    StoredEntity::Enrollment(StoredEnrollment {
        uid: Uid::new(uid).unwrap(),
        tracked_entity: Uid::new("teMother").unwrap(),
        program: Uid::new("progVisits").unwrap(),
        organisation_unit: Uid::new("ouClinic").unwrap(),
        status: EnrollmentStatus::Active,
        enrollment_date: Some(now),
        incident_date: None,
        follow_up: false,
        geometry: None,
        stored_by: "nurse".to_string(),
        created: now,
        last_updated: now,
        created_by: None,
        last_updated_by: None,
        completed_by: None,
        completed_date: None,
        deleted: false,
        attribute_values: Vec::new(),
    })
}

#[tokio::test]
async fn test_event_cannot_take_over_enrollment_uid() {
    let p = pipeline(InMemoryStore::with_entities([stored_enrollment(EVENT_A)]));
    let bundle = TrackerBundle::of_events(vec![visit_event(EVENT_A, "70")]);

    let report = p.importer.import(&bundle, p.options.clone(), None).await.unwrap();

    assert_eq!(report.status, ImportStatus::Error);
    assert_eq!(report.stats.ignored, 1);
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors[0].error_code.as_deref(), Some(ErrorCode::AlreadyExists.code()));

    let update = p
        .importer
        .import(
            &bundle,
            p.options.clone().with_strategy(ImportStrategy::Update),
            None,
        )
        .await
        .unwrap();
    assert_eq!(update.stats.ignored, 1);
    assert_eq!(update.stats.updated, 0);

    let kept = p.store.get(EVENT_A).await.unwrap();
    assert!(kept.as_enrollment().is_some());
    assert!(!kept.is_deleted());
    assert_eq!(p.store.commit_count().await, 0);
}

#[tokio::test]
async fn test_event_delete_leaves_enrollment_with_same_uid() {
    let p = pipeline(InMemoryStore::with_entities([stored_enrollment(EVENT_A)]));
    let bundle = TrackerBundle::of_events(vec![visit_event(EVENT_A, "70")]);

    let report = p
        .importer
        .import(
            &bundle,
            p.options.clone().with_strategy(ImportStrategy::Delete),
            None,
        )
        .await
        .unwrap();

    assert_eq!(report.status, ImportStatus::Success);
    assert_eq!(report.stats.deleted, 0);
    assert!(!p.store.get(EVENT_A).await.unwrap().is_deleted());
}

#[tokio::test]
async fn test_write_failure_rolls_back_only_that_record() {
    let store = InMemoryStore::new();
    store.fail_writes_for(Uid::new(EVENT_B).unwrap()).await;
    let p = pipeline(store);
    let bundle = TrackerBundle::of_events(vec![
        visit_event(EVENT_A, "70"),
        visit_event(EVENT_B, "80"),
    ]);

    let report = p.importer.import(&bundle, p.options.clone(), None).await.unwrap();

    assert_eq!(report.stats.created, 1);
    assert_eq!(report.stats.ignored, 1);
    assert_eq!(p.store.len().await, 1);
    assert!(p.store.get(EVENT_B).await.is_none());

    let audited: Vec<_> = p
        .sink
        .entries()
        .await
        .iter()
        .map(|a| a.event().to_string())
        .collect();
    assert_eq!(audited, vec![EVENT_A.to_string()]);
}

#[tokio::test]
async fn test_invalid_data_value_is_reported() {
    let p = pipeline(InMemoryStore::new());
    let bundle = TrackerBundle::of_events(vec![visit_event(EVENT_A, "heavy")]);

    let report = p.importer.import(&bundle, p.options.clone(), None).await.unwrap();

    assert!(report.has_errors());
    assert_eq!(report.stats.ignored, 1);
    assert!(p.store.is_empty().await);
    assert!(p.sink.is_empty().await);
}

#[tokio::test]
async fn test_shutdown_signal_cancels_import() {
    let p = pipeline(InMemoryStore::new());
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();
    let bundle = TrackerBundle::of_events(vec![site_event(EVENT_A)]);

    let report = p.importer.import(&bundle, p.options.clone(), Some(rx)).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.stats.total(), 0);
    assert!(p.store.is_empty().await);
}
