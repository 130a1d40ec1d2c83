//! Data value audit trail written through the import pipeline

use intake::adapters::access::DefaultAccessManager;
use intake::adapters::store::InMemoryStore;
use intake::core::audit::{AuditRecorder, FileAuditSink};
use intake::core::import::TrackerImporter;
use intake::domain::audit::{AuditType, DataValueAudit};
use intake::domain::metadata::{CatalogDocument, MetadataCatalog};
use intake::domain::options::ImportOptions;
use intake::domain::records::{DataValue, Event, TrackerBundle};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const EVENT: &str = "e1234567890123456789ab";

fn catalog() -> MetadataCatalog {
    let document: CatalogDocument = serde_json::from_value(json!({
        "programs": [{ "uid": "progVisits", "programStages": ["stageVisit"] }],
        "programStages": [{
            "uid": "stageVisit",
            "program": "progVisits",
            "dataElements": ["deWeight", "deNote"]
        }],
        "organisationUnits": [{ "uid": "ouClinic", "path": "/ouClinic" }],
        "dataElements": [
            { "uid": "deWeight", "valueType": "INTEGER" },
            { "uid": "deNote", "valueType": "TEXT" }
        ]
    }))
    .unwrap();
    document.into()
}

fn importer(path: &Path, enabled: bool, json_format: bool) -> TrackerImporter {
    let catalog = Arc::new(catalog());
    let sink = FileAuditSink::new(path, json_format).unwrap();
    TrackerImporter::new(
        Arc::new(InMemoryStore::new()),
        Arc::clone(&catalog),
        Arc::new(DefaultAccessManager::new(catalog)),
        AuditRecorder::new(enabled, Arc::new(sink)),
    )
}

fn visit(weight: &str, note: &str) -> TrackerBundle {
    TrackerBundle::of_events(vec![Event::new("stageVisit", "ouClinic")
        .with_uid(EVENT)
        .with_data_value(DataValue::new("deWeight", weight))
        .with_data_value(DataValue::new("deNote", note))])
}

fn read_entries(path: &Path) -> Vec<DataValueAudit> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_audit_trail_follows_value_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit").join("data_value_audit.log");
    let importer = importer(&path, true, true);

    importer
        .import(&visit("70", "first visit"), ImportOptions::default(), None)
        .await
        .unwrap();
    let created = read_entries(&path);
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|a| a.audit_type() == AuditType::Create));

    // Weight unchanged, note blanked
    importer
        .import(&visit("70", ""), ImportOptions::default(), None)
        .await
        .unwrap();
    let entries = read_entries(&path);
    assert_eq!(entries.len(), 3);

    let removed = &entries[2];
    assert_eq!(removed.audit_type(), AuditType::Delete);
    assert_eq!(removed.data_element().as_str(), "deNote");
    assert_eq!(removed.event().as_str(), EVENT);
    assert_eq!(removed.value(), Some("first visit"));
}

#[tokio::test]
async fn test_disabled_audit_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data_value_audit.log");
    let importer = importer(&path, false, true);

    let report = importer
        .import(&visit("70", "first visit"), ImportOptions::default(), None)
        .await
        .unwrap();

    assert_eq!(report.stats.created, 1);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_plain_text_audit_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data_value_audit.log");
    let importer = importer(&path, true, false);

    importer
        .import(&visit("70", "first visit"), ImportOptions::default(), None)
        .await
        .unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.lines().all(|line| line.contains("CREATE")));
    assert!(contents.contains(&format!("event: {EVENT}")));
}
