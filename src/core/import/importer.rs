//! Import orchestration
//!
//! One import runs in four phases:
//!
//! 1. **Preheat**: load metadata and existing entities for the bundle
//! 2. **Validate**: run the checker chain for each tracker type and stage
//! 3. **Persist**: convert accepted records and write each in its own
//!    transaction
//! 4. **Audit**: record event data value changes once committed
//!
//! Tracker types are processed parents first; deletes run afterwards in
//! reverse order so children go before their parents.

use super::report::ImportReport;
use crate::adapters::access::TrackerAccessManager;
use crate::adapters::store::{StoreTransaction, TrackerStore};
use crate::core::audit::{AuditRecorder, PendingAudit};
use crate::core::convert::{
    EnrollmentConverter, EventConverter, TrackedEntityConverter, TrackerConverter,
};
use crate::core::persist::EventWriter;
use crate::core::preheat::{PreheatContext, Preheater};
use crate::core::validation::{
    BatchSummary, CheckerPipeline, ErrorCode, ImportStage, Outcome,
};
use crate::domain::context::ResultExt;
use crate::domain::entities::StoredEntity;
use crate::domain::ids::Uid;
use crate::domain::metadata::MetadataCatalog;
use crate::domain::options::{ImportOptions, ImportStrategy};
use crate::domain::records::{TrackerBundle, TrackerRecord, TrackerType};
use crate::domain::{IntakeError, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Tracker types with parents before children
const DEPENDENCY_ORDER: [TrackerType; 3] = [
    TrackerType::TrackedEntity,
    TrackerType::Enrollment,
    TrackerType::Event,
];

/// Records of one tracker type sharing one stage
struct StagedRecords {
    tracker_type: TrackerType,
    stage: ImportStage,
    records: Vec<TrackerRecord>,
}

/// Runs bundles through validation, conversion, persistence and auditing
pub struct TrackerImporter {
    store: Arc<dyn TrackerStore>,
    catalog: Arc<MetadataCatalog>,
    access: Arc<dyn TrackerAccessManager>,
    pipeline: CheckerPipeline,
    recorder: AuditRecorder,
}

impl TrackerImporter {
    /// Importer with the standard checker chains
    pub fn new(
        store: Arc<dyn TrackerStore>,
        catalog: Arc<MetadataCatalog>,
        access: Arc<dyn TrackerAccessManager>,
        recorder: AuditRecorder,
    ) -> Self {
        Self {
            store,
            catalog,
            access,
            pipeline: CheckerPipeline::new(),
            recorder,
        }
    }

    /// Replace the checker chains
    pub fn with_pipeline(mut self, pipeline: CheckerPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Import a bundle
    ///
    /// Business-rule violations and per-record write failures end up in the
    /// report; they never fail the import.
    ///
    /// # Errors
    ///
    /// Preheat failures (unsupported id scheme, store errors while loading
    /// existing entities) abort the whole import.
    pub async fn import(
        &self,
        bundle: &TrackerBundle,
        options: ImportOptions,
        shutdown: Option<watch::Receiver<bool>>,
    ) -> Result<ImportReport> {
        let started = Instant::now();
        let mut report = ImportReport::new(options.report_mode);
        crate::log_import_start!(report.import_id, bundle.len(), options.import_strategy);

        let preheat = Preheater::new(self.store.as_ref(), &self.catalog)
            .preheat(bundle, options)
            .await?;
        let writer = EventWriter::new(&preheat, self.recorder.is_enabled());

        for staged in Self::plan(bundle, &preheat) {
            if Self::is_shutdown(shutdown.as_ref()) {
                report.cancelled = true;
                break;
            }

            let result = self.pipeline.run_with_shutdown(
                &staged.records,
                &preheat,
                self.access.as_ref(),
                staged.stage,
                shutdown.as_ref(),
            );

            let mut summary = result.summary;
            let mut persisted = Vec::new();
            for &index in &result.accepted {
                let record = &staged.records[index];
                match self.apply(&preheat, &writer, record, staged.stage).await {
                    Ok(Applied::Unchanged) => {
                        tracing::debug!(
                            reference = %record.reference(),
                            tracker_type = %staged.tracker_type,
                            "Delete target already absent, nothing to write"
                        );
                        summary.withdraw(staged.stage);
                        persisted.push(
                            Outcome {
                                message: Some(format!(
                                    "{} ({}) not found or already deleted, nothing to delete",
                                    staged.tracker_type,
                                    record.reference()
                                )),
                                ..Outcome::ok()
                            }
                            .with_reference(record.reference().as_str()),
                        );
                    }
                    Ok(Applied::Written(uid, pending)) => {
                        self.audit(&uid, &pending).await;
                        persisted.push(
                            Outcome {
                                message: Some(format!(
                                    "{} ({uid}) {}",
                                    staged.tracker_type,
                                    Self::past_tense(staged.stage)
                                )),
                                ..Outcome::ok()
                            }
                            .with_reference(uid.as_str()),
                        );
                    }
                    Err(rejection) => {
                        crate::log_record_rejected!(record.reference(), rejection.message());
                        summary.revoke(staged.stage, rejection);
                    }
                }
            }

            let outcomes = Self::outcomes(&summary, result.warnings, persisted);
            report.add_type(staged.tracker_type, &summary, outcomes);

            if result.cancelled {
                report.cancelled = true;
                break;
            }
        }

        let report = report.with_duration(started.elapsed());
        report.log_summary();
        Ok(report)
    }

    /// Split the bundle into (type, stage) groups in processing order
    fn plan(bundle: &TrackerBundle, preheat: &PreheatContext) -> Vec<StagedRecords> {
        let strategy = preheat.import_options().import_strategy;
        let mut writes = Vec::new();
        let mut deletes = Vec::new();

        for tracker_type in DEPENDENCY_ORDER {
            let mut inserts = Vec::new();
            let mut updates = Vec::new();
            let mut removals = Vec::new();
            for record in bundle.records(tracker_type) {
                match Self::classify(strategy, preheat, &record) {
                    ImportStage::Insert => inserts.push(record),
                    ImportStage::Update => updates.push(record),
                    ImportStage::Delete => removals.push(record),
                }
            }

            for (stage, records) in [
                (ImportStage::Insert, inserts),
                (ImportStage::Update, updates),
            ] {
                if !records.is_empty() {
                    writes.push(StagedRecords {
                        tracker_type,
                        stage,
                        records,
                    });
                }
            }
            if !removals.is_empty() {
                deletes.push(StagedRecords {
                    tracker_type,
                    stage: ImportStage::Delete,
                    records: removals,
                });
            }
        }

        deletes.reverse();
        writes.extend(deletes);
        writes
    }

    /// Stage a record is validated and written under
    pub fn classify(
        strategy: ImportStrategy,
        preheat: &PreheatContext,
        record: &TrackerRecord,
    ) -> ImportStage {
        match strategy {
            ImportStrategy::Create => ImportStage::Insert,
            ImportStrategy::Update => ImportStage::Update,
            ImportStrategy::Delete => ImportStage::Delete,
            ImportStrategy::CreateAndUpdate => {
                match record.uid().and_then(|uid| preheat.existing_by_uid(uid)) {
                    Some(existing)
                        if existing.tracker_type() == record.tracker_type()
                            && !existing.is_deleted() =>
                    {
                        ImportStage::Update
                    }
                    _ => ImportStage::Insert,
                }
            }
        }
    }

    /// Convert and write one accepted record
    ///
    /// Deleting a record that is missing or already deleted opens no
    /// transaction and yields [`Applied::Unchanged`]. On failure the returned
    /// outcome is the reason the record is ignored.
    async fn apply(
        &self,
        preheat: &PreheatContext,
        writer: &EventWriter<'_>,
        record: &TrackerRecord,
        stage: ImportStage,
    ) -> std::result::Result<Applied, Outcome> {
        let reference = record.reference();
        let tracker_type = record.tracker_type();

        let target = if stage == ImportStage::Delete {
            let existing = record
                .uid()
                .and_then(|uid| preheat.existing_by_uid(uid))
                .filter(|existing| {
                    existing.tracker_type() == tracker_type && !existing.is_deleted()
                });
            match existing {
                Some(existing) => Target::Delete(existing),
                None => return Ok(Applied::Unchanged),
            }
        } else {
            let entity = Self::convert(preheat, record).ok_or_else(|| {
                Outcome::error(format!(
                    "{tracker_type} ({reference}) references metadata that could not be resolved"
                ))
                .with_reference(reference.as_str())
                .with_code(ErrorCode::PersistenceFailed)
            })?;
            Target::Write(entity)
        };
        let uid = target.uid().clone();

        self.persist(preheat, writer, target, stage)
            .await
            .map(|pending| Applied::Written(uid, pending))
            .map_err(|err| {
                tracing::warn!(
                    reference = %reference,
                    tracker_type = %tracker_type,
                    error = %err,
                    "Failed to persist record, transaction rolled back"
                );
                Outcome::error(format!("Could not persist {tracker_type} ({reference}): {err}"))
                    .with_reference(reference.as_str())
                    .with_code(ErrorCode::PersistenceFailed)
            })
    }

    fn convert(preheat: &PreheatContext, record: &TrackerRecord) -> Option<StoredEntity> {
        match record {
            TrackerRecord::TrackedEntity(te) => TrackedEntityConverter
                .from(preheat, te)
                .map(StoredEntity::TrackedEntity),
            TrackerRecord::Enrollment(en) => EnrollmentConverter
                .from(preheat, en)
                .map(StoredEntity::Enrollment),
            TrackerRecord::Event(ev) => EventConverter.from(preheat, ev).map(StoredEntity::Event),
        }
    }

    /// Write in a fresh transaction; commit on success, roll back otherwise
    async fn persist(
        &self,
        preheat: &PreheatContext,
        writer: &EventWriter<'_>,
        target: Target<'_>,
        stage: ImportStage,
    ) -> Result<Vec<PendingAudit>> {
        let mut tx = self
            .store
            .begin()
            .await
            .context("Failed to open transaction")?;
        match Self::write(tx.as_mut(), preheat, writer, target, stage).await {
            Ok(pending) => {
                tx.commit().await.context("Failed to commit")?;
                Ok(pending)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    crate::log_error_with_context!(rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn write(
        tx: &mut dyn StoreTransaction,
        preheat: &PreheatContext,
        writer: &EventWriter<'_>,
        target: Target<'_>,
        stage: ImportStage,
    ) -> Result<Vec<PendingAudit>> {
        match target {
            Target::Delete(StoredEntity::Event(event)) => writer.delete_event(tx, event).await,
            Target::Delete(entity) => {
                tx.delete(entity.uid()).await?;
                Ok(Vec::new())
            }
            Target::Write(StoredEntity::Event(event)) => {
                let data_values = event
                    .data_values
                    .iter()
                    .filter_map(|dv| {
                        preheat
                            .data_element(dv.data_element.as_str())
                            .map(|de| (de.clone(), dv.clone()))
                    })
                    .collect();
                if stage == ImportStage::Insert {
                    writer
                        .save_event_with_data_values(tx, event, data_values)
                        .await
                } else {
                    let previous = preheat.existing_event(event.uid.as_str());
                    writer
                        .update_event_with_data_values(tx, event, data_values, previous)
                        .await
                }
            }
            Target::Write(entity) => {
                if stage == ImportStage::Insert {
                    tx.save(entity).await?;
                } else {
                    tx.update(entity).await?;
                }
                Ok(Vec::new())
            }
        }
    }

    /// Audit failures are logged; the record is already committed
    async fn audit(&self, uid: &Uid, pending: &[PendingAudit]) {
        if pending.is_empty() {
            return;
        }
        match self.recorder.record_all(pending).await {
            Ok(written) => tracing::debug!(event = %uid, written, "Data value audits recorded"),
            Err(err) => {
                let err = IntakeError::Audit(format!("event {uid}: {err}"));
                crate::log_error_with_context!(err, "Failed to record data value audits");
            }
        }
    }

    fn outcomes(
        summary: &BatchSummary,
        warnings: Vec<Outcome>,
        persisted: Vec<Outcome>,
    ) -> Vec<Outcome> {
        summary
            .rejections
            .iter()
            .cloned()
            .chain(warnings)
            .chain(persisted)
            .collect()
    }

    fn past_tense(stage: ImportStage) -> &'static str {
        match stage {
            ImportStage::Insert => "created",
            ImportStage::Update => "updated",
            ImportStage::Delete => "deleted",
        }
    }

    fn is_shutdown(shutdown: Option<&watch::Receiver<bool>>) -> bool {
        shutdown.is_some_and(|rx| *rx.borrow())
    }
}

/// Result of applying one accepted record
enum Applied {
    Written(Uid, Vec<PendingAudit>),
    Unchanged,
}

/// What to write for one accepted record
enum Target<'p> {
    Write(StoredEntity),
    Delete(&'p StoredEntity),
}

impl Target<'_> {
    fn uid(&self) -> &Uid {
        match self {
            Self::Write(entity) => entity.uid(),
            Self::Delete(entity) => entity.uid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::access::DefaultAccessManager;
    use crate::adapters::store::InMemoryStore;
    use crate::core::audit::MemoryAuditSink;
    use crate::core::import::ImportStatus;
    use crate::core::validation::checks::test_support::{catalog, clerk, stored_event, uid};
    use crate::domain::audit::AuditType;
    use crate::domain::options::ReportMode;
    use crate::domain::records::{DataValue, Event, EventStatus, Geometry};

    struct Harness {
        store: InMemoryStore,
        sink: MemoryAuditSink,
        importer: TrackerImporter,
    }

    fn harness(store: InMemoryStore) -> Harness {
        let catalog = Arc::new(catalog());
        let sink = MemoryAuditSink::new();
        let importer = TrackerImporter::new(
            Arc::new(store.clone()),
            Arc::clone(&catalog),
            Arc::new(DefaultAccessManager::new(catalog)),
            AuditRecorder::new(true, Arc::new(sink.clone())),
        );
        Harness {
            store,
            sink,
            importer,
        }
    }

    fn options() -> ImportOptions {
        ImportOptions::new(Some(clerk()))
    }

    fn point_event(uid: &str) -> Event {
        Event::new("stagePoint", "ouA")
            .with_uid(uid)
            .with_geometry(Geometry::point(10.0, 20.0))
    }

    #[tokio::test]
    async fn test_one_bad_geometry_in_three() {
        let h = harness(InMemoryStore::new());
        let polygon = Geometry::new("Polygon", serde_json::json!([[[0, 0], [1, 1], [0, 1], [0, 0]]]));
        let bundle = TrackerBundle::of_events(vec![
            point_event("a1234567890123456789bc"),
            Event::new("stagePoint", "ouA")
                .with_uid("b1234567890123456789bc")
                .with_geometry(polygon),
            point_event("c1234567890123456789bc"),
        ]);

        let report = h.importer.import(&bundle, options(), None).await.unwrap();

        assert_eq!(report.status, ImportStatus::Error);
        assert_eq!(report.stats.created, 2);
        assert_eq!(report.stats.ignored, 1);
        let errors: Vec<_> = report.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].reference, "b1234567890123456789bc");
        assert_eq!(h.store.len().await, 2);
        assert!(h.store.get("b1234567890123456789bc").await.is_none());
    }

    #[tokio::test]
    async fn test_update_audits_changed_values() {
        let mut existing = stored_event("a1234567890123456789bc", EventStatus::Active);
        if let StoredEntity::Event(event) = &mut existing {
            event.data_values = vec![
                crate::domain::entities::EventDataValue::new(uid("deA"), "1", "alice"),
                crate::domain::entities::EventDataValue::new(uid("deText"), "same", "alice"),
            ];
        }
        let h = harness(InMemoryStore::with_entities([existing]));
        let bundle = TrackerBundle::of_events(vec![Event::new("stageA", "ouA")
            .with_uid("a1234567890123456789bc")
            .with_data_value(DataValue::new("deA", "2"))
            .with_data_value(DataValue::new("deText", "same"))]);

        let report = h.importer.import(&bundle, options(), None).await.unwrap();

        assert_eq!(report.stats.updated, 1);
        let audits = h.sink.entries().await;
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].audit_type(), AuditType::Update);
        assert_eq!(audits[0].data_element().as_str(), "deA");
    }

    #[tokio::test]
    async fn test_write_failure_ignores_only_that_record() {
        let store = InMemoryStore::new();
        store.fail_writes_for(uid("b1234567890123456789bc")).await;
        let h = harness(store);
        let bundle = TrackerBundle::of_events(vec![
            point_event("a1234567890123456789bc"),
            point_event("b1234567890123456789bc"),
        ]);

        let report = h.importer.import(&bundle, options(), None).await.unwrap();

        assert_eq!(report.stats.created, 1);
        assert_eq!(report.stats.ignored, 1);
        let errors: Vec<_> = report.errors().collect();
        assert_eq!(errors[0].error_code.as_deref(), Some(ErrorCode::PersistenceFailed.code()));
        assert!(h.store.get("a1234567890123456789bc").await.is_some());
        assert!(h.store.get("b1234567890123456789bc").await.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_record_is_a_no_op() {
        let h = harness(InMemoryStore::new());
        let bundle = TrackerBundle::of_events(vec![point_event("a1234567890123456789bc")]);

        let report = h
            .importer
            .import(
                &bundle,
                options()
                    .with_strategy(ImportStrategy::Delete)
                    .with_report_mode(ReportMode::Full),
                None,
            )
            .await
            .unwrap();

        assert_eq!(report.status, ImportStatus::Success);
        assert_eq!(report.stats.deleted, 0);
        assert_eq!(report.stats.ignored, 0);
        assert_eq!(report.errors().count(), 0);
        let diagnostics: Vec<_> = report.diagnostics().collect();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("nothing to delete"));
        assert_eq!(h.store.len().await, 0);
    }

    #[tokio::test]
    async fn test_delete_of_deleted_event_writes_nothing() {
        let mut existing = stored_event("a1234567890123456789bc", EventStatus::Active);
        if let StoredEntity::Event(event) = &mut existing {
            event.deleted = true;
            event.data_values = vec![crate::domain::entities::EventDataValue::new(
                uid("deA"),
                "1",
                "alice",
            )];
        }
        let store = InMemoryStore::with_entities([existing]);
        store.fail_writes_for(uid("a1234567890123456789bc")).await;
        let h = harness(store);
        let bundle = TrackerBundle::of_events(vec![point_event("a1234567890123456789bc")]);

        let report = h
            .importer
            .import(&bundle, options().with_strategy(ImportStrategy::Delete), None)
            .await
            .unwrap();

        assert_eq!(report.status, ImportStatus::Success);
        assert_eq!(report.stats.deleted, 0);
        assert_eq!(report.stats.ignored, 0);
        assert!(h.sink.entries().await.is_empty());
    }

    #[test]
    fn test_classify_ignores_uid_of_other_type() {
        let fixture = crate::core::validation::checks::test_support::fixture();
        let enrollment = crate::domain::records::Enrollment {
            enrollment: Some("evActive".to_string()),
            ..Default::default()
        };

        let stage = TrackerImporter::classify(
            ImportStrategy::CreateAndUpdate,
            &fixture.preheat,
            &enrollment.into(),
        );
        assert_eq!(stage, ImportStage::Insert);
    }

    #[tokio::test]
    async fn test_full_report_lists_persisted_records() {
        let h = harness(InMemoryStore::new());
        let bundle = TrackerBundle::of_events(vec![point_event("a1234567890123456789bc")]);

        let report = h
            .importer
            .import(&bundle, options().with_report_mode(ReportMode::Full), None)
            .await
            .unwrap();

        assert_eq!(report.status, ImportStatus::Success);
        let diagnostics: Vec<_> = report.diagnostics().collect();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].reference, "a1234567890123456789bc");
    }

    #[tokio::test]
    async fn test_shutdown_before_start() {
        let h = harness(InMemoryStore::new());
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let bundle = TrackerBundle::of_events(vec![point_event("a1234567890123456789bc")]);

        let report = h.importer.import(&bundle, options(), Some(rx)).await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.stats.total(), 0);
        assert!(h.store.is_empty().await);
    }

    #[test]
    fn test_classify_create_and_update() {
        let fixture = crate::core::validation::checks::test_support::fixture();
        let existing: TrackerRecord = Event::new("stageA", "ouA").with_uid("evActive").into();
        let new: TrackerRecord = Event::new("stageA", "ouA").into();

        assert_eq!(
            TrackerImporter::classify(ImportStrategy::CreateAndUpdate, &fixture.preheat, &existing),
            ImportStage::Update
        );
        assert_eq!(
            TrackerImporter::classify(ImportStrategy::CreateAndUpdate, &fixture.preheat, &new),
            ImportStage::Insert
        );
        assert_eq!(
            TrackerImporter::classify(ImportStrategy::Delete, &fixture.preheat, &new),
            ImportStage::Delete
        );
    }
}
