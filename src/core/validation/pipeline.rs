//! Checker pipeline
//!
//! Runs an ordered chain of checkers per import stage over a batch of
//! records. Within one record the first ERROR stops the chain; warnings are
//! collected and the record stays accepted.

use crate::adapters::access::TrackerAccessManager;
use crate::core::preheat::PreheatContext;
use crate::core::validation::checks::{
    AttributeValueCheck, DeleteAclCheck, DataValueCheck, ExistenceCheck, GeometryCheck,
    OrgUnitCheck, ProgramCheck, ProgramStageCheck, TrackedEntityTypeCheck, UncompleteAuthCheck,
    UsernameValueCheck, WriteAclCheck,
};
use crate::core::validation::{Checker, ImportStage, Outcome, ValidationContext};
use crate::domain::records::TrackerRecord;
use tokio::sync::watch;

/// Counters for one batch, plus the first blocking reason per ignored record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Records accepted for insert
    pub imported: usize,
    /// Records accepted for update
    pub updated: usize,
    /// Records accepted for delete
    pub deleted: usize,
    /// Records rejected by validation or persistence
    pub ignored: usize,
    /// One blocking outcome per ignored record
    pub rejections: Vec<Outcome>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an accepted record under its stage
    pub fn add_accepted(&mut self, stage: ImportStage) {
        match stage {
            ImportStage::Insert => self.imported += 1,
            ImportStage::Update => self.updated += 1,
            ImportStage::Delete => self.deleted += 1,
        }
    }

    /// Count a rejected record
    pub fn add_rejection(&mut self, outcome: Outcome) {
        self.ignored += 1;
        self.rejections.push(outcome);
    }

    /// Move an accepted record to ignored, e.g. after its transaction failed
    pub fn revoke(&mut self, stage: ImportStage, outcome: Outcome) {
        let counter = match stage {
            ImportStage::Insert => &mut self.imported,
            ImportStage::Update => &mut self.updated,
            ImportStage::Delete => &mut self.deleted,
        };
        *counter = counter.saturating_sub(1);
        self.add_rejection(outcome);
    }

    /// Uncount an accepted record that turned out to need no write
    pub fn withdraw(&mut self, stage: ImportStage) {
        let counter = match stage {
            ImportStage::Insert => &mut self.imported,
            ImportStage::Update => &mut self.updated,
            ImportStage::Delete => &mut self.deleted,
        };
        *counter = counter.saturating_sub(1);
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: BatchSummary) {
        self.imported += other.imported;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.ignored += other.ignored;
        self.rejections.extend(other.rejections);
    }

    /// Total records seen
    pub fn total(&self) -> usize {
        self.imported + self.updated + self.deleted + self.ignored
    }
}

/// Result of running one stage's chain over a batch
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: ImportStage,
    /// Indices of accepted records, in input order
    pub accepted: Vec<usize>,
    /// Warnings raised on any record
    pub warnings: Vec<Outcome>,
    pub summary: BatchSummary,
    /// Set when the run stopped early on shutdown
    pub cancelled: bool,
}

impl StageResult {
    fn new(stage: ImportStage) -> Self {
        Self {
            stage,
            accepted: Vec::new(),
            warnings: Vec::new(),
            summary: BatchSummary::new(),
            cancelled: false,
        }
    }

    pub fn is_accepted(&self, index: usize) -> bool {
        self.accepted.binary_search(&index).is_ok()
    }
}

/// Ordered checker chains for insert, update and delete
pub struct CheckerPipeline {
    insert: Vec<Box<dyn Checker>>,
    update: Vec<Box<dyn Checker>>,
    delete: Vec<Box<dyn Checker>>,
}

impl CheckerPipeline {
    /// Pipeline with the standard chains
    pub fn new() -> Self {
        Self {
            insert: Self::write_chain(false),
            update: Self::write_chain(true),
            delete: vec![Box::new(DeleteAclCheck)],
        }
    }

    /// Pipeline with custom chains
    pub fn with_chains(
        insert: Vec<Box<dyn Checker>>,
        update: Vec<Box<dyn Checker>>,
        delete: Vec<Box<dyn Checker>>,
    ) -> Self {
        Self {
            insert,
            update,
            delete,
        }
    }

    fn write_chain(update: bool) -> Vec<Box<dyn Checker>> {
        let mut chain: Vec<Box<dyn Checker>> = vec![
            Box::new(ExistenceCheck),
            Box::new(OrgUnitCheck),
            Box::new(TrackedEntityTypeCheck),
            Box::new(ProgramCheck),
            Box::new(ProgramStageCheck),
            Box::new(WriteAclCheck),
        ];
        if update {
            chain.push(Box::new(UncompleteAuthCheck));
        }
        chain.push(Box::new(GeometryCheck));
        chain.push(Box::new(DataValueCheck));
        chain.push(Box::new(AttributeValueCheck));
        chain.push(Box::new(UsernameValueCheck));
        chain
    }

    /// Checkers run for a stage, in order
    pub fn chain(&self, stage: ImportStage) -> &[Box<dyn Checker>] {
        match stage {
            ImportStage::Insert => &self.insert,
            ImportStage::Update => &self.update,
            ImportStage::Delete => &self.delete,
        }
    }

    /// Validate every record under `stage`
    pub fn run(
        &self,
        records: &[TrackerRecord],
        preheat: &PreheatContext,
        access: &dyn TrackerAccessManager,
        stage: ImportStage,
    ) -> StageResult {
        self.run_with_shutdown(records, preheat, access, stage, None)
    }

    /// Validate every record under `stage`, stopping before the next record
    /// once `shutdown` flips to true
    pub fn run_with_shutdown(
        &self,
        records: &[TrackerRecord],
        preheat: &PreheatContext,
        access: &dyn TrackerAccessManager,
        stage: ImportStage,
        shutdown: Option<&watch::Receiver<bool>>,
    ) -> StageResult {
        let ctx = ValidationContext::new(preheat, access, stage);
        let mut result = StageResult::new(stage);

        for (index, record) in records.iter().enumerate() {
            if shutdown.is_some_and(|rx| *rx.borrow()) {
                tracing::warn!(
                    stage = %stage,
                    validated = index,
                    remaining = records.len() - index,
                    "Shutdown requested, stopping validation"
                );
                result.cancelled = true;
                break;
            }

            let (blocking, warnings) = self.validate_record(record, &ctx);
            result.warnings.extend(warnings);
            match blocking {
                Some(outcome) => {
                    crate::log_record_rejected!(record.reference(), outcome.message());
                    result.summary.add_rejection(outcome);
                }
                None => {
                    result.accepted.push(index);
                    result.summary.add_accepted(stage);
                }
            }
        }

        tracing::debug!(
            stage = %stage,
            accepted = result.accepted.len(),
            ignored = result.summary.ignored,
            warnings = result.warnings.len(),
            "Validation stage finished"
        );
        result
    }

    /// Run one record through its chain; returns the blocking outcome if any
    /// and the warnings raised before it
    pub fn validate_record(
        &self,
        record: &TrackerRecord,
        ctx: &ValidationContext<'_>,
    ) -> (Option<Outcome>, Vec<Outcome>) {
        let mut warnings = Vec::new();
        for checker in self.chain(ctx.stage) {
            let outcome = checker.check(record, ctx);
            if outcome.is_ok() {
                continue;
            }
            let outcome = if outcome.reference.is_none() {
                outcome.with_reference(record.reference())
            } else {
                outcome
            };
            if outcome.is_error() {
                tracing::trace!(checker = checker.name(), reference = %record.reference(), "Check failed");
                return (Some(outcome), warnings);
            }
            warnings.push(outcome);
        }
        (None, warnings)
    }
}

impl Default for CheckerPipeline {
    fn default() -> Self {
        Self::new()
    }
}
