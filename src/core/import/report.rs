//! Import report
//!
//! Per tracker type statistics plus the diagnostics the import's
//! [`ReportMode`] asks for.

use crate::core::validation::{BatchSummary, Outcome, Severity};
use crate::domain::options::ReportMode;
use crate::domain::records::TrackerType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Overall result of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    /// Every record was applied without warnings
    Success,
    /// Every record was applied, some with warnings
    Warning,
    /// At least one record was ignored
    Error,
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

/// Record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub ignored: usize,
}

impl Stats {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.deleted + self.ignored
    }

    pub fn merge(&mut self, other: &Stats) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.ignored += other.ignored;
    }
}

impl From<&BatchSummary> for Stats {
    fn from(summary: &BatchSummary) -> Self {
        Self {
            created: summary.imported,
            updated: summary.updated,
            deleted: summary.deleted,
            ignored: summary.ignored,
        }
    }
}

/// One reported finding about one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub reference: String,
    pub tracker_type: TrackerType,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl Diagnostic {
    pub fn from_outcome(tracker_type: TrackerType, outcome: &Outcome) -> Self {
        Self {
            reference: outcome.reference.clone().unwrap_or_default(),
            tracker_type,
            severity: outcome.severity,
            message: outcome.message().to_string(),
            error_code: outcome.error_code.map(|code| code.code().to_string()),
        }
    }
}

/// Statistics and diagnostics for one tracker type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeReport {
    pub stats: Stats,
    pub diagnostics: Vec<Diagnostic>,
}

/// Report of one import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub import_id: Uuid,
    pub status: ImportStatus,
    pub report_mode: ReportMode,
    pub stats: Stats,
    pub type_reports: BTreeMap<TrackerType, TypeReport>,
    /// Set when the import stopped early on shutdown
    pub cancelled: bool,
    pub duration_ms: u64,
}

impl ImportReport {
    pub fn new(report_mode: ReportMode) -> Self {
        Self {
            import_id: Uuid::new_v4(),
            status: ImportStatus::Success,
            report_mode,
            stats: Stats::default(),
            type_reports: BTreeMap::new(),
            cancelled: false,
            duration_ms: 0,
        }
    }

    /// Adds the counts and outcomes of one tracker type
    ///
    /// Outcomes are filtered by the report mode; counts are always kept.
    pub fn add_type(
        &mut self,
        tracker_type: TrackerType,
        summary: &BatchSummary,
        outcomes: impl IntoIterator<Item = Outcome>,
    ) {
        let stats = Stats::from(summary);
        let report_mode = self.report_mode;
        let entry = self.type_reports.entry(tracker_type).or_default();
        entry.stats.merge(&stats);

        let mut has_warning = false;
        for outcome in outcomes {
            has_warning |= outcome.is_warning();
            if Self::is_reported(report_mode, outcome.severity) {
                entry
                    .diagnostics
                    .push(Diagnostic::from_outcome(tracker_type, &outcome));
            }
        }

        self.stats.merge(&stats);
        if stats.ignored > 0 {
            self.status = ImportStatus::Error;
        } else if has_warning && self.status == ImportStatus::Success {
            self.status = ImportStatus::Warning;
        }
    }

    fn is_reported(report_mode: ReportMode, severity: Severity) -> bool {
        match report_mode {
            ReportMode::Errors => severity == Severity::Error,
            ReportMode::Warnings => severity >= Severity::Warning,
            ReportMode::Full => true,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Every reported diagnostic, tracker types in dependency order
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.type_reports.values().flat_map(|r| r.diagnostics.iter())
    }

    /// Diagnostics with ERROR severity
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics().filter(|d| d.severity == Severity::Error)
    }

    pub fn stats_for(&self, tracker_type: TrackerType) -> Stats {
        self.type_reports
            .get(&tracker_type)
            .map(|r| r.stats)
            .unwrap_or_default()
    }

    pub fn has_errors(&self) -> bool {
        self.status == ImportStatus::Error
    }

    /// Log the report
    pub fn log_summary(&self) {
        crate::log_import_complete!(
            self.import_id,
            self.status,
            self.stats,
            Duration::from_millis(self.duration_ms)
        );

        if self.cancelled {
            tracing::warn!(import_id = %self.import_id, "Import was cancelled before completion");
        }

        for diagnostic in self.errors() {
            tracing::warn!(
                reference = %diagnostic.reference,
                tracker_type = %diagnostic.tracker_type,
                error_code = diagnostic.error_code.as_deref().unwrap_or(""),
                message = %diagnostic.message,
                "Record ignored"
            );
        }
    }
}
