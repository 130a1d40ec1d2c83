//! Record validation
//!
//! Each rule is a [`Checker`]: a pure, read-only function from a record and
//! the [`ValidationContext`] to an [`Outcome`]. Checkers are grouped into
//! ordered chains by the [`pipeline::CheckerPipeline`].
//!
//! # Modules
//!
//! - [`outcome`] - Check outcomes, severities and error codes
//! - [`checks`] - The individual checkers
//! - [`value_type`] - Value validation per declared value type
//! - [`pipeline`] - Ordered chains per import stage

pub mod checks;
pub mod outcome;
pub mod pipeline;
pub mod value_type;

pub use outcome::{ErrorCode, Outcome, Severity};
pub use pipeline::{BatchSummary, CheckerPipeline, StageResult};
pub use value_type::{validate_value, value_is_valid};

use crate::adapters::access::TrackerAccessManager;
use crate::core::preheat::PreheatContext;
use crate::domain::metadata::{OrganisationUnit, Program, ProgramStage};
use crate::domain::records::{Event, TrackerRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage a record is validated and persisted under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStage {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        write!(f, "{s}")
    }
}

/// A single validation rule
///
/// Implementations must not mutate anything reachable from the context.
pub trait Checker: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Checks one record
    fn check(&self, record: &TrackerRecord, ctx: &ValidationContext<'_>) -> Outcome;
}

/// Everything a checker may read
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    pub preheat: &'a PreheatContext,
    pub access: &'a dyn TrackerAccessManager,
    pub stage: ImportStage,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        preheat: &'a PreheatContext,
        access: &'a dyn TrackerAccessManager,
        stage: ImportStage,
    ) -> Self {
        Self {
            preheat,
            access,
            stage,
        }
    }

    /// Program stage of an event under the import's stage scheme
    pub fn event_stage(&self, event: &Event) -> Option<&'a ProgramStage> {
        let scheme = self.preheat.import_options().id_schemes.program_stage_id_scheme();
        self.preheat.program_stage(scheme, &event.program_stage)
    }

    /// Program a record belongs to, if any
    pub fn record_program(&self, record: &TrackerRecord) -> Option<&'a Program> {
        let schemes = &self.preheat.import_options().id_schemes;
        match record {
            TrackerRecord::TrackedEntity(_) => None,
            TrackerRecord::Enrollment(en) => {
                self.preheat.program(schemes.program_id_scheme(), &en.program)
            }
            TrackerRecord::Event(ev) => self
                .event_stage(ev)
                .and_then(|stage| self.preheat.event_program(ev.program.as_deref(), stage)),
        }
    }

    /// Organisation unit a record is registered in
    pub fn record_org_unit(&self, record: &TrackerRecord) -> Option<&'a OrganisationUnit> {
        self.preheat.organisation_unit(record.org_unit())
    }
}
