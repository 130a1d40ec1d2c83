//! Check outcomes
//!
//! A checker never fails: it returns an [`Outcome`] describing whether the
//! record may proceed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a check outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

/// Machine-readable reason attached to a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// User lacks write access to the org unit or program
    NoWriteAccess,
    /// Tracked entity type reference does not resolve
    TrackedEntityTypeNotFound,
    /// Attribute does not exist or is not allowed here
    InvalidAttribute,
    /// Attribute value does not match its value type
    InvalidAttributeValue,
    /// Organisation unit reference does not resolve
    OrgUnitNotFound,
    /// Geometry does not match the declared feature type
    GeometryMismatch,
    /// Program stage reference does not resolve
    ProgramStageNotFound,
    /// Program stage belongs to another program
    ProgramStageNotInProgram,
    /// Record already exists
    AlreadyExists,
    /// Record does not exist
    NotFound,
    /// Record uid is malformed
    InvalidUid,
    /// Program reference does not resolve
    ProgramNotFound,
    /// User may not reopen completed events
    UncompleteNotAuthorized,
    /// User may not delete the record
    NoDeleteAccess,
    /// Data value does not match its value type
    InvalidDataValue,
    /// Data element does not exist
    DataElementNotFound,
    /// Data element is not part of the program stage
    DataElementNotInStage,
    /// Username value does not reference a known user
    UsernameNotFound,
    /// Record could not be persisted
    PersistenceFailed,
}

impl ErrorCode {
    /// Stable code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoWriteAccess => "E1000",
            Self::TrackedEntityTypeNotFound => "E1005",
            Self::InvalidAttribute => "E1006",
            Self::InvalidAttributeValue => "E1007",
            Self::OrgUnitNotFound => "E1011",
            Self::GeometryMismatch => "E1012",
            Self::ProgramStageNotFound => "E1013",
            Self::ProgramStageNotInProgram => "E1089",
            Self::AlreadyExists => "E1030",
            Self::NotFound => "E1032",
            Self::InvalidUid => "E1048",
            Self::ProgramNotFound => "E1069",
            Self::UncompleteNotAuthorized => "E1083",
            Self::NoDeleteAccess => "E1100",
            Self::InvalidDataValue => "E1302",
            Self::DataElementNotFound => "E1304",
            Self::DataElementNotInStage => "E1305",
            Self::UsernameNotFound => "E6020",
            Self::PersistenceFailed => "E9999",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Result of one check on one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub severity: Severity,
    /// Uid of the offending record, when known
    pub reference: Option<String>,
    pub message: Option<String>,
    pub error_code: Option<ErrorCode>,
    /// Records ignored because of this outcome
    pub ignored: usize,
}

impl Outcome {
    pub fn ok() -> Self {
        Self {
            severity: Severity::Ok,
            reference: None,
            message: None,
            error_code: None,
            ignored: 0,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: Some(message.into()),
            ..Self::ok()
        }
    }

    /// Blocking outcome; the record is counted as ignored
    pub fn error(message: impl Into<String>) -> Self {
        let mut outcome = Self {
            severity: Severity::Error,
            message: Some(message.into()),
            ..Self::ok()
        };
        outcome.increment_ignored();
        outcome
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_code(mut self, error_code: ErrorCode) -> Self {
        self.error_code = Some(error_code);
        self
    }

    pub fn increment_ignored(&mut self) {
        self.ignored += 1;
    }

    pub fn is_ok(&self) -> bool {
        self.severity == Severity::Ok
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Self::ok()
    }
}
