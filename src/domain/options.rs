//! Import options
//!
//! Parameters of one import: acting user, identifier schemes, strategy and
//! how much detail the report carries.

use super::ids::IdSchemes;
use super::metadata::User;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How records in a bundle are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStrategy {
    /// Only new records are accepted
    Create,
    /// Only existing records are accepted
    Update,
    /// New records are created, existing ones updated
    #[default]
    CreateAndUpdate,
    /// Records are deleted
    Delete,
}

impl fmt::Display for ImportStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::CreateAndUpdate => "CREATE_AND_UPDATE",
            Self::Delete => "DELETE",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ImportStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "CREATE_AND_UPDATE" => Ok(Self::CreateAndUpdate),
            "DELETE" => Ok(Self::Delete),
            _ => Err(format!(
                "Invalid import strategy: {s}. Expected 'create', 'update', 'create_and_update' or 'delete'"
            )),
        }
    }
}

/// Level of detail in the import report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportMode {
    /// Only errors
    #[default]
    Errors,
    /// Errors and warnings
    Warnings,
    /// Every diagnostic, including informational ones
    Full,
}

impl FromStr for ReportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "errors" => Ok(Self::Errors),
            "warnings" => Ok(Self::Warnings),
            "full" => Ok(Self::Full),
            _ => Err(format!(
                "Invalid report mode: {s}. Expected 'errors', 'warnings' or 'full'"
            )),
        }
    }
}

/// Options for one import
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Acting user, `None` for system imports
    pub user: Option<User>,
    pub id_schemes: IdSchemes,
    pub import_strategy: ImportStrategy,
    pub report_mode: ReportMode,
    /// Requested asynchronous execution; recorded only
    pub async_mode: bool,
}

impl ImportOptions {
    pub fn new(user: Option<User>) -> Self {
        Self {
            user,
            id_schemes: IdSchemes::default(),
            import_strategy: ImportStrategy::default(),
            report_mode: ReportMode::default(),
            async_mode: false,
        }
    }

    pub fn with_id_schemes(mut self, id_schemes: IdSchemes) -> Self {
        self.id_schemes = id_schemes;
        self
    }

    pub fn with_strategy(mut self, strategy: ImportStrategy) -> Self {
        self.import_strategy = strategy;
        self
    }

    pub fn with_report_mode(mut self, report_mode: ReportMode) -> Self {
        self.report_mode = report_mode;
        self
    }

    /// Username of the acting user, if any
    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            "create-and-update".parse::<ImportStrategy>().unwrap(),
            ImportStrategy::CreateAndUpdate
        );
        assert_eq!("DELETE".parse::<ImportStrategy>().unwrap(), ImportStrategy::Delete);
        assert!("merge".parse::<ImportStrategy>().is_err());
    }

    #[test]
    fn test_report_mode_order() {
        assert!(ReportMode::Errors < ReportMode::Warnings);
        assert!(ReportMode::Warnings < ReportMode::Full);
        assert_eq!("Full".parse::<ReportMode>().unwrap(), ReportMode::Full);
    }

    #[test]
    fn test_options_defaults() {
        let options = ImportOptions::default();
        assert!(options.user.is_none());
        assert_eq!(options.import_strategy, ImportStrategy::CreateAndUpdate);
        assert_eq!(options.report_mode, ReportMode::Errors);
        assert!(options.username().is_none());
    }
}
