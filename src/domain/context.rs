//! Error context extension trait
//!
//! Adds `.context()` / `.with_context()` to any `Result` whose error converts
//! into [`IntakeError`], keeping library code on the domain error type.
//!
//! ```rust
//! use intake::domain::Result;
//! use intake::domain::context::ResultExt;
//!
//! fn read_bundle(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).with_context(|| format!("Failed to read bundle: {path}"))
//! }
//! ```

use crate::domain::errors::IntakeError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add lazily computed context to an error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<IntakeError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| wrap(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

// Contract violations keep their variant.
fn wrap(base: IntakeError, context: impl std::fmt::Display) -> IntakeError {
    match base {
        IntakeError::ContractViolation(msg) => {
            IntakeError::ContractViolation(format!("{context}: {msg}"))
        }
        other => IntakeError::Other(format!("{context}: {other}")),
    }
}
