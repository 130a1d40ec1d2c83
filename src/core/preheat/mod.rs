//! Preheat context
//!
//! - [`context`] - Immutable per-batch lookup context and its builder
//! - [`loader`] - Bulk loading from the store and the metadata catalog

pub mod context;
pub mod loader;

pub use context::{PreheatBuilder, PreheatContext};
pub use loader::Preheater;
