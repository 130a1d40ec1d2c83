//! External system integrations for Intake.
//!
//! - [`store`] - Tracker entity storage (trait-based, with an in-memory backend)
//! - [`access`] - Capability checks for the acting user
//!
//! # Design Pattern
//!
//! Adapters isolate persistence and access control behind traits so the
//! import pipeline can run against any backend, including test doubles.
//!
//! ```rust
//! use intake::adapters::store::{InMemoryStore, TrackerStore};
//! use intake::domain::Uid;
//!
//! # async fn example() -> intake::domain::Result<()> {
//! let store = InMemoryStore::new();
//! assert!(!store.exists_by_uid(&Uid::new("evA").unwrap()).await?);
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod store;

pub use access::{DefaultAccessManager, TrackerAccessManager};
pub use store::{InMemoryStore, StoreTransaction, TrackerStore};
