//! Storage abstraction layer
//!
//! Trait-based persistence for tracker entities with an in-memory
//! implementation.

pub mod memory;
pub mod traits;

pub use memory::InMemoryStore;
pub use traits::{StoreTransaction, TrackerStore};
